//! Picking and applying the best category for a message.

use chrono::{DateTime, Utc};

use super::model::{CategorySet, ScoreResult};
use super::scoring::{MessageText, ScoringEngine};
use super::segment::ThreadSegmenter;
use crate::config::WeightConfig;
use crate::host::{MailHost, MailMessage};
use crate::report::StatusReporter;

/// Selection made from a set of scores, before anything is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The leader cleared the threshold.
    Apply {
        /// Winning category.
        category: String,
        /// Its score.
        score: f64,
    },
    /// No category cleared the threshold.
    BelowThreshold {
        /// Highest-scoring category, if any scored above zero.
        best: Option<(String, f64)>,
    },
}

/// Chooses a category from `scores`.
///
/// The leader is the first category, in score order, whose score strictly
/// exceeds every earlier one, starting from zero; an equal later score never
/// displaces it, and a category scoring zero is never chosen. The leader is
/// applied when its score is at least `threshold`.
#[must_use]
pub fn decide(scores: &ScoreResult, threshold: f64) -> Decision {
    let mut highest = 0.0;
    let mut leader: Option<(&str, f64)> = None;

    for (category, score) in scores.iter() {
        if score > highest {
            highest = score;
            leader = Some((category, score));
        }
    }

    match leader {
        Some((category, score)) if score >= threshold => Decision::Apply {
            category: category.to_string(),
            score,
        },
        _ => Decision::BelowThreshold {
            best: leader.map(|(c, s)| (c.to_string(), s)),
        },
    }
}

/// Terminal state of classifying one message.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The category was applied by the host.
    Applied {
        /// Applied category.
        category: String,
        /// Its score.
        score: f64,
    },
    /// The host failed to apply the chosen category.
    ApplyFailed {
        /// Chosen category.
        category: String,
        /// Its score.
        score: f64,
        /// Host error message.
        error: String,
    },
    /// No category reached the threshold.
    BelowThreshold {
        /// Highest-scoring category, if any scored above zero.
        best: Option<(String, f64)>,
    },
}

/// Result of classifying one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Every category's score, kept for diagnostics.
    pub scores: ScoreResult,
    /// What happened.
    pub outcome: Outcome,
    /// Why the body did not contribute, if it could not be retrieved.
    pub body_error: Option<String>,
}

impl Classification {
    /// The applied category and its score, if one was applied.
    #[must_use]
    pub fn applied(&self) -> Option<(&str, f64)> {
        match &self.outcome {
            Outcome::Applied { category, score } => Some((category.as_str(), *score)),
            _ => None,
        }
    }
}

/// Scores messages against every category and applies the winner.
pub struct CategoryClassifier<'a, H, R> {
    host: &'a H,
    reporter: &'a R,
    engine: ScoringEngine,
    segmenter: ThreadSegmenter,
}

impl<'a, H, R> CategoryClassifier<'a, H, R>
where
    H: MailHost,
    R: StatusReporter,
{
    /// Create a classifier for one run.
    ///
    /// `now` anchors synthetic timestamps for undated thread segments.
    #[must_use]
    pub const fn new(host: &'a H, reporter: &'a R, weights: WeightConfig, now: DateTime<Utc>) -> Self {
        Self {
            host,
            reporter,
            engine: ScoringEngine::new(weights),
            segmenter: ThreadSegmenter::new(now),
        }
    }

    /// Fetches and segments a message's body.
    ///
    /// When the host cannot provide the body the failure is reported and the
    /// message is scored on its subject alone.
    pub async fn prepare(&self, message: &MailMessage) -> (MessageText, Option<String>) {
        match self.host.plain_text_body(message).await {
            Ok(body) => {
                let segments = self.segmenter.segment(&body);
                self.reporter.verbose(format!(
                    "Message {}: {} thread segment(s)",
                    message.id,
                    segments.len()
                ));
                (MessageText::new(&message.subject, &segments), None)
            }
            Err(e) => {
                self.reporter.error(format!(
                    "Could not read body of message {}, scoring subject only: {e}",
                    message.id
                ));
                (MessageText::subject_only(&message.subject), Some(e.to_string()))
            }
        }
    }

    /// Scores prepared text against every category, in set order.
    pub fn score_all(&self, message: &MailMessage, text: &MessageText, categories: &CategorySet) -> ScoreResult {
        let mut scores = ScoreResult::new();

        for category in categories {
            let breakdown = self.engine.breakdown(text, category.keywords());
            for m in &breakdown.matches {
                let body_count = m.body_count();
                if m.subject_count > 0 || body_count > 0 {
                    self.reporter.verbose(format!(
                        "Message {}: '{}' keyword '{}' matched {} time(s) in subject, {} in body",
                        message.id,
                        category.name(),
                        m.keyword,
                        m.subject_count,
                        body_count
                    ));
                }
            }
            scores.add(category.name(), breakdown.total());
        }

        scores
    }

    /// Classifies one message and applies the winning category.
    ///
    /// Never fails: body and apply failures are reported and reflected in the
    /// returned [`Classification`].
    pub async fn classify(&self, message: &MailMessage, categories: &CategorySet) -> Classification {
        let (text, body_error) = self.prepare(message).await;
        let scores = self.score_all(message, &text, categories);
        let threshold = self.engine.weights().score_threshold;

        let outcome = match decide(&scores, threshold) {
            Decision::Apply { category, score } => {
                match self.host.apply_category(message, &category, score).await {
                    Ok(()) => {
                        self.reporter.success(format!(
                            "Applied '{category}' to message {} (score {score:.2})",
                            message.id
                        ));
                        Outcome::Applied { category, score }
                    }
                    Err(e) => {
                        self.reporter.error(format!(
                            "Failed to apply '{category}' to message {}: {e}",
                            message.id
                        ));
                        Outcome::ApplyFailed {
                            category,
                            score,
                            error: e.to_string(),
                        }
                    }
                }
            }
            Decision::BelowThreshold { best } => {
                match &best {
                    Some((category, score)) => self.reporter.info(format!(
                        "No category applied to message {}: best '{category}' scored {score:.2}, threshold {threshold}",
                        message.id
                    )),
                    None => self.reporter.info(format!(
                        "No category applied to message {}: no keyword matched",
                        message.id
                    )),
                }
                Outcome::BelowThreshold { best }
            }
        };

        Classification {
            scores,
            outcome,
            body_error,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::classify::Category;
    use crate::error::HostError;
    use crate::report::{MemoryReporter, Severity};
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeHost {
        bodies: Vec<(String, String)>,
        fail_apply: bool,
        applied: Mutex<Vec<(String, String)>>,
    }

    impl FakeHost {
        fn with_body(id: &str, body: &str) -> Self {
            Self {
                bodies: vec![(id.to_string(), body.to_string())],
                ..Self::default()
            }
        }

        fn applied(&self) -> Vec<(String, String)> {
            self.applied.lock().unwrap().clone()
        }
    }

    impl MailHost for FakeHost {
        async fn list_messages(&self, _folder: &str) -> Result<Vec<MailMessage>, HostError> {
            Ok(Vec::new())
        }

        async fn plain_text_body(&self, message: &MailMessage) -> Result<String, HostError> {
            self.bodies
                .iter()
                .find(|(id, _)| id == message.id.as_str())
                .map(|(_, body)| body.clone())
                .ok_or_else(|| HostError::MessageNotFound(message.id.to_string()))
        }

        async fn apply_category(
            &self,
            message: &MailMessage,
            category: &str,
            _score: f64,
        ) -> Result<(), HostError> {
            if self.fail_apply {
                return Err(HostError::Operation("mailbox is read-only".to_string()));
            }
            self.applied
                .lock()
                .unwrap()
                .push((message.id.to_string(), category.to_string()));
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn scores(entries: &[(&str, f64)]) -> ScoreResult {
        let mut result = ScoreResult::new();
        for (name, score) in entries {
            result.add(name, *score);
        }
        result
    }

    #[test]
    fn test_decide_first_wins_ties() {
        let decision = decide(&scores(&[("Work", 20.0), ("Finance", 20.0)]), 10.0);
        assert_eq!(
            decision,
            Decision::Apply {
                category: "Work".to_string(),
                score: 20.0
            }
        );
    }

    #[test]
    fn test_decide_strictly_higher_overtakes() {
        let decision = decide(&scores(&[("Work", 20.0), ("Finance", 20.5)]), 10.0);
        assert_eq!(
            decision,
            Decision::Apply {
                category: "Finance".to_string(),
                score: 20.5
            }
        );
    }

    #[test]
    fn test_decide_threshold_boundary() {
        let at = decide(&scores(&[("Work", 10.0)]), 10.0);
        assert!(matches!(at, Decision::Apply { .. }));

        let below = decide(&scores(&[("Work", 9.0)]), 10.0);
        assert_eq!(
            below,
            Decision::BelowThreshold {
                best: Some(("Work".to_string(), 9.0))
            }
        );
    }

    #[test]
    fn test_decide_zero_scores_never_lead() {
        let decision = decide(&scores(&[("Work", 0.0), ("Finance", 0.0)]), 0.0);
        assert_eq!(decision, Decision::BelowThreshold { best: None });

        assert_eq!(
            decide(&ScoreResult::new(), 10.0),
            Decision::BelowThreshold { best: None }
        );
    }

    #[tokio::test]
    async fn test_classify_applies_best_category() {
        let host = FakeHost::with_body("m1", "Please pay the attached invoice.");
        let reporter = MemoryReporter::new();
        let classifier = CategoryClassifier::new(&host, &reporter, WeightConfig::default(), now());

        let categories: CategorySet = [
            Category::new("Travel", ["flight"]),
            Category::new("Finance", ["invoice", "pay"]),
        ]
        .into_iter()
        .collect();
        let message = MailMessage::new("m1", "Invoice 42");

        let result = classifier.classify(&message, &categories).await;

        // subject "invoice" 10 + body "invoice" 1 + body "pay" 1
        assert_eq!(result.applied(), Some(("Finance", 12.0)));
        assert_eq!(result.scores.get("Travel"), 0.0);
        assert_eq!(host.applied(), [("m1".to_string(), "Finance".to_string())]);
        assert_eq!(reporter.events_with(Severity::Success).len(), 1);
        assert!(!reporter.events_with(Severity::Verbose).is_empty());
    }

    #[tokio::test]
    async fn test_classify_body_failure_scores_subject_only() {
        let host = FakeHost::default();
        let reporter = MemoryReporter::new();
        let classifier = CategoryClassifier::new(&host, &reporter, WeightConfig::default(), now());

        let categories: CategorySet = [Category::new("Finance", ["invoice"])].into_iter().collect();
        let message = MailMessage::new("missing", "Invoice reminder");

        let result = classifier.classify(&message, &categories).await;

        assert_eq!(result.applied(), Some(("Finance", 10.0)));
        assert!(result.body_error.is_some());
        assert_eq!(reporter.events_with(Severity::Error).len(), 1);
    }

    #[tokio::test]
    async fn test_classify_apply_failure_is_reported() {
        let host = FakeHost {
            fail_apply: true,
            ..FakeHost::with_body("m1", "")
        };
        let reporter = MemoryReporter::new();
        let classifier = CategoryClassifier::new(&host, &reporter, WeightConfig::default(), now());

        let categories: CategorySet = [Category::new("Finance", ["invoice"])].into_iter().collect();
        let result = classifier
            .classify(&MailMessage::new("m1", "invoice"), &categories)
            .await;

        assert!(matches!(
            result.outcome,
            Outcome::ApplyFailed { ref category, .. } if category == "Finance"
        ));
        assert!(result.applied().is_none());
        assert!(host.applied().is_empty());
        assert_eq!(reporter.events_with(Severity::Error).len(), 1);
    }

    #[tokio::test]
    async fn test_classify_empty_categories_applies_nothing() {
        let host = FakeHost::with_body("m1", "invoice invoice invoice");
        let reporter = MemoryReporter::new();
        let classifier = CategoryClassifier::new(&host, &reporter, WeightConfig::default(), now());

        let result = classifier
            .classify(&MailMessage::new("m1", "invoice"), &CategorySet::new())
            .await;

        assert_eq!(result.outcome, Outcome::BelowThreshold { best: None });
        assert!(result.scores.is_empty());
        assert!(host.applied().is_empty());
    }

    #[tokio::test]
    async fn test_classify_long_thread_keeps_subject_match() {
        let body: String = (0..1800)
            .map(|_| "From: Ops\nSent: 2024-05-01\n\nfiller\n")
            .collect();
        let host = FakeHost::with_body("m1", &body);
        let reporter = MemoryReporter::new();
        let classifier = CategoryClassifier::new(&host, &reporter, WeightConfig::default(), now());

        let categories: CategorySet = [Category::new("Finance", ["invoice"])].into_iter().collect();
        let result = classifier
            .classify(&MailMessage::new("m1", "invoice"), &categories)
            .await;

        assert_eq!(result.applied(), Some(("Finance", 10.0)));
    }

    #[tokio::test]
    async fn test_classify_is_idempotent() {
        let body = "Thanks!\n\nFrom: Ops\nSent: 2024-05-30\n\nThe deploy of the release is done.";
        let host = FakeHost::with_body("m1", body);
        let reporter = MemoryReporter::new();
        let classifier = CategoryClassifier::new(&host, &reporter, WeightConfig::default(), now());

        let categories: CategorySet = [
            Category::new("Releases", ["release", "deploy"]),
            Category::new("Ops", ["ops"]),
        ]
        .into_iter()
        .collect();
        let message = MailMessage::new("m1", "Release deploy finished");

        let first = classifier.classify(&message, &categories).await;
        let second = classifier.classify(&message, &categories).await;

        assert_eq!(first, second);
        assert_eq!(first.applied().map(|(c, _)| c), Some("Releases"));
    }
}
