//! Weighted keyword scoring.
//!
//! A message's score for one category is
//!
//! ```text
//! Σ_k count(k, subject) × subject_weight
//!   + Σ_k Σ_i count(k, segment_i) × body_weight × recency_multiplier^(n - i - 1)
//! ```
//!
//! where segments are ordered newest first, so the newest segment carries
//! the largest recency weight and the oldest carries weight 1.

use super::model::ThreadSegment;
use crate::config::WeightConfig;

/// Counts non-overlapping, case-insensitive occurrences of `keyword` in `text`,
/// scanning left to right.
///
/// The keyword is matched literally. A blank keyword never matches.
#[must_use]
pub fn count_occurrences(text: &str, keyword: &str) -> usize {
    count_lowered(&text.to_lowercase(), &keyword.trim().to_lowercase())
}

fn count_lowered(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

/// Case-folded subject and thread segments of one message, ready to score
/// against any number of categories.
#[derive(Debug, Clone, Default)]
pub struct MessageText {
    subject: String,
    segments: Vec<String>,
}

impl MessageText {
    /// Prepare a message whose body was segmented (newest segment first).
    #[must_use]
    pub fn new(subject: &str, segments: &[ThreadSegment]) -> Self {
        Self {
            subject: subject.to_lowercase(),
            segments: segments.iter().map(|s| s.text.to_lowercase()).collect(),
        }
    }

    /// Prepare a message whose body is unavailable; only the subject scores.
    #[must_use]
    pub fn subject_only(subject: &str) -> Self {
        Self {
            subject: subject.to_lowercase(),
            segments: Vec::new(),
        }
    }

    /// Number of body segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

/// Match counts for one keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatch {
    /// The keyword as configured.
    pub keyword: String,
    /// Occurrences in the subject.
    pub subject_count: usize,
    /// Occurrences per body segment, newest segment first.
    pub segment_counts: Vec<usize>,
}

impl KeywordMatch {
    /// Total occurrences across all body segments.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.segment_counts.iter().sum()
    }
}

/// Score of one message against one category, with the counts behind it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBreakdown {
    /// Contribution of subject matches.
    pub subject_score: f64,
    /// Contribution of recency-weighted body matches.
    pub body_score: f64,
    /// Per-keyword counts, in keyword order.
    pub matches: Vec<KeywordMatch>,
}

impl ScoreBreakdown {
    /// Subject plus body contribution.
    ///
    /// Saturates at `f64::MAX` when a long thread overflows the recency weight.
    #[must_use]
    pub fn total(&self) -> f64 {
        saturating_add(self.subject_score, self.body_score)
    }
}

/// Scores messages against keyword lists under fixed weights.
#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine {
    weights: WeightConfig,
}

impl ScoringEngine {
    /// Create an engine for one run's weights.
    #[must_use]
    pub const fn new(weights: WeightConfig) -> Self {
        Self { weights }
    }

    /// The weights this engine scores with.
    #[must_use]
    pub const fn weights(&self) -> &WeightConfig {
        &self.weights
    }

    /// Recency weight of the segment at `index` among `count` segments.
    #[must_use]
    pub fn recency_weight(&self, index: usize, count: usize) -> f64 {
        let exponent = count.saturating_sub(index + 1);
        self.weights
            .recency_multiplier
            .powi(i32::try_from(exponent).unwrap_or(i32::MAX))
    }

    /// Total score of `text` against `keywords`.
    #[must_use]
    pub fn score(&self, text: &MessageText, keywords: &[String]) -> f64 {
        self.breakdown(text, keywords).total()
    }

    /// Score of `text` against `keywords`, with per-keyword counts.
    #[must_use]
    pub fn breakdown(&self, text: &MessageText, keywords: &[String]) -> ScoreBreakdown {
        let n = text.segments.len();
        let mut breakdown = ScoreBreakdown::default();

        for keyword in keywords {
            let needle = keyword.trim().to_lowercase();
            if needle.is_empty() {
                continue;
            }

            let subject_count = count_lowered(&text.subject, &needle);
            breakdown.subject_score += count_as_f64(subject_count) * self.weights.subject_weight;

            let segment_counts: Vec<usize> = text
                .segments
                .iter()
                .map(|segment| count_lowered(segment, &needle))
                .collect();

            for (i, &count) in segment_counts.iter().enumerate() {
                if count == 0 {
                    continue;
                }
                let contribution =
                    count_as_f64(count) * self.weights.body_weight * self.recency_weight(i, n);
                breakdown.body_score = saturating_add(breakdown.body_score, contribution);
            }

            breakdown.matches.push(KeywordMatch {
                keyword: keyword.clone(),
                subject_count,
                segment_counts,
            });
        }

        breakdown
    }
}

/// Adds two non-negative scores, clamping an overflow to `f64::MAX`.
pub(crate) fn saturating_add(a: f64, b: f64) -> f64 {
    (a + b).min(f64::MAX)
}

#[allow(clippy::cast_precision_loss)]
fn count_as_f64(count: usize) -> f64 {
    count as f64
}
