//! Classifying a whole folder.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::classify::{CategoryClassifier, Outcome};
use crate::config::WeightConfig;
use crate::error::HostError;
use crate::host::{CategoryStore, MailHost};
use crate::report::StatusReporter;
use crate::{Error, Result};

/// Shared cancellation flag, checked between messages.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The message in progress still completes.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counts from one folder run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Folder that was classified.
    pub folder: String,
    /// Messages listed in the folder.
    pub total: usize,
    /// Messages scored.
    pub processed: usize,
    /// Messages a category was applied to.
    pub categorized: usize,
    /// Messages whose chosen category could not be applied.
    pub apply_failures: usize,
    /// Messages scored on their subject alone because the body was unavailable.
    pub body_failures: usize,
    /// Whether the run stopped early on request.
    pub cancelled: bool,
}

/// One classification pass over a folder.
pub struct FolderRun<'a, H, S, R> {
    host: &'a H,
    store: &'a S,
    reporter: &'a R,
    weights: WeightConfig,
    cancel: CancelFlag,
    now: Option<DateTime<Utc>>,
}

impl<'a, H, S, R> FolderRun<'a, H, S, R>
where
    H: MailHost,
    S: CategoryStore,
    R: StatusReporter,
{
    /// Create a run.
    #[must_use]
    pub fn new(host: &'a H, store: &'a S, reporter: &'a R, weights: WeightConfig) -> Self {
        Self {
            host,
            store,
            reporter,
            weights,
            cancel: CancelFlag::new(),
            now: None,
        }
    }

    /// Use `cancel` to stop the run between messages.
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fix the reference time for undated thread segments.
    ///
    /// Defaults to the time the run starts.
    #[must_use]
    pub const fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Classify every message in `folder`, in the order the host lists them.
    ///
    /// # Errors
    ///
    /// Returns an error if the categories cannot be loaded or the folder
    /// cannot be enumerated. Failures on individual messages are reported
    /// and counted in the summary instead.
    #[instrument(skip(self), fields(weights = ?self.weights))]
    pub async fn run(&self, folder: &str) -> Result<RunSummary> {
        let categories = match self.store.get_all().await {
            Ok(categories) => categories,
            Err(e) => {
                self.reporter.error(format!("Could not load categories: {e}"));
                return Err(Error::CategoryStore(e));
            }
        };
        if categories.is_empty() {
            self.reporter
                .info("No categories defined; messages will be scored but not categorized");
        }

        let messages = match self.host.list_messages(folder).await {
            Ok(messages) => messages,
            Err(e) => {
                self.reporter
                    .error(format!("Could not read folder {folder}: {e}"));
                return Err(match e {
                    HostError::FolderNotFound(_) => Error::FolderLoad {
                        folder: folder.to_string(),
                        source: e,
                    },
                    other => Error::MessageList {
                        folder: folder.to_string(),
                        source: other,
                    },
                });
            }
        };

        self.reporter.info(format!(
            "Classifying {} message(s) in {folder} against {} categor{}",
            messages.len(),
            categories.len(),
            if categories.len() == 1 { "y" } else { "ies" }
        ));

        let classifier = CategoryClassifier::new(
            self.host,
            self.reporter,
            self.weights,
            self.now.unwrap_or_else(Utc::now),
        );
        let mut summary = RunSummary {
            folder: folder.to_string(),
            total: messages.len(),
            ..RunSummary::default()
        };

        for message in &messages {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                self.reporter.info(format!(
                    "Cancelled after {} of {} message(s)",
                    summary.processed, summary.total
                ));
                break;
            }

            let result = classifier.classify(message, &categories).await;
            summary.processed += 1;
            if result.body_error.is_some() {
                summary.body_failures += 1;
            }
            match result.outcome {
                Outcome::Applied { .. } => summary.categorized += 1,
                Outcome::ApplyFailed { .. } => summary.apply_failures += 1,
                Outcome::BelowThreshold { .. } => {}
            }
        }

        debug!(?summary, "Run finished");
        self.reporter.success(format!(
            "Processed {} message(s), categorized {}",
            summary.processed, summary.categorized
        ));
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!flag.is_cancelled());

        clone.cancel();
        assert!(flag.is_cancelled());
    }
}
