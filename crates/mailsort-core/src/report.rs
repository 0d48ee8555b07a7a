//! Status events emitted while classifying.
//!
//! Every event carries one of four severities. `Verbose` events hold
//! per-keyword diagnostics only; nothing depends on them being delivered.

use std::sync::{Mutex, PoisonError};

/// Severity tag of a status event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Progress information.
    Info,
    /// Internal diagnostic detail (keyword match counts).
    Verbose,
    /// A failure.
    Error,
    /// A completed action.
    Success,
}

impl Severity {
    /// Short lowercase label.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Verbose => "verbose",
            Self::Error => "error",
            Self::Success => "success",
        }
    }
}

/// A human-readable status event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    /// Event severity.
    pub severity: Severity,
    /// Message text.
    pub message: String,
}

/// Receiver of status events.
pub trait StatusReporter {
    /// Deliver one event.
    fn report(&self, event: StatusEvent);

    /// Report an [`Severity::Info`] event.
    fn info(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.report(StatusEvent {
            severity: Severity::Info,
            message: message.into(),
        });
    }

    /// Report a [`Severity::Verbose`] event.
    fn verbose(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.report(StatusEvent {
            severity: Severity::Verbose,
            message: message.into(),
        });
    }

    /// Report an [`Severity::Error`] event.
    fn error(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.report(StatusEvent {
            severity: Severity::Error,
            message: message.into(),
        });
    }

    /// Report a [`Severity::Success`] event.
    fn success(&self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.report(StatusEvent {
            severity: Severity::Success,
            message: message.into(),
        });
    }
}

/// Forwards events to `tracing`.
///
/// Info and Success map to `INFO` (Success with `status = "success"`),
/// Verbose to `DEBUG`, Error to `ERROR`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl StatusReporter for TracingReporter {
    fn report(&self, event: StatusEvent) {
        match event.severity {
            Severity::Info => tracing::info!("{}", event.message),
            Severity::Verbose => tracing::debug!("{}", event.message),
            Severity::Error => tracing::error!("{}", event.message),
            Severity::Success => tracing::info!(status = "success", "{}", event.message),
        }
    }
}

/// Buffers events in memory, e.g. for a log view to render later.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<StatusEvent>>,
}

impl MemoryReporter {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every event received so far.
    #[must_use]
    pub fn events(&self) -> Vec<StatusEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events of one severity.
    #[must_use]
    pub fn events_with(&self, severity: Severity) -> Vec<StatusEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.severity == severity)
            .collect()
    }
}

impl StatusReporter for MemoryReporter {
    fn report(&self, event: StatusEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl<R: StatusReporter> StatusReporter for &R {
    fn report(&self, event: StatusEvent) {
        (*self).report(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reporter_collects_in_order() {
        let reporter = MemoryReporter::new();
        reporter.info("starting");
        reporter.verbose("keyword 'invoice' matched 2 times");
        reporter.error("body unavailable");
        reporter.success("done");

        let severities: Vec<Severity> = reporter.events().iter().map(|e| e.severity).collect();
        assert_eq!(
            severities,
            [
                Severity::Info,
                Severity::Verbose,
                Severity::Error,
                Severity::Success
            ]
        );
        assert_eq!(reporter.events_with(Severity::Error)[0].message, "body unavailable");
    }

    #[test]
    fn test_reporter_by_reference() {
        let reporter = MemoryReporter::new();
        let by_ref = &reporter;
        by_ref.success("applied");

        assert_eq!(reporter.events().len(), 1);
        assert_eq!(Severity::Success.as_str(), "success");
    }
}
