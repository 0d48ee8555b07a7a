//! # mailsort-core
//!
//! Keyword-based email categorization.
//!
//! This crate provides:
//! - Thread segmentation of quoted reply chains
//! - Weighted keyword scoring with recency weighting
//! - Category selection and application through a host
//! - Folder runs with cooperative cancellation
//! - Category storage (`SQLite`) and a Maildir host

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod category;
pub mod classify;
pub mod config;
mod error;
pub mod host;
pub mod report;
pub mod run;

pub use category::{Assignment, CategoryRepository};
pub use classify::{
    Category, CategoryClassifier, CategorySet, Classification, Decision, MessageText, Outcome,
    ScoreBreakdown, ScoreResult, ScoringEngine, ThreadSegment, ThreadSegmenter, decide,
};
pub use config::{RawWeights, WeightConfig};
pub use error::{Error, HostError, Result};
pub use host::{CategoryStore, MailHost, MailMessage, MaildirHost, MessageId};
pub use report::{MemoryReporter, Severity, StatusEvent, StatusReporter, TracingReporter};
pub use run::{CancelFlag, FolderRun, RunSummary};
