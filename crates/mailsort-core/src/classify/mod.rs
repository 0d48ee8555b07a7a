//! Keyword classification: thread segmentation, scoring and category choice.

mod classifier;
mod model;
mod scoring;
mod segment;

pub use classifier::{CategoryClassifier, Classification, Decision, Outcome, decide};
pub use model::{Category, CategorySet, ScoreResult, ThreadSegment};
pub use scoring::{KeywordMatch, MessageText, ScoreBreakdown, ScoringEngine, count_occurrences};
pub use segment::ThreadSegmenter;
