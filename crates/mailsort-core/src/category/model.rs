//! Category assignment records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A category recorded against a message.
///
/// Each message carries at most one assignment; re-classifying it replaces
/// the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Host identifier of the message.
    pub message_id: String,
    /// Assigned category name.
    pub category: String,
    /// Score the category won with.
    pub score: f64,
    /// When the assignment was recorded.
    pub assigned_at: DateTime<Utc>,
}
