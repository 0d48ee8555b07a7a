//! Error types for the core library.

use thiserror::Error;

/// Failure reported by a host collaborator (mail host or category store).
#[derive(Debug, Error)]
pub enum HostError {
    /// The requested folder does not exist or cannot be opened.
    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    /// The requested message does not exist.
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// The message content could not be parsed.
    #[error("MIME error: {0}")]
    Mime(#[from] mailsort_mime::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other host-side failure.
    #[error("Operation failed: {0}")]
    Operation(String),
}

/// Errors that abort a folder run.
///
/// Failures scoped to a single message (body retrieval, category apply)
/// never surface here; they are reported and the run moves on.
#[derive(Debug, Error)]
pub enum Error {
    /// The folder could not be opened.
    #[error("Failed to load folder {folder}: {source}")]
    FolderLoad {
        /// Folder that was requested.
        folder: String,
        /// Underlying host failure.
        #[source]
        source: HostError,
    },

    /// The folder was opened but its messages could not be listed.
    #[error("Failed to list messages in {folder}: {source}")]
    MessageList {
        /// Folder that was requested.
        folder: String,
        /// Underlying host failure.
        #[source]
        source: HostError,
    },

    /// The category snapshot could not be read.
    #[error("Failed to load categories: {0}")]
    CategoryStore(#[source] HostError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid category definition.
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for HostError {
    fn from(err: Error) -> Self {
        match err {
            Error::Database(e) => Self::Database(e),
            other => Self::Operation(other.to_string()),
        }
    }
}
