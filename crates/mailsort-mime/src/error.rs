//! Error types for MIME parsing.

use std::string::FromUtf8Error;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Invalid encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// UTF-8 decode error.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),

    /// Missing boundary in multipart message.
    #[error("Missing boundary in multipart message")]
    MissingBoundary,

    /// HTML to text conversion failed.
    #[error("HTML conversion failed: {0}")]
    Html(String),

    /// Multipart parts are nested deeper than the parser follows.
    #[error("Multipart nesting exceeds {0} levels")]
    NestingTooDeep(usize),

    /// The message has neither a text/plain nor a text/html body.
    #[error("No text body found")]
    NoTextBody,
}
