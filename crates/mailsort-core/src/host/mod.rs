//! Boundaries to the host mail client and category storage.
//!
//! The engine never talks to a mail server or a database directly. It asks a
//! [`MailHost`] for messages, their plain-text bodies and to record a category,
//! and a [`CategoryStore`] for the category definitions. Every call is an
//! awaited request that either succeeds or returns a [`HostError`]; timeouts
//! and cancellation of an individual call are the host's business.

mod maildir;

pub use maildir::MaildirHost;

use std::fmt;

use crate::classify::CategorySet;
use crate::error::HostError;

/// Host-assigned message identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl MessageId {
    /// Create a message ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message as listed by the host.
///
/// The body is not carried here; it is fetched on demand through
/// [`MailHost::plain_text_body`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    /// Host identifier.
    pub id: MessageId,
    /// Decoded subject line (empty when the message has none).
    pub subject: String,
}

impl MailMessage {
    /// Create a message handle.
    #[must_use]
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(id),
            subject: subject.into(),
        }
    }
}

/// The host mail client.
#[allow(async_fn_in_trait)]
pub trait MailHost {
    /// List the messages in a folder.
    ///
    /// Returns [`HostError::FolderNotFound`] when the folder itself cannot be
    /// opened, any other error when enumeration fails part way.
    async fn list_messages(&self, folder: &str) -> Result<Vec<MailMessage>, HostError>;

    /// Retrieve the plain-text rendition of a message body.
    async fn plain_text_body(&self, message: &MailMessage) -> Result<String, HostError>;

    /// Record `category` as the message's category.
    async fn apply_category(
        &self,
        message: &MailMessage,
        category: &str,
        score: f64,
    ) -> Result<(), HostError>;
}

/// Source of category definitions.
#[allow(async_fn_in_trait)]
pub trait CategoryStore {
    /// Snapshot of every category, in definition order.
    async fn get_all(&self) -> Result<CategorySet, HostError>;
}
