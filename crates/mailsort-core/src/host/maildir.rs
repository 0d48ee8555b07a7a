//! A [`MailHost`] over Maildir-style folders on disk.
//!
//! A folder is a directory under the root. When it has `cur/` or `new/`
//! subdirectories the messages are the files in those; otherwise every
//! regular file in the folder is a message. Message ids are paths relative
//! to the root, so `Inbox/cur/1700000000.M1.host:2,S` names one message.
//!
//! Categories are not written into the message files; they are recorded in
//! the [`CategoryRepository`].

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{MailHost, MailMessage};
use crate::category::CategoryRepository;
use crate::error::HostError;

/// Maildir-backed mail host.
#[derive(Debug, Clone)]
pub struct MaildirHost {
    root: PathBuf,
    repository: CategoryRepository,
}

impl MaildirHost {
    /// Create a host over the folders under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, repository: CategoryRepository) -> Self {
        Self {
            root: root.into(),
            repository,
        }
    }

    /// Root directory holding the folders.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn message_files(&self, folder: &str) -> Result<Vec<PathBuf>, HostError> {
        let dir = self.root.join(folder);
        if !tokio::fs::metadata(&dir).await.is_ok_and(|m| m.is_dir()) {
            return Err(HostError::FolderNotFound(folder.to_string()));
        }

        let mut sources = Vec::new();
        for sub in ["cur", "new"] {
            let candidate = dir.join(sub);
            if tokio::fs::metadata(&candidate).await.is_ok_and(|m| m.is_dir()) {
                sources.push(candidate);
            }
        }
        if sources.is_empty() {
            sources.push(dir);
        }

        let mut files = Vec::new();
        for source in sources {
            let mut entries = tokio::fs::read_dir(&source).await?;
            while let Some(entry) = entries.next_entry().await? {
                if entry.file_type().await?.is_file() {
                    files.push(entry.path());
                }
            }
        }
        files.sort();
        Ok(files)
    }

    fn message_id(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    async fn read_raw(&self, message: &MailMessage) -> Result<String, HostError> {
        let path = self.root.join(message.id.as_str());
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(HostError::MessageNotFound(message.id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl MailHost for MaildirHost {
    async fn list_messages(&self, folder: &str) -> Result<Vec<MailMessage>, HostError> {
        let files = self.message_files(folder).await?;
        let mut messages = Vec::with_capacity(files.len());

        for path in files {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %path.display(), "Skipping unreadable message: {e}");
                    continue;
                }
            };
            let raw = String::from_utf8_lossy(&bytes);
            let headers = mailsort_mime::Headers::parse(&raw);
            let subject = headers.get_decoded("subject").unwrap_or_default();

            messages.push(MailMessage::new(self.message_id(&path), subject));
        }

        debug!(folder, count = messages.len(), "Listed messages");
        Ok(messages)
    }

    async fn plain_text_body(&self, message: &MailMessage) -> Result<String, HostError> {
        let raw = self.read_raw(message).await?;
        let parsed = mailsort_mime::Message::parse(&raw)?;
        Ok(parsed.plain_text()?)
    }

    async fn apply_category(
        &self,
        message: &MailMessage,
        category: &str,
        score: f64,
    ) -> Result<(), HostError> {
        self.repository
            .assign(message.id.as_str(), category, score)
            .await?;
        Ok(())
    }
}
