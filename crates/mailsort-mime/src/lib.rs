//! # mailsort-mime
//!
//! Minimal MIME parsing for mail classification.
//!
//! Only the read side is covered: enough to recover a message's decoded
//! subject and a plain-text rendition of its body.
//!
//! ## Features
//!
//! - **Message parsing**: Split raw RFC 5322 text into headers and body, with
//!   recursive multipart traversal
//! - **Decoding**: Base64, Quoted-Printable, RFC 2047 encoded words
//! - **Plain text**: First `text/plain` part, falling back to HTML converted
//!   to text
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsort_mime::Message;
//!
//! let raw = "From: sender@example.com\r\n\
//!            Subject: =?utf-8?B?SW52b2ljZQ==?=\r\n\
//!            Content-Type: text/plain\r\n\
//!            \r\n\
//!            Please find the invoice attached.";
//!
//! let message = Message::parse(raw)?;
//! assert_eq!(message.subject_decoded().as_deref(), Some("Invoice"));
//! println!("{}", message.plain_text()?);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding};
