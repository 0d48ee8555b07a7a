//! MIME message structure and text extraction.

use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_charset, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;
use std::fmt;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// A leaf MIME part (nested multiparts are flattened in document order).
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body, still transfer-encoded.
    pub body: String,
}

impl Part {
    /// Creates a new part.
    #[must_use]
    pub const fn new(headers: Headers, body: String) -> Self {
        Self { headers, body }
    }

    /// Gets the content type, defaulting to `text/plain` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Whether this part is marked as an attachment.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.headers
            .get("content-disposition")
            .is_some_and(|d| d.trim_start().to_lowercase().starts_with("attachment"))
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if Base64 decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(&self.body),
            TransferEncoding::QuotedPrintable => Ok(decode_quoted_printable(&self.body)),
            _ => Ok(self.body.clone().into_bytes()),
        }
    }

    /// Gets the decoded body as a string, honouring the charset parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding or charset conversion fails.
    pub fn body_text(&self) -> Result<String> {
        let content_type = self.content_type()?;
        decode_charset(self.decode_body()?, content_type.charset())
    }
}

/// Parsed MIME message.
#[derive(Debug, Clone)]
pub struct Message {
    /// Message headers.
    pub headers: Headers,
    /// Leaf parts for multipart messages, empty otherwise.
    pub parts: Vec<Part>,
    /// Body for single-part messages.
    pub body: Option<String>,
}

impl Message {
    /// Parses a raw RFC 5322 message.
    ///
    /// # Errors
    ///
    /// Returns an error if the top-level content type is invalid or a
    /// multipart message is missing its boundary.
    pub fn parse(raw: &str) -> Result<Self> {
        let (header_text, body) = split_header_body(raw);
        let headers = Headers::parse(header_text);

        let content_type = headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)?;

        if content_type.is_multipart() {
            let mut parts = Vec::new();
            collect_parts(body, &content_type, &mut parts, 0)?;
            Ok(Self {
                headers,
                parts,
                body: None,
            })
        } else {
            Ok(Self {
                headers,
                parts: Vec::new(),
                body: Some(body.to_string()),
            })
        }
    }

    /// Gets the Subject header with RFC 2047 encoded words decoded.
    #[must_use]
    pub fn subject_decoded(&self) -> Option<String> {
        self.headers.get_decoded("subject")
    }

    /// Returns a plain-text rendition of the body.
    ///
    /// Prefers the first inline `text/plain` part; otherwise converts the
    /// first `text/html` part to text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoTextBody`] when there is no text content, or a
    /// decoding error when the chosen part cannot be decoded.
    pub fn plain_text(&self) -> Result<String> {
        if let Some(body) = &self.body {
            // Single-part messages carry their content headers at the top level.
            let part = Part::new(self.headers.clone(), body.clone());
            let content_type = part.content_type()?;
            return if content_type.is_plain_text() {
                part.body_text()
            } else if content_type.is_html() {
                html_to_text(&part.body_text()?)
            } else {
                Err(Error::NoTextBody)
            };
        }

        let mut html = None;
        for part in self.parts.iter().filter(|p| !p.is_attachment()) {
            let content_type = part.content_type()?;
            if content_type.is_plain_text() {
                return part.body_text();
            }
            if content_type.is_html() && html.is_none() {
                html = Some(part);
            }
        }

        match html {
            Some(part) => html_to_text(&part.body_text()?),
            None => Err(Error::NoTextBody),
        }
    }
}

fn html_to_text(html: &str) -> Result<String> {
    htmd::convert(html).map_err(|e| Error::Html(e.to_string()))
}

/// Splits a raw entity at the first blank line.
fn split_header_body(raw: &str) -> (&str, &str) {
    let crlf = raw.find("\r\n\r\n").map(|i| (i, 4));
    let lf = raw.find("\n\n").map(|i| (i, 2));

    let separator = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    match separator {
        Some((index, len)) => (&raw[..index], &raw[index + len..]),
        None => (raw, ""),
    }
}

/// Deepest multipart nesting followed before giving up.
const MAX_NESTING_DEPTH: usize = 32;

/// Recursively collects the leaf parts of a multipart body.
fn collect_parts(
    body: &str,
    content_type: &ContentType,
    parts: &mut Vec<Part>,
    depth: usize,
) -> Result<()> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(Error::NestingTooDeep(MAX_NESTING_DEPTH));
    }
    let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;

    for chunk in split_multipart(body, boundary) {
        let (header_text, part_body) = split_header_body(chunk);
        let headers = Headers::parse(header_text);
        let part_type = headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)?;

        if part_type.is_multipart() {
            collect_parts(part_body, &part_type, parts, depth + 1)?;
        } else {
            parts.push(Part::new(headers, part_body.to_string()));
        }
    }

    Ok(())
}

/// Splits a multipart body on its boundary delimiter lines.
///
/// The preamble before the first delimiter and the epilogue after the close
/// delimiter are discarded. The line break preceding each delimiter belongs
/// to the delimiter.
fn split_multipart<'a>(body: &'a str, boundary: &str) -> Vec<&'a str> {
    let delimiter = format!("--{boundary}");
    let close = format!("--{boundary}--");

    let mut chunks = Vec::new();
    let mut start: Option<usize> = None;
    let mut offset = 0;

    for line in body.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == delimiter || trimmed == close {
            if let Some(begin) = start {
                let chunk = &body[begin..offset];
                let chunk = chunk
                    .strip_suffix("\r\n")
                    .or_else(|| chunk.strip_suffix('\n'))
                    .unwrap_or(chunk);
                chunks.push(chunk);
            }
            if trimmed == close {
                return chunks;
            }
            start = Some(offset + line.len());
        }
        offset += line.len();
    }

    // Unterminated multipart: keep whatever followed the last delimiter.
    if let Some(begin) = start
        && begin < body.len()
    {
        chunks.push(&body[begin..]);
    }

    chunks
}
