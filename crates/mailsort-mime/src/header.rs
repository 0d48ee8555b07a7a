//! MIME header handling.

use crate::encoding::decode_rfc2047;
use std::collections::HashMap;

/// Collection of email headers, keyed case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    headers: HashMap<String, Vec<String>>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_lowercase();
        self.headers.entry(name).or_default().push(value.into());
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|v| v.first().map(String::as_str))
    }

    /// Gets the first value for a header with RFC 2047 encoded words decoded.
    ///
    /// Encoded words that fail to decode are kept verbatim.
    #[must_use]
    pub fn get_decoded(&self, name: &str) -> Option<String> {
        self.get(name).map(decode_header_value)
    }

    /// Returns the number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns `true` if no headers are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Parses headers from raw text.
    ///
    /// Parsing stops at the first empty line. Continuation lines (leading
    /// space or tab) are folded into the preceding header; lines without a
    /// colon are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut headers = Self::new();
        let mut current_name: Option<String> = None;
        let mut current_value = String::new();

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                if current_name.is_some() {
                    current_value.push(' ');
                    current_value.push_str(line.trim());
                }
                continue;
            }

            if let Some(name) = current_name.take() {
                headers.add(name, current_value.trim());
                current_value.clear();
            }

            if let Some((name, value)) = line.split_once(':') {
                current_name = Some(name.trim().to_string());
                current_value = value.trim().to_string();
            }
        }

        if let Some(name) = current_name {
            headers.add(name, current_value.trim());
        }

        headers
    }
}

/// Decodes every whitespace-separated RFC 2047 encoded word in a value.
///
/// Whitespace between two adjacent encoded words is dropped, as RFC 2047
/// section 6.2 requires.
fn decode_header_value(value: &str) -> String {
    let mut result = String::new();
    let mut previous_was_encoded = false;

    for (index, word) in value.split(' ').enumerate() {
        let is_encoded = word.starts_with("=?") && word.ends_with("?=");
        let decoded = if is_encoded {
            decode_rfc2047(word).unwrap_or_else(|_| word.to_string())
        } else {
            word.to_string()
        };

        if index > 0 && !(previous_was_encoded && is_encoded) {
            result.push(' ');
        }
        result.push_str(&decoded);
        previous_was_encoded = is_encoded;
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_case_insensitive() {
        let mut headers = Headers::new();
        headers.add("Subject", "Quarterly report");

        assert_eq!(headers.get("subject"), Some("Quarterly report"));
        assert_eq!(headers.get("SUBJECT"), Some("Quarterly report"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_headers_parse_folded() {
        let text = "From: alice@example.com\r\nSubject: Project\r\n  kickoff notes\r\n\r\nbody";
        let headers = Headers::parse(text);

        assert_eq!(headers.get("from"), Some("alice@example.com"));
        assert_eq!(headers.get("subject"), Some("Project kickoff notes"));
    }

    #[test]
    fn test_headers_parse_stops_at_blank_line() {
        let headers = Headers::parse("Subject: one\n\nX-Not-A-Header: two\n");

        assert_eq!(headers.get("subject"), Some("one"));
        assert!(headers.get("x-not-a-header").is_none());
    }

    #[test]
    fn test_get_decoded_mixed_words() {
        let mut headers = Headers::new();
        headers.add("subject", "Re: =?utf-8?Q?Caf=C3=A9?= =?utf-8?Q?_menu?= update");

        assert_eq!(
            headers.get_decoded("subject").as_deref(),
            Some("Re: Café menu update")
        );
    }

    #[test]
    fn test_get_decoded_keeps_broken_word() {
        let mut headers = Headers::new();
        headers.add("subject", "=?utf-8?X?abc?=");

        assert_eq!(headers.get_decoded("subject").as_deref(), Some("=?utf-8?X?abc?="));
    }
}
