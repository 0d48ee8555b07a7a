//! MIME decoding utilities.
//!
//! Supports Base64, Quoted-Printable, RFC 2047 header words and the handful
//! of single-byte charsets that still show up in the wild.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable content (RFC 2045) to raw bytes.
///
/// Malformed escape sequences are passed through literally.
#[must_use]
pub fn decode_quoted_printable(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        // Soft line break, possibly with trailing whitespace before the newline
        let mut j = i + 1;
        while j < bytes.len() && (bytes[j] == b' ' || bytes[j] == b'\t') {
            j += 1;
        }
        if bytes.get(j) == Some(&b'\r') && bytes.get(j + 1) == Some(&b'\n') {
            i = j + 2;
            continue;
        }
        if bytes.get(j) == Some(&b'\n') {
            i = j + 1;
            continue;
        }

        match (bytes.get(i + 1), bytes.get(i + 2)) {
            (Some(&hi), Some(&lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                result.push((hex_value(hi) << 4) | hex_value(lo));
                i += 3;
            }
            _ => {
                result.push(b'=');
                i += 1;
            }
        }
    }

    result
}

const fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

/// Converts bytes in the given charset to a `String`.
///
/// ISO-8859-1, US-ASCII and Windows-1252 are mapped byte-for-byte (the
/// Windows-1252 punctuation range is approximated as Latin-1). Everything
/// else is treated as UTF-8.
///
/// # Errors
///
/// Returns an error if a UTF-8 payload is not valid UTF-8.
pub fn decode_charset(bytes: Vec<u8>, charset: Option<&str>) -> Result<String> {
    let charset = charset.map(str::to_lowercase);
    match charset.as_deref() {
        Some("iso-8859-1" | "latin1" | "latin-1" | "us-ascii" | "windows-1252" | "cp1252") => {
            Ok(bytes.into_iter().map(char::from).collect())
        }
        _ => String::from_utf8(bytes).map_err(Into::into),
    }
}

/// Decodes an RFC 2047 encoded word.
///
/// Format: `=?charset?encoding?encoded-text?=`. Text that is not an encoded
/// word is returned unchanged.
///
/// # Errors
///
/// Returns an error if the word is malformed or its payload cannot be decoded.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    if !text.starts_with("=?") || !text.ends_with("?=") || text.len() < 4 {
        return Ok(text.to_string());
    }

    let inner = &text[2..text.len() - 2];
    let parts: Vec<&str> = inner.split('?').collect();

    let [charset, encoding, encoded_text] = parts.as_slice() else {
        return Err(Error::InvalidEncoding(
            "Invalid RFC 2047 format".to_string(),
        ));
    };

    let bytes = match encoding.to_uppercase().as_str() {
        "B" => decode_base64(encoded_text)?,
        // Q encoding: quoted-printable with underscore for space
        "Q" => decode_quoted_printable(&encoded_text.replace('_', " ")),
        other => {
            return Err(Error::InvalidEncoding(format!("Unknown encoding: {other}")));
        }
    };

    decode_charset(bytes, Some(*charset))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_base64_decode_with_line_breaks() {
        let decoded = decode_base64("SGVsbG8s\r\nIFdvcmxkIQ==").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(decode_quoted_printable("Hello, World!"), b"Hello, World!");
        assert_eq!(
            String::from_utf8(decode_quoted_printable("H=C3=A9llo")).unwrap(),
            "Héllo"
        );
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        assert_eq!(decode_quoted_printable("Hello=\r\nWorld"), b"HelloWorld");
        assert_eq!(decode_quoted_printable("Hello= \nWorld"), b"HelloWorld");
    }

    #[test]
    fn test_quoted_printable_stray_equals() {
        assert_eq!(decode_quoted_printable("a = b =Z"), b"a = b =Z");
    }

    #[test]
    fn test_decode_charset_latin1() {
        let text = decode_charset(vec![0x43, 0x61, 0x66, 0xE9], Some("ISO-8859-1")).unwrap();
        assert_eq!(text, "Café");
    }

    #[test]
    fn test_decode_charset_invalid_utf8() {
        assert!(decode_charset(vec![0xFF, 0xFE], Some("utf-8")).is_err());
    }

    #[test]
    fn test_rfc2047_decode() {
        assert_eq!(decode_rfc2047("Hello").unwrap(), "Hello");
        assert_eq!(decode_rfc2047("=?utf-8?B?SMOpbGxv?=").unwrap(), "Héllo");
        assert_eq!(decode_rfc2047("=?utf-8?Q?H=C3=A9llo?=").unwrap(), "Héllo");
        assert_eq!(decode_rfc2047("=?iso-8859-1?Q?Caf=E9?=").unwrap(), "Café");
    }

    #[test]
    fn test_rfc2047_unknown_encoding() {
        assert!(decode_rfc2047("=?utf-8?X?abc?=").is_err());
    }

    proptest! {
        #[test]
        fn quoted_printable_never_panics(input in ".*") {
            let _ = decode_quoted_printable(&input);
        }

        #[test]
        fn quoted_printable_is_identity_without_equals(input in "[^=]*") {
            prop_assert_eq!(decode_quoted_printable(&input), input.as_bytes().to_vec());
        }
    }
}
