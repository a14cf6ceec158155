//! MIME encoding utilities.
//!
//! Supports Base64 (with transfer-encoding line wrapping),
//! Quoted-Printable, and RFC 2047 header encoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum line length for encoded content.
const MAX_LINE_LENGTH: usize = 76;

/// Encodes data as Base64 on a single line.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 wrapped at 76 characters with CRLF line
/// endings, as required for transfer-encoded bodies.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2);
    let bytes = encoded.as_bytes();
    for chunk in bytes.chunks(MAX_LINE_LENGTH) {
        // Base64 output is pure ASCII.
        result.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        result.push_str("\r\n");
    }
    result
}

/// Encodes text using Quoted-Printable encoding (RFC 2045).
///
/// Encodes bytes that are not printable ASCII or would interfere
/// with email transmission.
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut result = String::new();
    let mut line_length = 0;

    for byte in text.as_bytes() {
        // Check if we need soft line break
        if line_length >= MAX_LINE_LENGTH - 3 {
            result.push_str("=\r\n");
            line_length = 0;
        }

        match byte {
            // Printable ASCII except '=' and space (handle separately)
            b'!'..=b'<' | b'>'..=b'~' => {
                result.push(*byte as char);
                line_length += 1;
            }
            // Space needs special handling (encode at line end)
            b' ' => {
                if line_length >= MAX_LINE_LENGTH - 1 {
                    result.push_str("=20");
                    line_length += 3;
                } else {
                    result.push(' ');
                    line_length += 1;
                }
            }
            // Everything else gets encoded
            _ => {
                result.push('=');
                let _ = write!(result, "{byte:02X}");
                line_length += 3;
            }
        }
    }

    result
}

/// Decodes Quoted-Printable text (RFC 2045).
///
/// Returns `None` on invalid escape sequences.
#[must_use]
pub fn decode_quoted_printable(text: &str) -> Option<String> {
    let mut result = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '=' {
            // Soft line break
            if chars.peek() == Some(&'\r') {
                chars.next();
                if chars.peek() == Some(&'\n') {
                    chars.next();
                    continue;
                }
            } else if chars.peek() == Some(&'\n') {
                chars.next();
                continue;
            }

            // Hex encoded byte
            let hex: String = chars.by_ref().take(2).collect();
            if hex.len() != 2 {
                return None;
            }
            result.push(u8::from_str_radix(&hex, 16).ok()?);
        } else {
            result.push(ch as u8);
        }
    }

    String::from_utf8(result).ok()
}

/// Encodes a header value using RFC 2047 encoding when needed.
///
/// ASCII values pass through unchanged; anything else becomes
/// `=?UTF-8?B?...?=`.
#[must_use]
pub fn encode_header_value(text: &str) -> String {
    if text.is_ascii() {
        text.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(text.as_bytes()))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn base64_known_value() {
        assert_eq!(encode_base64(b"hello"), "aGVsbG8=");
    }

    #[test]
    fn base64_wrapped_lines_stay_under_limit() {
        let data = vec![0xABu8; 300];
        let wrapped = encode_base64_wrapped(&data);
        for line in wrapped.split("\r\n").filter(|l| !l.is_empty()) {
            assert!(line.len() <= MAX_LINE_LENGTH);
        }
        // Joining the lines back gives the unwrapped encoding.
        let joined: String = wrapped.split("\r\n").collect();
        assert_eq!(joined, encode_base64(&data));
    }

    #[test]
    fn quoted_printable_plain_ascii_passthrough() {
        assert_eq!(encode_quoted_printable("hello world"), "hello world");
    }

    #[test]
    fn quoted_printable_escapes_equals_and_non_ascii() {
        assert_eq!(encode_quoted_printable("a=b"), "a=3Db");
        assert_eq!(encode_quoted_printable("héllo"), "h=C3=A9llo");
    }

    #[test]
    fn quoted_printable_soft_breaks_long_lines() {
        let long = "x".repeat(200);
        let encoded = encode_quoted_printable(&long);
        for line in encoded.split("\r\n") {
            assert!(line.len() <= MAX_LINE_LENGTH);
        }
        assert_eq!(decode_quoted_printable(&encoded).unwrap(), long);
    }

    #[test]
    fn header_value_ascii_passthrough() {
        assert_eq!(encode_header_value("Invoice #42"), "Invoice #42");
    }

    #[test]
    fn header_value_encodes_utf8() {
        assert_eq!(
            encode_header_value("Grüße"),
            format!("=?UTF-8?B?{}?=", encode_base64("Grüße".as_bytes()))
        );
    }

    proptest! {
        #[test]
        fn quoted_printable_round_trip(text in "\\PC{0,200}") {
            let encoded = encode_quoted_printable(&text);
            prop_assert_eq!(decode_quoted_printable(&encoded), Some(text));
        }
    }
}
