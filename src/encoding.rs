//! Character encoding detection and transcoding.
//!
//! Untrusted documents arrive as bytes in whatever encoding the author
//! declared (or failed to declare). This module sniffs the charset from
//! meta tags and converts to UTF-8 before the sanitizer runs.

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;

/// How many leading bytes are examined for a charset declaration.
const SNIFF_WINDOW: usize = 1024;

/// Match `<meta charset="...">`.
#[allow(clippy::expect_used)]
static META_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s>]+)"#).expect("META_CHARSET_RE regex")
});

/// Match `<meta http-equiv="Content-Type" content="...; charset=...">`.
#[allow(clippy::expect_used)]
static HTTP_EQUIV_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)<meta[^>]+http-equiv\s*=\s*["']?content-type["']?[^>]+content\s*=\s*["']?[^"'>]*;\s*charset\s*=\s*([^"'\s>]+)"#,
    )
    .expect("HTTP_EQUIV_CHARSET_RE regex")
});

/// Detect the character encoding of an HTML byte stream.
///
/// Checks `<meta charset>` first, then the http-equiv form, and falls back
/// to UTF-8. Only the first kilobyte is examined.
#[must_use]
pub fn detect_encoding(html: &[u8]) -> &'static Encoding {
    let head = &html[..html.len().min(SNIFF_WINDOW)];
    let head_str = String::from_utf8_lossy(head);

    for pattern in [&META_CHARSET_RE, &HTTP_EQUIV_CHARSET_RE] {
        if let Some(label) = pattern.captures(&head_str).and_then(|c| c.get(1)) {
            if let Some(encoding) = Encoding::for_label(label.as_str().as_bytes()) {
                return encoding;
            }
        }
    }

    UTF_8
}

/// Transcode HTML bytes to a UTF-8 string, lossily: undecodable sequences
/// become replacement characters instead of failing.
///
/// # Examples
///
/// ```
/// use scour::encoding::transcode_to_utf8;
///
/// let html = b"<meta charset=\"ISO-8859-1\"><p>Caf\xE9</p>";
/// assert!(transcode_to_utf8(html).contains("Caf\u{e9}"));
/// ```
#[must_use]
pub fn transcode_to_utf8(html: &[u8]) -> String {
    let encoding = detect_encoding(html);
    if encoding == UTF_8 {
        return String::from_utf8_lossy(html).into_owned();
    }
    let (decoded, _, _) = encoding.decode(html);
    decoded.into_owned()
}
