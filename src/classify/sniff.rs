//! Cheap content sniffers

use regex::bytes::Regex;
use std::sync::OnceLock;

/// UTF-8 encoded zero-width no-break space (the UTF-8 byte-order mark)
const ZERO_WIDTH_MARK: &[u8] = b"\xEF\xBB\xBF";

/// Number of characters of a body quoted in mismatch warnings
const PREVIEW_CHARS: usize = 100;

fn html_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:<!doctype|<html)").expect("valid regex"))
}

/// Strip leading and trailing ASCII whitespace
pub fn trim(bytes: &[u8]) -> &[u8] {
    bytes.trim_ascii()
}

/// Whether trimmed content starts like an HTML document.
///
/// Zero-width marks are removed first, so a UTF-8 byte-order mark in front
/// of `<!DOCTYPE` does not hide it.
pub fn looks_like_html(stripped: &[u8]) -> bool {
    if !stripped
        .windows(ZERO_WIDTH_MARK.len())
        .any(|w| w == ZERO_WIDTH_MARK)
    {
        return html_start().is_match(stripped);
    }

    let mut cleaned = Vec::with_capacity(stripped.len());
    let mut rest = stripped;
    while !rest.is_empty() {
        if rest.starts_with(ZERO_WIDTH_MARK) {
            rest = &rest[ZERO_WIDTH_MARK.len()..];
        } else {
            cleaned.push(rest[0]);
            rest = &rest[1..];
        }
    }
    html_start().is_match(&cleaned)
}

/// Whether trimmed content is a complete, strictly valid JSON document
pub fn looks_like_json(stripped: &[u8]) -> bool {
    serde_json::from_slice::<serde::de::IgnoredAny>(stripped).is_ok()
}

/// Leading slice of a body for log messages
pub fn preview(stripped: &[u8]) -> String {
    String::from_utf8_lossy(stripped)
        .chars()
        .take(PREVIEW_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctype_detected_case_insensitively() {
        assert!(looks_like_html(b"<!DOCTYPE html><html></html>"));
        assert!(looks_like_html(b"<!doctype html>"));
        assert!(looks_like_html(b"<HTML lang=\"en\">"));
    }

    #[test]
    fn html_must_be_at_start() {
        assert!(!looks_like_html(b"var s = '<html>';"));
        assert!(!looks_like_html(b"<div>fragment</div>"));
        assert!(!looks_like_html(b""));
    }

    #[test]
    fn zero_width_mark_ignored() {
        assert!(looks_like_html(b"\xEF\xBB\xBF<!DOCTYPE html>"));
    }

    #[test]
    fn trim_strips_ascii_whitespace() {
        assert_eq!(trim(b" \r\n\t<html>\n"), b"<html>");
        assert_eq!(trim(b"   "), b"");
    }

    #[test]
    fn json_probe() {
        assert!(looks_like_json(br#"{"a":1}"#));
        assert!(looks_like_json(b"[1, 2, 3]"));
        assert!(looks_like_json(b"42"));
        assert!(!looks_like_json(b"{a:1}"));
        assert!(!looks_like_json(b"var a = {\"a\":1};"));
        assert!(!looks_like_json(b""));
    }

    #[test]
    fn preview_truncates() {
        let long = "x".repeat(500);
        assert_eq!(preview(long.as_bytes()).len(), 100);
        assert_eq!(preview(b"short"), "short");
    }
}
