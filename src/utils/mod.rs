//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;
pub mod retry;

use encoding_rs::{Encoding, EUC_KR, UTF_8};
use regex::Regex;
use std::sync::OnceLock;
use tracing::warn;
use url::Url;

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

    re.replace_all(text.trim(), " ").to_string()
}

/// Append a path to a base URL with exactly one slash between them
pub fn join_base_path(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Resolve a possibly relative link against a page URL
///
/// Returns the input unchanged when either side cannot be parsed.
pub fn resolve_link(page_url: &str, href: &str) -> String {
    Url::parse(page_url)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Truncate text to a maximum number of characters
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

/// Decode a response body, honoring EUC-KR where the server declares it
///
/// The encoding is chosen from, in order:
/// 1. the charset of the Content-Type header
/// 2. a meta charset tag in the first kilobyte
/// 3. UTF-8 if the bytes are valid UTF-8, EUC-KR otherwise
///
/// Malformed sequences become U+FFFD; a single bad byte never costs the page.
pub fn decode_body(bytes: &[u8], content_type: &str) -> String {
    let encoding = charset_label(content_type)
        .or_else(|| meta_charset(&bytes[..bytes.len().min(1024)]))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or_else(|| {
            if std::str::from_utf8(bytes).is_ok() {
                UTF_8
            } else {
                EUC_KR
            }
        });

    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(
            encoding = actual.name(),
            len = bytes.len(),
            "Body contains malformed sequences; replaced them"
        );
    }

    text.into_owned()
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|label| !label.is_empty())
}

fn meta_charset(head: &[u8]) -> Option<String> {
    static META_CHARSET_RE: OnceLock<Regex> = OnceLock::new();

    let re = META_CHARSET_RE.get_or_init(|| {
        Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([A-Za-z0-9_\-]+)"#)
            .expect("Invalid regex pattern")
    });

    let head = String::from_utf8_lossy(head);
    re.captures(&head)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  hello   world  "), "hello world");
        assert_eq!(normalize_whitespace("공지\n\t사항"), "공지 사항");
    }

    #[test]
    fn test_join_base_path() {
        assert_eq!(
            join_base_path("https://sri.kostat.go.kr/", "/board.es?mid=1"),
            "https://sri.kostat.go.kr/board.es?mid=1"
        );
        assert_eq!(
            join_base_path("https://sri.kostat.go.kr", "board.es"),
            "https://sri.kostat.go.kr/board.es"
        );
        assert_eq!(
            join_base_path("https://sri.kostat.go.kr/", "//board.es"),
            "https://sri.kostat.go.kr/board.es"
        );
    }

    #[test]
    fn test_resolve_link() {
        assert_eq!(
            resolve_link("https://www.moef.go.kr/nw/nes/nesdta.do", "/nw/view.do?id=1"),
            "https://www.moef.go.kr/nw/view.do?id=1"
        );
        assert_eq!(
            resolve_link("https://www.moef.go.kr/", "https://other.go.kr/x"),
            "https://other.go.kr/x"
        );
        assert_eq!(resolve_link("not a url", "/x"), "/x");
    }

    #[test]
    fn test_truncate_text_korean() {
        assert_eq!(truncate_text("짧은 제목", 10), "짧은 제목");
        assert_eq!(truncate_text("아주 긴 공지사항 제목입니다", 8), "아주 긴 ...");
    }

    #[test]
    fn test_decode_utf8() {
        let text = "Hello, 안녕하세요";
        assert_eq!(
            decode_body(text.as_bytes(), "text/html; charset=utf-8"),
            text
        );
    }

    #[test]
    fn test_decode_euc_kr() {
        // "안녕하세요" in EUC-KR
        let bytes: &[u8] = &[0xbe, 0xc8, 0xb3, 0xe7, 0xc7, 0xcf, 0xbc, 0xbc, 0xbf, 0xe4];
        assert_eq!(
            decode_body(bytes, "text/html; charset=EUC-KR"),
            "안녕하세요"
        );
        assert_eq!(decode_body(bytes, "text/html"), "안녕하세요");
    }

    #[test]
    fn test_decode_replaces_malformed_bytes() {
        let mut bytes = "<p>공지</p>".as_bytes().to_vec();
        bytes.insert(3, 0xFF);
        let text = decode_body(&bytes, "text/html; charset=utf-8");
        assert_eq!(text, "<p>\u{FFFD}공지</p>");
    }

    #[test]
    fn test_decode_meta_charset_before_fallback() {
        // "공지" in EUC-KR after an EUC-KR meta tag
        let mut bytes = br#"<meta charset="euc-kr"><p>"#.to_vec();
        bytes.extend_from_slice(&[0xb0, 0xf8, 0xc1, 0xf6]);
        assert!(decode_body(&bytes, "text/html").ends_with("<p>공지"));
    }

    #[test]
    fn test_charset_label() {
        assert_eq!(
            charset_label("text/html; Charset=\"EUC-KR\"").as_deref(),
            Some("EUC-KR")
        );
        assert_eq!(charset_label("text/html"), None);
    }
}
