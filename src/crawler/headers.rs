use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT,
};

/// Minimal user agent some boards expect
pub const BASIC_USER_AGENT: &str = "Mozilla/5.0";

/// Desktop Chrome user agent
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

/// Build the header map sent with every request to a board
///
/// Starts from browser-like defaults (`Accept`, `Accept-Language`, and
/// `default_user_agent` when the board sets none), then applies the board's
/// own headers in order, later entries replacing earlier ones.
///
/// # Arguments
///
/// * `board_headers` - Header name/value pairs from the board configuration
/// * `default_user_agent` - User agent used when the board does not set one
///
/// # Errors
///
/// Returns a description of the first header whose name or value is not
/// valid HTTP.
///
/// # Examples
///
/// ```
/// use gongji::crawler::headers::build_board_headers;
///
/// let headers = build_board_headers(
///     &[("Referer".to_string(), "https://www.nts.go.kr/".to_string())],
///     "Mozilla/5.0",
/// )
/// .unwrap();
/// assert_eq!(headers["referer"], "https://www.nts.go.kr/");
/// assert_eq!(headers["user-agent"], "Mozilla/5.0");
/// ```
pub fn build_board_headers(
    board_headers: &[(String, String)],
    default_user_agent: &str,
) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::new();

    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"),
    );
    if !default_user_agent.is_empty() {
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(default_user_agent)
                .map_err(|e| format!("invalid user agent '{default_user_agent}': {e}"))?,
        );
    }

    for (name, value) in board_headers {
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|e| format!("invalid header name '{name}': {e}"))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|e| format!("invalid value for header '{name}': {e}"))?;
        headers.insert(name, value);
    }

    Ok(headers)
}

/// Board header set: a user agent plus an optional referer
pub fn board_header_pairs(user_agent: &str, referer: Option<&str>) -> Vec<(String, String)> {
    let mut pairs = vec![(USER_AGENT.as_str().to_string(), user_agent.to_string())];
    if let Some(referer) = referer {
        pairs.push((REFERER.as_str().to_string(), referer.to_string()));
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_headers_override_default_agent() {
        let pairs = board_header_pairs(CHROME_USER_AGENT, Some("https://www.customs.go.kr/"));
        let headers = build_board_headers(&pairs, BASIC_USER_AGENT).unwrap();

        assert_eq!(headers[USER_AGENT], CHROME_USER_AGENT);
        assert_eq!(headers[REFERER], "https://www.customs.go.kr/");
        assert!(headers.contains_key(ACCEPT));
        assert!(headers[ACCEPT_LANGUAGE].to_str().unwrap().starts_with("ko-KR"));
    }

    #[test]
    fn test_default_agent_when_board_sets_none() {
        let headers = build_board_headers(&[], "gongji/0.1").unwrap();
        assert_eq!(headers[USER_AGENT], "gongji/0.1");
        assert!(!headers.contains_key(REFERER));
    }

    #[test]
    fn test_invalid_header_rejected() {
        let pairs = vec![("Bad Header".to_string(), "x".to_string())];
        assert!(build_board_headers(&pairs, "").is_err());

        let pairs = vec![("X-Test".to_string(), "line\nbreak".to_string())];
        assert!(build_board_headers(&pairs, "").is_err());
    }
}
