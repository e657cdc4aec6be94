//! HTTP page fetcher with retry and EUC-KR decoding
//!
//! [`PageFetcher`] sends one listing request per attempt and folds every
//! failure mode into a [`FetchOutcome`]; callers never see an `Err`. Retry
//! behaviour comes from the board's [`RetryPolicy`], so "five tries, two
//! seconds apart" and "forever, five seconds apart" share one code path.

use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, Response};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::models::{HttpMethod, PageRequest};
use crate::utils::decode_body;
use crate::utils::error::{CrawlerError, FetchError};
use crate::utils::retry::{with_retry, RetryPolicy};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of fetching one page, after retries
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx response with a decoded body
    Success { status: u16, body: String },

    /// Connection error or timeout on the last attempt
    TransientFailure { cause: FetchError },

    /// Non-2xx status on the last attempt
    HttpError { status: u16 },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Body of a successful fetch
    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Success { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<FetchError> for FetchOutcome {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Status(status) => Self::HttpError { status },
            cause => Self::TransientFailure { cause },
        }
    }
}

/// Listing page fetcher
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// User agent for boards that don't set their own
    user_agent: String,
}

impl PageFetcher {
    /// Create a fetcher with the default timeout
    ///
    /// # Errors
    ///
    /// Returns `CrawlerError::Client` if the HTTP client cannot be created
    pub fn new() -> Result<Self, CrawlerError> {
        Self::with_config(DEFAULT_TIMEOUT, "")
    }

    /// Create a fetcher with a custom timeout and fallback user agent
    ///
    /// # Errors
    ///
    /// Returns `CrawlerError::Client` if the HTTP client cannot be created
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, CrawlerError> {
        let client = Client::builder().timeout(timeout).gzip(true).build()?;

        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
        })
    }

    /// Fallback user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Fetch one page, retrying per `policy`
    ///
    /// Every non-2xx status is retried the same way as a transport error.
    /// When attempts run out, or `cancel` fires between attempts, the last
    /// failure is returned as the outcome.
    #[instrument(skip_all, fields(source = %request.source, page = request.page))]
    pub async fn fetch(
        &self,
        request: &PageRequest,
        headers: &HeaderMap,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        let result = with_retry(policy, cancel, |attempt| async move {
            debug!(attempt, method = %request.method, url = %request.url, "Sending request");
            self.attempt(request, headers).await
        })
        .await;

        match result {
            Ok((status, body)) => FetchOutcome::Success { status, body },
            Err(err) => err.into(),
        }
    }

    /// One HTTP round trip
    async fn attempt(
        &self,
        request: &PageRequest,
        headers: &HeaderMap,
    ) -> Result<(u16, String), FetchError> {
        let builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url).query(&request.params),
            HttpMethod::Post => self.client.post(&request.url).form(&request.params),
        };

        let response = builder
            .headers(headers.clone())
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = Self::decode_response(response).await?;
        Ok((status.as_u16(), body))
    }

    /// Decode response body handling both UTF-8 and EUC-KR encodings
    async fn decode_response(response: Response) -> Result<String, FetchError> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let bytes = response.bytes().await.map_err(classify)?;

        Ok(decode_body(&bytes, &content_type))
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_builder() {
        FetchError::InvalidUrl(err.to_string())
    } else {
        FetchError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_status_error() {
        let outcome: FetchOutcome = FetchError::Status(503).into();
        assert!(matches!(outcome, FetchOutcome::HttpError { status: 503 }));
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_outcome_from_timeout() {
        let outcome: FetchOutcome = FetchError::Timeout.into();
        assert!(matches!(
            outcome,
            FetchOutcome::TransientFailure {
                cause: FetchError::Timeout
            }
        ));
        assert!(outcome.into_body().is_none());
    }

    #[test]
    fn test_success_body() {
        let outcome = FetchOutcome::Success {
            status: 200,
            body: "<html></html>".to_string(),
        };
        assert!(outcome.is_success());
        assert_eq!(outcome.into_body().as_deref(), Some("<html></html>"));
    }

    #[test]
    fn test_fetcher_creation() {
        let fetcher = PageFetcher::with_config(Duration::from_secs(3), "gongji-test").unwrap();
        assert_eq!(fetcher.user_agent(), "gongji-test");
    }
}
