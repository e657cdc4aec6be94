//! Error types for the gongji crawler
//!
//! This module defines the error types used by the crawling core.

use thiserror::Error;

use crate::models::SourceId;

/// Errors that can occur during a single HTTP attempt
///
/// These never escape the fetcher: they are folded into a
/// [`FetchOutcome`](crate::crawler::fetcher::FetchOutcome) and retried.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error (connection refused, reset, TLS, ...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx status code
    #[error("Server returned status {0}")]
    Status(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors that can occur while extracting records from a listing page
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// An element of the container path is missing from the page
    #[error("Structural gap: no element matches '{step}'")]
    StructuralGap { step: String },

    /// A selector in an extraction rule could not be parsed
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// A link pattern or template in a rule is unusable
    #[error("Invalid link pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl ParseError {
    /// Whether this error only means "nothing to harvest on this page"
    pub fn is_structural_gap(&self) -> bool {
        matches!(self, Self::StructuralGap { .. })
    }
}

/// General crawler errors
///
/// Only configuration problems surface here; per-page conditions are absorbed
/// into the crawl summary.
#[derive(Error, Debug)]
pub enum CrawlerError {
    /// Source configuration is structurally invalid
    #[error("Invalid configuration for {source_id}: {reason}")]
    InvalidConfig { source_id: SourceId, reason: String },

    /// HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl CrawlerError {
    /// Create a configuration error for a source
    pub fn invalid_config(source_id: SourceId, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            source_id,
            reason: reason.into(),
        }
    }
}

impl From<(SourceId, ParseError)> for CrawlerError {
    fn from((source, err): (SourceId, ParseError)) -> Self {
        Self::invalid_config(source, err.to_string())
    }
}
