//! Unified error handling for the gongji crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`GongjiErrorTrait`] - Common interface of the errors that abort a command
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping crawler and scheduler errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use gongji::error::{Error, GongjiErrorTrait};
//!
//! fn handle_error(err: Error) {
//!     if err.is_recoverable() {
//!         println!("Retrying: {}", err.korean_desc());
//!     } else {
//!         eprintln!("Fatal error: {}", err);
//!     }
//! }
//! ```

use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::scheduler::error::SchedulerError;
pub use crate::utils::error::{CrawlerError, FetchError, ParseError};

/// Common trait for all gongji error types
pub trait GongjiErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Korean description for user-facing messages
    fn korean_desc(&self) -> String;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
///
/// Per-page fetch and parse failures are absorbed into crawl summaries, so
/// only setup errors reach this classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// HTTP client setup errors
    Network,
    /// Board definition and validation errors
    Config,
    /// Refresh trigger errors
    Scheduler,
}

impl ErrorCategory {
    /// Korean description for the category
    pub fn korean_desc(&self) -> &'static str {
        match self {
            Self::Network => "네트워크 오류",
            Self::Config => "설정 오류",
            Self::Scheduler => "스케줄러 오류",
        }
    }
}

impl GongjiErrorTrait for CrawlerError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn korean_desc(&self) -> String {
        match self {
            Self::InvalidConfig { source_id, reason } => {
                format!("{} 게시판 설정 오류: {reason}", source_id.korean_name())
            }
            Self::Client(e) => format!("HTTP 클라이언트 생성 실패: {e}"),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig { .. } => ErrorCategory::Config,
            Self::Client(_) => ErrorCategory::Network,
        }
    }
}

/// Unified error type for the gongji crate
///
/// Wraps the errors that can abort a command: crawler setup and the refresh
/// trigger.
#[derive(Error, Debug)]
pub enum Error {
    /// Crawler setup errors
    #[error("Crawler error: {0}")]
    Crawler(#[from] CrawlerError),

    /// Scheduler and timing errors
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

impl GongjiErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Crawler(e) => e.is_recoverable(),
            Self::Scheduler(e) => e.is_recoverable(),
        }
    }

    fn korean_desc(&self) -> String {
        match self {
            Self::Crawler(e) => e.korean_desc(),
            Self::Scheduler(e) => e.korean_desc(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Crawler(e) => e.category(),
            Self::Scheduler(_) => ErrorCategory::Scheduler,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceId;

    #[test]
    fn test_error_category() {
        let config_err = Error::Crawler(CrawlerError::invalid_config(SourceId::Pps, "bad"));
        assert_eq!(config_err.category(), ErrorCategory::Config);

        let scheduler_err = Error::Scheduler(SchedulerError::invalid_time("25:00"));
        assert_eq!(scheduler_err.category(), ErrorCategory::Scheduler);
    }

    #[test]
    fn test_is_recoverable() {
        assert!(!Error::Crawler(CrawlerError::invalid_config(SourceId::Nts, "x")).is_recoverable());
        assert!(!Error::Scheduler(SchedulerError::invalid_time("x")).is_recoverable());
        assert!(
            Error::Scheduler(SchedulerError::execution_failed("no receivers")).is_recoverable()
        );
    }

    #[test]
    fn test_korean_desc() {
        let err = Error::Crawler(CrawlerError::invalid_config(SourceId::Kostat, "empty range"));
        assert_eq!(err.korean_desc(), "통계청 게시판 설정 오류: empty range");
    }

    #[test]
    fn test_error_conversion() {
        let crawler_err = CrawlerError::invalid_config(SourceId::Moef, "x");
        let unified: Error = crawler_err.into();
        assert!(matches!(unified, Error::Crawler(_)));

        let unified: Error = SchedulerError::invalid_time("x").into();
        assert!(matches!(unified, Error::Scheduler(_)));
    }

    #[test]
    fn test_error_category_korean() {
        assert_eq!(ErrorCategory::Network.korean_desc(), "네트워크 오류");
        assert_eq!(ErrorCategory::Scheduler.korean_desc(), "스케줄러 오류");
    }
}
