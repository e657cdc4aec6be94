//! Error types for the scheduler module

use std::fmt;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug)]
pub enum SchedulerError {
    /// Refresh time is not a valid "HH:MM" local time
    InvalidTime {
        value: String,
    },

    /// Trigger configuration error
    TriggerConfigError {
        field: String,
        reason: String,
    },

    /// Trigger execution error
    TriggerExecutionFailed {
        reason: String,
    },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTime { value } => {
                write!(f, "Invalid refresh time '{}'. Expected HH:MM", value)
            }
            Self::TriggerConfigError { field, reason } => {
                write!(f, "Trigger config error in '{}': {}", field, reason)
            }
            Self::TriggerExecutionFailed { reason } => {
                write!(f, "Trigger execution failed: {}", reason)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Create an invalid time error
    pub fn invalid_time(value: impl Into<String>) -> Self {
        Self::InvalidTime {
            value: value.into(),
        }
    }

    /// Create a trigger config error
    pub fn trigger_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TriggerConfigError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a trigger execution error
    pub fn execution_failed(reason: impl Into<String>) -> Self {
        Self::TriggerExecutionFailed {
            reason: reason.into(),
        }
    }

    /// Get Korean description for the error
    pub fn korean_desc(&self) -> String {
        match self {
            Self::InvalidTime { value } => {
                format!("잘못된 갱신 시각: '{}' (HH:MM 형식이어야 함)", value)
            }
            Self::TriggerConfigError { field, reason } => {
                format!("트리거 설정 오류 ({}): {}", field, reason)
            }
            Self::TriggerExecutionFailed { reason } => {
                format!("트리거 실행 실패: {}", reason)
            }
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::TriggerExecutionFailed { .. })
    }
}
