use std::time::Duration;
use thiserror::Error;

pub type IntentResult<T> = Result<T, IntentError>;

/// Errors produced by the intent transport layer.
///
/// These never reach SDK callers directly; the confirmation orchestrator
/// translates them into a terminal outcome before completing.
#[derive(Debug, Clone, Error)]
pub enum IntentError {
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limit exceeded")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: status={status}, message={message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
        retryable: bool,
    },

    #[error("Invalid API response: {message}")]
    Decode { message: String },

    #[error("Invalid client secret: {message}")]
    InvalidClientSecret { message: String },
}

impl IntentError {
    pub fn is_retryable(&self) -> bool {
        match self {
            IntentError::Network { .. } => true,
            IntentError::Timeout => true,
            IntentError::RateLimited { .. } => true,
            IntentError::Api { retryable, .. } => *retryable,
            IntentError::Decode { .. } => false,
            IntentError::InvalidClientSecret { .. } => false,
        }
    }

    /// Server-suggested delay before the next attempt, if one was provided.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            IntentError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
