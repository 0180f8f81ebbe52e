//! Error taxonomy for the confirmation core.
//!
//! Transport-level failures live in [`crate::intents::error`]; everything the
//! orchestrator and handlers can fail with is folded into [`ConfirmError`].
//! Callers never see these raw: the orchestrator translates them into a
//! terminal [`ConfirmOutcome`](crate::confirm::orchestrator::ConfirmOutcome)
//! with the error attached to the failed case.

use crate::challenge::ChallengeError;
use crate::intents::error::IntentError;
use crate::intents::types::{IntentStatus, NextActionKind};
use thiserror::Error;

pub type ConfirmResult<T> = Result<T, ConfirmError>;

#[derive(Debug, Clone, Error)]
pub enum ConfirmError {
    /// The host cannot present UI; required for redirects and challenges.
    #[error("No presentation context is available")]
    NoPresentationContext,

    #[error("Invalid client secret: {message}")]
    InvalidClientSecret { message: String },

    /// The server asked for an action this SDK version cannot perform
    /// client-side.
    #[error("Unsupported next action: {kind:?}")]
    UnsupportedAction { kind: NextActionKind },

    #[error("Malformed next action: {message}")]
    MalformedAction { message: String },

    #[error("Could not open redirect target: {url}")]
    RedirectFailed { url: String },

    /// The server moved the intent back to `requires_payment_method`; the
    /// attempted method was declined or authentication failed.
    #[error("Payment authentication failed; a new payment method is required")]
    AuthenticationFailed,

    #[error("Challenge timed out")]
    ChallengeTimedOut,

    #[error(transparent)]
    Challenge(#[from] ChallengeError),

    #[error(transparent)]
    Transport(#[from] IntentError),

    #[error("Intent is in an unexpected state: {status}")]
    UnexpectedState { status: IntentStatus },
}

impl ConfirmError {
    /// Only transport errors are ever retryable; configuration and protocol
    /// errors fail immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            ConfirmError::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_errors_are_retryable() {
        assert!(ConfirmError::Transport(IntentError::Timeout).is_retryable());
        assert!(!ConfirmError::NoPresentationContext.is_retryable());
        assert!(!ConfirmError::UnsupportedAction {
            kind: NextActionKind::Unknown
        }
        .is_retryable());
        assert!(!ConfirmError::AuthenticationFailed.is_retryable());
    }

    #[test]
    fn transport_errors_convert_transparently() {
        let err: ConfirmError = IntentError::RateLimited { retry_after: None }.into();
        assert!(matches!(
            err,
            ConfirmError::Transport(IntentError::RateLimited { .. })
        ));
    }
}
