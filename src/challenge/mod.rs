//! 3-D Secure 2 challenge transaction state machine.
//!
//! A [`ChallengeTransaction`] tracks one interactive challenge end to end:
//! parameter validation, device authentication, challenge presentation and
//! submission, and the terminal result. Transitions are validated the same
//! way the intent lifecycle is; an out-of-order transition is a protocol bug.

use crate::intents::types::ChallengeParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub type ChallengeResult<T> = Result<T, ChallengeError>;

#[derive(Debug, Clone, Error)]
pub enum ChallengeError {
    #[error("Invalid challenge parameters: {message}")]
    InvalidParams { message: String },

    #[error("Invalid challenge transition from {from} to {to}")]
    InvalidTransition {
        from: ChallengeState,
        to: ChallengeState,
    },

    #[error("Challenge protocol error: {message}")]
    Protocol { message: String },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeState {
    /// Transaction built, parameters validated.
    Created,
    /// Device parameters exchanged with the directory server.
    Authenticated,
    /// Challenge UI handed to the host.
    ChallengePresented,
    /// Challenge response submitted to the ACS.
    ChallengeSubmitted,
    Succeeded,
    Failed,
}

impl std::fmt::Display for ChallengeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChallengeState::Created => "created",
            ChallengeState::Authenticated => "authenticated",
            ChallengeState::ChallengePresented => "challenge_presented",
            ChallengeState::ChallengeSubmitted => "challenge_submitted",
            ChallengeState::Succeeded => "succeeded",
            ChallengeState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

impl ChallengeState {
    pub fn valid_transitions(&self) -> &'static [ChallengeState] {
        match self {
            ChallengeState::Created => {
                &[ChallengeState::Authenticated, ChallengeState::Failed]
            }
            ChallengeState::Authenticated => {
                &[ChallengeState::ChallengePresented, ChallengeState::Failed]
            }
            ChallengeState::ChallengePresented => {
                &[ChallengeState::ChallengeSubmitted, ChallengeState::Failed]
            }
            ChallengeState::ChallengeSubmitted => {
                &[ChallengeState::Succeeded, ChallengeState::Failed]
            }
            ChallengeState::Succeeded => &[],
            ChallengeState::Failed => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ChallengeState::Succeeded | ChallengeState::Failed)
    }
}

/// Host-tunable challenge settings, passed through opaquely to the
/// presentation layer.
#[derive(Debug, Clone)]
pub struct ChallengeCustomization {
    /// How long the challenge UI may stay open before the flow is abandoned.
    pub ui_timeout: Duration,
    pub merchant_display_name: Option<String>,
}

impl Default for ChallengeCustomization {
    fn default() -> Self {
        Self {
            ui_timeout: Duration::from_secs(300),
            merchant_display_name: None,
        }
    }
}

/// Everything the host needs to drive the challenge UI.
#[derive(Debug, Clone)]
pub struct ChallengeRequest {
    pub sdk_transaction_id: Uuid,
    pub directory_server_id: String,
    pub server_transaction_id: String,
    pub acs_url: String,
    pub message_version: String,
    pub customization: ChallengeCustomization,
}

pub struct ChallengeTransaction {
    id: Uuid,
    params: ChallengeParams,
    customization: ChallengeCustomization,
    state: ChallengeState,
}

impl ChallengeTransaction {
    /// Validates the directory-server parameters and builds a transaction in
    /// the `Created` state.
    pub fn new(
        params: ChallengeParams,
        customization: ChallengeCustomization,
    ) -> ChallengeResult<Self> {
        validate_params(&params)?;
        Ok(Self {
            id: Uuid::new_v4(),
            params,
            customization,
            state: ChallengeState::Created,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ChallengeState {
        self.state
    }

    /// Exchanges device parameters and produces the request the host UI
    /// needs. `Created` → `Authenticated`.
    pub fn authenticate(&mut self) -> ChallengeResult<ChallengeRequest> {
        self.transition(ChallengeState::Authenticated)?;
        Ok(ChallengeRequest {
            sdk_transaction_id: self.id,
            directory_server_id: self.params.directory_server_id.clone(),
            server_transaction_id: self.params.server_transaction_id.clone(),
            acs_url: self.params.acs_url.clone(),
            message_version: self
                .params
                .message_version
                .clone()
                .unwrap_or_else(|| "2.2.0".to_string()),
            customization: self.customization.clone(),
        })
    }

    /// `Authenticated` → `ChallengePresented`.
    pub fn mark_presented(&mut self) -> ChallengeResult<()> {
        self.transition(ChallengeState::ChallengePresented)
    }

    /// `ChallengePresented` → `ChallengeSubmitted`.
    pub fn mark_submitted(&mut self) -> ChallengeResult<()> {
        self.transition(ChallengeState::ChallengeSubmitted)
    }

    /// `ChallengeSubmitted` → `Succeeded`.
    pub fn succeed(&mut self) -> ChallengeResult<()> {
        self.transition(ChallengeState::Succeeded)
    }

    /// Moves to `Failed` from any non-terminal state. A no-op when the
    /// transaction already reached a terminal state.
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = ChallengeState::Failed;
        }
    }

    fn transition(&mut self, target: ChallengeState) -> ChallengeResult<()> {
        if self.state.valid_transitions().contains(&target) {
            self.state = target;
            Ok(())
        } else {
            Err(ChallengeError::InvalidTransition {
                from: self.state,
                to: target,
            })
        }
    }
}

fn validate_params(params: &ChallengeParams) -> ChallengeResult<()> {
    if params.directory_server_id.trim().is_empty() {
        return Err(ChallengeError::InvalidParams {
            message: "directory_server_id is required".to_string(),
        });
    }
    if params.server_transaction_id.trim().is_empty() {
        return Err(ChallengeError::InvalidParams {
            message: "server_transaction_id is required".to_string(),
        });
    }
    if params.acs_url.trim().is_empty() {
        return Err(ChallengeError::InvalidParams {
            message: "acs_url is required".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ChallengeParams {
        ChallengeParams {
            directory_server_id: "A000000003".to_string(),
            server_transaction_id: "c2d47d77-9377-4b16-9e0a-8f2c45a6f5f4".to_string(),
            acs_url: "https://acs.example.com/challenge".to_string(),
            directory_server_cert: None,
            message_version: None,
        }
    }

    #[test]
    fn happy_path_walks_every_state() {
        let mut tx = ChallengeTransaction::new(params(), ChallengeCustomization::default())
            .expect("params are valid");
        assert_eq!(tx.state(), ChallengeState::Created);

        let request = tx.authenticate().expect("created -> authenticated");
        assert_eq!(request.message_version, "2.2.0");
        assert_eq!(tx.state(), ChallengeState::Authenticated);

        tx.mark_presented().expect("authenticated -> presented");
        tx.mark_submitted().expect("presented -> submitted");
        tx.succeed().expect("submitted -> succeeded");
        assert!(tx.state().is_terminal());
    }

    #[test]
    fn out_of_order_transitions_are_rejected() {
        let mut tx = ChallengeTransaction::new(params(), ChallengeCustomization::default())
            .expect("params are valid");
        assert!(tx.mark_submitted().is_err());
        assert!(tx.succeed().is_err());

        tx.authenticate().expect("created -> authenticated");
        assert!(tx.succeed().is_err());
    }

    #[test]
    fn fail_is_reachable_from_any_live_state_and_sticky() {
        let mut tx = ChallengeTransaction::new(params(), ChallengeCustomization::default())
            .expect("params are valid");
        tx.authenticate().expect("created -> authenticated");
        tx.fail();
        assert_eq!(tx.state(), ChallengeState::Failed);

        // Terminal states never transition again.
        tx.fail();
        assert_eq!(tx.state(), ChallengeState::Failed);
        assert!(tx.mark_presented().is_err());
    }

    #[test]
    fn missing_parameters_are_rejected_up_front() {
        let mut bad = params();
        bad.acs_url = String::new();
        assert!(matches!(
            ChallengeTransaction::new(bad, ChallengeCustomization::default()),
            Err(ChallengeError::InvalidParams { .. })
        ));

        let mut bad = params();
        bad.directory_server_id = "  ".to_string();
        assert!(ChallengeTransaction::new(bad, ChallengeCustomization::default()).is_err());
    }
}
