use crate::challenge::ChallengeTransaction;
use crate::confirm::handlers::{ActionHandler, HandlerOutcome};
use crate::confirm::params::ActionParams;
use crate::confirm::presenter::ChallengeDisposition;
use crate::confirm::retry::with_backoff;
use crate::error::{ConfirmError, ConfirmResult};
use crate::intents::types::{ActionGroup, NextAction, NextActionKind};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Drives the 3DS2 challenge protocol end to end: validate parameters,
/// present the challenge UI, submit the result, interpret the outcome.
pub struct ChallengeHandler;

#[async_trait]
impl ActionHandler for ChallengeHandler {
    fn name(&self) -> &'static str {
        "challenge"
    }

    fn can_handle(&self, kind: NextActionKind) -> bool {
        kind.group() == Some(ActionGroup::Challenge)
    }

    async fn execute(&self, params: &mut ActionParams) -> ConfirmResult<HandlerOutcome> {
        if !params.context.can_present() {
            return Err(ConfirmError::NoPresentationContext);
        }

        let challenge_params = match params.intent.next_action.as_ref() {
            Some(NextAction::ChallengeRequired { params }) => params.clone(),
            _ => {
                return Err(ConfirmError::MalformedAction {
                    message: "challenge action is missing its parameters".to_string(),
                })
            }
        };

        let mut transaction =
            ChallengeTransaction::new(challenge_params, params.customization.clone())?;
        let request = transaction.authenticate()?;
        info!(
            intent_id = %params.intent.id,
            sdk_transaction_id = %transaction.id(),
            "presenting 3DS2 challenge"
        );

        transaction.mark_presented()?;
        let disposition = params.context.perform_challenge(&request).await;
        match disposition {
            ChallengeDisposition::Completed => {
                transaction.mark_submitted()?;
                let client = Arc::clone(&params.client);
                let intent_id = params.intent.id.clone();
                let submitted = with_backoff(&params.retry, "complete_challenge", || {
                    client.complete_challenge(&intent_id)
                })
                .await;

                match submitted {
                    Ok(()) => {
                        transaction.succeed()?;
                        Ok(HandlerOutcome::Completed)
                    }
                    Err(e) => {
                        // The completion call could not be delivered even with
                        // retries. The challenge itself may still have gone
                        // through server-side, so the intent is the authority.
                        transaction.fail();
                        warn!(
                            intent_id = %intent_id,
                            error = %e,
                            "challenge completion undeliverable, falling back to intent retrieval"
                        );
                        let authoritative = params
                            .client
                            .retrieve_intent(&params.intent.client_secret)
                            .await?;
                        Ok(HandlerOutcome::Settled(authoritative))
                    }
                }
            }
            ChallengeDisposition::Canceled => {
                transaction.fail();
                Ok(HandlerOutcome::Canceled)
            }
            ChallengeDisposition::TimedOut => {
                transaction.fail();
                Err(ConfirmError::ChallengeTimedOut)
            }
            ChallengeDisposition::ProtocolError { message } => {
                transaction.fail();
                Err(ConfirmError::MalformedAction { message })
            }
        }
    }
}
