use crate::config::ConfirmConfig;
use crate::confirm::handlers::HandlerOutcome;
use crate::confirm::params::ActionParams;
use crate::confirm::polling::poll_intent_status;
use crate::confirm::presenter::AuthenticationContext;
use crate::confirm::registry::HandlerRegistry;
use crate::confirm::retry::with_backoff;
use crate::error::ConfirmError;
use crate::intents::client::IntentClient;
use crate::intents::types::{
    parse_client_secret, ConfirmIntentRequest, Intent, IntentStatus, NextActionKind,
    PaymentMethodType,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Terminal result of one confirmation flow.
///
/// Exactly one outcome is produced per flow: it is the return value of the
/// orchestrator entry points, and dropping the in-flight future is the only
/// way to cancel a flow from outside.
#[derive(Debug)]
pub enum ConfirmOutcome {
    Succeeded(Intent),
    /// The user backed out, or the flow could not observe a terminal status
    /// within its polling budget. Deliberately not an error.
    Canceled { intent: Intent },
    Failed {
        intent: Option<Intent>,
        error: ConfirmError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmStatus {
    Succeeded,
    Canceled,
    Failed,
}

impl ConfirmOutcome {
    pub fn status(&self) -> ConfirmStatus {
        match self {
            ConfirmOutcome::Succeeded(_) => ConfirmStatus::Succeeded,
            ConfirmOutcome::Canceled { .. } => ConfirmStatus::Canceled,
            ConfirmOutcome::Failed { .. } => ConfirmStatus::Failed,
        }
    }

    pub fn intent(&self) -> Option<&Intent> {
        match self {
            ConfirmOutcome::Succeeded(intent) => Some(intent),
            ConfirmOutcome::Canceled { intent } => Some(intent),
            ConfirmOutcome::Failed { intent, .. } => intent.as_ref(),
        }
    }

    pub fn error(&self) -> Option<&ConfirmError> {
        match self {
            ConfirmOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Request to confirm an intent and drive any required next action.
#[derive(Debug, Clone)]
pub struct ConfirmRequest {
    pub client_secret: String,
    pub payment_method_type: Option<PaymentMethodType>,
    pub return_url: Option<String>,
    pub metadata: Option<JsonValue>,
}

/// Client-side payment confirmation orchestrator.
///
/// Stateless across flows: each entry point builds its own [`ActionParams`],
/// so one orchestrator instance may serve concurrent confirmations. All
/// outbound intent calls run under the configured retry policy.
pub struct ConfirmOrchestrator {
    client: Arc<dyn IntentClient>,
    registry: HandlerRegistry,
    config: ConfirmConfig,
}

impl ConfirmOrchestrator {
    pub fn new(client: Arc<dyn IntentClient>, config: ConfirmConfig) -> Self {
        Self {
            client,
            registry: HandlerRegistry::new(),
            config,
        }
    }

    pub fn config(&self) -> &ConfirmConfig {
        &self.config
    }

    /// Confirms the intent with the server, then drives whatever next action
    /// the server returns until the flow settles.
    pub async fn confirm(
        &self,
        request: ConfirmRequest,
        context: Arc<dyn AuthenticationContext>,
    ) -> ConfirmOutcome {
        if let Err(e) = parse_client_secret(&request.client_secret) {
            return ConfirmOutcome::Failed {
                intent: None,
                error: ConfirmError::InvalidClientSecret {
                    message: e.to_string(),
                },
            };
        }

        let confirm_request = ConfirmIntentRequest {
            client_secret: request.client_secret.clone(),
            payment_method_type: request.payment_method_type,
            return_url: request.return_url.clone(),
            idempotency_key: Some(Uuid::new_v4().to_string()),
            metadata: request.metadata.clone(),
        };
        let client = Arc::clone(&self.client);
        let confirmed = with_backoff(&self.config.retry, "confirm_intent", || {
            client.confirm_intent(confirm_request.clone())
        })
        .await;

        match confirmed {
            Ok(intent) => self.drive(intent, context, request.return_url).await,
            Err(e) => {
                error!(error = %e, "intent confirmation failed");
                ConfirmOutcome::Failed {
                    intent: None,
                    error: e.into(),
                }
            }
        }
    }

    /// Drives the next action of an already-confirmed intent, e.g. after the
    /// host resumed a flow from a push notification or a fresh retrieve.
    pub async fn handle_next_action(
        &self,
        client_secret: &str,
        context: Arc<dyn AuthenticationContext>,
        return_url: Option<String>,
    ) -> ConfirmOutcome {
        if let Err(e) = parse_client_secret(client_secret) {
            return ConfirmOutcome::Failed {
                intent: None,
                error: ConfirmError::InvalidClientSecret {
                    message: e.to_string(),
                },
            };
        }

        let client = Arc::clone(&self.client);
        let retrieved = with_backoff(&self.config.retry, "retrieve_intent", || {
            client.retrieve_intent(client_secret)
        })
        .await;

        match retrieved {
            Ok(intent) => self.drive(intent, context, return_url).await,
            Err(e) => {
                error!(error = %e, "intent retrieval failed");
                ConfirmOutcome::Failed {
                    intent: None,
                    error: e.into(),
                }
            }
        }
    }

    /// Single advance loop for one confirmation flow. Every external event
    /// (network response, app-return, dismissal) resolves inside one round of
    /// this loop, which settles on a terminal outcome exactly once.
    async fn drive(
        &self,
        intent: Intent,
        context: Arc<dyn AuthenticationContext>,
        return_url: Option<String>,
    ) -> ConfirmOutcome {
        info!(
            intent_id = %intent.id,
            status = %intent.status,
            "starting confirmation flow"
        );
        let mut params = ActionParams::new(
            Arc::clone(&self.client),
            context,
            intent,
            &self.config,
            return_url,
        );
        let mut rounds: u32 = 0;
        let mut last_action_kind: Option<NextActionKind> = None;

        loop {
            match params.intent.status {
                IntentStatus::Succeeded | IntentStatus::RequiresCapture => {
                    info!(intent_id = %params.intent.id, "confirmation succeeded");
                    return ConfirmOutcome::Succeeded(params.intent);
                }
                IntentStatus::Canceled => {
                    return ConfirmOutcome::Canceled {
                        intent: params.intent,
                    }
                }
                IntentStatus::RequiresPaymentMethod => {
                    return ConfirmOutcome::Failed {
                        intent: Some(params.intent),
                        error: ConfirmError::AuthenticationFailed,
                    }
                }
                IntentStatus::RequiresConfirmation => {
                    // The action ran but the server never saw a confirmation;
                    // the flow was abandoned mid-way.
                    return ConfirmOutcome::Canceled {
                        intent: params.intent,
                    };
                }
                IntentStatus::Processing => return self.settle_processing(params).await,
                IntentStatus::RequiresAction => {
                    let Some(kind) = params.intent.next_action_kind() else {
                        return ConfirmOutcome::Failed {
                            intent: Some(params.intent),
                            error: ConfirmError::MalformedAction {
                                message: "requires_action without a next action descriptor"
                                    .to_string(),
                            },
                        };
                    };

                    if last_action_kind == Some(kind) {
                        // The server handed back the same action after we ran
                        // it: the user went through the motions without
                        // completing. Surface as canceled, not failed.
                        return ConfirmOutcome::Canceled {
                            intent: params.intent,
                        };
                    }
                    rounds += 1;
                    if rounds > self.config.max_action_rounds {
                        warn!(
                            intent_id = %params.intent.id,
                            rounds = rounds,
                            "action round limit reached, abandoning flow"
                        );
                        return ConfirmOutcome::Canceled {
                            intent: params.intent,
                        };
                    }

                    let Some(handler) = self.registry.handler_for(kind) else {
                        return ConfirmOutcome::Failed {
                            intent: Some(params.intent),
                            error: ConfirmError::UnsupportedAction { kind },
                        };
                    };

                    info!(
                        intent_id = %params.intent.id,
                        handler = handler.name(),
                        action = ?kind,
                        round = rounds,
                        "dispatching next action"
                    );
                    let executed = handler.execute(&mut params).await;
                    // Presenter teardown is unconditional; handlers already
                    // clean up on their own paths and this is idempotent.
                    params.presenter.cleanup();

                    match executed {
                        Ok(HandlerOutcome::Completed) => {
                            last_action_kind = Some(kind);
                            let client = Arc::clone(&params.client);
                            let secret = params.intent.client_secret.clone();
                            let refreshed = with_backoff(&params.retry, "retrieve_intent", || {
                                client.retrieve_intent(&secret)
                            })
                            .await;
                            match refreshed {
                                Ok(fresh) => params.intent = fresh,
                                Err(e) => {
                                    return ConfirmOutcome::Failed {
                                        intent: Some(params.intent),
                                        error: e.into(),
                                    }
                                }
                            }
                        }
                        Ok(HandlerOutcome::Pending) => {
                            let client = Arc::clone(&params.client);
                            let secret = params.intent.client_secret.clone();
                            let refreshed = with_backoff(&params.retry, "retrieve_intent", || {
                                client.retrieve_intent(&secret)
                            })
                            .await;
                            return match refreshed {
                                Ok(fresh) => Self::settle_lenient(fresh),
                                Err(e) => ConfirmOutcome::Failed {
                                    intent: Some(params.intent),
                                    error: e.into(),
                                },
                            };
                        }
                        Ok(HandlerOutcome::Canceled) => {
                            return ConfirmOutcome::Canceled {
                                intent: params.intent,
                            }
                        }
                        Ok(HandlerOutcome::Settled(fresh)) => return Self::settle_polled(fresh),
                        Err(e) => {
                            error!(
                                intent_id = %params.intent.id,
                                handler = handler.name(),
                                error = %e,
                                "next action handler failed"
                            );
                            return ConfirmOutcome::Failed {
                                intent: Some(params.intent),
                                error: e,
                            };
                        }
                    }
                }
            }
        }
    }

    /// A `processing` status on an async rail is watched under the
    /// processing budget; every other rail settles out of band and is
    /// reported as success immediately.
    async fn settle_processing(&self, params: ActionParams) -> ConfirmOutcome {
        let pollable = params
            .intent
            .payment_method_type
            .map(|method| params.polling.should_poll(method))
            .unwrap_or(false);
        if !pollable {
            info!(
                intent_id = %params.intent.id,
                "processing on a synchronous rail, settling as success"
            );
            return ConfirmOutcome::Succeeded(params.intent);
        }

        let budget = params.polling.create_processing_budget();
        let timings = params.polling.timings().clone();
        match poll_intent_status(
            &params.client,
            &params.intent.client_secret,
            &budget,
            &timings,
        )
        .await
        {
            Ok(fresh) => Self::settle_polled(fresh),
            Err(e) => ConfirmOutcome::Failed {
                intent: Some(params.intent),
                error: e.into(),
            },
        }
    }

    /// Settlement after a polling session: the snapshot is authoritative and
    /// a still-pending status means the budget ran out first — deliberately
    /// reported as canceled with no error attached.
    fn settle_polled(intent: Intent) -> ConfirmOutcome {
        match intent.status {
            IntentStatus::Succeeded | IntentStatus::RequiresCapture => {
                ConfirmOutcome::Succeeded(intent)
            }
            IntentStatus::RequiresPaymentMethod => ConfirmOutcome::Failed {
                intent: Some(intent),
                error: ConfirmError::AuthenticationFailed,
            },
            IntentStatus::Canceled
            | IntentStatus::Processing
            | IntentStatus::RequiresAction
            | IntentStatus::RequiresConfirmation => ConfirmOutcome::Canceled { intent },
        }
    }

    /// Settlement after a voucher display: the client-side part is done, so
    /// a status that merely has not settled yet counts as success.
    fn settle_lenient(intent: Intent) -> ConfirmOutcome {
        match intent.status {
            IntentStatus::Canceled => ConfirmOutcome::Canceled { intent },
            IntentStatus::RequiresPaymentMethod => ConfirmOutcome::Failed {
                intent: Some(intent),
                error: ConfirmError::AuthenticationFailed,
            },
            _ => ConfirmOutcome::Succeeded(intent),
        }
    }
}
