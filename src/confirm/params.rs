use crate::challenge::ChallengeCustomization;
use crate::config::ConfirmConfig;
use crate::confirm::polling::PollingCoordinator;
use crate::confirm::presenter::{AuthenticationContext, UiPresenter};
use crate::confirm::retry::RetryConfig;
use crate::intents::client::IntentClient;
use crate::intents::types::Intent;
use std::sync::Arc;

/// Mutable state of one in-flight confirmation attempt.
///
/// Exclusively owned by the orchestrator for the duration of the attempt;
/// handlers are stateless and receive this by `&mut`. The presenter and the
/// polling coordinator are per-flow and never shared across attempts.
pub struct ActionParams {
    pub client: Arc<dyn IntentClient>,
    pub context: Arc<dyn AuthenticationContext>,
    pub customization: ChallengeCustomization,
    pub intent: Intent,
    pub return_url: Option<String>,
    pub retry: RetryConfig,
    pub presenter: UiPresenter,
    pub polling: PollingCoordinator,
}

impl ActionParams {
    pub fn new(
        client: Arc<dyn IntentClient>,
        context: Arc<dyn AuthenticationContext>,
        intent: Intent,
        config: &ConfirmConfig,
        return_url: Option<String>,
    ) -> Self {
        Self {
            client,
            context,
            customization: config.challenge.clone(),
            intent,
            return_url,
            retry: config.retry.clone(),
            presenter: UiPresenter::new(),
            polling: PollingCoordinator::new(config.poll.clone()),
        }
    }
}
