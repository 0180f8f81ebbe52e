use crate::confirm::handlers::{ActionHandler, HandlerOutcome};
use crate::confirm::params::ActionParams;
use crate::confirm::polling::poll_intent_status;
use crate::error::ConfirmResult;
use crate::intents::types::{ActionGroup, NextActionKind};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Discovers completion by re-fetching the intent under a polling budget.
///
/// The budget is scoped to the attached rail's duration; rails outside the
/// polling allow-list get the minimal wait-for-first-status budget so a QR
/// or authorization-code action still observes at least one status change.
pub struct PollHandler;

#[async_trait]
impl ActionHandler for PollHandler {
    fn name(&self) -> &'static str {
        "poll"
    }

    fn can_handle(&self, kind: NextActionKind) -> bool {
        kind.group() == Some(ActionGroup::Poll)
    }

    async fn execute(&self, params: &mut ActionParams) -> ConfirmResult<HandlerOutcome> {
        let client = Arc::clone(&params.client);
        let client_secret = params.intent.client_secret.clone();
        let timings = params.polling.timings().clone();
        let budget = params
            .intent
            .payment_method_type
            .and_then(|method| params.polling.get_or_create_budget(method).cloned())
            .unwrap_or_else(|| params.polling.create_minimal_budget());

        info!(
            intent_id = %params.intent.id,
            budget_secs = budget.allowed().as_secs_f64(),
            "polling intent until settled or budget exhausted"
        );
        let settled = poll_intent_status(&client, &client_secret, &budget, &timings).await?;
        Ok(HandlerOutcome::Settled(settled))
    }
}
