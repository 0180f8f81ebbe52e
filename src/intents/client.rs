use crate::intents::error::IntentResult;
use crate::intents::types::{ConfirmIntentRequest, Intent};
use async_trait::async_trait;

/// Capability to retrieve and confirm intents against the Paymesh API.
///
/// One instance may be shared across concurrent confirmation flows; request
/// state is carried per call. The orchestrator wraps every call site with the
/// shared retry policy, so implementations perform single-shot requests.
#[async_trait]
pub trait IntentClient: Send + Sync {
    /// Fetches the current intent snapshot for a client secret.
    async fn retrieve_intent(&self, client_secret: &str) -> IntentResult<Intent>;

    /// Re-fetches an intent during polling. Rails with distinct refresh
    /// semantics override this; the default is a plain retrieve.
    async fn refresh_intent(&self, client_secret: &str) -> IntentResult<Intent> {
        self.retrieve_intent(client_secret).await
    }

    /// Confirms an intent, attaching the payment method and return URL.
    async fn confirm_intent(&self, request: ConfirmIntentRequest) -> IntentResult<Intent>;

    /// Reports a completed 3DS2 challenge back to the server.
    async fn complete_challenge(&self, intent_id: &str) -> IntentResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intents::types::{IntentKind, IntentStatus};

    struct MockClient;

    #[async_trait]
    impl IntentClient for MockClient {
        async fn retrieve_intent(&self, client_secret: &str) -> IntentResult<Intent> {
            Ok(Intent {
                id: "pi_mock".to_string(),
                kind: IntentKind::Payment,
                client_secret: client_secret.to_string(),
                status: IntentStatus::RequiresAction,
                amount_minor: Some(1_000),
                currency: Some("USD".to_string()),
                payment_method_type: None,
                payment_method_types: Vec::new(),
                next_action: None,
                created: None,
                livemode: false,
            })
        }

        async fn confirm_intent(&self, request: ConfirmIntentRequest) -> IntentResult<Intent> {
            self.retrieve_intent(&request.client_secret).await
        }

        async fn complete_challenge(&self, _intent_id: &str) -> IntentResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn refresh_defaults_to_retrieve() {
        let client: Box<dyn IntentClient> = Box::new(MockClient);
        let refreshed = client
            .refresh_intent("pi_mock_secret_abc")
            .await
            .expect("refresh should succeed");
        assert_eq!(refreshed.client_secret, "pi_mock_secret_abc");
        assert_eq!(refreshed.status, IntentStatus::RequiresAction);
    }
}
