use crate::intents::client::IntentClient;
use crate::intents::error::{IntentError, IntentResult};
use crate::intents::types::{parse_client_secret, ConfirmIntentRequest, Intent};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct RestClientConfig {
    pub api_base_url: String,
    pub publishable_key: String,
    pub timeout_secs: u64,
}

impl Default for RestClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.paymesh.io".to_string(),
            publishable_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl RestClientConfig {
    pub fn from_env() -> IntentResult<Self> {
        let publishable_key =
            std::env::var("PAYMESH_PUBLISHABLE_KEY").map_err(|_| IntentError::Decode {
                message: "PAYMESH_PUBLISHABLE_KEY environment variable is required".to_string(),
            })?;

        Ok(Self {
            api_base_url: std::env::var("PAYMESH_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.paymesh.io".to_string()),
            timeout_secs: std::env::var("PAYMESH_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30),
            publishable_key,
        })
    }
}

/// `IntentClient` over the Paymesh REST API.
///
/// Requests are single-shot; retry and backoff are owned by the
/// confirmation orchestrator so that one bounded policy governs every
/// outbound call of a flow.
pub struct RestIntentClient {
    config: RestClientConfig,
    http: Client,
}

impl RestIntentClient {
    pub fn new(config: RestClientConfig) -> IntentResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IntentError::Network {
                message: format!("failed to initialize HTTP client: {}", e),
            })?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> IntentResult<Self> {
        Self::new(RestClientConfig::from_env()?)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&JsonValue>,
    ) -> IntentResult<T> {
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(&self.config.publishable_key);
        if let Some(payload) = body {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                IntentError::Timeout
            } else {
                IntentError::Network {
                    message: format!("intent request failed: {}", e),
                }
            }
        })?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(IntentError::RateLimited { retry_after });
        }

        let text = response.text().await.unwrap_or_default();
        if status.is_success() {
            return serde_json::from_str::<T>(&text).map_err(|e| IntentError::Decode {
                message: format!("invalid intent JSON response: {}", e),
            });
        }

        let envelope = serde_json::from_str::<ApiErrorEnvelope>(&text).ok();
        Err(IntentError::Api {
            status: status.as_u16(),
            code: envelope.as_ref().and_then(|e| e.error.code.clone()),
            message: envelope
                .map(|e| e.error.message)
                .unwrap_or_else(|| format!("HTTP {}", status)),
            retryable: status.is_server_error(),
        })
    }
}

#[async_trait]
impl IntentClient for RestIntentClient {
    async fn retrieve_intent(&self, client_secret: &str) -> IntentResult<Intent> {
        let secret = parse_client_secret(client_secret)?;
        debug!(intent_id = %secret.intent_id, "retrieving intent");
        self.request_json(
            reqwest::Method::GET,
            &self.endpoint(&format!(
                "/v1/intents/{}?client_secret={}",
                secret.intent_id, client_secret
            )),
            None,
        )
        .await
    }

    async fn refresh_intent(&self, client_secret: &str) -> IntentResult<Intent> {
        let secret = parse_client_secret(client_secret)?;
        debug!(intent_id = %secret.intent_id, "refreshing intent");
        self.request_json(
            reqwest::Method::POST,
            &self.endpoint(&format!("/v1/intents/{}/refresh", secret.intent_id)),
            Some(&serde_json::json!({ "client_secret": client_secret })),
        )
        .await
    }

    async fn confirm_intent(&self, request: ConfirmIntentRequest) -> IntentResult<Intent> {
        let secret = parse_client_secret(&request.client_secret)?;
        debug!(intent_id = %secret.intent_id, "confirming intent");
        let payload = serde_json::json!({
            "client_secret": request.client_secret,
            "payment_method_type": request.payment_method_type,
            "return_url": request.return_url,
            "idempotency_key": request.idempotency_key,
            "metadata": request.metadata,
        });
        self.request_json(
            reqwest::Method::POST,
            &self.endpoint(&format!("/v1/intents/{}/confirm", secret.intent_id)),
            Some(&payload),
        )
        .await
    }

    async fn complete_challenge(&self, intent_id: &str) -> IntentResult<()> {
        debug!(intent_id = %intent_id, "submitting challenge completion");
        let _: JsonValue = self
            .request_json(
                reqwest::Method::POST,
                &self.endpoint(&format!("/v1/intents/{}/challenge/complete", intent_id)),
                Some(&serde_json::json!({})),
            )
            .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: String,
}
