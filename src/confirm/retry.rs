use crate::intents::error::IntentResult;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded exponential backoff policy for outbound intent calls.
///
/// Threaded explicitly through the orchestrator; there is no process-wide
/// retry setting. Tests construct their own values directly.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry.
    pub initial_delay: Duration,
    /// Ceiling for the computed delay.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryConfig {
    /// Policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: std::env::var("PAYMESH_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(defaults.max_retries),
            initial_delay: std::env::var("PAYMESH_RETRY_INITIAL_DELAY_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_delay),
            max_delay: std::env::var("PAYMESH_RETRY_MAX_DELAY_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_delay),
        }
    }

    /// Delay before retry number `attempt` (1-based), capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        std::cmp::min(self.initial_delay.saturating_mul(factor), self.max_delay)
    }
}

/// Runs `operation` under the retry policy.
///
/// Retries only transient failures (`IntentError::is_retryable`), honoring a
/// server-provided `Retry-After` over the computed backoff. The attempt count
/// never exceeds `1 + max_retries`.
pub async fn with_backoff<T, F, Fut>(
    config: &RetryConfig,
    operation: &'static str,
    mut run: F,
) -> IntentResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = IntentResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match run().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                attempt += 1;
                let delay = e
                    .retry_after()
                    .unwrap_or_else(|| config.delay_for_attempt(attempt));
                warn!(
                    operation = operation,
                    attempt = attempt,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient failure, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
