use crate::intents::client::IntentClient;
use crate::intents::error::IntentResult;
use crate::intents::types::{Intent, PaymentMethodType};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Time window within which repeated status checks are permitted.
///
/// `can_poll` becomes permanently false once the elapsed time exceeds the
/// allowed duration; a budget is never revived, only superseded by a new one.
#[derive(Debug, Clone)]
pub struct PollingBudget {
    started_at: Instant,
    allowed: Duration,
}

impl PollingBudget {
    pub fn new(allowed: Duration) -> Self {
        Self {
            started_at: Instant::now(),
            allowed,
        }
    }

    pub fn can_poll(&self) -> bool {
        self.started_at.elapsed() < self.allowed
    }

    pub fn allowed(&self) -> Duration {
        self.allowed
    }

    pub fn remaining(&self) -> Duration {
        self.allowed.saturating_sub(self.started_at.elapsed())
    }
}

/// Fixed timing policy for status polling.
#[derive(Debug, Clone)]
pub struct PollTimings {
    /// Delay between successive poll attempts when the server answers quickly.
    pub interval: Duration,
    /// Delay before re-trying a poll that failed with a transient error.
    pub timeout_retry_delay: Duration,
    /// Hard cap on poll attempts within one session, independent of budget.
    pub max_attempts: u32,
    /// Budget for the initial wait-for-first-status window.
    pub minimal_budget: Duration,
    /// Budget for the window after the server reports `processing`.
    pub processing_budget: Duration,
}

impl Default for PollTimings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            timeout_retry_delay: Duration::from_secs(1),
            max_attempts: 10,
            minimal_budget: Duration::from_secs(5),
            processing_budget: Duration::from_secs(15),
        }
    }
}

impl PollTimings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            interval: std::env::var("PAYMESH_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
            timeout_retry_delay: std::env::var("PAYMESH_POLL_RETRY_DELAY_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout_retry_delay),
            max_attempts: std::env::var("PAYMESH_POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(defaults.max_attempts),
            minimal_budget: defaults.minimal_budget,
            processing_budget: defaults.processing_budget,
        }
    }
}

/// Decides, per payment-method rail, whether polling is applicable and for
/// how long, and owns the budget for one confirmation flow.
///
/// One coordinator per flow; the cached budget is never shared across flows.
#[derive(Debug)]
pub struct PollingCoordinator {
    timings: PollTimings,
    budget: Option<PollingBudget>,
}

impl PollingCoordinator {
    pub fn new(timings: PollTimings) -> Self {
        Self {
            timings,
            budget: None,
        }
    }

    pub fn timings(&self) -> &PollTimings {
        &self.timings
    }

    /// True only for rails known to resolve asynchronously server-side.
    pub fn should_poll(&self, method: PaymentMethodType) -> bool {
        self.polling_duration(method).is_some()
    }

    /// Total polling window for a rail, or `None` for rails that resolve
    /// synchronously.
    pub fn polling_duration(&self, method: PaymentMethodType) -> Option<Duration> {
        match method {
            PaymentMethodType::Card => Some(Duration::from_secs_f64(15.0)),
            PaymentMethodType::Blik => Some(Duration::from_secs_f64(5.0)),
            PaymentMethodType::Upi => Some(Duration::from_secs_f64(300.0)),
            _ => None,
        }
    }

    /// Budget for the initial wait-for-first-status window.
    pub fn create_minimal_budget(&self) -> PollingBudget {
        PollingBudget::new(self.timings.minimal_budget)
    }

    /// Budget for the window after the server reports `processing`.
    pub fn create_processing_budget(&self) -> PollingBudget {
        PollingBudget::new(self.timings.processing_budget)
    }

    /// Lazily creates and caches one budget scoped to the rail's duration.
    /// Returns `None` for rails that are not pollable.
    pub fn get_or_create_budget(&mut self, method: PaymentMethodType) -> Option<&PollingBudget> {
        let duration = self.polling_duration(method)?;
        if self.budget.is_none() {
            self.budget = Some(PollingBudget::new(duration));
        }
        self.budget.as_ref()
    }

    /// Discards the cached budget; the next access creates a fresh one.
    pub fn reset(&mut self) {
        self.budget = None;
    }
}

/// Re-fetches an intent until it settles or the budget runs out.
///
/// The budget is checked before each new attempt, never used to abort an
/// in-flight request: a round-trip that outlives the budget is followed by
/// exactly one final authoritative check, whose snapshot is returned as-is.
/// Transient failures are re-tried after a fixed delay instead of failing the
/// flow; non-transient failures propagate immediately.
pub async fn poll_intent_status(
    client: &Arc<dyn IntentClient>,
    client_secret: &str,
    budget: &PollingBudget,
    timings: &PollTimings,
) -> IntentResult<Intent> {
    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        match client.refresh_intent(client_secret).await {
            Ok(intent) => {
                if !intent.status.is_in_flight() {
                    debug!(
                        intent_id = %intent.id,
                        status = %intent.status,
                        attempts = attempts,
                        "intent settled while polling"
                    );
                    return Ok(intent);
                }
                if attempts >= timings.max_attempts || !budget.can_poll() {
                    break;
                }
                tokio::time::sleep(timings.interval).await;
            }
            Err(e) if e.is_retryable() => {
                warn!(
                    attempt = attempts,
                    error = %e,
                    "transient error while polling intent status"
                );
                if attempts >= timings.max_attempts || !budget.can_poll() {
                    break;
                }
                tokio::time::sleep(timings.timeout_retry_delay).await;
            }
            Err(e) => return Err(e),
        }
        if !budget.can_poll() {
            break;
        }
    }

    // Budget or attempt cap exhausted: one final authoritative check.
    debug!(attempts = attempts, "polling window closed, final status check");
    client.refresh_intent(client_secret).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_poll_only_for_async_rails() {
        let coordinator = PollingCoordinator::new(PollTimings::default());
        assert!(coordinator.should_poll(PaymentMethodType::Card));
        assert!(coordinator.should_poll(PaymentMethodType::Blik));
        assert!(coordinator.should_poll(PaymentMethodType::Upi));
        assert!(!coordinator.should_poll(PaymentMethodType::BankTransfer));
        assert!(!coordinator.should_poll(PaymentMethodType::MobileMoney));
        assert!(!coordinator.should_poll(PaymentMethodType::Wallet));
        assert!(!coordinator.should_poll(PaymentMethodType::Other));
    }

    #[test]
    fn polling_durations_match_rail_policy() {
        let coordinator = PollingCoordinator::new(PollTimings::default());
        assert_eq!(
            coordinator.polling_duration(PaymentMethodType::Card),
            Some(Duration::from_secs_f64(15.0))
        );
        assert_eq!(
            coordinator.polling_duration(PaymentMethodType::Blik),
            Some(Duration::from_secs_f64(5.0))
        );
        assert_eq!(coordinator.polling_duration(PaymentMethodType::Wallet), None);
    }

    #[tokio::test(start_paused = true)]
    async fn budget_is_immediately_pollable_and_expires_permanently() {
        let budget = PollingBudget::new(Duration::from_secs(2));
        assert!(budget.can_poll());

        tokio::time::advance(Duration::from_millis(2_100)).await;
        assert!(!budget.can_poll());

        // Never becomes true again.
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(!budget.can_poll());
        assert_eq!(budget.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn get_or_create_budget_caches_until_reset() {
        let mut coordinator = PollingCoordinator::new(PollTimings::default());
        assert!(coordinator
            .get_or_create_budget(PaymentMethodType::Wallet)
            .is_none());

        let first = coordinator
            .get_or_create_budget(PaymentMethodType::Blik)
            .expect("blik is pollable")
            .clone();
        assert!(first.can_poll());
        assert_eq!(first.allowed(), Duration::from_secs_f64(5.0));

        tokio::time::advance(Duration::from_secs(1)).await;
        let cached = coordinator
            .get_or_create_budget(PaymentMethodType::Blik)
            .expect("budget is cached")
            .clone();
        assert_eq!(cached.remaining(), Duration::from_secs(4));

        coordinator.reset();
        let fresh = coordinator
            .get_or_create_budget(PaymentMethodType::Blik)
            .expect("fresh budget after reset");
        assert_eq!(fresh.remaining(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn minimal_and_processing_budgets_are_queryable_on_creation() {
        let coordinator = PollingCoordinator::new(PollTimings::default());
        assert!(coordinator.create_minimal_budget().can_poll());
        assert!(coordinator.create_processing_budget().can_poll());
        assert!(
            coordinator.create_processing_budget().allowed()
                > coordinator.create_minimal_budget().allowed()
        );
    }
}
