//! SDK configuration.
//!
//! All knobs are threaded explicitly through the orchestrator constructor;
//! there is no mutable global configuration. Tests construct values directly
//! instead of mutating process state.

use crate::challenge::ChallengeCustomization;
use crate::confirm::polling::PollTimings;
use crate::confirm::retry::RetryConfig;

#[derive(Debug, Clone)]
pub struct ConfirmConfig {
    /// Backoff policy shared by every outbound intent call of a flow.
    pub retry: RetryConfig,
    /// Timing policy for status polling.
    pub poll: PollTimings,
    /// Challenge settings, passed through opaquely to the challenge protocol.
    pub challenge: ChallengeCustomization,
    /// How many distinct next actions one confirmation may chain through
    /// before the flow is abandoned as canceled.
    pub max_action_rounds: u32,
}

impl Default for ConfirmConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            poll: PollTimings::default(),
            challenge: ChallengeCustomization::default(),
            max_action_rounds: 3,
        }
    }
}

impl ConfirmConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            retry: RetryConfig::from_env(),
            poll: PollTimings::from_env(),
            challenge: ChallengeCustomization::default(),
            max_action_rounds: std::env::var("PAYMESH_MAX_ACTION_ROUNDS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(defaults.max_action_rounds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn defaults_are_sane() {
        let config = ConfirmConfig::default();
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.poll.interval, Duration::from_secs(3));
        assert_eq!(config.max_action_rounds, 3);
    }
}
