//! Intent domain model and transport boundary.
//!
//! The confirmation core consumes the server through the [`IntentClient`]
//! capability trait; [`RestIntentClient`] is the production adapter.

pub mod client;
pub mod error;
pub mod rest;
pub mod types;

pub use client::IntentClient;
pub use error::{IntentError, IntentResult};
pub use rest::{RestClientConfig, RestIntentClient};
pub use types::{
    parse_client_secret, ActionGroup, ChallengeParams, ClientSecret, ConfirmIntentRequest, Intent,
    IntentKind, IntentStatus, NextAction, NextActionKind, PaymentMethodType,
};
