//! Paymesh client SDK — payment confirmation core.
//!
//! Takes a payment or setup intent returned from the Paymesh API, determines
//! what client-side action is required (redirect, voucher display, status
//! polling, 3DS2 challenge), dispatches to the matching handler strategy, and
//! reports a terminal status back to the caller.
//!
//! ```no_run
//! use paymesh_client::confirm::{ConfirmOrchestrator, ConfirmRequest};
//! use paymesh_client::intents::{PaymentMethodType, RestIntentClient};
//! use paymesh_client::ConfirmConfig;
//! use std::sync::Arc;
//!
//! # async fn run(context: Arc<dyn paymesh_client::confirm::AuthenticationContext>) -> anyhow::Result<()> {
//! let client = Arc::new(RestIntentClient::from_env()?);
//! let orchestrator = ConfirmOrchestrator::new(client, ConfirmConfig::default());
//! let outcome = orchestrator
//!     .confirm(
//!         ConfirmRequest {
//!             client_secret: "pi_123_secret_456".to_string(),
//!             payment_method_type: Some(PaymentMethodType::Card),
//!             return_url: Some("paymesh://return".to_string()),
//!             metadata: None,
//!         },
//!         context,
//!     )
//!     .await;
//! println!("confirmation settled: {:?}", outcome.status());
//! # Ok(())
//! # }
//! ```

pub mod challenge;
pub mod config;
pub mod confirm;
pub mod error;
pub mod intents;
pub mod logging;

pub use config::ConfirmConfig;
pub use confirm::{ConfirmOrchestrator, ConfirmOutcome, ConfirmRequest, ConfirmStatus};
pub use error::{ConfirmError, ConfirmResult};
pub use intents::{Intent, IntentClient, IntentStatus, NextAction, NextActionKind};
