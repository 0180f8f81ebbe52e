//! Authentication handler strategies.
//!
//! Four mutually exclusive strategies, one per action group. Handlers are
//! stateless and shared across concurrent flows; all mutable state lives in
//! [`ActionParams`].

pub mod challenge;
pub mod poll;
pub mod redirect;
pub mod voucher;

pub use challenge::ChallengeHandler;
pub use poll::PollHandler;
pub use redirect::RedirectHandler;
pub use voucher::VoucherHandler;

use crate::confirm::params::ActionParams;
use crate::error::ConfirmResult;
use crate::intents::types::{Intent, NextActionKind};
use async_trait::async_trait;

/// What a handler reports back to the orchestrator.
#[derive(Debug)]
pub enum HandlerOutcome {
    /// The action ran to completion; re-fetch the intent and settle strictly
    /// on the refreshed status.
    Completed,
    /// The client-side part is done and settlement continues out of band; a
    /// still-pending refreshed status settles as success.
    Pending,
    /// The user backed out of the action.
    Canceled,
    /// The handler already observed an authoritative snapshot; settle on it
    /// without another fetch.
    Settled(Intent),
}

#[async_trait]
pub trait ActionHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this strategy covers the given action kind. Exactly one
    /// handler answers true per recognized kind; all answer false for
    /// `Unknown`.
    fn can_handle(&self, kind: NextActionKind) -> bool;

    async fn execute(&self, params: &mut ActionParams) -> ConfirmResult<HandlerOutcome>;
}
