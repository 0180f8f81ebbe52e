use crate::confirm::handlers::{ActionHandler, HandlerOutcome};
use crate::confirm::params::ActionParams;
use crate::confirm::presenter::RedirectDisposition;
use crate::error::{ConfirmError, ConfirmResult};
use crate::intents::types::{ActionGroup, NextAction, NextActionKind};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Opens an external browser or wallet app and suspends until the
/// application regains foreground control.
pub struct RedirectHandler;

#[async_trait]
impl ActionHandler for RedirectHandler {
    fn name(&self) -> &'static str {
        "redirect"
    }

    fn can_handle(&self, kind: NextActionKind) -> bool {
        kind.group() == Some(ActionGroup::Redirect)
    }

    async fn execute(&self, params: &mut ActionParams) -> ConfirmResult<HandlerOutcome> {
        if !params.context.can_present() {
            return Err(ConfirmError::NoPresentationContext);
        }

        let (target, fallback) = match params.intent.next_action.as_ref() {
            Some(NextAction::RedirectToUrl { url, .. }) => (url.clone(), None),
            Some(NextAction::WalletAppRedirect {
                native_url,
                fallback_url,
            }) => (native_url.clone(), fallback_url.clone()),
            _ => {
                return Err(ConfirmError::MalformedAction {
                    message: "redirect action is missing its target URL".to_string(),
                })
            }
        };

        let context = Arc::clone(&params.context);
        info!(intent_id = %params.intent.id, url = %target, "opening redirect");
        let surface = params.presenter.create_surface(&target);
        let mut disposition = context.open_redirect(surface).await;

        // Wallet app not installed: retry once through the browser fallback.
        if disposition == RedirectDisposition::OpenFailed {
            if let Some(fallback_url) = fallback {
                warn!(
                    intent_id = %params.intent.id,
                    fallback_url = %fallback_url,
                    "native redirect failed, falling back to browser"
                );
                params.presenter.cleanup();
                let surface = params.presenter.create_surface(&fallback_url);
                disposition = context.open_redirect(surface).await;
            }
        }

        params.presenter.cleanup();
        match disposition {
            RedirectDisposition::Returned => Ok(HandlerOutcome::Completed),
            RedirectDisposition::Canceled => Ok(HandlerOutcome::Canceled),
            RedirectDisposition::OpenFailed => Err(ConfirmError::RedirectFailed { url: target }),
        }
    }
}
