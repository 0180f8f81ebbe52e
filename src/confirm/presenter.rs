use crate::challenge::ChallengeRequest;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One interstitial presentation surface (an in-app browser session or an
/// app-switch handoff) owned by a [`UiPresenter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationSurface {
    pub id: Uuid,
    pub url: String,
    pub opened_at: DateTime<Utc>,
}

/// Owns the lifecycle of the interstitial surface used by redirects.
///
/// At most one surface is active per presenter; every redirect path must run
/// `cleanup` on completion, cancellation, and error. `cleanup` is idempotent
/// so exit paths never need to know whether a surface was actually created.
#[derive(Debug, Default)]
pub struct UiPresenter {
    surface: Option<PresentationSurface>,
}

impl UiPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and retains the surface for `url`, replacing any surface that
    /// is still active.
    pub fn create_surface(&mut self, url: &str) -> &PresentationSurface {
        self.surface.insert(PresentationSurface {
            id: Uuid::new_v4(),
            url: url.to_string(),
            opened_at: Utc::now(),
        })
    }

    pub fn active_surface(&self) -> Option<&PresentationSurface> {
        self.surface.as_ref()
    }

    /// Tears down the retained surface. Safe to call when nothing is
    /// presented.
    pub fn cleanup(&mut self) {
        self.surface = None;
    }
}

/// How a redirect resolved once control returned to the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectDisposition {
    /// The app regained foreground control after the external flow.
    Returned,
    /// The user dismissed the surface without completing.
    Canceled,
    /// The browser or wallet app could not be opened.
    OpenFailed,
}

/// How a voucher display resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoucherDisposition {
    /// The user acknowledged the instructions; settlement happens out of band.
    Dismissed,
    /// The user backed out without acknowledging.
    Abandoned,
}

/// How the challenge UI resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeDisposition {
    Completed,
    Canceled,
    TimedOut,
    ProtocolError { message: String },
}

/// Static display data extracted from a voucher-group next action.
#[derive(Debug, Clone, PartialEq)]
pub struct VoucherDetails {
    pub reference: String,
    pub barcode_data: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub hosted_url: Option<String>,
}

/// Host-provided capability to present authentication UI.
///
/// The futures returned here model the external signals the orchestrator
/// waits on: return-to-foreground, voucher dismissal, challenge completion.
/// Implementations are UIKit/Compose/etc. adapters in the host app and
/// scripted fakes in tests.
#[async_trait]
pub trait AuthenticationContext: Send + Sync {
    /// Whether the host can present UI right now. A redirect or challenge
    /// without a presentation context fails immediately with a
    /// configuration error.
    fn can_present(&self) -> bool {
        true
    }

    /// Opens the surface's URL externally and resolves when the user returns
    /// to the app or dismisses the flow.
    async fn open_redirect(&self, surface: &PresentationSurface) -> RedirectDisposition;

    /// Shows static voucher instructions and resolves on dismissal.
    async fn show_voucher(&self, voucher: &VoucherDetails) -> VoucherDisposition;

    /// Drives the 3DS2 challenge UI and resolves with its outcome.
    async fn perform_challenge(&self, request: &ChallengeRequest) -> ChallengeDisposition;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_is_idempotent_when_nothing_is_presented() {
        let mut presenter = UiPresenter::new();
        assert!(presenter.active_surface().is_none());
        presenter.cleanup();
        assert!(presenter.active_surface().is_none());
        presenter.cleanup();
        assert!(presenter.active_surface().is_none());
    }

    #[test]
    fn presenter_retains_exactly_one_surface() {
        let mut presenter = UiPresenter::new();
        let first_id = presenter.create_surface("https://bank.example.com/a").id;
        let second = presenter.create_surface("https://bank.example.com/b");
        assert_ne!(second.id, first_id);
        assert_eq!(
            presenter.active_surface().map(|s| s.url.as_str()),
            Some("https://bank.example.com/b")
        );

        presenter.cleanup();
        assert!(presenter.active_surface().is_none());
    }
}
