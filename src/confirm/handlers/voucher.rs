use crate::confirm::handlers::{ActionHandler, HandlerOutcome};
use crate::confirm::params::ActionParams;
use crate::confirm::presenter::{VoucherDetails, VoucherDisposition};
use crate::error::{ConfirmError, ConfirmResult};
use crate::intents::types::{ActionGroup, NextAction, NextActionKind};
use async_trait::async_trait;
use tracing::info;

/// Hands static payment instructions to the host UI and waits for the
/// reported dismissal. No network follow-up is initiated from here;
/// settlement for voucher rails happens out of band.
pub struct VoucherHandler;

#[async_trait]
impl ActionHandler for VoucherHandler {
    fn name(&self) -> &'static str {
        "voucher"
    }

    fn can_handle(&self, kind: NextActionKind) -> bool {
        kind.group() == Some(ActionGroup::Voucher)
    }

    async fn execute(&self, params: &mut ActionParams) -> ConfirmResult<HandlerOutcome> {
        let details = match params.intent.next_action.as_ref() {
            Some(NextAction::DisplayVoucher {
                reference,
                barcode_data,
                expires_at,
                hosted_url,
            }) => VoucherDetails {
                reference: reference.clone(),
                barcode_data: barcode_data.clone(),
                expires_at: *expires_at,
                hosted_url: hosted_url.clone(),
            },
            Some(NextAction::DisplayPaymentCode { code, expires_at }) => VoucherDetails {
                reference: code.clone(),
                barcode_data: None,
                expires_at: *expires_at,
                hosted_url: None,
            },
            _ => {
                return Err(ConfirmError::MalformedAction {
                    message: "voucher action is missing its display payload".to_string(),
                })
            }
        };

        info!(
            intent_id = %params.intent.id,
            reference = %details.reference,
            "displaying payment voucher"
        );
        match params.context.show_voucher(&details).await {
            VoucherDisposition::Dismissed => Ok(HandlerOutcome::Pending),
            VoucherDisposition::Abandoned => Ok(HandlerOutcome::Canceled),
        }
    }
}
