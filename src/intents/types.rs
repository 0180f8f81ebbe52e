use crate::intents::error::IntentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// Whether an intent represents a payment or the setup of a payment method
/// for later use. Both flavors share one state machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Payment,
    Setup,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
}

impl IntentStatus {
    /// Terminal statuses never transition again server-side.
    pub fn is_terminal(&self) -> bool {
        matches!(self, IntentStatus::Succeeded | IntentStatus::Canceled)
    }

    /// Statuses that may still resolve on their own while the client waits.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            IntentStatus::Processing
                | IntentStatus::RequiresAction
                | IntentStatus::RequiresConfirmation
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentStatus::RequiresPaymentMethod => "requires_payment_method",
            IntentStatus::RequiresConfirmation => "requires_confirmation",
            IntentStatus::RequiresAction => "requires_action",
            IntentStatus::Processing => "processing",
            IntentStatus::RequiresCapture => "requires_capture",
            IntentStatus::Canceled => "canceled",
            IntentStatus::Succeeded => "succeeded",
        }
    }
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    Card,
    BankTransfer,
    MobileMoney,
    Wallet,
    Upi,
    Blik,
    Other,
}

impl PaymentMethodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodType::Card => "card",
            PaymentMethodType::BankTransfer => "bank_transfer",
            PaymentMethodType::MobileMoney => "mobile_money",
            PaymentMethodType::Wallet => "wallet",
            PaymentMethodType::Upi => "upi",
            PaymentMethodType::Blik => "blik",
            PaymentMethodType::Other => "other",
        }
    }
}

impl std::fmt::Display for PaymentMethodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentMethodType {
    type Err = IntentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "card" => Ok(PaymentMethodType::Card),
            "bank_transfer" => Ok(PaymentMethodType::BankTransfer),
            "mobile_money" => Ok(PaymentMethodType::MobileMoney),
            "wallet" => Ok(PaymentMethodType::Wallet),
            "upi" => Ok(PaymentMethodType::Upi),
            "blik" => Ok(PaymentMethodType::Blik),
            "other" => Ok(PaymentMethodType::Other),
            _ => Err(IntentError::Decode {
                message: format!("unsupported payment method type: {}", value),
            }),
        }
    }
}

/// Parameters the directory server returned for a 3DS2 challenge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChallengeParams {
    pub directory_server_id: String,
    pub server_transaction_id: String,
    pub acs_url: String,
    pub directory_server_cert: Option<String>,
    pub message_version: Option<String>,
}

/// Server-specified instruction for what the client must do before the
/// intent can proceed. A new intent fetch produces a new descriptor;
/// unrecognized instructions decode as `Unknown`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NextAction {
    RedirectToUrl {
        url: String,
        return_url: Option<String>,
    },
    WalletAppRedirect {
        native_url: String,
        fallback_url: Option<String>,
    },
    DisplayVoucher {
        reference: String,
        barcode_data: Option<String>,
        expires_at: Option<DateTime<Utc>>,
        hosted_url: Option<String>,
    },
    DisplayPaymentCode {
        code: String,
        expires_at: Option<DateTime<Utc>>,
    },
    DisplayQrCode {
        data: String,
        image_url: Option<String>,
        hosted_url: Option<String>,
    },
    AwaitAuthorization {
        reference: Option<String>,
    },
    VerifyMicrodeposits {
        arrival_estimate: Option<DateTime<Utc>>,
        hosted_url: Option<String>,
    },
    ChallengeRequired {
        params: ChallengeParams,
    },
    #[serde(other)]
    Unknown,
}

impl NextAction {
    pub fn kind(&self) -> NextActionKind {
        match self {
            NextAction::RedirectToUrl { .. } => NextActionKind::RedirectToUrl,
            NextAction::WalletAppRedirect { .. } => NextActionKind::WalletAppRedirect,
            NextAction::DisplayVoucher { .. } => NextActionKind::DisplayVoucher,
            NextAction::DisplayPaymentCode { .. } => NextActionKind::DisplayPaymentCode,
            NextAction::DisplayQrCode { .. } => NextActionKind::DisplayQrCode,
            NextAction::AwaitAuthorization { .. } => NextActionKind::AwaitAuthorization,
            NextAction::VerifyMicrodeposits { .. } => NextActionKind::VerifyMicrodeposits,
            NextAction::ChallengeRequired { .. } => NextActionKind::ChallengeRequired,
            NextAction::Unknown => NextActionKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NextActionKind {
    RedirectToUrl,
    WalletAppRedirect,
    DisplayVoucher,
    DisplayPaymentCode,
    DisplayQrCode,
    AwaitAuthorization,
    VerifyMicrodeposits,
    ChallengeRequired,
    Unknown,
}

impl NextActionKind {
    pub const ALL: [NextActionKind; 9] = [
        NextActionKind::RedirectToUrl,
        NextActionKind::WalletAppRedirect,
        NextActionKind::DisplayVoucher,
        NextActionKind::DisplayPaymentCode,
        NextActionKind::DisplayQrCode,
        NextActionKind::AwaitAuthorization,
        NextActionKind::VerifyMicrodeposits,
        NextActionKind::ChallengeRequired,
        NextActionKind::Unknown,
    ];

    /// The handler group an action kind belongs to. `Unknown` belongs to no
    /// group and therefore resolves to no handler.
    pub fn group(&self) -> Option<ActionGroup> {
        match self {
            NextActionKind::RedirectToUrl | NextActionKind::WalletAppRedirect => {
                Some(ActionGroup::Redirect)
            }
            NextActionKind::DisplayVoucher | NextActionKind::DisplayPaymentCode => {
                Some(ActionGroup::Voucher)
            }
            NextActionKind::DisplayQrCode
            | NextActionKind::AwaitAuthorization
            | NextActionKind::VerifyMicrodeposits => Some(ActionGroup::Poll),
            NextActionKind::ChallengeRequired => Some(ActionGroup::Challenge),
            NextActionKind::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionGroup {
    Redirect,
    Voucher,
    Poll,
    Challenge,
}

/// Snapshot of a server-side payment or setup attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub id: String,
    pub kind: IntentKind,
    pub client_secret: String,
    pub status: IntentStatus,
    pub amount_minor: Option<i64>,
    pub currency: Option<String>,
    pub payment_method_type: Option<PaymentMethodType>,
    pub payment_method_types: Vec<PaymentMethodType>,
    pub next_action: Option<NextAction>,
    pub created: Option<DateTime<Utc>>,
    pub livemode: bool,
}

impl Intent {
    /// Kind of the attached next action, if any.
    pub fn next_action_kind(&self) -> Option<NextActionKind> {
        self.next_action.as_ref().map(NextAction::kind)
    }
}

/// Request to confirm an intent with the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmIntentRequest {
    pub client_secret: String,
    pub payment_method_type: Option<PaymentMethodType>,
    pub return_url: Option<String>,
    pub idempotency_key: Option<String>,
    pub metadata: Option<JsonValue>,
}

/// Components parsed out of a client secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSecret {
    pub intent_id: String,
    pub kind: IntentKind,
}

/// Parses a client secret of the form `pi_<id>_secret_<nonce>` (payment) or
/// `seti_<id>_secret_<nonce>` (setup) into its intent id and kind.
pub fn parse_client_secret(raw: &str) -> Result<ClientSecret, IntentError> {
    let trimmed = raw.trim();
    let (kind, prefix) = if trimmed.starts_with("pi_") {
        (IntentKind::Payment, "pi_")
    } else if trimmed.starts_with("seti_") {
        (IntentKind::Setup, "seti_")
    } else {
        return Err(IntentError::InvalidClientSecret {
            message: "client secret must start with pi_ or seti_".to_string(),
        });
    };

    let Some(marker) = trimmed.find("_secret_") else {
        return Err(IntentError::InvalidClientSecret {
            message: "client secret is missing the _secret_ segment".to_string(),
        });
    };

    let intent_id = &trimmed[..marker];
    let nonce = &trimmed[marker + "_secret_".len()..];
    if intent_id.len() <= prefix.len() || nonce.is_empty() {
        return Err(IntentError::InvalidClientSecret {
            message: "client secret is truncated".to_string(),
        });
    }

    Ok(ClientSecret {
        intent_id: intent_id.to_string(),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenge_action() -> NextAction {
        NextAction::ChallengeRequired {
            params: ChallengeParams {
                directory_server_id: "A000000003".to_string(),
                server_transaction_id: "c2d47d77-9377-4b16-9e0a-8f2c45a6f5f4".to_string(),
                acs_url: "https://acs.example.com/challenge".to_string(),
                directory_server_cert: None,
                message_version: Some("2.2.0".to_string()),
            },
        }
    }

    #[test]
    fn action_kinds_map_to_disjoint_groups() {
        for kind in NextActionKind::ALL {
            match kind {
                NextActionKind::RedirectToUrl | NextActionKind::WalletAppRedirect => {
                    assert_eq!(kind.group(), Some(ActionGroup::Redirect))
                }
                NextActionKind::DisplayVoucher | NextActionKind::DisplayPaymentCode => {
                    assert_eq!(kind.group(), Some(ActionGroup::Voucher))
                }
                NextActionKind::DisplayQrCode
                | NextActionKind::AwaitAuthorization
                | NextActionKind::VerifyMicrodeposits => {
                    assert_eq!(kind.group(), Some(ActionGroup::Poll))
                }
                NextActionKind::ChallengeRequired => {
                    assert_eq!(kind.group(), Some(ActionGroup::Challenge))
                }
                NextActionKind::Unknown => assert_eq!(kind.group(), None),
            }
        }
    }

    #[test]
    fn next_action_deserializes_from_tagged_json() {
        let payload = serde_json::json!({
            "type": "redirect_to_url",
            "url": "https://bank.example.com/authorize",
            "return_url": "paymesh://return"
        });
        let action: NextAction = serde_json::from_value(payload).expect("valid descriptor");
        assert_eq!(action.kind(), NextActionKind::RedirectToUrl);
    }

    #[test]
    fn unrecognized_next_action_decodes_as_unknown() {
        let payload = serde_json::json!({
            "type": "hologram_scan",
            "hologram_id": "h_123"
        });
        let action: NextAction = serde_json::from_value(payload).expect("should not fail");
        assert_eq!(action.kind(), NextActionKind::Unknown);
        assert_eq!(action.kind().group(), None);
    }

    #[test]
    fn challenge_action_exposes_its_params() {
        let action = challenge_action();
        assert_eq!(action.kind(), NextActionKind::ChallengeRequired);
        assert_eq!(action.kind().group(), Some(ActionGroup::Challenge));
    }

    #[test]
    fn client_secret_parsing_accepts_both_kinds() {
        let payment = parse_client_secret("pi_3Abc123_secret_x9y8z7").expect("payment secret");
        assert_eq!(payment.intent_id, "pi_3Abc123");
        assert_eq!(payment.kind, IntentKind::Payment);

        let setup = parse_client_secret("seti_1Def456_secret_q1w2e3").expect("setup secret");
        assert_eq!(setup.intent_id, "seti_1Def456");
        assert_eq!(setup.kind, IntentKind::Setup);
    }

    #[test]
    fn client_secret_parsing_rejects_malformed_input() {
        assert!(parse_client_secret("tok_visa").is_err());
        assert!(parse_client_secret("pi_3Abc123").is_err());
        assert!(parse_client_secret("pi__secret_x").is_err());
        assert!(parse_client_secret("pi_3Abc123_secret_").is_err());
    }

    #[test]
    fn status_helpers_classify_lifecycle() {
        assert!(IntentStatus::Succeeded.is_terminal());
        assert!(IntentStatus::Canceled.is_terminal());
        assert!(!IntentStatus::Processing.is_terminal());

        assert!(IntentStatus::Processing.is_in_flight());
        assert!(IntentStatus::RequiresAction.is_in_flight());
        assert!(!IntentStatus::RequiresPaymentMethod.is_in_flight());
        assert!(!IntentStatus::Succeeded.is_in_flight());
    }
}
