//! Paystack request and response envelopes.
//!
//! Every Paystack response is `{status, message, data}`. Checkout metadata is
//! echoed back on verification and webhooks; it may arrive as an object, a
//! JSON-encoded string or be missing entirely.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{PaymentReference, PaymentStatus, PaymentVerification, UserId};

#[derive(Debug, Serialize)]
pub(super) struct InitializeRequestDto<'a> {
    pub(super) email: &'a str,
    /// Minor units, sent as a string as Paystack documents.
    pub(super) amount: String,
    pub(super) reference: &'a str,
    pub(super) callback_url: &'a str,
    pub(super) metadata: MetadataDto<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MetadataDto<'a> {
    pub(super) user_id: &'a str,
    pub(super) plan: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct EnvelopeDto<T> {
    pub(super) status: bool,
    #[serde(default)]
    pub(super) message: String,
    pub(super) data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(super) struct InitializeDataDto {
    pub(super) authorization_url: String,
    pub(super) access_code: String,
    pub(super) reference: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct TransactionDto {
    pub(super) reference: String,
    #[serde(default)]
    pub(super) status: String,
    #[serde(default)]
    pub(super) metadata: Value,
}

#[derive(Debug, Deserialize)]
pub(super) struct WebhookDto {
    pub(super) event: String,
    /// Shape depends on `event`; only `charge.success` is decoded further.
    #[serde(default)]
    pub(super) data: Value,
}

impl TransactionDto {
    /// Map into the domain verification, dropping metadata it cannot parse.
    pub(super) fn into_verification(self) -> Result<PaymentVerification, String> {
        let reference = PaymentReference::parse(&self.reference)
            .ok_or_else(|| format!("invalid payment reference {:?}", self.reference))?;
        let metadata = match self.metadata {
            Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::Null),
            other => other,
        };
        let field = |name: &str| metadata.get(name).and_then(Value::as_str);
        Ok(PaymentVerification {
            reference,
            status: PaymentStatus::from_gateway(&self.status),
            user_id: field("userId").and_then(|raw| UserId::new(raw).ok()),
            plan: field("plan").and_then(|raw| raw.parse().ok()),
        })
    }
}
