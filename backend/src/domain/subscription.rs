//! Paid plans and the payment records exchanged with the gateway.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Email, SubscriptionTier, UserId};

/// Plans that can be purchased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Premium,
    Pro,
}

impl SubscriptionPlan {
    /// Lowercase plan name used in metadata and URLs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Premium => "premium",
            Self::Pro => "pro",
        }
    }

    /// Tier granted once payment succeeds.
    pub const fn tier(self) -> SubscriptionTier {
        match self {
            Self::Premium => SubscriptionTier::Premium,
            Self::Pro => SubscriptionTier::Pro,
        }
    }
}

impl fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unknown plan name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("plan must be premium or pro (got {0})")]
pub struct UnknownPlan(pub String);

impl FromStr for SubscriptionPlan {
    type Err = UnknownPlan;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "premium" => Ok(Self::Premium),
            "pro" => Ok(Self::Pro),
            _ => Err(UnknownPlan(s.to_owned())),
        }
    }
}

/// Unique payment reference shared with the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentReference(String);

impl PaymentReference {
    /// Mint a fresh reference for a checkout.
    pub fn generate() -> Self {
        Self(format!("fw_{}", Uuid::new_v4().simple()))
    }

    /// Wrap a reference received from the gateway or a client.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let valid = !trimmed.is_empty()
            && trimmed.len() <= 100
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '='));
        valid.then(|| Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for PaymentReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checkout request sent to the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub reference: PaymentReference,
    pub email: Email,
    /// Amount in the currency's minor unit (kobo for NGN).
    pub amount_minor: u64,
    pub user_id: UserId,
    pub plan: SubscriptionPlan,
    /// Where the gateway redirects after payment.
    pub callback_url: String,
}

/// Hosted checkout returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    /// Hosted payment page to redirect the user to.
    pub authorization_url: String,
    pub access_code: String,
    #[schema(value_type = String)]
    pub reference: PaymentReference,
}

/// Gateway-reported transaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    Pending,
    Failed,
    Abandoned,
}

impl PaymentStatus {
    /// Map a gateway status string; unknown values are treated as pending.
    pub fn from_gateway(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" => Self::Success,
            "failed" | "reversed" => Self::Failed,
            "abandoned" => Self::Abandoned,
            _ => Self::Pending,
        }
    }
}

/// Verified transaction details, including the metadata attached at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentVerification {
    pub reference: PaymentReference,
    pub status: PaymentStatus,
    /// Taken from checkout metadata; absent for foreign transactions.
    pub user_id: Option<UserId>,
    pub plan: Option<SubscriptionPlan>,
}

/// Webhook notification decoded from the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// A charge completed; carries the same details as a verification.
    ChargeSucceeded(PaymentVerification),
    /// Any other event type, acknowledged without action.
    Ignored { event: String },
}

/// Outcome of applying a verified payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub status: PaymentStatus,
    #[schema(value_type = String)]
    pub reference: PaymentReference,
    /// Tier now held, when the payment was applied.
    pub subscription_tier: Option<SubscriptionTier>,
}

/// Subscription state reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub subscription_tier: SubscriptionTier,
    pub prompts_used: u32,
    /// Remaining free prompts; absent on paid tiers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompts_remaining: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_reference: Option<String>,
}
