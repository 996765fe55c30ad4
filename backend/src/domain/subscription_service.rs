//! Subscription purchase flow: checkout, webhook and verification.
//!
//! Applying a payment is idempotent per reference, so the webhook and the
//! redirect verification may both fire for the same charge.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ports::{PaymentGateway, SubscriptionChange, UserRepository};
use crate::domain::{
    CheckoutRequest, CheckoutSession, Error, FREE_PROMPT_LIMIT, PaymentOutcome,
    PaymentReference, PaymentStatus, PaymentVerification, SubscriptionPlan, SubscriptionStatus,
    SubscriptionTier, UserId, WebhookEvent,
};

/// Plan prices in the currency's minor unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanPricing {
    /// Premium plan price, e.g. kobo for NGN.
    pub premium_minor: u64,
    /// Pro plan price in the same unit.
    pub pro_minor: u64,
}

impl PlanPricing {
    /// Price of `plan` in minor units.
    pub fn amount_for(self, plan: SubscriptionPlan) -> u64 {
        match plan {
            SubscriptionPlan::Premium => self.premium_minor,
            SubscriptionPlan::Pro => self.pro_minor,
        }
    }
}

/// URLs the purchase flow sends users back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionUrls {
    /// Gateway callback, normally the backend's verify endpoint.
    pub callback_url: String,
    /// Frontend base URL for post-payment redirects.
    pub frontend_url: String,
}

/// Drives checkout, payment confirmation and tier status for users.
#[derive(Clone)]
pub struct SubscriptionService {
    users: Arc<dyn UserRepository>,
    gateway: Arc<dyn PaymentGateway>,
    pricing: PlanPricing,
    urls: SubscriptionUrls,
}

impl SubscriptionService {
    /// Build the service with fixed plan prices and redirect URLs.
    pub fn new(
        users: Arc<dyn UserRepository>,
        gateway: Arc<dyn PaymentGateway>,
        pricing: PlanPricing,
        urls: SubscriptionUrls,
    ) -> Self {
        Self {
            users,
            gateway,
            pricing,
            urls,
        }
    }

    /// Start a hosted checkout for `plan`.
    pub async fn initialize(
        &self,
        user_id: &UserId,
        plan: SubscriptionPlan,
    ) -> Result<CheckoutSession, Error> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))?;

        let request = CheckoutRequest {
            reference: PaymentReference::generate(),
            email: user.email,
            amount_minor: self.pricing.amount_for(plan),
            user_id: user_id.clone(),
            plan,
            callback_url: self.urls.callback_url.clone(),
        };
        let session = self.gateway.initialize(&request).await?;
        info!(user_id = %user_id, plan = %plan, reference = %session.reference, "checkout initialised");
        Ok(session)
    }

    /// Handle a signed gateway notification.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<Option<PaymentOutcome>, Error> {
        let valid = signature.is_some_and(|sig| self.gateway.verify_signature(payload, sig));
        if !valid {
            warn!("webhook signature rejected");
            return Err(Error::unauthorized("Invalid signature"));
        }

        match self.gateway.parse_webhook(payload)? {
            WebhookEvent::ChargeSucceeded(verification) => {
                self.apply(verification).await.map(Some)
            }
            WebhookEvent::Ignored { event } => {
                info!(event = %event, "webhook event ignored");
                Ok(None)
            }
        }
    }

    /// Verify a reference with the gateway and apply it on success.
    pub async fn verify(&self, reference: &PaymentReference) -> Result<PaymentOutcome, Error> {
        let verification = self.gateway.verify(reference).await?;
        if verification.status != PaymentStatus::Success {
            return Ok(PaymentOutcome {
                status: verification.status,
                reference: verification.reference,
                subscription_tier: None,
            });
        }
        self.apply(verification).await
    }

    /// Frontend URL to send the browser to after verification.
    ///
    /// Failures are logged and mapped to the failure page.
    pub async fn verification_redirect(&self, reference: &PaymentReference) -> String {
        let base = self.urls.frontend_url.trim_end_matches('/');
        match self.verify(reference).await {
            Ok(outcome) if outcome.status == PaymentStatus::Success => {
                format!("{base}/dashboard?payment=success&reference={reference}")
            }
            Ok(outcome) => {
                info!(reference = %reference, status = ?outcome.status, "payment not successful");
                format!("{base}/pricing?payment=failed&reference={reference}")
            }
            Err(err) => {
                warn!(reference = %reference, error = %err, "payment verification failed");
                format!("{base}/pricing?payment=failed&reference={reference}")
            }
        }
    }

    /// Current tier, usage and remaining free prompts for a user.
    pub async fn status(&self, user_id: &UserId) -> Result<SubscriptionStatus, Error> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))?;
        let prompts_remaining = (user.tier == SubscriptionTier::Free)
            .then(|| FREE_PROMPT_LIMIT.saturating_sub(user.prompts_used));
        Ok(SubscriptionStatus {
            subscription_tier: user.tier,
            prompts_used: user.prompts_used,
            prompts_remaining,
            subscription_reference: user.subscription_reference,
        })
    }

    async fn apply(&self, verification: PaymentVerification) -> Result<PaymentOutcome, Error> {
        let (Some(user_id), Some(plan)) = (verification.user_id.as_ref(), verification.plan) else {
            return Err(Error::invalid_request(
                "Payment metadata is missing the user or plan",
            ));
        };
        let tier = plan.tier();
        match self
            .users
            .apply_subscription(user_id, tier, verification.reference.as_ref())
            .await?
        {
            SubscriptionChange::Applied => {
                info!(user_id = %user_id, tier = %tier, reference = %verification.reference, "subscription upgraded");
            }
            SubscriptionChange::AlreadyApplied => {
                info!(reference = %verification.reference, "payment already applied");
            }
            SubscriptionChange::UnknownUser => return Err(Error::not_found("User not found")),
        }
        Ok(PaymentOutcome {
            status: PaymentStatus::Success,
            reference: verification.reference,
            subscription_tier: Some(tier),
        })
    }
}

#[cfg(test)]
#[path = "subscription_service_tests.rs"]
mod tests;
