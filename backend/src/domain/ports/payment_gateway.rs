//! Driven port for the hosted payment gateway.

use async_trait::async_trait;

use crate::domain::{
    CheckoutRequest, CheckoutSession, Error, PaymentReference, PaymentVerification, WebhookEvent,
};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced while calling the payment gateway.
    pub enum PaymentGatewayError {
        Transport { message: String } => "payment gateway transport failed: {message}",
        /// Gateway answered but refused the operation.
        Rejected { message: String } => "payment gateway rejected request: {message}",
        Decode { message: String } => "payment gateway response decode failed: {message}",
    }
}

impl From<PaymentGatewayError> for Error {
    fn from(value: PaymentGatewayError) -> Self {
        Error::upstream_failure(value.to_string())
    }
}

/// Hosted-checkout payment provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout for the request.
    async fn initialize(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError>;

    /// Look up the transaction state for `reference`.
    async fn verify(
        &self,
        reference: &PaymentReference,
    ) -> Result<PaymentVerification, PaymentGatewayError>;

    /// Check a webhook body against its signature header.
    fn verify_signature(&self, payload: &[u8], signature: &str) -> bool;

    /// Decode a webhook body whose signature has been checked.
    fn parse_webhook(&self, payload: &[u8]) -> Result<WebhookEvent, PaymentGatewayError>;
}
