//! Reqwest-backed Paystack gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::dto::{
    EnvelopeDto, InitializeDataDto, InitializeRequestDto, MetadataDto, TransactionDto, WebhookDto,
};
use super::signature;
use crate::domain::ports::{PaymentGateway, PaymentGatewayError};
use crate::domain::{
    CheckoutRequest, CheckoutSession, PaymentReference, PaymentVerification, WebhookEvent,
};

const CHARGE_SUCCESS: &str = "charge.success";

/// Connection settings for the Paystack API.
pub struct PaystackConfig {
    /// API root, normally `https://api.paystack.co/`.
    pub base_url: Url,
    /// Secret key used for bearer auth and webhook signatures.
    pub secret_key: Zeroizing<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// `PaymentGateway` adapter for Paystack.
pub struct PaystackHttpGateway {
    client: Client,
    base_url: Url,
    secret_key: Zeroizing<String>,
}

impl PaystackHttpGateway {
    /// Build the gateway with a reqwest client using the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentGatewayError::Transport`] when the client cannot be built.
    pub fn new(config: PaystackConfig) -> Result<Self, PaymentGatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| PaymentGatewayError::transport(err.to_string()))?;
        let mut base_url = config.base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client,
            base_url,
            secret_key: config.secret_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, PaymentGatewayError> {
        self.base_url
            .join(path)
            .map_err(|err| PaymentGatewayError::transport(format!("invalid endpoint: {err}")))
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PaymentGatewayError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| PaymentGatewayError::transport(err.to_string()))?;
        decode_envelope(status.as_u16(), body.as_ref())
    }
}

/// Unwrap `{status, message, data}`, mapping refusals to `Rejected`.
fn decode_envelope<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, PaymentGatewayError> {
    let envelope: EnvelopeDto<T> = serde_json::from_slice(body).map_err(|err| {
        if (200..300).contains(&status) {
            PaymentGatewayError::decode(format!("invalid Paystack payload: {err}"))
        } else {
            PaymentGatewayError::rejected(format!("status {status}"))
        }
    })?;
    if !envelope.status || !(200..300).contains(&status) {
        return Err(PaymentGatewayError::rejected(format!(
            "status {status}: {}",
            envelope.message
        )));
    }
    envelope
        .data
        .ok_or_else(|| PaymentGatewayError::decode("Paystack response has no data"))
}

#[async_trait]
impl PaymentGateway for PaystackHttpGateway {
    async fn initialize(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError> {
        let body = InitializeRequestDto {
            email: request.email.as_ref(),
            amount: request.amount_minor.to_string(),
            reference: request.reference.as_ref(),
            callback_url: &request.callback_url,
            metadata: MetadataDto {
                user_id: request.user_id.as_ref(),
                plan: request.plan.as_str(),
            },
        };
        let response = self
            .client
            .post(self.endpoint("transaction/initialize")?)
            .bearer_auth(self.secret_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|err| PaymentGatewayError::transport(err.to_string()))?;

        let data: InitializeDataDto = Self::read_envelope(response).await?;
        let reference = PaymentReference::parse(&data.reference).ok_or_else(|| {
            PaymentGatewayError::decode(format!("invalid payment reference {:?}", data.reference))
        })?;
        debug!(reference = %reference, "Paystack checkout created");
        Ok(CheckoutSession {
            authorization_url: data.authorization_url,
            access_code: data.access_code,
            reference,
        })
    }

    async fn verify(
        &self,
        reference: &PaymentReference,
    ) -> Result<PaymentVerification, PaymentGatewayError> {
        let response = self
            .client
            .get(self.endpoint(&format!("transaction/verify/{reference}"))?)
            .bearer_auth(self.secret_key.as_str())
            .send()
            .await
            .map_err(|err| PaymentGatewayError::transport(err.to_string()))?;

        let data: TransactionDto = Self::read_envelope(response).await?;
        data.into_verification().map_err(PaymentGatewayError::decode)
    }

    fn verify_signature(&self, payload: &[u8], signature: &str) -> bool {
        signature::verify(self.secret_key.as_bytes(), payload, signature)
    }

    fn parse_webhook(&self, payload: &[u8]) -> Result<WebhookEvent, PaymentGatewayError> {
        parse_webhook_payload(payload)
    }
}

/// Decode a webhook body. Events other than `charge.success` are ignored.
pub fn parse_webhook_payload(payload: &[u8]) -> Result<WebhookEvent, PaymentGatewayError> {
    let webhook: WebhookDto = serde_json::from_slice(payload)
        .map_err(|err| PaymentGatewayError::decode(format!("invalid webhook payload: {err}")))?;
    if webhook.event != CHARGE_SUCCESS {
        return Ok(WebhookEvent::Ignored {
            event: webhook.event,
        });
    }
    if webhook.data.is_null() {
        warn!("charge.success webhook without data");
        return Err(PaymentGatewayError::decode("charge.success webhook has no data"));
    }
    let data: TransactionDto = serde_json::from_value(webhook.data)
        .map_err(|err| PaymentGatewayError::decode(format!("invalid charge data: {err}")))?;
    data.into_verification()
        .map(WebhookEvent::ChargeSucceeded)
        .map_err(PaymentGatewayError::decode)
}
