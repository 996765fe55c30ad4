//! Paystack outbound adapter.
//!
//! HTTP implementation of the `PaymentGateway` port: hosted checkout,
//! transaction verification and signed webhook decoding.

mod dto;
mod http_gateway;
pub mod signature;

pub use http_gateway::{PaystackConfig, PaystackHttpGateway, parse_webhook_payload};
