//! Driven port for the generative model that answers farming questions.
//!
//! The domain owns the request shape so services stay adapter-agnostic.

use async_trait::async_trait;

use crate::domain::{Error, Language};

use super::define_port_error;

/// Prompt sent to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryRequest {
    /// Fully rendered prompt text.
    pub prompt: String,
    pub language: Language,
}

impl AdvisoryRequest {
    pub fn new(prompt: impl Into<String>, language: Language) -> Self {
        Self {
            prompt: prompt.into(),
            language,
        }
    }
}

define_port_error! {
    /// Errors surfaced while calling the model.
    pub enum AdvisoryModelError {
        /// Network transport failed before receiving a response.
        Transport { message: String } => "advisory model transport failed: {message}",
        /// Call exceeded the configured timeout.
        Timeout { message: String } => "advisory model timeout: {message}",
        /// Model API answered with a non-success status.
        Upstream { status: u16, message: String } =>
            "advisory model returned {status}: {message}",
        /// Response body could not be decoded.
        Decode { message: String } => "advisory model response decode failed: {message}",
        /// Model returned no usable text.
        EmptyResponse => "advisory model returned no content",
    }
}

impl From<AdvisoryModelError> for Error {
    fn from(value: AdvisoryModelError) -> Self {
        Error::upstream_failure(value.to_string())
    }
}

/// Text-generation backend answering farming questions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdvisoryModel: Send + Sync {
    /// Generate a reply for the prompt.
    async fn generate(&self, request: &AdvisoryRequest) -> Result<String, AdvisoryModelError>;
}
