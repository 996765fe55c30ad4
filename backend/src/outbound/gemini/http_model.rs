//! Reqwest-backed Gemini adapter.
//!
//! Owns transport details only: request serialisation, timeout and HTTP
//! error mapping, and extracting the reply text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{ErrorEnvelopeDto, GenerateRequestDto, GenerateResponseDto};
use crate::domain::Language;
use crate::domain::ports::{AdvisoryModel, AdvisoryModelError, AdvisoryRequest};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Connection settings for the Gemini API.
pub struct GeminiConfig {
    /// API root, e.g. `https://generativelanguage.googleapis.com/v1beta/`.
    pub base_url: Url,
    pub model: String,
    pub api_key: Zeroizing<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// `AdvisoryModel` adapter that calls `models/{model}:generateContent`.
pub struct GeminiHttpModel {
    client: Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
}

impl GeminiHttpModel {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AdvisoryModelError::Transport`] when the endpoint URL cannot
    /// be formed or the reqwest client cannot be constructed.
    pub fn new(config: GeminiConfig) -> Result<Self, AdvisoryModelError> {
        let endpoint = generate_endpoint(&config.base_url, &config.model)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| AdvisoryModelError::transport(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key,
        })
    }
}

#[async_trait]
impl AdvisoryModel for GeminiHttpModel {
    async fn generate(&self, request: &AdvisoryRequest) -> Result<String, AdvisoryModelError> {
        let system = system_instruction(&request.language);
        let body = GenerateRequestDto::new(&system, &request.prompt);
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, bytes.as_ref()));
        }
        debug!(bytes = bytes.len(), "advisory model replied");
        parse_reply(bytes.as_ref())
    }
}

fn generate_endpoint(base_url: &Url, model: &str) -> Result<Url, AdvisoryModelError> {
    let model = model.trim();
    if model.is_empty() {
        return Err(AdvisoryModelError::transport("model name must not be empty"));
    }
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(&format!("models/{model}:generateContent"))
        .map_err(|err| AdvisoryModelError::transport(format!("invalid model endpoint: {err}")))
}

fn system_instruction(language: &Language) -> String {
    format!(
        "You are FarmWise, an assistant for smallholder farmers and conscious \
         consumers. Give practical, sustainable agriculture and food advice in \
         plain language. Prefer organic and low-input practices. Respond in {language}."
    )
}

fn parse_reply(body: &[u8]) -> Result<String, AdvisoryModelError> {
    let decoded: GenerateResponseDto = serde_json::from_slice(body).map_err(|error| {
        AdvisoryModelError::decode(format!("invalid generateContent payload: {error}"))
    })?;
    decoded.into_text().ok_or_else(AdvisoryModelError::empty_response)
}

fn map_transport_error(error: reqwest::Error) -> AdvisoryModelError {
    if error.is_timeout() {
        AdvisoryModelError::timeout(error.to_string())
    } else {
        AdvisoryModelError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AdvisoryModelError {
    let message = serde_json::from_slice::<ErrorEnvelopeDto>(body)
        .map(|envelope| envelope.error.message)
        .ok()
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| body_preview(body));
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            AdvisoryModelError::timeout(format!("status {}", status.as_u16()))
        }
        _ => AdvisoryModelError::upstream(status.as_u16(), message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Coverage for the non-network helpers.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://generativelanguage.googleapis.com/v1beta/")]
    #[case("https://generativelanguage.googleapis.com/v1beta")]
    fn endpoint_appends_model_path(#[case] base: &str) {
        let base = Url::parse(base).expect("url");
        let endpoint = generate_endpoint(&base, "gemini-1.5-flash").expect("endpoint");
        assert_eq!(
            endpoint.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn request_body_carries_prompt_and_language() {
        let system = system_instruction(&Language::new("Swahili"));
        let body = serde_json::to_value(GenerateRequestDto::new(&system, "When to plant maize?"))
            .expect("encode");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "When to plant maize?");
        let instruction = body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .expect("system text");
        assert!(instruction.ends_with("Respond in swahili."));
    }

    #[test]
    fn joins_candidate_parts() {
        let body = br#"{"candidates":[{"content":{"parts":[{"text":"Plant "},{"text":"after rains. "}]}}]}"#;
        assert_eq!(parse_reply(body).expect("reply"), "Plant after rains.");
    }

    #[rstest]
    #[case(br#"{"candidates":[]}"#.as_slice())]
    #[case(br#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#.as_slice())]
    #[case(br#"{"candidates":[{"finishReason":"SAFETY"}]}"#.as_slice())]
    fn empty_candidates_are_rejected(#[case] body: &[u8]) {
        assert_eq!(parse_reply(body), Err(AdvisoryModelError::EmptyResponse));
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let error = parse_reply(b"<html>").expect_err("not json");
        assert!(matches!(error, AdvisoryModelError::Decode { .. }));
    }

    #[rstest]
    #[case(StatusCode::TOO_MANY_REQUESTS, br#"{"error":{"message":"quota exhausted"}}"#.as_slice(), "quota exhausted")]
    #[case(StatusCode::BAD_GATEWAY, b"upstream   down".as_slice(), "upstream down")]
    fn status_errors_keep_the_upstream_message(
        #[case] status: StatusCode,
        #[case] body: &[u8],
        #[case] message: &str,
    ) {
        assert_eq!(
            map_status_error(status, body),
            AdvisoryModelError::upstream(status.as_u16(), message)
        );
    }

    #[test]
    fn gateway_timeout_maps_to_timeout() {
        let error = map_status_error(StatusCode::GATEWAY_TIMEOUT, b"");
        assert!(matches!(error, AdvisoryModelError::Timeout { .. }));
    }
}
