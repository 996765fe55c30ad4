//! Shared validation helpers for inbound HTTP adapters.

use std::fmt::Display;

use actix_web::web;
use serde_json::json;

use crate::domain::{Error, PaymentReference, SessionId, UserId};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidValue,
    InvalidBody,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::InvalidBody => "invalid_body",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

pub(crate) const USER_ID: FieldName = FieldName::new("userId");
pub(crate) const SESSION_ID: FieldName = FieldName::new("sessionId");
pub(crate) const REFERENCE: FieldName = FieldName::new("reference");

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

/// Map a domain validation failure onto a 400 naming the offending field.
pub(crate) fn invalid_field(field: FieldName, error: impl Display) -> Error {
    ValidationError::new(field.as_str(), error.to_string()).with_code(ErrorCode::InvalidValue)
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be a valid UUID"))
        .with_value(ErrorCode::InvalidUuid, value)
}

pub(crate) fn parse_user_id(value: &str, field: FieldName) -> Result<UserId, Error> {
    UserId::new(value).map_err(|_| invalid_uuid_error(field, value))
}

pub(crate) fn parse_session_id(value: &str) -> Result<SessionId, Error> {
    SessionId::new(value).map_err(|err| invalid_field(SESSION_ID, err))
}

pub(crate) fn parse_reference(value: &str) -> Result<PaymentReference, Error> {
    PaymentReference::parse(value).ok_or_else(|| {
        ValidationError::new(REFERENCE.as_str(), "reference is not a valid payment reference")
            .with_value(ErrorCode::InvalidValue, value)
    })
}

/// JSON extractor configuration that reports malformed bodies in the shared
/// error envelope instead of actix's plain-text default.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = format!("invalid JSON body: {err}");
        let error = ValidationError::new("body", message).with_code(ErrorCode::InvalidBody);
        actix_web::error::InternalError::from_response(
            err,
            actix_web::ResponseError::error_response(&error),
        )
        .into()
    })
}
