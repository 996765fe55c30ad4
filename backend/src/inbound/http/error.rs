//! Domain errors rendered as the shared JSON envelope.
//!
//! Internal failures are replaced by a generic message before leaving the
//! process; the trace id survives so operators can find the log line.
//! Upstream failures keep their message because it names the collaborator
//! (AI model, payment gateway) the client should retry against.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use tracing::{error, info, warn};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Result type returned by every handler.
pub type ApiResult<T> = Result<T, Error>;

const REDACTED_MESSAGE: &str = "Internal server error";

/// Client-safe copy of `error`.
fn public_view(error: &Error) -> Error {
    if error.code() != ErrorCode::InternalError {
        return error.clone();
    }
    let redacted = Error::internal(REDACTED_MESSAGE);
    match error.trace_id() {
        Some(id) => redacted.with_trace_id(id),
        None => redacted,
    }
}

fn log_failure(error: &Error, status: StatusCode) {
    let trace_id = error.trace_id().unwrap_or("-");
    match error.code() {
        ErrorCode::InternalError => {
            error!(%trace_id, message = %error.message(), "internal error");
        }
        ErrorCode::UpstreamFailure | ErrorCode::ServiceUnavailable => {
            warn!(%trace_id, status = status.as_u16(), message = %error.message(), "dependency failure");
        }
        ErrorCode::Forbidden if error.upgrade_required() => {
            info!(%trace_id, "request refused pending upgrade");
        }
        _ => {}
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.code() {
            ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::UpstreamFailure | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        log_failure(self, status);

        let mut response = HttpResponse::build(status);
        if let Some(id) = self.trace_id() {
            response.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        response.json(public_view(self))
    }
}

#[cfg(test)]
mod tests;
