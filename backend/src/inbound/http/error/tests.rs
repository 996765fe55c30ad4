//! Envelope rendering for each error category.

use super::*;
use actix_web::body::to_bytes;
use rstest::rstest;
use serde_json::{Value, json};

const TRACE: &str = "7d444840-9dc0-11d1-b245-5ffdce74fad2";

async fn render(error: &Error) -> (StatusCode, Option<String>, Value) {
    let response = error.error_response();
    let status = response.status();
    let trace = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = to_bytes(response.into_body()).await.expect("error body");
    let body = serde_json::from_slice(&bytes).expect("error body is JSON");
    (status, trace, body)
}

#[rstest]
#[case(Error::invalid_request("email is required"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("Invalid credentials"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("Pro subscription required"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("User not found"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("already applied"), StatusCode::CONFLICT)]
#[case(Error::upstream_failure("Paystack timed out"), StatusCode::INTERNAL_SERVER_ERROR)]
#[case(Error::service_unavailable("database offline"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("pool poisoned"), StatusCode::INTERNAL_SERVER_ERROR)]
fn categories_map_to_statuses(#[case] error: Error, #[case] expected: StatusCode) {
    assert_eq!(error.status_code(), expected);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted_but_keep_their_trace() {
    let error = Error::internal("postgres://user:secret@db refused")
        .with_trace_id(TRACE)
        .with_details(json!({"dsn": "postgres://user:secret@db"}));

    let (status, trace, body) = render(&error).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(trace.as_deref(), Some(TRACE));
    assert_eq!(body["code"], "internal_error");
    assert_eq!(body["message"], REDACTED_MESSAGE);
    assert_eq!(body["traceId"], TRACE);
    assert!(body.get("details").is_none());
}

#[rstest]
#[actix_web::test]
async fn validation_errors_keep_details() {
    let error = Error::invalid_request("quantity must be positive")
        .with_trace_id(TRACE)
        .with_details(json!({"field": "quantity"}));

    let (status, _, body) = render(&error).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "quantity must be positive");
    assert_eq!(body["details"]["field"], "quantity");
}

#[rstest]
#[actix_web::test]
async fn untraced_errors_send_no_trace_header() {
    let (_, trace, body) = render(&Error::not_found("Farm data not found")).await;
    assert_eq!(trace, None);
    assert!(body.get("traceId").is_none());
}

#[rstest]
#[actix_web::test]
async fn upstream_messages_reach_the_client() {
    let (_, _, body) = render(&Error::upstream_failure("AI model returned no content")).await;
    assert_eq!(body["code"], "upstream_failure");
    assert_eq!(body["message"], "AI model returned no content");
}

#[rstest]
#[actix_web::test]
async fn quota_refusals_carry_the_upgrade_flag() {
    let error = Error::forbidden("Free tier limit reached").requiring_upgrade();
    let (status, _, body) = render(&error).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["upgradeRequired"], true);
}

#[rstest]
fn public_view_leaves_client_errors_untouched() {
    let error = Error::forbidden("Premium subscription required").requiring_upgrade();
    assert_eq!(public_view(&error), error);
}
