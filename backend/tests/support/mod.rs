//! Shared helpers for backend integration tests.
//!
//! Each test binary includes this module, so helpers unused by one binary are
//! expected.
#![allow(dead_code)]

pub mod cluster_skip;
pub mod embedded_postgres;
pub mod pg_embed;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use serde_json::{Value, json};

use farmwise::Trace;
use farmwise::inbound::http::api_scope;
use farmwise::inbound::http::validation::json_config;
use farmwise::test_support::TestPorts;

/// Initialise the full `/api` surface over in-memory ports.
pub async fn init_app(
    ports: &TestPorts,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    actix_test::init_service(
        App::new()
            .app_data(web::Data::new(ports.http_state()))
            .app_data(json_config())
            .wrap(Trace)
            .service(api_scope()),
    )
    .await
}

/// Dispatch a request and decode the JSON body, treating an empty body as `null`.
pub async fn send<S, B>(app: &S, request: actix_test::TestRequest) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let response = actix_test::call_service(app, request.to_request()).await;
    let status = response.status();
    let body = actix_test::read_body(response).await;
    if body.is_empty() {
        return (status, Value::Null);
    }
    let value = serde_json::from_slice(&body)
        .unwrap_or_else(|err| panic!("{status} body is not JSON ({err}): {body:?}"));
    (status, value)
}

/// Body for `POST /api/chat/message`.
pub fn chat_message(user_id: &str, session_id: &str, message: &str) -> Value {
    json!({
        "userId": user_id,
        "sessionId": session_id,
        "message": message,
    })
}
