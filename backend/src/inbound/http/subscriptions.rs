//! Subscription purchase handlers backed by the payment gateway.
//!
//! ```text
//! POST /api/subscriptions/initialize {"userId":"…","plan":"premium"}
//! POST /api/subscriptions/webhook            (x-paystack-signature)
//! GET  /api/subscriptions/verify/{reference} (302 to the frontend)
//! GET  /api/subscriptions/verify-json/{reference}
//! GET  /api/subscriptions/status/{userId}
//! ```

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    CheckoutSession, Error, PaymentOutcome, SubscriptionPlan, SubscriptionStatus,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, USER_ID, invalid_field, parse_reference, parse_user_id,
};

/// Header carrying the hex HMAC-SHA512 of the raw webhook body.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Checkout request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequest {
    pub user_id: String,
    /// `premium` or `pro`.
    pub plan: String,
}

/// Start a hosted checkout for a paid plan.
#[utoipa::path(
    post,
    path = "/api/subscriptions/initialize",
    request_body = InitializeRequest,
    responses(
        (status = 200, description = "Hosted checkout", body = CheckoutSession),
        (status = 400, description = "Invalid user or plan", body = Error),
        (status = 404, description = "Unknown user", body = Error),
        (status = 500, description = "Gateway failure", body = Error)
    ),
    tags = ["subscriptions"],
    operation_id = "initializeSubscription"
)]
#[post("/initialize")]
pub async fn initialize(
    state: web::Data<HttpState>,
    payload: web::Json<InitializeRequest>,
) -> ApiResult<web::Json<CheckoutSession>> {
    let InitializeRequest { user_id, plan } = payload.into_inner();
    let user_id = parse_user_id(&user_id, USER_ID)?;
    let plan: SubscriptionPlan = plan
        .parse()
        .map_err(|err| invalid_field(FieldName::new("plan"), err))?;
    Ok(web::Json(
        state.subscriptions.initialize(&user_id, plan).await?,
    ))
}

/// Gateway notification. The body is read raw so the signature covers the
/// exact bytes sent.
#[utoipa::path(
    post,
    path = "/api/subscriptions/webhook",
    request_body(content = String, content_type = "application/json"),
    params(("x-paystack-signature" = String, Header, description = "HMAC-SHA512 of the body")),
    responses(
        (status = 200, description = "Event accepted"),
        (status = 401, description = "Missing or invalid signature", body = Error)
    ),
    tags = ["subscriptions"],
    operation_id = "subscriptionWebhook"
)]
#[post("/webhook")]
pub async fn webhook(
    state: web::Data<HttpState>,
    request: HttpRequest,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let signature = request
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    state.subscriptions.handle_webhook(&body, signature).await?;
    Ok(HttpResponse::Ok().finish())
}

/// Browser landing point after checkout; always redirects.
#[utoipa::path(
    get,
    path = "/api/subscriptions/verify/{reference}",
    params(("reference" = String, Path, description = "Payment reference")),
    responses(
        (status = 302, description = "Redirect to the dashboard or pricing page"),
        (status = 400, description = "Malformed reference", body = Error)
    ),
    tags = ["subscriptions"],
    operation_id = "verifySubscriptionRedirect"
)]
#[get("/verify/{reference}")]
pub async fn verify_redirect(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let reference = parse_reference(&path.into_inner())?;
    let location = state.subscriptions.verification_redirect(&reference).await;
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish())
}

/// Verify a payment by reference and report the outcome as JSON.
#[utoipa::path(
    get,
    path = "/api/subscriptions/verify-json/{reference}",
    params(("reference" = String, Path, description = "Payment reference")),
    responses(
        (status = 200, description = "Verification outcome", body = PaymentOutcome),
        (status = 400, description = "Malformed reference or metadata", body = Error),
        (status = 500, description = "Gateway failure", body = Error)
    ),
    tags = ["subscriptions"],
    operation_id = "verifySubscription"
)]
#[get("/verify-json/{reference}")]
pub async fn verify_json(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<PaymentOutcome>> {
    let reference = parse_reference(&path.into_inner())?;
    Ok(web::Json(state.subscriptions.verify(&reference).await?))
}

/// Subscription tier and quota for a user.
#[utoipa::path(
    get,
    path = "/api/subscriptions/status/{user_id}",
    params(("user_id" = String, Path, description = "User UUID")),
    responses(
        (status = 200, description = "Tier and prompt usage", body = SubscriptionStatus),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["subscriptions"],
    operation_id = "subscriptionStatus"
)]
#[get("/status/{user_id}")]
pub async fn status(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<SubscriptionStatus>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    Ok(web::Json(state.subscriptions.status(&user_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        PaymentReference, PaymentStatus, PaymentVerification, SubscriptionTier, UserAccount,
    };
    use crate::test_support::{FRONTEND_URL, StubPaymentGateway, TestPorts};
    use actix_web::dev::ServiceResponse;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    #[fixture]
    fn ports() -> TestPorts {
        TestPorts::default()
    }

    async fn call(ports: &TestPorts, request: actix_test::TestRequest) -> ServiceResponse {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(ports.http_state()))
                .service(
                    web::scope("/api/subscriptions")
                        .service(initialize)
                        .service(webhook)
                        .service(verify_redirect)
                        .service(verify_json)
                        .service(status),
                ),
        )
        .await;
        actix_test::call_service(&app, request.to_request()).await
    }

    async fn json(response: ServiceResponse) -> Value {
        let body = actix_test::read_body(response).await;
        serde_json::from_slice(&body).expect("json body")
    }

    fn charge_success(user: &UserAccount, plan: &str) -> Vec<u8> {
        json!({
            "event": "charge.success",
            "data": {
                "reference": "fw_webhook1",
                "status": "success",
                "metadata": {"userId": user.id.to_string(), "plan": plan}
            }
        })
        .to_string()
        .into_bytes()
    }

    fn settled(user: &UserAccount, reference: &str, payment_status: PaymentStatus) -> PaymentVerification {
        PaymentVerification {
            reference: PaymentReference::parse(reference).expect("reference"),
            status: payment_status,
            user_id: Some(user.id.clone()),
            plan: Some(SubscriptionPlan::Premium),
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn initialize_prices_the_plan(ports: TestPorts) {
        let user = ports.seed_user("buyer@example.com", SubscriptionTier::Free, 2);
        let response = call(
            &ports,
            actix_test::TestRequest::post()
                .uri("/api/subscriptions/initialize")
                .set_json(json!({"userId": user.id.to_string(), "plan": "pro"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        let reference = body["reference"].as_str().expect("reference").to_owned();
        assert!(reference.starts_with("fw_"));
        assert_eq!(
            body["authorizationUrl"],
            format!("https://checkout.test/{reference}")
        );

        let checkouts = ports.gateway.checkouts();
        assert_eq!(checkouts.len(), 1);
        assert_eq!(checkouts[0].amount_minor, 1_500_000);
        assert_eq!(checkouts[0].email.as_ref(), "buyer@example.com");
    }

    #[rstest]
    #[case("free")]
    #[case("platinum")]
    #[actix_web::test]
    async fn initialize_rejects_unknown_plans(ports: TestPorts, #[case] plan: &str) {
        let user = ports.seed_user("buyer@example.com", SubscriptionTier::Free, 0);
        let response = call(
            &ports,
            actix_test::TestRequest::post()
                .uri("/api/subscriptions/initialize")
                .set_json(json!({"userId": user.id.to_string(), "plan": plan})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["details"]["field"], "plan");
    }

    #[rstest]
    #[actix_web::test]
    async fn signed_webhook_upgrades_and_resets(ports: TestPorts) {
        let user = ports.seed_user("hook@example.com", SubscriptionTier::Free, 5);
        let payload = charge_success(&user, "pro");
        let response = call(
            &ports,
            actix_test::TestRequest::post()
                .uri("/api/subscriptions/webhook")
                .insert_header((SIGNATURE_HEADER, StubPaymentGateway::sign(&payload)))
                .insert_header((header::CONTENT_TYPE, "application/json"))
                .set_payload(payload),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let stored = ports.users.get(&user.id).expect("get").expect("user");
        assert_eq!(stored.tier, SubscriptionTier::Pro);
        assert_eq!(stored.prompts_used, 0);
    }

    #[rstest]
    #[case(Some("deadbeef"))]
    #[case(None)]
    #[actix_web::test]
    async fn unsigned_webhook_is_rejected(ports: TestPorts, #[case] signature: Option<&str>) {
        let user = ports.seed_user("forged@example.com", SubscriptionTier::Free, 5);
        let mut request = actix_test::TestRequest::post()
            .uri("/api/subscriptions/webhook")
            .set_payload(charge_success(&user, "pro"));
        if let Some(signature) = signature {
            request = request.insert_header((SIGNATURE_HEADER, signature));
        }
        let response = call(&ports, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let stored = ports.users.get(&user.id).expect("get").expect("user");
        assert_eq!(stored.tier, SubscriptionTier::Free);
    }

    #[rstest]
    #[case(PaymentStatus::Success, "/dashboard?payment=success&reference=fw_paid1")]
    #[case(PaymentStatus::Abandoned, "/pricing?payment=failed&reference=fw_paid1")]
    #[actix_web::test]
    async fn verify_redirects_to_frontend(
        ports: TestPorts,
        #[case] outcome: PaymentStatus,
        #[case] suffix: &str,
    ) {
        let user = ports.seed_user("redirect@example.com", SubscriptionTier::Free, 1);
        ports.gateway.settle(settled(&user, "fw_paid1", outcome));

        let response = call(
            &ports,
            actix_test::TestRequest::get().uri("/api/subscriptions/verify/fw_paid1"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        assert_eq!(location, Some(format!("{FRONTEND_URL}{suffix}")));
    }

    #[rstest]
    #[actix_web::test]
    async fn verify_json_then_status_reports_paid_tier(ports: TestPorts) {
        let user = ports.seed_user("json@example.com", SubscriptionTier::Free, 4);
        ports
            .gateway
            .settle(settled(&user, "fw_paid2", PaymentStatus::Success));

        let response = call(
            &ports,
            actix_test::TestRequest::get().uri("/api/subscriptions/verify-json/fw_paid2"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["subscriptionTier"], "premium");

        let response = call(
            &ports,
            actix_test::TestRequest::get().uri(&format!("/api/subscriptions/status/{}", user.id)),
        )
        .await;
        let body = json(response).await;
        assert_eq!(body["subscriptionTier"], "premium");
        assert_eq!(body["promptsUsed"], 0);
        assert!(body.get("promptsRemaining").is_none());
    }

    #[rstest]
    #[actix_web::test]
    async fn free_status_reports_remaining_prompts(ports: TestPorts) {
        let user = ports.seed_user("count@example.com", SubscriptionTier::Free, 2);
        let response = call(
            &ports,
            actix_test::TestRequest::get().uri(&format!("/api/subscriptions/status/{}", user.id)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["promptsRemaining"], 3);
    }
}
