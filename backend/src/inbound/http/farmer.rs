//! Farmer API handlers.
//!
//! ```text
//! GET  /api/farmer/{userId}
//! POST /api/farmer/{userId}
//! POST /api/farmer/{userId}/pests/analyze {"crop":"maize","symptoms":"holes in leaves"}
//! POST /api/farmer/{userId}/irrigation/schedule {"crop":"rice","soilType":"clay"}
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    Error, FarmData, FarmProfile, FarmValidationError, IrrigationPlan, IrrigationRequest,
    PestAnalysisRequest, PestReport,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, USER_ID, invalid_field, parse_user_id};

/// Pest symptoms to analyse.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PestAnalysisBody {
    pub crop: String,
    pub symptoms: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Inputs for an irrigation schedule.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IrrigationBody {
    pub crop: String,
    #[serde(default)]
    pub soil_type: Option<String>,
    #[serde(default)]
    pub climate: Option<String>,
    /// Hectares.
    #[serde(default)]
    pub farm_size: Option<f64>,
}

fn map_farm_error(err: FarmValidationError) -> Error {
    let field = match &err {
        FarmValidationError::EmptyField { field } | FarmValidationError::TooLong { field, .. } => {
            FieldName::new(*field)
        }
        FarmValidationError::NegativeFarmSize => FieldName::new("farmSize"),
    };
    invalid_field(field, err)
}

/// Stored farm document.
#[utoipa::path(
    get,
    path = "/api/farmer/{user_id}",
    params(("user_id" = String, Path, description = "User UUID")),
    responses(
        (status = 200, description = "Farm document", body = FarmData),
        (status = 404, description = "No farm document yet", body = Error)
    ),
    tags = ["farmer"],
    operation_id = "getFarmData"
)]
#[get("/{user_id}")]
pub async fn get_farm_data(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<FarmData>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    Ok(web::Json(state.farmers.farm_data(&user_id).await?))
}

/// Create or replace the editable farm fields.
#[utoipa::path(
    post,
    path = "/api/farmer/{user_id}",
    params(("user_id" = String, Path, description = "User UUID")),
    request_body = FarmProfile,
    responses(
        (status = 200, description = "Updated farm document", body = FarmData),
        (status = 400, description = "Invalid profile", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["farmer"],
    operation_id = "upsertFarmData"
)]
#[post("/{user_id}")]
pub async fn upsert_farm_data(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<FarmProfile>,
) -> ApiResult<web::Json<FarmData>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    let profile = payload.into_inner().validate().map_err(map_farm_error)?;
    Ok(web::Json(
        state.farmers.update_profile(&user_id, profile).await?,
    ))
}

/// Diagnose pest symptoms with the assistant and log the report.
#[utoipa::path(
    post,
    path = "/api/farmer/{user_id}/pests/analyze",
    params(("user_id" = String, Path, description = "User UUID")),
    request_body = PestAnalysisBody,
    responses(
        (status = 200, description = "Logged pest report", body = PestReport),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Unknown user", body = Error),
        (status = 500, description = "AI model failure", body = Error)
    ),
    tags = ["farmer"],
    operation_id = "analyzePests"
)]
#[post("/{user_id}/pests/analyze")]
pub async fn analyze_pests(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<PestAnalysisBody>,
) -> ApiResult<web::Json<PestReport>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    let body = payload.into_inner();
    let request = PestAnalysisRequest::try_new(&body.crop, &body.symptoms, body.location.as_deref())
        .map_err(map_farm_error)?;
    Ok(web::Json(
        state.farmers.analyze_pests(&user_id, request).await?,
    ))
}

/// Build an irrigation schedule with the assistant and log it.
#[utoipa::path(
    post,
    path = "/api/farmer/{user_id}/irrigation/schedule",
    params(("user_id" = String, Path, description = "User UUID")),
    request_body = IrrigationBody,
    responses(
        (status = 200, description = "Logged irrigation plan", body = IrrigationPlan),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Unknown user", body = Error),
        (status = 500, description = "AI model failure", body = Error)
    ),
    tags = ["farmer"],
    operation_id = "irrigationSchedule"
)]
#[post("/{user_id}/irrigation/schedule")]
pub async fn irrigation_schedule(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<IrrigationBody>,
) -> ApiResult<web::Json<IrrigationPlan>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    let body = payload.into_inner();
    let request = IrrigationRequest::try_new(
        &body.crop,
        body.soil_type.as_deref(),
        body.climate.as_deref(),
        body.farm_size,
    )
    .map_err(map_farm_error)?;
    Ok(web::Json(
        state.farmers.irrigation_schedule(&user_id, request).await?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SubscriptionTier;
    use crate::test_support::TestPorts;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    #[fixture]
    fn ports() -> TestPorts {
        TestPorts::default()
    }

    async fn call(ports: &TestPorts, request: actix_test::TestRequest) -> (StatusCode, Value) {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(ports.http_state()))
                .service(
                    web::scope("/api/farmer")
                        .service(get_farm_data)
                        .service(upsert_farm_data)
                        .service(analyze_pests)
                        .service(irrigation_schedule),
                ),
        )
        .await;
        let response = actix_test::call_service(&app, request.to_request()).await;
        let status = response.status();
        let body = actix_test::read_body(response).await;
        (status, serde_json::from_slice(&body).expect("json body"))
    }

    #[rstest]
    #[actix_web::test]
    async fn missing_document_is_not_found(ports: TestPorts) {
        let user = ports.seed_user("new@example.com", SubscriptionTier::Free, 0);
        let (status, _) = call(
            &ports,
            actix_test::TestRequest::get().uri(&format!("/api/farmer/{}", user.id)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn profile_upsert_then_read(ports: TestPorts) {
        let user = ports.seed_user("farm@example.com", SubscriptionTier::Free, 0);
        let uri = format!("/api/farmer/{}", user.id);
        let (status, body) = call(
            &ports,
            actix_test::TestRequest::post().uri(&uri).set_json(json!({
                "farmName": "Green Acres",
                "farmSize": 4.5,
                "crops": [{"name": "cassava"}]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["farmName"], "Green Acres");

        let (status, body) = call(&ports, actix_test::TestRequest::get().uri(&uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["crops"][0]["name"], "cassava");
        assert_eq!(body["pestReports"], json!([]));
    }

    #[rstest]
    #[case(json!({"farmSize": -1.0}), "farmSize")]
    #[case(json!({"farmName": "f".repeat(129)}), "farmName")]
    #[case(json!({"location": "l".repeat(257)}), "location")]
    #[case(json!({"soilType": "s".repeat(65)}), "soilType")]
    #[actix_web::test]
    async fn invalid_profile_fields_are_rejected(
        ports: TestPorts,
        #[case] payload: Value,
        #[case] field: &str,
    ) {
        let user = ports.seed_user("neg@example.com", SubscriptionTier::Free, 0);
        let (status, body) = call(
            &ports,
            actix_test::TestRequest::post()
                .uri(&format!("/api/farmer/{}", user.id))
                .set_json(payload),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], field);

        let (status, _) = call(
            &ports,
            actix_test::TestRequest::get().uri(&format!("/api/farmer/{}", user.id)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn pest_analysis_is_logged(ports: TestPorts) {
        let user = ports.seed_user("pest@example.com", SubscriptionTier::Free, 0);
        let (status, body) = call(
            &ports,
            actix_test::TestRequest::post()
                .uri(&format!("/api/farmer/{}/pests/analyze", user.id))
                .set_json(json!({"crop": "maize", "symptoms": "holes in leaves"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["treatment"], "Rotate maize with legumes.");

        let (_, document) = call(
            &ports,
            actix_test::TestRequest::get().uri(&format!("/api/farmer/{}", user.id)),
        )
        .await;
        assert_eq!(document["pestReports"][0]["crop"], "maize");
        let stored = ports.users.get(&user.id).expect("get").expect("user");
        assert_eq!(stored.prompts_used, 0);
    }

    #[rstest]
    #[actix_web::test]
    async fn irrigation_requires_a_crop(ports: TestPorts) {
        let user = ports.seed_user("dry@example.com", SubscriptionTier::Free, 0);
        let (status, body) = call(
            &ports,
            actix_test::TestRequest::post()
                .uri(&format!("/api/farmer/{}/irrigation/schedule", user.id))
                .set_json(json!({"crop": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], "crop");
    }

    #[rstest]
    #[actix_web::test]
    async fn irrigation_plan_is_returned(ports: TestPorts) {
        let user = ports.seed_user("wet@example.com", SubscriptionTier::Free, 0);
        let (status, body) = call(
            &ports,
            actix_test::TestRequest::post()
                .uri(&format!("/api/farmer/{}/irrigation/schedule", user.id))
                .set_json(json!({"crop": "rice", "soilType": "clay", "farmSize": 2.0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["crop"], "rice");
        assert_eq!(body["schedule"], "Rotate maize with legumes.");
    }
}
