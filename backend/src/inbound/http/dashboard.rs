//! Public SDG dashboard handlers.
//!
//! ```text
//! GET  /api/dashboard/public
//! POST /api/dashboard/calculate
//! GET  /api/dashboard/export
//! ```

use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, get, post, web};

use crate::domain::{Error, SdgSnapshot};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Latest impact snapshot, or zeros before the first calculation.
#[utoipa::path(
    get,
    path = "/api/dashboard/public",
    responses(
        (status = 200, description = "Latest snapshot", body = SdgSnapshot),
        (status = 503, description = "Database unavailable", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "publicMetrics"
)]
#[get("/public")]
pub async fn public_metrics(state: web::Data<HttpState>) -> ApiResult<web::Json<SdgSnapshot>> {
    Ok(web::Json(state.sdg.public_metrics().await?))
}

/// Run the impact calculation now and return the new snapshot.
#[utoipa::path(
    post,
    path = "/api/dashboard/calculate",
    responses(
        (status = 200, description = "Newly recorded snapshot", body = SdgSnapshot),
        (status = 503, description = "Database unavailable", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "calculateImpact"
)]
#[post("/calculate")]
pub async fn calculate(state: web::Data<HttpState>) -> ApiResult<web::Json<SdgSnapshot>> {
    Ok(web::Json(state.sdg.calculate_daily_impact().await?))
}

/// Download the current snapshot as CSV.
#[utoipa::path(
    get,
    path = "/api/dashboard/export",
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String),
        (status = 503, description = "Database unavailable", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "exportImpact"
)]
#[get("/export")]
pub async fn export_csv(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let snapshot = state.sdg.public_metrics().await?;
    let filename = format!(
        "farmwise-sdg-impact-{}.csv",
        snapshot.recorded_at.format("%Y-%m-%d")
    );
    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .body(snapshot.to_csv()))
}
