//! Consumer API handlers.
//!
//! ```text
//! GET  /api/consumer/{userId}
//! POST /api/consumer/{userId}
//! POST /api/consumer/{userId}/food-waste {"item":"bread","quantity":0.5}
//! POST /api/consumer/{userId}/carbon-footprint {"dietType":"vegan","weeklyMeals":21,"transportation":"bike"}
//! ```

use actix_web::{get, post, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    CarbonFootprintInput, CarbonFootprintRecord, ConsumerData, ConsumerProfile,
    ConsumerValidationError, Error, FoodWasteEntry,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, USER_ID, invalid_field, parse_user_id};

/// Food waste entry submitted by a consumer.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FoodWasteBody {
    pub item: String,
    pub quantity: f64,
    /// Defaults to `kg`.
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Weekly habits for a footprint estimate.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarbonFootprintBody {
    pub diet_type: String,
    pub weekly_meals: u32,
    pub transportation: String,
}

fn map_consumer_error(err: ConsumerValidationError) -> Error {
    let field = match err {
        ConsumerValidationError::EmptyItem => "item",
        ConsumerValidationError::InvalidQuantity => "quantity",
        ConsumerValidationError::EmptyDietType => "dietType",
        ConsumerValidationError::EmptyTransportation => "transportation",
        ConsumerValidationError::LocationTooLong { .. } => "location",
    };
    invalid_field(FieldName::new(field), err)
}

/// Fetch the consumer document.
#[utoipa::path(
    get,
    path = "/api/consumer/{user_id}",
    params(("user_id" = String, Path, description = "User UUID")),
    responses(
        (status = 200, description = "Consumer document", body = ConsumerData),
        (status = 404, description = "No consumer document yet", body = Error)
    ),
    tags = ["consumer"],
    operation_id = "getConsumerData"
)]
#[get("/{user_id}")]
pub async fn get_consumer_data(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<ConsumerData>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    Ok(web::Json(state.consumers.consumer_data(&user_id).await?))
}

/// Create or replace the household profile.
#[utoipa::path(
    post,
    path = "/api/consumer/{user_id}",
    params(("user_id" = String, Path, description = "User UUID")),
    request_body = ConsumerProfile,
    responses(
        (status = 200, description = "Updated consumer document", body = ConsumerData),
        (status = 400, description = "Invalid profile", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["consumer"],
    operation_id = "upsertConsumerData"
)]
#[post("/{user_id}")]
pub async fn upsert_consumer_data(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<ConsumerProfile>,
) -> ApiResult<web::Json<ConsumerData>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    let profile = payload.into_inner().validate().map_err(map_consumer_error)?;
    Ok(web::Json(
        state.consumers.update_profile(&user_id, profile).await?,
    ))
}

/// Append an item to the food waste log.
#[utoipa::path(
    post,
    path = "/api/consumer/{user_id}/food-waste",
    params(("user_id" = String, Path, description = "User UUID")),
    request_body = FoodWasteBody,
    responses(
        (status = 200, description = "Logged entry", body = FoodWasteEntry),
        (status = 400, description = "Invalid entry", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["consumer"],
    operation_id = "logFoodWaste"
)]
#[post("/{user_id}/food-waste")]
pub async fn log_food_waste(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<FoodWasteBody>,
) -> ApiResult<web::Json<FoodWasteEntry>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    let body = payload.into_inner();
    let entry = FoodWasteEntry::try_new(
        &body.item,
        body.quantity,
        body.unit.as_deref(),
        body.reason.as_deref(),
        Utc::now(),
    )
    .map_err(map_consumer_error)?;
    Ok(web::Json(
        state.consumers.log_food_waste(&user_id, entry).await?,
    ))
}

/// Estimate and record a weekly carbon footprint.
#[utoipa::path(
    post,
    path = "/api/consumer/{user_id}/carbon-footprint",
    params(("user_id" = String, Path, description = "User UUID")),
    request_body = CarbonFootprintBody,
    responses(
        (status = 200, description = "Stored estimate", body = CarbonFootprintRecord),
        (status = 400, description = "Invalid input", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["consumer"],
    operation_id = "recordCarbonFootprint"
)]
#[post("/{user_id}/carbon-footprint")]
pub async fn carbon_footprint(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<CarbonFootprintBody>,
) -> ApiResult<web::Json<CarbonFootprintRecord>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    let body = payload.into_inner();
    let input = CarbonFootprintInput::try_new(&body.diet_type, body.weekly_meals, &body.transportation)
        .map_err(map_consumer_error)?;
    Ok(web::Json(
        state
            .consumers
            .record_carbon_footprint(&user_id, input)
            .await?,
    ))
}
