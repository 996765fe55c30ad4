//! Premium API handlers.
//!
//! Tier checks happen in [`PremiumFeatures`](crate::domain::PremiumFeatures);
//! handlers only parse identifiers and forward.

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::Error;
use crate::domain::premium::catalog::PrioritySupport;
use crate::domain::premium::{
    AchievementSummary, AwardResult, ClimateForecast, RegionalCrops, SupplyChainInsights,
    UserAnalytics,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{USER_ID, parse_user_id};

/// Query string for the climate forecast.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ForecastQuery {
    /// Crop to tailor the forecast to.
    pub crop: Option<String>,
}

/// Badge requested by the client.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AwardBody {
    /// Catalogue key such as `first_chat`.
    pub achievement_type: String,
}

/// Sustainability score and usage insights. Premium or Pro.
#[utoipa::path(
    get,
    path = "/api/premium/analytics/{user_id}",
    params(("user_id" = String, Path, description = "User UUID")),
    responses(
        (status = 200, description = "Usage analytics", body = UserAnalytics),
        (status = 403, description = "Paid tier required", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["premium"],
    operation_id = "userAnalytics"
)]
#[get("/analytics/{user_id}")]
pub async fn analytics(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserAnalytics>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    Ok(web::Json(state.premium.user_analytics(&user_id).await?))
}

/// Regional climate outlook. Pro only.
#[utoipa::path(
    get,
    path = "/api/premium/climate-forecast/{user_id}",
    params(("user_id" = String, Path, description = "User UUID"), ForecastQuery),
    responses(
        (status = 200, description = "Regional forecast", body = ClimateForecast),
        (status = 403, description = "Pro tier required", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["premium"],
    operation_id = "climateForecast"
)]
#[get("/climate-forecast/{user_id}")]
pub async fn climate_forecast(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<ForecastQuery>,
) -> ApiResult<web::Json<ClimateForecast>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    let ForecastQuery { crop } = query.into_inner();
    Ok(web::Json(
        state
            .premium
            .climate_forecast(&user_id, crop.as_deref())
            .await?,
    ))
}

/// Supply-chain tips for the user type. Pro only.
#[utoipa::path(
    get,
    path = "/api/premium/supply-chain/{user_id}",
    params(("user_id" = String, Path, description = "User UUID")),
    responses(
        (status = 200, description = "Supply chain tips", body = SupplyChainInsights),
        (status = 403, description = "Pro tier required", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["premium"],
    operation_id = "supplyChain"
)]
#[get("/supply-chain/{user_id}")]
pub async fn supply_chain(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<SupplyChainInsights>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    Ok(web::Json(state.premium.supply_chain(&user_id).await?))
}

/// Earned badges and points.
#[utoipa::path(
    get,
    path = "/api/premium/achievements/{user_id}",
    params(("user_id" = String, Path, description = "User UUID")),
    responses(
        (status = 200, description = "Badges and points", body = AchievementSummary),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["premium"],
    operation_id = "listAchievements"
)]
#[get("/achievements/{user_id}")]
pub async fn achievements(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<AchievementSummary>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    Ok(web::Json(state.premium.achievements(&user_id).await?))
}

/// Award a catalogue badge and add its points.
#[utoipa::path(
    post,
    path = "/api/premium/achievements/{user_id}/award",
    params(("user_id" = String, Path, description = "User UUID")),
    request_body = AwardBody,
    responses(
        (status = 200, description = "Award applied or already held", body = AwardResult),
        (status = 400, description = "Unknown achievement type", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["premium"],
    operation_id = "awardAchievement"
)]
#[post("/achievements/{user_id}/award")]
pub async fn award_achievement(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<AwardBody>,
) -> ApiResult<web::Json<AwardResult>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    Ok(web::Json(
        state
            .premium
            .award_achievement(&user_id, &payload.achievement_type)
            .await?,
    ))
}

/// Priority support contacts. Pro only.
#[utoipa::path(
    get,
    path = "/api/premium/priority-support/{user_id}",
    params(("user_id" = String, Path, description = "User UUID")),
    responses(
        (status = 200, description = "Support channel", body = PrioritySupport),
        (status = 403, description = "Pro tier required", body = Error),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["premium"],
    operation_id = "prioritySupport"
)]
#[get("/priority-support/{user_id}")]
pub async fn priority_support(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<PrioritySupport>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    Ok(web::Json(state.premium.priority_support(&user_id).await?))
}

/// Crops suited to the user's region.
#[utoipa::path(
    get,
    path = "/api/premium/regional-crops/{user_id}",
    params(("user_id" = String, Path, description = "User UUID")),
    responses(
        (status = 200, description = "Crops suited to the user's region", body = RegionalCrops),
        (status = 404, description = "Unknown user", body = Error)
    ),
    tags = ["premium"],
    operation_id = "regionalCrops"
)]
#[get("/regional-crops/{user_id}")]
pub async fn regional_crops(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<RegionalCrops>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    Ok(web::Json(state.premium.regional_crops(&user_id).await?))
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
                    web::scope("/api/premium")
                        .service(analytics)
                        .service(climate_forecast)
                        .service(supply_chain)
                        .service(achievements)
                        .service(award_achievement)
                        .service(priority_support)
                        .service(regional_crops),
                ),
        )
        .await;
        let response = actix_test::call_service(&app, request.to_request()).await;
        let status = response.status();
        let body = actix_test::read_body(response).await;
        (status, serde_json::from_slice(&body).expect("json body"))
    }

    fn get(uri: String) -> actix_test::TestRequest {
        actix_test::TestRequest::get().uri(&uri)
    }

    #[rstest]
    #[case(SubscriptionTier::Free, StatusCode::FORBIDDEN)]
    #[case(SubscriptionTier::Premium, StatusCode::OK)]
    #[case(SubscriptionTier::Pro, StatusCode::OK)]
    #[actix_web::test]
    async fn analytics_needs_a_paid_tier(
        ports: TestPorts,
        #[case] tier: SubscriptionTier,
        #[case] expected: StatusCode,
    ) {
        let user = ports.seed_user("stats@example.com", tier, 0);
        let (status, body) = call(&ports, get(format!("/api/premium/analytics/{}", user.id))).await;
        assert_eq!(status, expected);
        if expected == StatusCode::FORBIDDEN {
            assert_eq!(body["upgradeRequired"], true);
        } else {
            assert!(body["sustainabilityScore"].as_u64().is_some());
        }
    }

    #[rstest]
    #[case("climate-forecast")]
    #[case("supply-chain")]
    #[case("priority-support")]
    #[actix_web::test]
    async fn pro_features_refuse_premium(ports: TestPorts, #[case] feature: &str) {
        let user = ports.seed_user("mid@example.com", SubscriptionTier::Premium, 0);
        let (status, body) =
            call(&ports, get(format!("/api/premium/{feature}/{}", user.id))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Pro subscription required");
        assert_eq!(body["upgradeRequired"], true);
    }

    #[rstest]
    #[actix_web::test]
    async fn pro_forecast_echoes_crop_and_region(ports: TestPorts) {
        let user = ports.seed_user("pro@example.com", SubscriptionTier::Pro, 0);
        let (status, body) = call(
            &ports,
            get(format!("/api/premium/climate-forecast/{}?crop=maize", user.id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["crop"], "maize");
        assert_eq!(body["region"], "Lagos");
        assert!(body["forecast"].as_str().is_some_and(|f| !f.is_empty()));
    }

    #[rstest]
    #[actix_web::test]
    async fn regional_crops_are_open_to_free_users(ports: TestPorts) {
        let user = ports.seed_user("free@example.com", SubscriptionTier::Free, 0);
        let (status, body) =
            call(&ports, get(format!("/api/premium/regional-crops/{}", user.id))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["crops"].as_array().is_some_and(|c| !c.is_empty()));
    }

    #[rstest]
    #[actix_web::test]
    async fn awarding_updates_points_and_listing(ports: TestPorts) {
        let user = ports.seed_user("badge@example.com", SubscriptionTier::Free, 0);
        let award = || {
            actix_test::TestRequest::post()
                .uri(&format!("/api/premium/achievements/{}/award", user.id))
                .set_json(json!({"achievementType": "first_chat"}))
        };

        let (status, body) = call(&ports, award()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["awarded"], true);
        assert_eq!(body["totalPoints"], 10);

        let (_, body) = call(&ports, award()).await;
        assert_eq!(body["awarded"], false);
        assert_eq!(body["totalPoints"], 10);

        let (status, body) =
            call(&ports, get(format!("/api/premium/achievements/{}", user.id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["achievements"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["totalPoints"], 10);
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_achievement_is_rejected(ports: TestPorts) {
        let user = ports.seed_user("odd@example.com", SubscriptionTier::Free, 0);
        let (status, body) = call(
            &ports,
            actix_test::TestRequest::post()
                .uri(&format!("/api/premium/achievements/{}/award", user.id))
                .set_json(json!({"achievementType": "moon_landing"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_request");
    }
}
