//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every HTTP endpoint from the inbound layer. Request and
//! response schemas are gathered from the `#[utoipa::path]` annotations, so
//! only the shared error envelope is registered explicitly.
//!
//! The generated document is served by Swagger UI in debug builds and
//! exported via `cargo run --bin openapi-dump` for the web client.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};

/// Document the bearer token issued by `POST /api/auth/login`.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        let mut bearer = Http::new(HttpAuthScheme::Bearer);
        bearer.bearer_format = Some("JWT".to_owned());
        bearer.description = Some("Access token issued by POST /api/auth/login.".to_owned());
        components.add_security_scheme("BearerToken", SecurityScheme::Http(bearer));
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "FarmWise backend API",
        description = "Accounts, AI farming assistant, farm and household tracking, premium \
                       insights, SDG impact dashboard and subscriptions."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::auth::register,
        crate::inbound::http::auth::login,
        crate::inbound::http::chat::send_message,
        crate::inbound::http::chat::history,
        crate::inbound::http::chat::sessions,
        crate::inbound::http::farmer::get_farm_data,
        crate::inbound::http::farmer::upsert_farm_data,
        crate::inbound::http::farmer::analyze_pests,
        crate::inbound::http::farmer::irrigation_schedule,
        crate::inbound::http::consumer::get_consumer_data,
        crate::inbound::http::consumer::upsert_consumer_data,
        crate::inbound::http::consumer::log_food_waste,
        crate::inbound::http::consumer::carbon_footprint,
        crate::inbound::http::premium::analytics,
        crate::inbound::http::premium::climate_forecast,
        crate::inbound::http::premium::supply_chain,
        crate::inbound::http::premium::achievements,
        crate::inbound::http::premium::award_achievement,
        crate::inbound::http::premium::priority_support,
        crate::inbound::http::premium::regional_crops,
        crate::inbound::http::dashboard::public_metrics,
        crate::inbound::http::dashboard::calculate,
        crate::inbound::http::dashboard::export_csv,
        crate::inbound::http::subscriptions::initialize,
        crate::inbound::http::subscriptions::webhook,
        crate::inbound::http::subscriptions::verify_redirect,
        crate::inbound::http::subscriptions::verify_json,
        crate::inbound::http::subscriptions::status,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(Error, ErrorCode)),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "chat", description = "Quota-gated farming assistant"),
        (name = "farmer", description = "Farm documents, pest analysis and irrigation"),
        (name = "consumer", description = "Household profile, food waste and carbon"),
        (name = "premium", description = "Tier-gated insights and achievements"),
        (name = "dashboard", description = "Public SDG impact metrics"),
        (name = "subscriptions", description = "Paid plan checkout and verification"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
