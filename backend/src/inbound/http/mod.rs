//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

pub mod auth;
pub mod chat;
pub mod consumer;
pub mod dashboard;
pub mod error;
pub mod farmer;
pub mod health;
pub mod premium;
pub mod state;
pub mod subscriptions;
pub mod validation;

pub use error::ApiResult;

/// Every REST endpoint, mounted under `/api`.
pub fn api_scope() -> actix_web::Scope {
    web::scope("/api")
        .service(
            web::scope("/auth")
                .service(auth::register)
                .service(auth::login),
        )
        .service(
            web::scope("/chat")
                .service(chat::send_message)
                .service(chat::history)
                .service(chat::sessions),
        )
        .service(
            web::scope("/farmer")
                .service(farmer::get_farm_data)
                .service(farmer::upsert_farm_data)
                .service(farmer::analyze_pests)
                .service(farmer::irrigation_schedule),
        )
        .service(
            web::scope("/consumer")
                .service(consumer::get_consumer_data)
                .service(consumer::upsert_consumer_data)
                .service(consumer::log_food_waste)
                .service(consumer::carbon_footprint),
        )
        .service(
            web::scope("/premium")
                .service(premium::analytics)
                .service(premium::climate_forecast)
                .service(premium::supply_chain)
                .service(premium::achievements)
                .service(premium::award_achievement)
                .service(premium::priority_support)
                .service(premium::regional_crops),
        )
        .service(
            web::scope("/dashboard")
                .service(dashboard::public_metrics)
                .service(dashboard::calculate)
                .service(dashboard::export_csv),
        )
        .service(
            web::scope("/subscriptions")
                .service(subscriptions::initialize)
                .service(subscriptions::webhook)
                .service(subscriptions::verify_redirect)
                .service(subscriptions::verify_json)
                .service(subscriptions::status),
        )
}
