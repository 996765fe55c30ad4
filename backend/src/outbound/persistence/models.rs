//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use super::schema::{
    chats, consumer_data, farm_data, sdg_metrics, subscription_payments, user_achievements, users,
};

/// Clamp a non-negative domain counter into an `INTEGER` column.
pub(crate) fn count_to_db(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Read an `INTEGER` counter; the schema's check constraints keep it non-negative.
pub(crate) fn count_from_db(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

pub(crate) fn total_to_db(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

pub(crate) fn total_from_db(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub subscription_tier: String,
    pub prompts_used: i32,
    pub total_points: i32,
    pub sustainability_score: i16,
    pub name: Option<String>,
    pub user_type: String,
    pub region: Option<String>,
    pub preferred_language: String,
    pub subscription_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: Option<&'a str>,
    pub user_type: &'a str,
    pub region: Option<&'a str>,
    pub preferred_language: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_achievements)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AchievementRow {
    pub badge: String,
    pub description: String,
    pub points: i32,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_achievements)]
pub(crate) struct NewAchievementRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub badge: &'a str,
    pub description: &'a str,
    pub points: i32,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscription_payments)]
pub(crate) struct NewSubscriptionPaymentRow<'a> {
    pub reference: &'a str,
    pub user_id: Uuid,
    pub subscription_tier: &'a str,
}

// ---------------------------------------------------------------------------
// Chats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = chats)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ChatRow {
    pub user_id: Uuid,
    pub session_id: String,
    pub message: String,
    pub response: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = chats)]
pub(crate) struct NewChatRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: &'a str,
    pub message: &'a str,
    pub response: &'a str,
    pub language: &'a str,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Farm and consumer documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = farm_data)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FarmDataRow {
    pub user_id: Uuid,
    pub farm_name: Option<String>,
    pub location: Option<String>,
    pub farm_size: Option<f64>,
    pub soil_type: Option<String>,
    pub crops: Value,
    pub crop_rotation_history: Value,
    pub pest_reports: Value,
    pub irrigation_schedule: Value,
    pub updated_at: DateTime<Utc>,
}

/// Profile columns written by an upsert. `None` clears the column.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = farm_data)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct FarmProfileRow<'a> {
    pub user_id: Uuid,
    pub farm_name: Option<&'a str>,
    pub location: Option<&'a str>,
    pub farm_size: Option<f64>,
    pub soil_type: Option<&'a str>,
    pub crops: Value,
    pub crop_rotation_history: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = consumer_data)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ConsumerDataRow {
    pub user_id: Uuid,
    pub household_size: Option<i32>,
    pub dietary_preferences: Value,
    pub location: Option<String>,
    pub food_waste_log: Value,
    pub carbon_footprints: Value,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = consumer_data)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ConsumerProfileRow<'a> {
    pub user_id: Uuid,
    pub household_size: Option<i32>,
    pub dietary_preferences: Value,
    pub location: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// SDG metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = sdg_metrics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SdgMetricsRow {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub total_users: i64,
    pub total_prompts: i64,
    pub meals_supported: i64,
    pub food_waste_reduced: i64,
    pub co2_reduced: i64,
    pub active_farmers: i64,
    pub consumers_registered: i64,
    pub premium_subscribers: i64,
    pub farm_data_records: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(7, 7)]
    #[case(u32::MAX, i32::MAX)]
    fn counters_clamp_into_integer_columns(#[case] value: u32, #[case] expected: i32) {
        assert_eq!(count_to_db(value), expected);
    }

    #[rstest]
    #[case(12, 12)]
    #[case(-3, 0)]
    fn negative_counters_read_as_zero(#[case] value: i32, #[case] expected: u32) {
        assert_eq!(count_from_db(value), expected);
    }

    #[rstest]
    fn totals_clamp_into_bigint_columns() {
        assert_eq!(total_to_db(u64::MAX), i64::MAX);
        assert_eq!(total_from_db(-1), 0);
        assert_eq!(total_from_db(42), 42);
    }
}
