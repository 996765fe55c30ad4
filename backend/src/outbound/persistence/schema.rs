//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts with quota, tier and profile columns.
    users (id) {
        id -> Uuid,
        /// Lowercased, unique.
        email -> Varchar,
        password_hash -> Text,
        /// One of `free`, `premium` or `pro`.
        subscription_tier -> Varchar,
        prompts_used -> Int4,
        total_points -> Int4,
        sustainability_score -> Int2,
        name -> Nullable<Varchar>,
        user_type -> Varchar,
        region -> Nullable<Varchar>,
        preferred_language -> Varchar,
        /// Last payment reference applied to the account.
        subscription_reference -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    user_achievements (id) {
        id -> Uuid,
        user_id -> Uuid,
        badge -> Varchar,
        description -> Text,
        points -> Int4,
        earned_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per applied payment reference.
    subscription_payments (reference) {
        reference -> Varchar,
        user_id -> Uuid,
        subscription_tier -> Varchar,
        applied_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only chat log.
    chats (id) {
        id -> Uuid,
        user_id -> Uuid,
        session_id -> Varchar,
        message -> Text,
        response -> Text,
        language -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One farm document per user. List columns hold JSON arrays.
    farm_data (user_id) {
        user_id -> Uuid,
        farm_name -> Nullable<Varchar>,
        location -> Nullable<Varchar>,
        farm_size -> Nullable<Float8>,
        soil_type -> Nullable<Varchar>,
        crops -> Jsonb,
        crop_rotation_history -> Jsonb,
        pest_reports -> Jsonb,
        irrigation_schedule -> Jsonb,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// One consumer document per user. List columns hold JSON arrays.
    consumer_data (user_id) {
        user_id -> Uuid,
        household_size -> Nullable<Int4>,
        dietary_preferences -> Jsonb,
        location -> Nullable<Varchar>,
        food_waste_log -> Jsonb,
        carbon_footprints -> Jsonb,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Daily SDG impact snapshots.
    sdg_metrics (id) {
        id -> Uuid,
        recorded_at -> Timestamptz,
        total_users -> Int8,
        total_prompts -> Int8,
        meals_supported -> Int8,
        food_waste_reduced -> Int8,
        co2_reduced -> Int8,
        active_farmers -> Int8,
        consumers_registered -> Int8,
        premium_subscribers -> Int8,
        farm_data_records -> Int8,
    }
}

diesel::joinable!(user_achievements -> users (user_id));
diesel::joinable!(subscription_payments -> users (user_id));
diesel::joinable!(chats -> users (user_id));
diesel::joinable!(farm_data -> users (user_id));
diesel::joinable!(consumer_data -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    user_achievements,
    subscription_payments,
    chats,
    farm_data,
    consumer_data,
    sdg_metrics,
);
