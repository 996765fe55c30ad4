//! PostgreSQL-backed `ConsumerDataRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::append_jsonb_entry;
use crate::domain::ports::{ConsumerDataPersistenceError, ConsumerDataRepository};
use crate::domain::{
    CarbonFootprintRecord, ConsumerData, ConsumerProfile, FoodWasteEntry, UserId,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::json_serializers::{from_json_array, to_json_array, to_json_singleton};
use super::models::{ConsumerDataRow, ConsumerProfileRow, count_from_db, count_to_db};
use super::pool::{DbPool, PoolError};
use super::schema::consumer_data;

/// Diesel-backed implementation of the `ConsumerDataRepository` port.
#[derive(Clone)]
pub struct DieselConsumerDataRepository {
    pool: DbPool,
}

impl DieselConsumerDataRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> ConsumerDataPersistenceError {
    map_pool_error(error, ConsumerDataPersistenceError::connection)
}

fn diesel_error(error: diesel::result::Error) -> ConsumerDataPersistenceError {
    map_diesel_error(
        error,
        ConsumerDataPersistenceError::query,
        ConsumerDataPersistenceError::connection,
    )
}

fn row_to_consumer_data(row: ConsumerDataRow) -> Result<ConsumerData, ConsumerDataPersistenceError> {
    Ok(ConsumerData {
        user_id: UserId::from_uuid(row.user_id),
        profile: ConsumerProfile {
            household_size: row.household_size.map(count_from_db),
            dietary_preferences: from_json_array(row.dietary_preferences, "dietary_preferences")
                .map_err(ConsumerDataPersistenceError::query)?,
            location: row.location,
        },
        food_waste_log: from_json_array(row.food_waste_log, "food_waste_log")
            .map_err(ConsumerDataPersistenceError::query)?,
        carbon_footprints: from_json_array(row.carbon_footprints, "carbon_footprints")
            .map_err(ConsumerDataPersistenceError::query)?,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl ConsumerDataRepository for DieselConsumerDataRepository {
    async fn find(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ConsumerData>, ConsumerDataPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = consumer_data::table
            .filter(consumer_data::user_id.eq(user_id.as_uuid()))
            .select(ConsumerDataRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_consumer_data).transpose()
    }

    async fn upsert_profile(
        &self,
        user_id: &UserId,
        profile: &ConsumerProfile,
    ) -> Result<ConsumerData, ConsumerDataPersistenceError> {
        let row = ConsumerProfileRow {
            user_id: *user_id.as_uuid(),
            household_size: profile.household_size.map(count_to_db),
            dietary_preferences: to_json_array(&profile.dietary_preferences, "dietary_preferences")
                .map_err(ConsumerDataPersistenceError::query)?,
            location: profile.location.as_deref(),
            updated_at: Utc::now(),
        };

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let stored = diesel::insert_into(consumer_data::table)
            .values(&row)
            .on_conflict(consumer_data::user_id)
            .do_update()
            .set(&row)
            .returning(ConsumerDataRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        row_to_consumer_data(stored)
    }

    async fn append_food_waste(
        &self,
        user_id: &UserId,
        entry: &FoodWasteEntry,
    ) -> Result<(), ConsumerDataPersistenceError> {
        let entry = to_json_singleton(entry, "food_waste_log")
            .map_err(ConsumerDataPersistenceError::query)?;
        append_jsonb_entry!(
            self,
            table: consumer_data,
            column: food_waste_log,
            user_id: user_id,
            entry: entry,
            map_pool_error: pool_error,
            map_diesel_error: diesel_error,
        )
    }

    async fn append_carbon_footprint(
        &self,
        user_id: &UserId,
        record: &CarbonFootprintRecord,
    ) -> Result<(), ConsumerDataPersistenceError> {
        let entry = to_json_singleton(record, "carbon_footprints")
            .map_err(ConsumerDataPersistenceError::query)?;
        append_jsonb_entry!(
            self,
            table: consumer_data,
            column: carbon_footprints,
            user_id: user_id,
            entry: entry,
            map_pool_error: pool_error,
            map_diesel_error: diesel_error,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use uuid::Uuid;

    #[rstest]
    fn row_converts_to_document() {
        let row = ConsumerDataRow {
            user_id: Uuid::new_v4(),
            household_size: Some(4),
            dietary_preferences: json!(["vegetarian"]),
            location: Some("Accra".into()),
            food_waste_log: json!([{
                "item": "bread",
                "quantity": 0.5,
                "unit": "kg",
                "loggedAt": "2024-03-01T08:00:00Z"
            }]),
            carbon_footprints: json!([]),
            updated_at: Utc::now(),
        };

        let data = row_to_consumer_data(row).expect("valid row");
        assert_eq!(data.profile.household_size, Some(4));
        assert_eq!(data.profile.dietary_preferences, ["vegetarian"]);
        assert_eq!(data.food_waste_log[0].item, "bread");
        assert!(data.carbon_footprints.is_empty());
    }
}
