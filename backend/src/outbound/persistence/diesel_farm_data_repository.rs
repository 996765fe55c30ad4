//! PostgreSQL-backed `FarmDataRepository` implementation using Diesel ORM.
//!
//! Each user owns at most one row. Pest reports and irrigation plans are
//! JSONB arrays grown with `||` inside a single upsert, so concurrent appends
//! never drop entries.

use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::count_distinct;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::append_jsonb_entry;
use crate::domain::ports::{FarmDataPersistenceError, FarmDataRepository};
use crate::domain::{FarmData, FarmProfile, IrrigationPlan, PestReport, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::json_serializers::{from_json_array, to_json_array, to_json_singleton};
use super::models::{FarmDataRow, FarmProfileRow, total_from_db};
use super::pool::{DbPool, PoolError};
use super::schema::farm_data;

/// Diesel-backed implementation of the `FarmDataRepository` port.
#[derive(Clone)]
pub struct DieselFarmDataRepository {
    pool: DbPool,
}

impl DieselFarmDataRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> FarmDataPersistenceError {
    map_pool_error(error, FarmDataPersistenceError::connection)
}

fn diesel_error(error: diesel::result::Error) -> FarmDataPersistenceError {
    map_diesel_error(
        error,
        FarmDataPersistenceError::query,
        FarmDataPersistenceError::connection,
    )
}

fn decode<T: DeserializeOwned>(
    value: Value,
    column: &str,
) -> Result<Vec<T>, FarmDataPersistenceError> {
    from_json_array(value, column).map_err(FarmDataPersistenceError::query)
}

fn encode<T: serde::Serialize>(
    items: &[T],
    column: &str,
) -> Result<Value, FarmDataPersistenceError> {
    to_json_array(items, column).map_err(FarmDataPersistenceError::query)
}

fn row_to_farm_data(row: FarmDataRow) -> Result<FarmData, FarmDataPersistenceError> {
    Ok(FarmData {
        user_id: UserId::from_uuid(row.user_id),
        profile: FarmProfile {
            farm_name: row.farm_name,
            location: row.location,
            farm_size: row.farm_size,
            soil_type: row.soil_type,
            crops: decode(row.crops, "crops")?,
            crop_rotation_history: decode(row.crop_rotation_history, "crop_rotation_history")?,
        },
        pest_reports: decode(row.pest_reports, "pest_reports")?,
        irrigation_schedule: decode(row.irrigation_schedule, "irrigation_schedule")?,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl FarmDataRepository for DieselFarmDataRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<FarmData>, FarmDataPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = farm_data::table
            .filter(farm_data::user_id.eq(user_id.as_uuid()))
            .select(FarmDataRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_farm_data).transpose()
    }

    async fn upsert_profile(
        &self,
        user_id: &UserId,
        profile: &FarmProfile,
    ) -> Result<FarmData, FarmDataPersistenceError> {
        let row = FarmProfileRow {
            user_id: *user_id.as_uuid(),
            farm_name: profile.farm_name.as_deref(),
            location: profile.location.as_deref(),
            farm_size: profile.farm_size,
            soil_type: profile.soil_type.as_deref(),
            crops: encode(&profile.crops, "crops")?,
            crop_rotation_history: encode(
                &profile.crop_rotation_history,
                "crop_rotation_history",
            )?,
            updated_at: Utc::now(),
        };

        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let stored = diesel::insert_into(farm_data::table)
            .values(&row)
            .on_conflict(farm_data::user_id)
            .do_update()
            .set(&row)
            .returning(FarmDataRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        row_to_farm_data(stored)
    }

    async fn append_pest_report(
        &self,
        user_id: &UserId,
        report: &PestReport,
    ) -> Result<(), FarmDataPersistenceError> {
        let entry =
            to_json_singleton(report, "pest_reports").map_err(FarmDataPersistenceError::query)?;
        append_jsonb_entry!(
            self,
            table: farm_data,
            column: pest_reports,
            user_id: user_id,
            entry: entry,
            map_pool_error: pool_error,
            map_diesel_error: diesel_error,
        )
    }

    async fn append_irrigation_plan(
        &self,
        user_id: &UserId,
        plan: &IrrigationPlan,
    ) -> Result<(), FarmDataPersistenceError> {
        let entry = to_json_singleton(plan, "irrigation_schedule")
            .map_err(FarmDataPersistenceError::query)?;
        append_jsonb_entry!(
            self,
            table: farm_data,
            column: irrigation_schedule,
            user_id: user_id,
            entry: entry,
            map_pool_error: pool_error,
            map_diesel_error: diesel_error,
        )
    }

    async fn count_records(&self) -> Result<u64, FarmDataPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let count: i64 = farm_data::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(total_from_db(count))
    }

    async fn count_distinct_farmers(&self) -> Result<u64, FarmDataPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let count: i64 = farm_data::table
            .select(count_distinct(farm_data::user_id))
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(total_from_db(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use uuid::Uuid;

    fn row(pest_reports: Value) -> FarmDataRow {
        FarmDataRow {
            user_id: Uuid::new_v4(),
            farm_name: Some("Green Acres".into()),
            location: Some("Kisumu".into()),
            farm_size: Some(2.5),
            soil_type: Some("loam".into()),
            crops: json!([{ "name": "maize" }]),
            crop_rotation_history: json!([]),
            pest_reports,
            irrigation_schedule: Value::Null,
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    fn row_converts_to_document() {
        let data = row_to_farm_data(row(json!([{
            "crop": "maize",
            "symptoms": "holes in leaves",
            "treatment": "neem oil",
            "reportedAt": "2024-03-01T08:00:00Z"
        }])))
        .expect("valid row");
        assert_eq!(data.profile.crops[0].name, "maize");
        assert_eq!(data.pest_reports[0].treatment, "neem oil");
        assert!(data.irrigation_schedule.is_empty());
    }

    #[rstest]
    fn malformed_array_is_a_query_error() {
        let err = row_to_farm_data(row(json!({ "not": "an array" }))).expect_err("bad column");
        assert!(matches!(err, FarmDataPersistenceError::Query { .. }));
    }
}
