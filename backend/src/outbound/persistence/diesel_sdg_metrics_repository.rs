//! PostgreSQL-backed `SdgMetricsRepository` implementation using Diesel ORM.
//!
//! Snapshots are insert-only; the newest `recorded_at` wins on read.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{SdgMetricsPersistenceError, SdgMetricsRepository};
use crate::domain::{PlatformStats, SdgImpact, SdgSnapshot};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{SdgMetricsRow, total_from_db, total_to_db};
use super::pool::{DbPool, PoolError};
use super::schema::sdg_metrics;

/// Diesel-backed implementation of the `SdgMetricsRepository` port.
#[derive(Clone)]
pub struct DieselSdgMetricsRepository {
    pool: DbPool,
}

impl DieselSdgMetricsRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> SdgMetricsPersistenceError {
    map_pool_error(error, SdgMetricsPersistenceError::connection)
}

fn diesel_error(error: diesel::result::Error) -> SdgMetricsPersistenceError {
    map_diesel_error(
        error,
        SdgMetricsPersistenceError::query,
        SdgMetricsPersistenceError::connection,
    )
}

impl From<&SdgSnapshot> for SdgMetricsRow {
    fn from(snapshot: &SdgSnapshot) -> Self {
        let impact = snapshot.sdg_impact;
        let stats = snapshot.platform_stats;
        Self {
            id: snapshot.id,
            recorded_at: snapshot.recorded_at,
            total_users: total_to_db(snapshot.total_users),
            total_prompts: total_to_db(snapshot.total_prompts),
            meals_supported: total_to_db(impact.meals_supported),
            food_waste_reduced: total_to_db(impact.food_waste_reduced),
            co2_reduced: total_to_db(impact.co2_reduced),
            active_farmers: total_to_db(stats.active_farmers),
            consumers_registered: total_to_db(stats.consumers_registered),
            premium_subscribers: total_to_db(stats.premium_subscribers),
            farm_data_records: total_to_db(stats.farm_data_records),
        }
    }
}

impl From<SdgMetricsRow> for SdgSnapshot {
    fn from(row: SdgMetricsRow) -> Self {
        Self {
            id: row.id,
            recorded_at: row.recorded_at,
            total_users: total_from_db(row.total_users),
            total_prompts: total_from_db(row.total_prompts),
            sdg_impact: SdgImpact {
                meals_supported: total_from_db(row.meals_supported),
                food_waste_reduced: total_from_db(row.food_waste_reduced),
                co2_reduced: total_from_db(row.co2_reduced),
            },
            platform_stats: PlatformStats {
                active_farmers: total_from_db(row.active_farmers),
                consumers_registered: total_from_db(row.consumers_registered),
                premium_subscribers: total_from_db(row.premium_subscribers),
                farm_data_records: total_from_db(row.farm_data_records),
            },
        }
    }
}

#[async_trait]
impl SdgMetricsRepository for DieselSdgMetricsRepository {
    async fn insert(&self, snapshot: &SdgSnapshot) -> Result<(), SdgMetricsPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(sdg_metrics::table)
            .values(&SdgMetricsRow::from(snapshot))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(())
    }

    async fn latest(&self) -> Result<Option<SdgSnapshot>, SdgMetricsPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = sdg_metrics::table
            .order(sdg_metrics::recorded_at.desc())
            .select(SdgMetricsRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        Ok(row.map(SdgSnapshot::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ImpactCounts;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn snapshot_survives_row_conversion() {
        let counts = ImpactCounts {
            total_users: 12,
            total_prompts: 400,
            active_farmers: 7,
            premium_subscribers: 3,
            farm_data_records: 9,
        };
        let snapshot = SdgSnapshot::from_counts(counts, Uuid::new_v4(), Utc::now());

        let row = SdgMetricsRow::from(&snapshot);
        assert_eq!(row.meals_supported, 200);
        assert_eq!(row.consumers_registered, 5);
        assert_eq!(SdgSnapshot::from(row), snapshot);
    }
}
