//! Daily SDG impact calculation.
//!
//! Each run counts the platform state, derives the impact figures and inserts
//! an independent snapshot. Concurrent runs simply produce more rows.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::ports::{
    ChatRepository, FarmDataRepository, SdgMetricsRepository, UserRepository,
};
use crate::domain::{Error, ImpactCounts, SdgSnapshot};

/// Computes, stores and serves SDG impact snapshots.
#[derive(Clone)]
pub struct SdgCalculator {
    users: Arc<dyn UserRepository>,
    chats: Arc<dyn ChatRepository>,
    farms: Arc<dyn FarmDataRepository>,
    metrics: Arc<dyn SdgMetricsRepository>,
}

impl SdgCalculator {
    /// Build the calculator over the counting repositories and snapshot store.
    pub fn new(
        users: Arc<dyn UserRepository>,
        chats: Arc<dyn ChatRepository>,
        farms: Arc<dyn FarmDataRepository>,
        metrics: Arc<dyn SdgMetricsRepository>,
    ) -> Self {
        Self {
            users,
            chats,
            farms,
            metrics,
        }
    }

    async fn gather_counts(&self) -> Result<ImpactCounts, Error> {
        Ok(ImpactCounts {
            total_users: self.users.count_users().await?,
            total_prompts: self.chats.count_all().await?,
            active_farmers: self.farms.count_distinct_farmers().await?,
            premium_subscribers: self.users.count_paid_subscribers().await?,
            farm_data_records: self.farms.count_records().await?,
        })
    }

    /// Count, derive and persist a new snapshot. Failures propagate unchanged.
    pub async fn calculate_daily_impact(&self) -> Result<SdgSnapshot, Error> {
        let counts = self.gather_counts().await?;
        let snapshot = SdgSnapshot::from_counts(counts, Uuid::new_v4(), Utc::now());
        self.metrics.insert(&snapshot).await?;
        info!(
            snapshot_id = %snapshot.id,
            total_users = snapshot.total_users,
            total_prompts = snapshot.total_prompts,
            "sdg snapshot recorded"
        );
        Ok(snapshot)
    }

    /// Newest stored snapshot, if any run has completed.
    pub async fn latest_metrics(&self) -> Result<Option<SdgSnapshot>, Error> {
        Ok(self.metrics.latest().await?)
    }

    /// Latest snapshot, or the all-zero fallback before the first run.
    pub async fn public_metrics(&self) -> Result<SdgSnapshot, Error> {
        Ok(self
            .latest_metrics()
            .await?
            .unwrap_or_else(|| SdgSnapshot::fallback(Utc::now())))
    }
}
