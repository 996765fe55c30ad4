//! Sustainable Development Goal impact snapshots.
//!
//! Snapshots are immutable; the newest by `recorded_at` is authoritative.
//! Impact figures are integer approximations derived from prompt volume:
//!
//! | figure               | formula                     |
//! |----------------------|-----------------------------|
//! | meals supported      | `floor(prompts * 0.5)`      |
//! | food waste reduced   | `floor(prompts * 0.01)` kg  |
//! | CO2 reduced          | `floor(prompts * 0.005)` kg |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Column layout of the dashboard CSV export.
pub const CSV_HEADER: &str = "Date,Total Users,Total Prompts,Meals Supported,\
Food Waste Reduced (kg),CO2 Reduced (kg),Active Farmers,Consumers Registered,\
Premium Subscribers";

/// Raw platform counts gathered before a snapshot is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImpactCounts {
    /// Registered accounts of every role.
    pub total_users: u64,
    /// Stored chat exchanges across all users.
    pub total_prompts: u64,
    /// Users owning a farm document.
    pub active_farmers: u64,
    /// Accounts on a paid tier.
    pub premium_subscribers: u64,
    /// Farm documents; one per farmer.
    pub farm_data_records: u64,
}

/// Impact figures estimated from prompt volume.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SdgImpact {
    pub meals_supported: u64,
    pub food_waste_reduced: u64,
    pub co2_reduced: u64,
}

impl SdgImpact {
    /// Apply the fixed per-prompt ratios, rounding down.
    pub fn from_prompts(total_prompts: u64) -> Self {
        Self {
            meals_supported: total_prompts / 2,
            food_waste_reduced: total_prompts / 100,
            co2_reduced: total_prompts / 200,
        }
    }
}

/// Platform adoption figures carried by each snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub active_farmers: u64,
    pub consumers_registered: u64,
    pub premium_subscribers: u64,
    pub farm_data_records: u64,
}

/// Persisted impact snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SdgSnapshot {
    pub id: Uuid,
    #[serde(rename = "date")]
    pub recorded_at: DateTime<Utc>,
    pub total_users: u64,
    pub total_prompts: u64,
    pub sdg_impact: SdgImpact,
    pub platform_stats: PlatformStats,
}

impl SdgSnapshot {
    /// Derive a snapshot from raw counts.
    ///
    /// `consumers_registered` saturates at zero when farmers outnumber users.
    pub fn from_counts(counts: ImpactCounts, id: Uuid, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id,
            recorded_at,
            total_users: counts.total_users,
            total_prompts: counts.total_prompts,
            sdg_impact: SdgImpact::from_prompts(counts.total_prompts),
            platform_stats: PlatformStats {
                active_farmers: counts.active_farmers,
                consumers_registered: counts.total_users.saturating_sub(counts.active_farmers),
                premium_subscribers: counts.premium_subscribers,
                farm_data_records: counts.farm_data_records,
            },
        }
    }

    /// All-zero snapshot served before the first calculation.
    pub fn fallback(now: DateTime<Utc>) -> Self {
        Self::from_counts(ImpactCounts::default(), Uuid::nil(), now)
    }

    /// Render the snapshot as one CSV data row matching [`CSV_HEADER`].
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{}",
            self.recorded_at.format("%Y-%m-%d"),
            self.total_users,
            self.total_prompts,
            self.sdg_impact.meals_supported,
            self.sdg_impact.food_waste_reduced,
            self.sdg_impact.co2_reduced,
            self.platform_stats.active_farmers,
            self.platform_stats.consumers_registered,
            self.platform_stats.premium_subscribers,
        )
    }

    /// Header plus this snapshot as a complete CSV document.
    pub fn to_csv(&self) -> String {
        format!("{CSV_HEADER}\n{}\n", self.to_csv_row())
    }
}
