//! Premium analytics, advisory lookups and achievements.
//!
//! Tier gating lives here: analytics need a paid tier, climate, supply chain
//! and priority support need pro. Gated calls fail with a forbidden error
//! flagged `upgrade_required`.

pub mod analytics;
pub mod catalog;

use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use self::analytics::{EngagementLevel, FeatureUsage};
use self::catalog::PrioritySupport;
use crate::domain::ports::{AwardOutcome, ChatRepository, FarmDataRepository, UserRepository};
use crate::domain::{Achievement, Error, SubscriptionTier, UserAccount, UserId, UserType};

/// Chats loaded for analytics.
pub const ANALYTICS_CHAT_LIMIT: u32 = 100;

/// Window used for the engagement level.
pub const ENGAGEMENT_WINDOW_DAYS: i64 = 30;

/// How repeated awards of the same badge are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateAwardPolicy {
    /// A badge is held at most once; repeat awards are no-ops.
    #[default]
    OncePerBadge,
    /// Every award appends and adds points, matching the legacy behaviour.
    AllowDuplicates,
}

/// Error returned for an unknown policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("award policy must be once_per_badge or allow_duplicates (got {0})")]
pub struct UnknownAwardPolicy(pub String);

impl FromStr for DuplicateAwardPolicy {
    type Err = UnknownAwardPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "once_per_badge" => Ok(Self::OncePerBadge),
            "allow_duplicates" => Ok(Self::AllowDuplicates),
            _ => Err(UnknownAwardPolicy(s.to_owned())),
        }
    }
}

/// Premium analytics payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalytics {
    /// Score between 0 and 100, also stored on the account.
    pub sustainability_score: u8,
    pub recommendations: Vec<String>,
    pub climate_insights: String,
    pub supply_chain_tips: Vec<String>,
    pub top_features: Vec<FeatureUsage>,
    pub engagement: EngagementLevel,
    /// Chats in the engagement window.
    pub chats_last_30_days: u64,
    pub total_points: u32,
}

/// Canned regional climate advice for pro users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClimateForecast {
    pub region: Option<String>,
    pub crop: Option<String>,
    /// Advice text; falls back to generic guidance for unknown regions.
    pub forecast: String,
}

/// Supply-chain tips tailored to the user type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplyChainInsights {
    pub user_type: UserType,
    pub tips: Vec<String>,
}

/// Crops suited to the user's region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegionalCrops {
    pub region: Option<String>,
    pub crops: Vec<String>,
}

/// Earned badges and the running points total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AchievementSummary {
    pub achievements: Vec<Achievement>,
    pub total_points: u32,
}

/// Outcome of an award request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AwardResult {
    /// False when the badge was already held.
    pub awarded: bool,
    pub achievement: Achievement,
    pub total_points: u32,
}

/// Domain service for the premium surface.
#[derive(Clone)]
pub struct PremiumFeatures {
    users: Arc<dyn UserRepository>,
    chats: Arc<dyn ChatRepository>,
    farms: Arc<dyn FarmDataRepository>,
    award_policy: DuplicateAwardPolicy,
}

impl PremiumFeatures {
    /// Build the premium service; `award_policy` governs repeated badges.
    pub fn new(
        users: Arc<dyn UserRepository>,
        chats: Arc<dyn ChatRepository>,
        farms: Arc<dyn FarmDataRepository>,
        award_policy: DuplicateAwardPolicy,
    ) -> Self {
        Self {
            users,
            chats,
            farms,
            award_policy,
        }
    }

    async fn load_user(&self, user_id: &UserId) -> Result<UserAccount, Error> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))
    }

    async fn load_with_tier(
        &self,
        user_id: &UserId,
        allowed: fn(SubscriptionTier) -> bool,
        message: &str,
    ) -> Result<UserAccount, Error> {
        let user = self.load_user(user_id).await?;
        if !allowed(user.tier) {
            debug!(user_id = %user_id, tier = %user.tier, "premium feature refused");
            return Err(Error::forbidden(message).requiring_upgrade());
        }
        Ok(user)
    }

    /// Score, recommendations and usage insights. Persists the refreshed score.
    pub async fn user_analytics(&self, user_id: &UserId) -> Result<UserAnalytics, Error> {
        let user = self
            .load_with_tier(
                user_id,
                SubscriptionTier::is_paid,
                "Premium subscription required",
            )
            .await?;
        let chats = self.chats.recent(user_id, ANALYTICS_CHAT_LIMIT).await?;
        let farm = self.farms.find(user_id).await?;
        let since = Utc::now() - Duration::days(ENGAGEMENT_WINDOW_DAYS);
        let monthly = self.chats.count_since(user_id, since).await?;

        let score = analytics::sustainability_score(user.tier, &chats, farm.as_ref());
        self.users
            .update_sustainability_score(user_id, score)
            .await?;

        Ok(UserAnalytics {
            sustainability_score: score,
            recommendations: analytics::recommendations(&chats, farm.as_ref()),
            climate_insights: catalog::climate_forecast(user.profile.region.as_deref(), None)
                .to_owned(),
            supply_chain_tips: to_owned_list(catalog::supply_chain_tips(user.profile.user_type)),
            top_features: analytics::top_features(&chats),
            engagement: EngagementLevel::from_monthly_chats(monthly),
            chats_last_30_days: monthly,
            total_points: user.total_points,
        })
    }

    /// Regional climate outlook, optionally narrowed to one crop.
    ///
    /// Pro tier only; other tiers receive a `forbidden` error flagged for upgrade.
    pub async fn climate_forecast(
        &self,
        user_id: &UserId,
        crop: Option<&str>,
    ) -> Result<ClimateForecast, Error> {
        let user = self
            .load_with_tier(user_id, is_pro, "Pro subscription required")
            .await?;
        let crop = crop.map(str::trim).filter(|c| !c.is_empty());
        let region = user.profile.region;
        Ok(ClimateForecast {
            forecast: catalog::climate_forecast(region.as_deref(), crop).to_owned(),
            region,
            crop: crop.map(str::to_owned),
        })
    }

    /// Pro tier only.
    pub async fn supply_chain(&self, user_id: &UserId) -> Result<SupplyChainInsights, Error> {
        let user = self
            .load_with_tier(user_id, is_pro, "Pro subscription required")
            .await?;
        let user_type = user.profile.user_type;
        Ok(SupplyChainInsights {
            user_type,
            tips: to_owned_list(catalog::supply_chain_tips(user_type)),
        })
    }

    /// Support contact details. Pro tier only.
    pub async fn priority_support(&self, user_id: &UserId) -> Result<PrioritySupport, Error> {
        self.load_with_tier(user_id, is_pro, "Pro subscription required")
            .await?;
        Ok(catalog::PRIORITY_SUPPORT)
    }

    /// Available on every tier.
    pub async fn regional_crops(&self, user_id: &UserId) -> Result<RegionalCrops, Error> {
        let user = self.load_user(user_id).await?;
        let region = user.profile.region;
        Ok(RegionalCrops {
            crops: to_owned_list(catalog::regional_crops(region.as_deref())),
            region,
        })
    }

    /// Badges in award order, on any tier.
    pub async fn achievements(&self, user_id: &UserId) -> Result<AchievementSummary, Error> {
        let user = self.load_user(user_id).await?;
        let achievements = self.users.achievements(user_id).await?;
        Ok(AchievementSummary {
            achievements,
            total_points: user.total_points,
        })
    }

    /// Award a catalogue badge. Unknown types are rejected.
    pub async fn award_achievement(
        &self,
        user_id: &UserId,
        achievement_type: &str,
    ) -> Result<AwardResult, Error> {
        let definition = catalog::find_achievement(achievement_type).ok_or_else(|| {
            Error::invalid_request(format!("Unknown achievement type: {achievement_type}"))
        })?;
        let achievement = Achievement {
            badge: definition.badge.to_owned(),
            description: definition.description.to_owned(),
            points: definition.points,
            earned_at: Utc::now(),
        };

        let outcome = self
            .users
            .award_achievement(user_id, &achievement, self.award_policy)
            .await?;
        match outcome {
            AwardOutcome::Awarded { total_points } => {
                info!(user_id = %user_id, badge = definition.badge, total_points, "achievement awarded");
                Ok(AwardResult {
                    awarded: true,
                    achievement,
                    total_points,
                })
            }
            AwardOutcome::AlreadyHeld { total_points } => Ok(AwardResult {
                awarded: false,
                achievement,
                total_points,
            }),
            AwardOutcome::UnknownUser => Err(Error::not_found("User not found")),
        }
    }
}

fn is_pro(tier: SubscriptionTier) -> bool {
    tier == SubscriptionTier::Pro
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}
