//! Pure scoring and recommendation rules behind the premium analytics view.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ChatRecord, FarmData, SubscriptionTier};

/// Score every user starts from.
pub const SCORE_BASE: u8 = 50;
/// Upper clamp for the score.
pub const SCORE_MAX: u8 = 100;

/// Chats inspected for recommendations.
pub const RECOMMENDATION_WINDOW: usize = 10;

const FEATURE_KEYWORDS: &[&str] = &[
    "pest",
    "soil",
    "water",
    "irrigation",
    "fertilizer",
    "weather",
    "harvest",
    "market",
    "organic",
    "seed",
];

const IPM_TIP: &str = "Consider integrated pest management: combine crop rotation, \
natural predators and targeted organic treatments before reaching for chemicals.";
const SOIL_TIP: &str = "Test your soil every season to tune fertiliser use and \
protect long-term soil health.";
const DIVERSITY_PRAISE: &str = "Great crop diversity! Growing several crops \
improves resilience against pests and price swings.";

/// Sustainability score from 0 to 100.
///
/// Starts at 50 and adds 10 for a rotation history, 15 for an organic pest
/// treatment, 5 for talking about sustainability and 20 for a paid tier.
pub fn sustainability_score(
    tier: SubscriptionTier,
    chats: &[ChatRecord],
    farm: Option<&FarmData>,
) -> u8 {
    let mut score = u32::from(SCORE_BASE);
    if let Some(farm) = farm {
        if !farm.profile.crop_rotation_history.is_empty() {
            score += 10;
        }
        if farm
            .pest_reports
            .iter()
            .any(|report| mentions(&report.treatment, "organic"))
        {
            score += 15;
        }
    }
    if chats.iter().any(|chat| mentions(&chat.message, "sustainable")) {
        score += 5;
    }
    if tier.is_paid() {
        score += 20;
    }
    u8::try_from(score.min(u32::from(SCORE_MAX))).unwrap_or(SCORE_MAX)
}

/// Recommendations from the newest chats and the farm's crop count.
///
/// `chats` is expected newest first.
pub fn recommendations(chats: &[ChatRecord], farm: Option<&FarmData>) -> Vec<String> {
    let window = &chats[..chats.len().min(RECOMMENDATION_WINDOW)];
    let mut tips = Vec::new();
    if window.iter().any(|chat| mentions(&chat.message, "pest")) {
        tips.push(IPM_TIP.to_owned());
    }
    if window.iter().any(|chat| mentions(&chat.message, "soil")) {
        tips.push(SOIL_TIP.to_owned());
    }
    if farm.is_some_and(|farm| farm.profile.crops.len() > 2) {
        tips.push(DIVERSITY_PRAISE.to_owned());
    }
    tips
}

/// How often a feature keyword appears across the user's chats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureUsage {
    /// Keyword from the fixed feature list.
    pub feature: String,
    pub mentions: u32,
}

/// The three most mentioned feature keywords, ties broken by keyword order.
pub fn top_features(chats: &[ChatRecord]) -> Vec<FeatureUsage> {
    let mut usage: Vec<FeatureUsage> = FEATURE_KEYWORDS
        .iter()
        .map(|keyword| FeatureUsage {
            feature: (*keyword).to_owned(),
            mentions: u32::try_from(
                chats
                    .iter()
                    .filter(|chat| mentions(&chat.message, keyword))
                    .count(),
            )
            .unwrap_or(u32::MAX),
        })
        .filter(|usage| usage.mentions > 0)
        .collect();
    // Stable sort keeps keyword order for ties.
    usage.sort_by(|a, b| b.mentions.cmp(&a.mentions));
    usage.truncate(3);
    usage
}

/// Coarse activity bucket over the last 30 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EngagementLevel {
    High,
    Medium,
    Low,
}

impl EngagementLevel {
    /// More than 20 chats in 30 days is high, more than 5 medium.
    pub fn from_monthly_chats(count: u64) -> Self {
        match count {
            c if c > 20 => Self::High,
            c if c > 5 => Self::Medium,
            _ => Self::Low,
        }
    }
}

fn mentions(text: &str, keyword: &str) -> bool {
    text.to_lowercase().contains(keyword)
}
