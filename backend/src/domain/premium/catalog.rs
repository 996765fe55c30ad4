//! Canned advisory tables and the achievement catalogue.
//!
//! Region lookups are case-insensitive and ignore surrounding whitespace.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::UserType;

struct RegionClimate {
    region: &'static str,
    default: &'static str,
    crops: &'static [(&'static str, &'static str)],
}

const CLIMATE: &[RegionClimate] = &[
    RegionClimate {
        region: "west africa",
        default: "Rainy season expected from April to October with a short August break. \
                  Plan planting around the first steady rains.",
        crops: &[
            (
                "maize",
                "Plant maize with the first reliable rains in April; expect reduced yields \
                 if the August dry spell extends beyond three weeks.",
            ),
            (
                "cassava",
                "Cassava tolerates the coming dry months well; mulch young stands to hold \
                 soil moisture through December.",
            ),
            (
                "rice",
                "Lowland rice benefits from the peak rains in July; prepare bunds early to \
                 retain water.",
            ),
        ],
    },
    RegionClimate {
        region: "east africa",
        default: "Bimodal rains: long rains March to May, short rains October to December. \
                  Stagger planting to use both seasons.",
        crops: &[
            (
                "maize",
                "Long rains look adequate for maize; choose drought-tolerant varieties for \
                 the short-rain season.",
            ),
            (
                "beans",
                "Beans fit well into the short rains; avoid waterlogged fields during the \
                 April peak.",
            ),
            (
                "coffee",
                "Expect flowering after the short rains; irrigate during extended dry \
                 spells to protect cherry set.",
            ),
        ],
    },
    RegionClimate {
        region: "southern africa",
        default: "Single rainy season November to March with rising heat stress risk in \
                  January. Conservation tillage helps retain moisture.",
        crops: &[
            (
                "maize",
                "Mid-season heat waves are likely; plant early-maturing maize to finish \
                 before February.",
            ),
            (
                "sorghum",
                "Sorghum is the safer cereal for the drier outlook; sow by mid-December.",
            ),
        ],
    },
    RegionClimate {
        region: "north africa",
        default: "Winter rainfall with hot dry summers. Prioritise water harvesting and \
                  drip irrigation.",
        crops: &[
            (
                "wheat",
                "Sow wheat in November to use winter rains; monitor for spring heat during \
                 grain fill.",
            ),
            (
                "olives",
                "Olive groves will need supplementary irrigation through the summer \
                 drought.",
            ),
        ],
    },
];

const GLOBAL_CLIMATE: &str = "No regional outlook is available. Track local forecasts weekly \
and favour drought-tolerant, short-cycle varieties to hedge against rainfall variability.";

/// Climate outlook for `region`, narrowed to `crop` when the table has one.
///
/// Falls back to the region default, then a global default.
pub fn climate_forecast(region: Option<&str>, crop: Option<&str>) -> &'static str {
    let Some(entry) = region.and_then(find_region) else {
        return GLOBAL_CLIMATE;
    };
    let crop = crop.map(normalise);
    crop.and_then(|crop| {
        entry
            .crops
            .iter()
            .find(|(name, _)| *name == crop)
            .map(|(_, text)| *text)
    })
    .unwrap_or(entry.default)
}

fn find_region(region: &str) -> Option<&'static RegionClimate> {
    let region = normalise(region);
    CLIMATE.iter().find(|entry| entry.region == region)
}

fn normalise(value: &str) -> String {
    value.trim().to_lowercase()
}

const FARMER_SUPPLY_CHAIN: &[&str] = &[
    "Join a farmer cooperative to negotiate better prices and share transport costs.",
    "Use hermetic storage bags to cut post-harvest losses.",
    "Sell surplus produce through local markets before it spoils.",
];

const CONSUMER_SUPPLY_CHAIN: &[&str] = &[
    "Buy seasonal produce directly from local farmers to shorten supply chains.",
    "Plan weekly meals to reduce household food waste.",
    "Choose imperfect produce that would otherwise be discarded.",
];

const BOTH_SUPPLY_CHAIN: &[&str] = &[
    "Connect your farm output with neighbouring households through community supported agriculture.",
    "Track both harvest losses and kitchen waste to find the biggest savings.",
    "Share cold storage with nearby growers and buyers.",
];

/// Supply chain optimisation tips for the user's role.
pub fn supply_chain_tips(user_type: UserType) -> &'static [&'static str] {
    match user_type {
        UserType::Farmer => FARMER_SUPPLY_CHAIN,
        UserType::Consumer => CONSUMER_SUPPLY_CHAIN,
        UserType::Both => BOTH_SUPPLY_CHAIN,
    }
}

const REGIONAL_CROPS: &[(&str, &[&str])] = &[
    ("west africa", &["maize", "cassava", "yam", "cowpea", "sorghum"]),
    ("east africa", &["maize", "beans", "sweet potato", "banana", "coffee"]),
    ("southern africa", &["maize", "sorghum", "groundnut", "sunflower"]),
    ("north africa", &["wheat", "barley", "olives", "dates", "chickpea"]),
];

const DEFAULT_CROPS: &[&str] = &["maize", "beans", "sorghum", "sweet potato"];

/// Recommended crops for the region, or a general list.
pub fn regional_crops(region: Option<&str>) -> &'static [&'static str] {
    let Some(region) = region.map(normalise) else {
        return DEFAULT_CROPS;
    };
    REGIONAL_CROPS
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, crops)| *crops)
        .unwrap_or(DEFAULT_CROPS)
}

/// Catalogue entry describing an awardable badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementDefinition {
    /// Request key, matched case-insensitively.
    pub achievement_type: &'static str,
    pub badge: &'static str,
    pub description: &'static str,
    pub points: u32,
}

/// Every badge the award endpoint accepts.
pub const ACHIEVEMENTS: &[AchievementDefinition] = &[
    AchievementDefinition {
        achievement_type: "first_chat",
        badge: "Curious Grower",
        description: "Asked your first question to the farming assistant",
        points: 10,
    },
    AchievementDefinition {
        achievement_type: "farm_profile",
        badge: "Farm Builder",
        description: "Completed your farm profile",
        points: 20,
    },
    AchievementDefinition {
        achievement_type: "pest_detective",
        badge: "Pest Detective",
        description: "Reported and analysed a pest problem",
        points: 25,
    },
    AchievementDefinition {
        achievement_type: "water_saver",
        badge: "Water Saver",
        description: "Created an irrigation schedule",
        points: 25,
    },
    AchievementDefinition {
        achievement_type: "waste_warrior",
        badge: "Waste Warrior",
        description: "Logged household food waste",
        points: 15,
    },
    AchievementDefinition {
        achievement_type: "carbon_conscious",
        badge: "Carbon Conscious",
        description: "Calculated your carbon footprint",
        points: 15,
    },
    AchievementDefinition {
        achievement_type: "sustainability_champion",
        badge: "Sustainability Champion",
        description: "Reached a sustainability score of 80 or more",
        points: 50,
    },
];

/// Look up a badge by its request key.
pub fn find_achievement(achievement_type: &str) -> Option<&'static AchievementDefinition> {
    let wanted = normalise(achievement_type);
    ACHIEVEMENTS
        .iter()
        .find(|definition| definition.achievement_type == wanted)
}

/// Dedicated support channel offered to pro subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrioritySupport {
    pub email: &'static str,
    pub phone: &'static str,
    pub response_time_hours: u32,
    pub dedicated_agronomist: bool,
    pub hours: &'static str,
}

pub const PRIORITY_SUPPORT: PrioritySupport = PrioritySupport {
    email: "priority@farmwise.africa",
    phone: "+234-800-FARMWISE",
    response_time_hours: 2,
    dedicated_agronomist: true,
    hours: "Monday to Saturday, 07:00 to 19:00 WAT",
};

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn climate_prefers_crop_specific_text() {
        let text = climate_forecast(Some("West Africa"), Some(" Maize "));
        assert!(text.starts_with("Plant maize"));
    }

    #[rstest]
    fn climate_falls_back_to_region_default() {
        let text = climate_forecast(Some("east africa"), Some("quinoa"));
        assert!(text.starts_with("Bimodal rains"));
        assert_eq!(climate_forecast(Some("east africa"), None), text);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("atlantis"))]
    fn climate_falls_back_to_global_default(#[case] region: Option<&str>) {
        assert_eq!(climate_forecast(region, Some("maize")), GLOBAL_CLIMATE);
    }

    #[rstest]
    #[case(UserType::Farmer, FARMER_SUPPLY_CHAIN)]
    #[case(UserType::Consumer, CONSUMER_SUPPLY_CHAIN)]
    #[case(UserType::Both, BOTH_SUPPLY_CHAIN)]
    fn supply_chain_is_keyed_by_user_type(
        #[case] user_type: UserType,
        #[case] expected: &[&str],
    ) {
        assert_eq!(supply_chain_tips(user_type), expected);
    }

    #[rstest]
    fn regional_crops_default_for_unknown_region() {
        assert_eq!(regional_crops(Some("mars")), DEFAULT_CROPS);
        assert_eq!(regional_crops(None), DEFAULT_CROPS);
        assert!(regional_crops(Some("North Africa")).contains(&"wheat"));
    }

    #[rstest]
    fn catalogue_types_are_unique() {
        for (index, definition) in ACHIEVEMENTS.iter().enumerate() {
            assert!(
                ACHIEVEMENTS[index + 1..]
                    .iter()
                    .all(|other| other.achievement_type != definition.achievement_type),
                "duplicate achievement type {}",
                definition.achievement_type
            );
        }
    }

    #[rstest]
    fn first_chat_is_worth_ten_points() {
        let definition = find_achievement("FIRST_CHAT").expect("known type");
        assert_eq!(definition.points, 10);
        assert!(find_achievement("moon_landing").is_none());
    }
}
