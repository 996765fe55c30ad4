//! Consumer documents: household profile, food waste log and carbon estimates.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;
use super::farm::{LOCATION_MAX, optional, required};

/// Validation errors for consumer inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumerValidationError {
    EmptyItem,
    InvalidQuantity,
    EmptyDietType,
    EmptyTransportation,
    LocationTooLong { max: usize },
}

impl fmt::Display for ConsumerValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyItem => write!(f, "item must not be empty"),
            Self::InvalidQuantity => write!(f, "quantity must be a non-negative number"),
            Self::EmptyDietType => write!(f, "dietType must not be empty"),
            Self::EmptyTransportation => write!(f, "transportation must not be empty"),
            Self::LocationTooLong { max } => {
                write!(f, "location must be at most {max} characters")
            }
        }
    }
}

impl std::error::Error for ConsumerValidationError {}

/// Editable portion of a consumer document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerProfile {
    /// People in the household.
    #[serde(default)]
    pub household_size: Option<u32>,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    /// At most 256 characters.
    #[serde(default)]
    pub location: Option<String>,
}

impl ConsumerProfile {
    /// Reject a location wider than its column.
    pub fn validate(self) -> Result<Self, ConsumerValidationError> {
        if self
            .location
            .as_deref()
            .is_some_and(|l| l.chars().count() > LOCATION_MAX)
        {
            return Err(ConsumerValidationError::LocationTooLong { max: LOCATION_MAX });
        }
        Ok(self)
    }
}

/// Logged item of wasted food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FoodWasteEntry {
    pub item: String,
    /// Amount in `unit`; finite and non-negative.
    pub quantity: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub logged_at: DateTime<Utc>,
}

impl FoodWasteEntry {
    /// Unit used when the request omits one.
    pub const DEFAULT_UNIT: &'static str = "kg";

    /// Trim and validate a waste entry.
    pub fn try_new(
        item: &str,
        quantity: f64,
        unit: Option<&str>,
        reason: Option<&str>,
        logged_at: DateTime<Utc>,
    ) -> Result<Self, ConsumerValidationError> {
        let item = required(item, "item").map_err(|_| ConsumerValidationError::EmptyItem)?;
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(ConsumerValidationError::InvalidQuantity);
        }
        Ok(Self {
            item,
            quantity,
            unit: optional(unit).unwrap_or_else(|| Self::DEFAULT_UNIT.to_owned()),
            reason: optional(reason),
            logged_at,
        })
    }
}

/// Inputs for a weekly carbon footprint estimate.
///
/// # Examples
/// ```
/// use farmwise::domain::CarbonFootprintInput;
///
/// let input = CarbonFootprintInput::try_new("vegan", 21, "bike").unwrap();
/// assert_eq!(input.estimated_co2(), 126.0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarbonFootprintInput {
    diet_type: String,
    weekly_meals: u32,
    transportation: String,
}

impl CarbonFootprintInput {
    /// Normalise the diet and transport labels to lowercase.
    pub fn try_new(
        diet_type: &str,
        weekly_meals: u32,
        transportation: &str,
    ) -> Result<Self, ConsumerValidationError> {
        let diet_type = diet_type.trim().to_lowercase();
        if diet_type.is_empty() {
            return Err(ConsumerValidationError::EmptyDietType);
        }
        let transportation = transportation.trim().to_lowercase();
        if transportation.is_empty() {
            return Err(ConsumerValidationError::EmptyTransportation);
        }
        Ok(Self {
            diet_type,
            weekly_meals,
            transportation,
        })
    }

    /// kg CO2 per meal for the diet.
    pub fn diet_factor(&self) -> f64 {
        match self.diet_type.as_str() {
            "vegan" => 1.5,
            "vegetarian" => 2.0,
            "omnivore" => 3.5,
            _ => 2.5,
        }
    }

    /// Monthly kg CO2 for the main transport mode.
    pub fn transport_factor(&self) -> f64 {
        match self.transportation.as_str() {
            "bike" => 0.0,
            "public" => 50.0,
            "car" => 200.0,
            _ => 100.0,
        }
    }

    /// `diet_factor * weekly_meals * 4 + transport_factor`.
    pub fn estimated_co2(&self) -> f64 {
        self.diet_factor() * f64::from(self.weekly_meals) * 4.0 + self.transport_factor()
    }

    /// Freeze the estimate into a stored record.
    pub fn into_record(self, recorded_at: DateTime<Utc>) -> CarbonFootprintRecord {
        let estimated_co2 = self.estimated_co2();
        CarbonFootprintRecord {
            diet_type: self.diet_type,
            weekly_meals: self.weekly_meals,
            transportation: self.transportation,
            estimated_co2,
            recorded_at,
        }
    }
}

/// Stored carbon footprint estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarbonFootprintRecord {
    pub diet_type: String,
    pub weekly_meals: u32,
    pub transportation: String,
    /// Weekly estimate in kg CO2.
    #[serde(rename = "estimatedCO2")]
    pub estimated_co2: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Full consumer document, one per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerData {
    #[schema(value_type = String, format = Uuid)]
    pub user_id: UserId,
    #[serde(flatten)]
    pub profile: ConsumerProfile,
    /// Append-only, oldest first.
    pub food_waste_log: Vec<FoodWasteEntry>,
    pub carbon_footprints: Vec<CarbonFootprintRecord>,
    pub updated_at: DateTime<Utc>,
}
