//! Farm documents: profile fields plus append-only pest and irrigation logs.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;

/// Upper bound on `farmName`.
pub const FARM_NAME_MAX: usize = 128;
/// Upper bound on a farm or household location.
pub const LOCATION_MAX: usize = 256;
/// Upper bound on `soilType`.
pub const SOIL_TYPE_MAX: usize = 64;

/// Validation errors for farmer inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FarmValidationError {
    EmptyField { field: &'static str },
    TooLong { field: &'static str, max: usize },
    NegativeFarmSize,
}

impl fmt::Display for FarmValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyField { field } => write!(f, "{field} must not be empty"),
            Self::TooLong { field, max } => write!(f, "{field} must be at most {max} characters"),
            Self::NegativeFarmSize => write!(f, "farmSize must not be negative"),
        }
    }
}

impl std::error::Error for FarmValidationError {}

pub(crate) fn required(value: &str, field: &'static str) -> Result<String, FarmValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FarmValidationError::EmptyField { field });
    }
    Ok(trimmed.to_owned())
}

pub(crate) fn bounded(
    value: Option<&str>,
    field: &'static str,
    max: usize,
) -> Result<(), FarmValidationError> {
    if value.is_some_and(|v| v.chars().count() > max) {
        return Err(FarmValidationError::TooLong { field, max });
    }
    Ok(())
}

pub(crate) fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// A crop currently grown on the farm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CropEntry {
    /// Crop name; must not be blank.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variety: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_hectares: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planted_on: Option<NaiveDate>,
}

/// One season of the crop rotation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CropRotation {
    /// Free-form season label such as "2023 wet".
    pub season: String,
    pub crops: Vec<String>,
}

/// Pest sighting with the advisory model's suggested treatment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PestReport {
    pub crop: String,
    pub symptoms: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub treatment: String,
    pub reported_at: DateTime<Utc>,
}

/// Irrigation advice generated for one crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IrrigationPlan {
    pub crop: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm_size: Option<f64>,
    pub schedule: String,
    pub created_at: DateTime<Utc>,
}

/// Editable portion of a farm document. Applied with whole-document upsert
/// semantics: the lists replace what is stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FarmProfile {
    /// Display name, at most 128 characters.
    #[serde(default)]
    pub farm_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Size in hectares; never negative.
    #[serde(default)]
    pub farm_size: Option<f64>,
    #[serde(default)]
    pub soil_type: Option<String>,
    /// Crops currently grown.
    #[serde(default)]
    pub crops: Vec<CropEntry>,
    #[serde(default)]
    pub crop_rotation_history: Vec<CropRotation>,
}

impl FarmProfile {
    /// Reject negative sizes, blank crop names and text wider than its column.
    pub fn validate(self) -> Result<Self, FarmValidationError> {
        if self.farm_size.is_some_and(|size| size < 0.0) {
            return Err(FarmValidationError::NegativeFarmSize);
        }
        bounded(self.farm_name.as_deref(), "farmName", FARM_NAME_MAX)?;
        bounded(self.location.as_deref(), "location", LOCATION_MAX)?;
        bounded(self.soil_type.as_deref(), "soilType", SOIL_TYPE_MAX)?;
        if self.crops.iter().any(|crop| crop.name.trim().is_empty()) {
            return Err(FarmValidationError::EmptyField { field: "crops.name" });
        }
        Ok(self)
    }
}

/// Full farm document, one per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FarmData {
    #[schema(value_type = String, format = Uuid)]
    pub user_id: UserId,
    /// Editable fields, flattened into the document.
    #[serde(flatten)]
    pub profile: FarmProfile,
    /// Append-only, oldest first.
    pub pest_reports: Vec<PestReport>,
    /// Append-only, oldest first.
    pub irrigation_schedule: Vec<IrrigationPlan>,
    pub updated_at: DateTime<Utc>,
}

/// Pest symptoms submitted for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PestAnalysisRequest {
    pub crop: String,
    pub symptoms: String,
    pub location: Option<String>,
}

impl PestAnalysisRequest {
    /// Trim inputs and require a crop and symptoms.
    pub fn try_new(
        crop: &str,
        symptoms: &str,
        location: Option<&str>,
    ) -> Result<Self, FarmValidationError> {
        Ok(Self {
            crop: required(crop, "crop")?,
            symptoms: required(symptoms, "symptoms")?,
            location: optional(location),
        })
    }

    /// Prompt sent to the advisory model.
    pub fn advisory_prompt(&self) -> String {
        let location = self
            .location
            .as_deref()
            .map(|l| format!(" in {l}"))
            .unwrap_or_default();
        format!(
            "A farmer{location} reports these symptoms on their {crop}: {symptoms}. \
             Identify the likely pest or disease and recommend a treatment, \
             preferring organic and integrated pest management options.",
            crop = self.crop,
            symptoms = self.symptoms,
        )
    }

    /// Attach the model's treatment to form the stored report.
    pub fn into_report(self, treatment: String, reported_at: DateTime<Utc>) -> PestReport {
        PestReport {
            crop: self.crop,
            symptoms: self.symptoms,
            location: self.location,
            treatment,
            reported_at,
        }
    }
}

/// Inputs for an irrigation schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct IrrigationRequest {
    pub crop: String,
    pub soil_type: Option<String>,
    pub climate: Option<String>,
    pub farm_size: Option<f64>,
}

impl IrrigationRequest {
    /// Require a crop and reject negative farm sizes.
    pub fn try_new(
        crop: &str,
        soil_type: Option<&str>,
        climate: Option<&str>,
        farm_size: Option<f64>,
    ) -> Result<Self, FarmValidationError> {
        if farm_size.is_some_and(|size| size < 0.0) {
            return Err(FarmValidationError::NegativeFarmSize);
        }
        Ok(Self {
            crop: required(crop, "crop")?,
            soil_type: optional(soil_type),
            climate: optional(climate),
            farm_size,
        })
    }

    /// Prompt listing only the details that were supplied.
    pub fn advisory_prompt(&self) -> String {
        let mut prompt = format!(
            "Create a water-efficient weekly irrigation schedule for {}.",
            self.crop
        );
        if let Some(soil) = &self.soil_type {
            prompt.push_str(&format!(" Soil type: {soil}."));
        }
        if let Some(climate) = &self.climate {
            prompt.push_str(&format!(" Climate: {climate}."));
        }
        if let Some(size) = self.farm_size {
            prompt.push_str(&format!(" Farm size: {size} hectares."));
        }
        prompt
    }

    pub fn into_plan(self, schedule: String, created_at: DateTime<Utc>) -> IrrigationPlan {
        IrrigationPlan {
            crop: self.crop,
            soil_type: self.soil_type,
            climate: self.climate,
            farm_size: self.farm_size,
            schedule,
            created_at,
        }
    }
}
