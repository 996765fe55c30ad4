//! Farmer document management and AI-assisted field advice.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::domain::ports::{AdvisoryModel, AdvisoryRequest, FarmDataRepository, UserRepository};
use crate::domain::{
    Error, FarmData, FarmProfile, IrrigationPlan, IrrigationRequest, PestAnalysisRequest,
    PestReport, UserAccount, UserId,
};

/// Farm profile management plus pest and irrigation advice.
#[derive(Clone)]
pub struct FarmerService {
    users: Arc<dyn UserRepository>,
    farms: Arc<dyn FarmDataRepository>,
    model: Arc<dyn AdvisoryModel>,
}

impl FarmerService {
    /// Build the service; `model` answers pest and irrigation prompts.
    pub fn new(
        users: Arc<dyn UserRepository>,
        farms: Arc<dyn FarmDataRepository>,
        model: Arc<dyn AdvisoryModel>,
    ) -> Self {
        Self {
            users,
            farms,
            model,
        }
    }

    async fn require_user(&self, user_id: &UserId) -> Result<UserAccount, Error> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))
    }

    /// Fetch the farm document; missing documents are `not_found`.
    pub async fn farm_data(&self, user_id: &UserId) -> Result<FarmData, Error> {
        self.farms
            .find(user_id)
            .await?
            .ok_or_else(|| Error::not_found("Farm data not found"))
    }

    /// Replace the editable farm fields, creating the document if needed.
    pub async fn update_profile(
        &self,
        user_id: &UserId,
        profile: FarmProfile,
    ) -> Result<FarmData, Error> {
        self.require_user(user_id).await?;
        Ok(self.farms.upsert_profile(user_id, &profile).await?)
    }

    /// Ask the model for a diagnosis and log the report.
    pub async fn analyze_pests(
        &self,
        user_id: &UserId,
        request: PestAnalysisRequest,
    ) -> Result<PestReport, Error> {
        let user = self.require_user(user_id).await?;
        let advisory = AdvisoryRequest::new(
            request.advisory_prompt(),
            user.profile.preferred_language,
        );
        let treatment = self.model.generate(&advisory).await?;
        let report = request.into_report(treatment, Utc::now());
        self.farms.append_pest_report(user_id, &report).await?;
        info!(user_id = %user_id, crop = %report.crop, "pest report logged");
        Ok(report)
    }

    /// Ask the model for an irrigation schedule and log the plan.
    pub async fn irrigation_schedule(
        &self,
        user_id: &UserId,
        request: IrrigationRequest,
    ) -> Result<IrrigationPlan, Error> {
        let user = self.require_user(user_id).await?;
        let advisory = AdvisoryRequest::new(
            request.advisory_prompt(),
            user.profile.preferred_language,
        );
        let schedule = self.model.generate(&advisory).await?;
        let plan = request.into_plan(schedule, Utc::now());
        self.farms.append_irrigation_plan(user_id, &plan).await?;
        info!(user_id = %user_id, crop = %plan.crop, "irrigation plan logged");
        Ok(plan)
    }
}
