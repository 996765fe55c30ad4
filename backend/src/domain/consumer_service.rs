//! Consumer document management, food waste logging and carbon estimates.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::domain::ports::{ConsumerDataRepository, UserRepository};
use crate::domain::{
    CarbonFootprintInput, CarbonFootprintRecord, ConsumerData, ConsumerProfile, Error,
    FoodWasteEntry, UserId,
};

/// Consumer profile, food waste and carbon footprint operations.
#[derive(Clone)]
pub struct ConsumerService {
    users: Arc<dyn UserRepository>,
    consumers: Arc<dyn ConsumerDataRepository>,
}

impl ConsumerService {
    /// Build the service over the user and consumer stores.
    pub fn new(users: Arc<dyn UserRepository>, consumers: Arc<dyn ConsumerDataRepository>) -> Self {
        Self { users, consumers }
    }

    async fn require_user(&self, user_id: &UserId) -> Result<(), Error> {
        match self.users.find_by_id(user_id).await? {
            Some(_) => Ok(()),
            None => Err(Error::not_found("User not found")),
        }
    }

    /// Fetch the consumer document; missing documents are `not_found`.
    pub async fn consumer_data(&self, user_id: &UserId) -> Result<ConsumerData, Error> {
        self.consumers
            .find(user_id)
            .await?
            .ok_or_else(|| Error::not_found("Consumer data not found"))
    }

    /// Replace the editable profile, keeping existing logs.
    pub async fn update_profile(
        &self,
        user_id: &UserId,
        profile: ConsumerProfile,
    ) -> Result<ConsumerData, Error> {
        self.require_user(user_id).await?;
        Ok(self.consumers.upsert_profile(user_id, &profile).await?)
    }

    /// Append a waste entry for an existing user.
    pub async fn log_food_waste(
        &self,
        user_id: &UserId,
        entry: FoodWasteEntry,
    ) -> Result<FoodWasteEntry, Error> {
        self.require_user(user_id).await?;
        self.consumers.append_food_waste(user_id, &entry).await?;
        info!(user_id = %user_id, item = %entry.item, "food waste logged");
        Ok(entry)
    }

    /// Compute and store a weekly footprint estimate.
    pub async fn record_carbon_footprint(
        &self,
        user_id: &UserId,
        input: CarbonFootprintInput,
    ) -> Result<CarbonFootprintRecord, Error> {
        self.require_user(user_id).await?;
        let record = input.into_record(Utc::now());
        self.consumers
            .append_carbon_footprint(user_id, &record)
            .await?;
        Ok(record)
    }
}
