//! Port abstraction for per-user consumer documents.

use async_trait::async_trait;

use crate::domain::{
    CarbonFootprintRecord, ConsumerData, ConsumerProfile, Error, FoodWasteEntry, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by consumer data adapters.
    pub enum ConsumerDataPersistenceError {
        Connection { message: String } => "consumer data connection failed: {message}",
        Query { message: String } => "consumer data query failed: {message}",
    }
}

impl From<ConsumerDataPersistenceError> for Error {
    fn from(value: ConsumerDataPersistenceError) -> Self {
        match value {
            ConsumerDataPersistenceError::Connection { message } => {
                Error::service_unavailable(message)
            }
            ConsumerDataPersistenceError::Query { message } => Error::internal(message),
        }
    }
}

/// Per-user consumer documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConsumerDataRepository: Send + Sync {
    async fn find(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ConsumerData>, ConsumerDataPersistenceError>;

    /// Replace the editable fields, keeping the append-only logs.
    async fn upsert_profile(
        &self,
        user_id: &UserId,
        profile: &ConsumerProfile,
    ) -> Result<ConsumerData, ConsumerDataPersistenceError>;

    async fn append_food_waste(
        &self,
        user_id: &UserId,
        entry: &FoodWasteEntry,
    ) -> Result<(), ConsumerDataPersistenceError>;

    async fn append_carbon_footprint(
        &self,
        user_id: &UserId,
        record: &CarbonFootprintRecord,
    ) -> Result<(), ConsumerDataPersistenceError>;
}
