//! Port abstraction for per-user farm documents.

use async_trait::async_trait;

use crate::domain::{Error, FarmData, FarmProfile, IrrigationPlan, PestReport, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by farm data adapters.
    pub enum FarmDataPersistenceError {
        Connection { message: String } => "farm data connection failed: {message}",
        Query { message: String } => "farm data query failed: {message}",
    }
}

impl From<FarmDataPersistenceError> for Error {
    fn from(value: FarmDataPersistenceError) -> Self {
        match value {
            FarmDataPersistenceError::Connection { message } => {
                Error::service_unavailable(message)
            }
            FarmDataPersistenceError::Query { message } => Error::internal(message),
        }
    }
}

/// Appends create the document when it does not exist yet.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FarmDataRepository: Send + Sync {
    async fn find(&self, user_id: &UserId) -> Result<Option<FarmData>, FarmDataPersistenceError>;

    /// Replace the editable fields, keeping the append-only logs.
    async fn upsert_profile(
        &self,
        user_id: &UserId,
        profile: &FarmProfile,
    ) -> Result<FarmData, FarmDataPersistenceError>;

    async fn append_pest_report(
        &self,
        user_id: &UserId,
        report: &PestReport,
    ) -> Result<(), FarmDataPersistenceError>;

    async fn append_irrigation_plan(
        &self,
        user_id: &UserId,
        plan: &IrrigationPlan,
    ) -> Result<(), FarmDataPersistenceError>;

    async fn count_records(&self) -> Result<u64, FarmDataPersistenceError>;

    async fn count_distinct_farmers(&self) -> Result<u64, FarmDataPersistenceError>;
}
