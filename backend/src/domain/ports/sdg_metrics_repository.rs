//! Port abstraction for SDG impact snapshots.

use async_trait::async_trait;

use crate::domain::{Error, SdgSnapshot};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by snapshot adapters.
    pub enum SdgMetricsPersistenceError {
        Connection { message: String } => "sdg metrics connection failed: {message}",
        Query { message: String } => "sdg metrics query failed: {message}",
    }
}

impl From<SdgMetricsPersistenceError> for Error {
    fn from(value: SdgMetricsPersistenceError) -> Self {
        match value {
            SdgMetricsPersistenceError::Connection { message } => {
                Error::service_unavailable(message)
            }
            SdgMetricsPersistenceError::Query { message } => Error::internal(message),
        }
    }
}

/// Snapshots are inserted, never updated.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SdgMetricsRepository: Send + Sync {
    async fn insert(&self, snapshot: &SdgSnapshot) -> Result<(), SdgMetricsPersistenceError>;

    /// Newest snapshot by recording time.
    async fn latest(&self) -> Result<Option<SdgSnapshot>, SdgMetricsPersistenceError>;
}
