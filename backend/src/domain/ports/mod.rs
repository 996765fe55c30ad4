//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod advisory_model;
mod chat_repository;
mod consumer_data_repository;
mod credentials;
mod farm_data_repository;
mod payment_gateway;
mod readiness_check;
mod sdg_metrics_repository;
mod user_repository;

#[cfg(test)]
pub use advisory_model::MockAdvisoryModel;
pub use advisory_model::{AdvisoryModel, AdvisoryModelError, AdvisoryRequest};
#[cfg(test)]
pub use chat_repository::MockChatRepository;
pub use chat_repository::{ChatPersistenceError, ChatRepository};
#[cfg(test)]
pub use consumer_data_repository::MockConsumerDataRepository;
pub use consumer_data_repository::{ConsumerDataPersistenceError, ConsumerDataRepository};
#[cfg(test)]
pub use credentials::{MockPasswordHasher, MockTokenIssuer};
pub use credentials::{PasswordHashError, PasswordHasher, TokenIssueError, TokenIssuer};
#[cfg(test)]
pub use farm_data_repository::MockFarmDataRepository;
pub use farm_data_repository::{FarmDataPersistenceError, FarmDataRepository};
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
pub use payment_gateway::{PaymentGateway, PaymentGatewayError};
#[cfg(test)]
pub use readiness_check::MockReadinessCheck;
pub use readiness_check::ReadinessCheck;
#[cfg(test)]
pub use sdg_metrics_repository::MockSdgMetricsRepository;
pub use sdg_metrics_repository::{SdgMetricsPersistenceError, SdgMetricsRepository};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{
    AwardOutcome, PromptReservation, SubscriptionChange, UserPersistenceError, UserRepository,
};
