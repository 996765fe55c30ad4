//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL through `diesel-async` and a `bb8` pool.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. No business logic resides here.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Store-side atomicity**: counter updates are conditional statements or
//!   row-locking transactions; JSONB arrays grow with `||`.
//!
//! # Example
//!
//! ```ignore
//! use farmwise::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/farmwise")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod diesel_chat_repository;
mod diesel_consumer_data_repository;
mod diesel_error_mapping;
mod diesel_farm_data_repository;
mod diesel_sdg_metrics_repository;
mod diesel_user_repository;
mod json_serializers;
mod jsonb_append_macros;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_chat_repository::DieselChatRepository;
pub use diesel_consumer_data_repository::DieselConsumerDataRepository;
pub use diesel_farm_data_repository::DieselFarmDataRepository;
pub use diesel_sdg_metrics_repository::DieselSdgMetricsRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
