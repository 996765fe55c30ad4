//! Async connection pool for Diesel PostgreSQL connections.
//!
//! Wraps `diesel-async` and `bb8`. Checkout honours the configured timeout and
//! all failures surface as [`PoolError`] so adapters can map them to their own
//! connection errors.

use std::time::Duration;

use async_trait::async_trait;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use tracing::warn;

use crate::domain::ports::ReadinessCheck;

/// Pool construction or checkout failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("database pool could not be built: {0}")]
    Build(String),
    #[error("no database connection available: {0}")]
    Checkout(String),
}

const DEFAULT_MAX_SIZE: u32 = 10;
const MIN_IDLE: u32 = 1;
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(10);

/// Pool sizing for [`DbPool::new`].
///
/// ```
/// use farmwise::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://farmwise@localhost/farmwise").with_max_size(4);
/// assert_eq!(config.max_size(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    checkout_timeout: Duration,
}

impl PoolConfig {
    /// Defaults: 10 connections and a 10 second checkout timeout.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: DEFAULT_MAX_SIZE,
            checkout_timeout: CHECKOUT_TIMEOUT,
        }
    }

    /// Upper bound on open connections; zero is raised to one.
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    /// How long a caller waits for a free connection.
    pub fn with_checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = timeout;
        self
    }

    /// Configured connection ceiling.
    pub fn max_size(&self) -> u32 {
        self.max_size
    }
}

/// Shared PostgreSQL pool handed to every Diesel adapter.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// One idle connection is opened eagerly, so an unreachable database
    /// fails at startup.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url);
        let inner = Pool::builder()
            .max_size(config.max_size)
            .min_idle(Some(MIN_IDLE.min(config.max_size)))
            .connection_timeout(config.checkout_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::Build(err.to_string()))?;
        Ok(Self { inner })
    }

    /// Check out a connection, failing with [`PoolError::Checkout`] on timeout.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::Checkout(err.to_string()))
    }
}

#[async_trait]
impl ReadinessCheck for DbPool {
    /// Check out a connection and run `SELECT 1`.
    async fn is_ready(&self) -> bool {
        let mut conn = match self.get().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!(error = %err, "readiness check could not reach the database");
                return false;
            }
        };
        match diesel::sql_query("SELECT 1").execute(&mut conn).await {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "readiness query failed");
                false
            }
        }
    }
}
