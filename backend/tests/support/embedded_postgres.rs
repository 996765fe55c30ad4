//! Per-test databases cloned from a migrated template.
//!
//! The template is named after a hash of `backend/migrations`, so a schema
//! change provisions a fresh template instead of reusing a stale one. The
//! template is migrated with the same runner the server uses at startup.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use farmwise::domain::ports::UserPersistenceError;
use farmwise::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use pg_embedded_setup_unpriv::test_support::hash_directory;
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use tokio::runtime::Runtime;
use uuid::Uuid;

use super::cluster_skip::handle_cluster_setup_failure;
use super::pg_embed::shared_cluster;

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const TEMPLATE_NAME_PREFIX: &str = "farmwise_template";
const TEMPLATE_PROVISION_RETRIES: usize = 5;
const TEMPLATE_PROVISION_RETRY_DELAY: Duration = Duration::from_millis(500);
/// Enough connections for the concurrency tests to race for real.
const POOL_SIZE: u32 = 8;

fn migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

fn template_database_name() -> Result<String, UserPersistenceError> {
    let hash = hash_directory(migrations_dir())
        .map_err(|err| UserPersistenceError::query(format!("hash migrations: {err}")))?;
    let short_hash = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_NAME_PREFIX}_{short_hash}"))
}

/// Apply the embedded migrations on a throwaway runtime.
///
/// Must be called outside any Tokio runtime.
pub fn migrate_schema(url: &str) -> Result<usize, UserPersistenceError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| UserPersistenceError::query(format!("migration runtime: {err}")))?;
    runtime
        .block_on(run_pending_migrations(url))
        .map_err(|err| UserPersistenceError::query(format!("migration: {err}")))
}

fn ensure_template_database(cluster: &ClusterHandle) -> Result<String, UserPersistenceError> {
    let template_name = template_database_name()?;
    let _lock = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(template_name.as_str())
        .map_err(|err| UserPersistenceError::query(format!("template check: {err:?}")))?;
    if !exists {
        cluster
            .create_database(template_name.as_str())
            .map_err(|err| UserPersistenceError::query(format!("create template: {err:?}")))?;
        let url = cluster.connection().database_url(&template_name);
        migrate_schema(&url)?;
    }
    Ok(template_name)
}

fn provision_attempt(
    cluster: &ClusterHandle,
    attempt: usize,
) -> Result<TemporaryDatabase, UserPersistenceError> {
    let template_name = ensure_template_database(cluster).map_err(|error| {
        UserPersistenceError::query(format!(
            "template check: attempt {attempt}/{TEMPLATE_PROVISION_RETRIES}: {error}"
        ))
    })?;
    let db_name = format!("test_{}", Uuid::new_v4());
    cluster
        .temporary_database_from_template(db_name.as_str(), template_name.as_str())
        .map_err(|error| {
            UserPersistenceError::query(format!(
                "create database from template: attempt {attempt}/{TEMPLATE_PROVISION_RETRIES}: {error:?}"
            ))
        })
}

/// Clone the migration template into a fresh temporary database.
pub fn provision_template_database(
    cluster: &ClusterHandle,
) -> Result<TemporaryDatabase, UserPersistenceError> {
    let mut last_error = None;
    for attempt in 1..=TEMPLATE_PROVISION_RETRIES {
        match provision_attempt(cluster, attempt) {
            Ok(database) => return Ok(database),
            Err(error) => last_error = Some(error),
        }
        if attempt < TEMPLATE_PROVISION_RETRIES {
            std::thread::sleep(TEMPLATE_PROVISION_RETRY_DELAY);
        }
    }
    Err(last_error.unwrap_or_else(|| {
        UserPersistenceError::query("create database from template: exhausted retries")
    }))
}

/// A migrated database with a pool and the runtime its adapters run on.
///
/// Fields drop in order, so the runtime and pool are gone before the
/// temporary database is removed.
pub struct TestDatabase {
    pub runtime: Runtime,
    pub pool: DbPool,
    _database: TemporaryDatabase,
}

impl TestDatabase {
    /// Provision a database, or `None` when `SKIP_TEST_CLUSTER` allows skipping.
    pub fn provision() -> Option<Self> {
        match Self::try_provision() {
            Ok(database) => Some(database),
            Err(reason) => handle_cluster_setup_failure(reason),
        }
    }

    fn try_provision() -> Result<Self, String> {
        let cluster = shared_cluster()?;
        let database = provision_template_database(cluster).map_err(|err| err.to_string())?;
        let runtime = Runtime::new().map_err(|err| err.to_string())?;
        let config = PoolConfig::new(database.url().to_string()).with_max_size(POOL_SIZE);
        let pool = runtime
            .block_on(DbPool::new(config))
            .map_err(|err| err.to_string())?;
        Ok(Self {
            runtime,
            pool,
            _database: database,
        })
    }

    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
