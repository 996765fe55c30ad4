//! Port used by the readiness endpoint to check backing services.

use async_trait::async_trait;

/// Reports whether a dependency can currently serve requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadinessCheck: Send + Sync {
    /// True when the dependency answered in time.
    async fn is_ready(&self) -> bool;
}
