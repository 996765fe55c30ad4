//! Port abstraction for the append-only chat log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ChatRecord, ChatSessionSummary, Error, SessionId, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by chat repository adapters.
    pub enum ChatPersistenceError {
        Connection { message: String } => "chat repository connection failed: {message}",
        Query { message: String } => "chat repository query failed: {message}",
    }
}

impl From<ChatPersistenceError> for Error {
    fn from(value: ChatPersistenceError) -> Self {
        match value {
            ChatPersistenceError::Connection { message } => Error::service_unavailable(message),
            ChatPersistenceError::Query { message } => Error::internal(message),
        }
    }
}

/// Append-only store of chat exchanges. No update or delete is offered.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn append(&self, record: &ChatRecord) -> Result<(), ChatPersistenceError>;

    /// Messages of one session in chronological order.
    async fn session_history(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<Vec<ChatRecord>, ChatPersistenceError>;

    /// One summary per session, most recent activity first.
    async fn sessions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ChatSessionSummary>, ChatPersistenceError>;

    /// Newest `limit` exchanges of the user, newest first.
    async fn recent(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<ChatRecord>, ChatPersistenceError>;

    /// Exchanges across all users.
    async fn count_all(&self) -> Result<u64, ChatPersistenceError>;

    async fn count_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<u64, ChatPersistenceError>;
}
