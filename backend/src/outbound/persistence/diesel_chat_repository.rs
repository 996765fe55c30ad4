//! PostgreSQL-backed `ChatRepository` implementation using Diesel ORM.
//!
//! The chat log is append-only: the adapter exposes inserts and reads only.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, max};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{ChatPersistenceError, ChatRepository};
use crate::domain::{ChatRecord, ChatSessionSummary, Language, SessionId, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{ChatRow, NewChatRow, total_from_db};
use super::pool::{DbPool, PoolError};
use super::schema::chats;

/// Diesel-backed implementation of the `ChatRepository` port.
#[derive(Clone)]
pub struct DieselChatRepository {
    pool: DbPool,
}

impl DieselChatRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> ChatPersistenceError {
    map_pool_error(error, ChatPersistenceError::connection)
}

fn diesel_error(error: diesel::result::Error) -> ChatPersistenceError {
    map_diesel_error(
        error,
        ChatPersistenceError::query,
        ChatPersistenceError::connection,
    )
}

fn session_id(raw: &str) -> Result<SessionId, ChatPersistenceError> {
    SessionId::new(raw)
        .map_err(|err| ChatPersistenceError::query(format!("stored session id is invalid: {err}")))
}

fn row_to_record(row: ChatRow) -> Result<ChatRecord, ChatPersistenceError> {
    Ok(ChatRecord {
        user_id: UserId::from_uuid(row.user_id),
        session_id: session_id(&row.session_id)?,
        message: row.message,
        response: row.response,
        language: Language::new(row.language),
        created_at: row.created_at,
    })
}

/// Join per-session aggregates with each session's newest message.
fn summarise(
    aggregates: Vec<(String, i64, Option<DateTime<Utc>>)>,
    latest: Vec<(String, String)>,
) -> Result<Vec<ChatSessionSummary>, ChatPersistenceError> {
    let mut last_messages: HashMap<String, String> = latest.into_iter().collect();
    let mut summaries = aggregates
        .into_iter()
        .filter_map(|(raw, count, last_activity)| {
            let last_activity = last_activity?;
            let last_message = last_messages.remove(&raw).unwrap_or_default();
            Some(session_id(&raw).map(|session_id| ChatSessionSummary {
                session_id,
                last_message,
                message_count: u32::try_from(count).unwrap_or(u32::MAX),
                last_activity,
            }))
        })
        .collect::<Result<Vec<_>, _>>()?;
    summaries.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
    Ok(summaries)
}

#[async_trait]
impl ChatRepository for DieselChatRepository {
    async fn append(&self, record: &ChatRecord) -> Result<(), ChatPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(chats::table)
            .values(&NewChatRow {
                id: Uuid::new_v4(),
                user_id: *record.user_id.as_uuid(),
                session_id: record.session_id.as_ref(),
                message: &record.message,
                response: &record.response,
                language: record.language.as_ref(),
                created_at: record.created_at,
            })
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(())
    }

    async fn session_history(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<Vec<ChatRecord>, ChatPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = chats::table
            .filter(chats::user_id.eq(user_id.as_uuid()))
            .filter(chats::session_id.eq(session_id.as_ref()))
            .order(chats::created_at.asc())
            .select(ChatRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows.into_iter().map(row_to_record).collect()
    }

    async fn sessions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ChatSessionSummary>, ChatPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let uuid = *user_id.as_uuid();

        let aggregates: Vec<(String, i64, Option<DateTime<Utc>>)> = chats::table
            .filter(chats::user_id.eq(uuid))
            .group_by(chats::session_id)
            .select((chats::session_id, count_star(), max(chats::created_at)))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        let latest: Vec<(String, String)> = chats::table
            .filter(chats::user_id.eq(uuid))
            .distinct_on(chats::session_id)
            .order((chats::session_id, chats::created_at.desc()))
            .select((chats::session_id, chats::message))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        summarise(aggregates, latest)
    }

    async fn recent(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<ChatRecord>, ChatPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = chats::table
            .filter(chats::user_id.eq(user_id.as_uuid()))
            .order(chats::created_at.desc())
            .limit(i64::from(limit))
            .select(ChatRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows.into_iter().map(row_to_record).collect()
    }

    async fn count_all(&self) -> Result<u64, ChatPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let count: i64 = chats::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(total_from_db(count))
    }

    async fn count_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<u64, ChatPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let count: i64 = chats::table
            .filter(chats::user_id.eq(user_id.as_uuid()))
            .filter(chats::created_at.ge(since))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(total_from_db(count))
    }
}
