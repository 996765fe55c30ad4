//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Quota and point counters are changed with single conditional statements or
//! inside a row-locking transaction, so concurrent requests for the same user
//! cannot overshoot the free-tier cap or double-award a badge.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::ports::{
    AwardOutcome, PromptReservation, SubscriptionChange, UserPersistenceError, UserRepository,
};
use crate::domain::{
    Achievement, DuplicateAwardPolicy, Email, Language, NewUserAccount, SubscriptionTier,
    UserAccount, UserId, UserProfile,
};

use super::diesel_error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{
    AchievementRow, NewAchievementRow, NewSubscriptionPaymentRow, NewUserRow, UserRow,
    count_from_db, count_to_db,
};
use super::pool::{DbPool, PoolError};
use super::schema::{subscription_payments, user_achievements, users};

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> UserPersistenceError {
    map_pool_error(error, UserPersistenceError::connection)
}

fn diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    map_diesel_error(
        error,
        UserPersistenceError::query,
        UserPersistenceError::connection,
    )
}

fn row_to_account(row: UserRow) -> Result<UserAccount, UserPersistenceError> {
    let email = Email::new(&row.email)
        .map_err(|err| UserPersistenceError::query(format!("stored email is invalid: {err}")))?;
    let tier = row.subscription_tier.parse::<SubscriptionTier>().map_err(|err| {
        UserPersistenceError::query(format!("stored subscription tier is invalid: {err}"))
    })?;
    let user_type = row.user_type.parse().unwrap_or_else(|_| {
        warn!(
            value = %row.user_type,
            user_id = %row.id,
            "unrecognised user_type value, defaulting to farmer"
        );
        Default::default()
    });

    Ok(UserAccount {
        id: UserId::from_uuid(row.id),
        email,
        password_hash: row.password_hash,
        tier,
        prompts_used: count_from_db(row.prompts_used),
        total_points: count_from_db(row.total_points),
        sustainability_score: u8::try_from(row.sustainability_score).unwrap_or(0),
        profile: UserProfile {
            name: row.name,
            user_type,
            region: row.region,
            preferred_language: Language::new(row.preferred_language),
        },
        subscription_reference: row.subscription_reference,
        created_at: row.created_at,
    })
}

fn row_to_achievement(row: AchievementRow) -> Achievement {
    Achievement {
        badge: row.badge,
        description: row.description,
        points: count_from_db(row.points),
        earned_at: row.earned_at,
    }
}

fn parse_tier(raw: &str) -> Result<SubscriptionTier, UserPersistenceError> {
    raw.parse().map_err(|err| {
        UserPersistenceError::query(format!("stored subscription tier is invalid: {err}"))
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, account: &NewUserAccount) -> Result<UserAccount, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let profile = &account.profile;
        let new_row = NewUserRow {
            id: *account.id.as_uuid(),
            email: account.email.as_ref(),
            password_hash: &account.password_hash,
            name: profile.name.as_deref(),
            user_type: profile.user_type.as_str(),
            region: profile.region.as_deref(),
            preferred_language: profile.preferred_language.as_ref(),
        };

        let row = diesel::insert_into(users::table)
            .values(&new_row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    UserPersistenceError::duplicate_email(account.email.as_ref())
                } else {
                    diesel_error(err)
                }
            })?;
        row_to_account(row)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = users::table
            .filter(users::id.eq(id.as_uuid()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_account).transpose()
    }

    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(row_to_account).transpose()
    }

    async fn reserve_prompt(
        &self,
        id: &UserId,
        free_limit: u32,
    ) -> Result<PromptReservation, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let uuid = *id.as_uuid();

        let reserved: Option<(i32, String)> = diesel::update(
            users::table.filter(users::id.eq(uuid)).filter(
                users::subscription_tier
                    .ne(SubscriptionTier::Free.as_str())
                    .or(users::prompts_used.lt(count_to_db(free_limit))),
            ),
        )
        .set((
            users::prompts_used.eq(users::prompts_used + 1),
            users::updated_at.eq(diesel::dsl::now),
        ))
        .returning((users::prompts_used, users::subscription_tier))
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(diesel_error)?;

        if let Some((prompts_used, tier)) = reserved {
            return Ok(PromptReservation::Reserved {
                prompts_used: count_from_db(prompts_used),
                tier: parse_tier(&tier)?,
            });
        }

        let current: Option<i32> = users::table
            .filter(users::id.eq(uuid))
            .select(users::prompts_used)
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        Ok(match current {
            Some(prompts_used) => PromptReservation::LimitReached {
                prompts_used: count_from_db(prompts_used),
            },
            None => PromptReservation::UnknownUser,
        })
    }

    async fn release_prompt(&self, id: &UserId) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let released = diesel::update(
            users::table
                .filter(users::id.eq(id.as_uuid()))
                .filter(users::prompts_used.gt(0)),
        )
        .set((
            users::prompts_used.eq(users::prompts_used - 1),
            users::updated_at.eq(diesel::dsl::now),
        ))
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        debug!(user_id = %id, released, "prompt released");
        Ok(())
    }

    async fn apply_subscription(
        &self,
        id: &UserId,
        tier: SubscriptionTier,
        reference: &str,
    ) -> Result<SubscriptionChange, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let uuid = *id.as_uuid();

        conn.transaction(|conn| {
            async move {
                let exists: Option<Uuid> = users::table
                    .filter(users::id.eq(uuid))
                    .select(users::id)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                if exists.is_none() {
                    return Ok(SubscriptionChange::UnknownUser);
                }

                let inserted = diesel::insert_into(subscription_payments::table)
                    .values(&NewSubscriptionPaymentRow {
                        reference,
                        user_id: uuid,
                        subscription_tier: tier.as_str(),
                    })
                    .on_conflict(subscription_payments::reference)
                    .do_nothing()
                    .execute(conn)
                    .await?;
                if inserted == 0 {
                    return Ok(SubscriptionChange::AlreadyApplied);
                }

                diesel::update(users::table.filter(users::id.eq(uuid)))
                    .set((
                        users::subscription_tier.eq(tier.as_str()),
                        users::prompts_used.eq(0),
                        users::subscription_reference.eq(reference),
                        users::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(conn)
                    .await?;
                Ok(SubscriptionChange::Applied)
            }
            .scope_boxed()
        })
        .await
        .map_err(diesel_error)
    }

    async fn update_sustainability_score(
        &self,
        id: &UserId,
        score: u8,
    ) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::update(users::table.filter(users::id.eq(id.as_uuid())))
            .set((
                users::sustainability_score.eq(i16::from(score)),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(())
    }

    async fn award_achievement(
        &self,
        id: &UserId,
        achievement: &Achievement,
        policy: DuplicateAwardPolicy,
    ) -> Result<AwardOutcome, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let uuid = *id.as_uuid();

        conn.transaction(|conn| {
            async move {
                let current: Option<i32> = users::table
                    .filter(users::id.eq(uuid))
                    .select(users::total_points)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                let Some(current) = current else {
                    return Ok(AwardOutcome::UnknownUser);
                };

                if policy == DuplicateAwardPolicy::OncePerBadge {
                    let held: bool = diesel::select(diesel::dsl::exists(
                        user_achievements::table
                            .filter(user_achievements::user_id.eq(uuid))
                            .filter(user_achievements::badge.eq(&achievement.badge)),
                    ))
                    .get_result(conn)
                    .await?;
                    if held {
                        return Ok(AwardOutcome::AlreadyHeld {
                            total_points: count_from_db(current),
                        });
                    }
                }

                let points = count_to_db(achievement.points);
                diesel::insert_into(user_achievements::table)
                    .values(&NewAchievementRow {
                        id: Uuid::new_v4(),
                        user_id: uuid,
                        badge: &achievement.badge,
                        description: &achievement.description,
                        points,
                        earned_at: achievement.earned_at,
                    })
                    .execute(conn)
                    .await?;

                let total: i32 = diesel::update(users::table.filter(users::id.eq(uuid)))
                    .set((
                        users::total_points.eq(users::total_points + points),
                        users::updated_at.eq(diesel::dsl::now),
                    ))
                    .returning(users::total_points)
                    .get_result(conn)
                    .await?;
                Ok(AwardOutcome::Awarded {
                    total_points: count_from_db(total),
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(diesel_error)
    }

    async fn achievements(&self, id: &UserId) -> Result<Vec<Achievement>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows = user_achievements::table
            .filter(user_achievements::user_id.eq(id.as_uuid()))
            .order(user_achievements::earned_at.asc())
            .select(AchievementRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(rows.into_iter().map(row_to_achievement).collect())
    }

    async fn count_users(&self) -> Result<u64, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let count: i64 = users::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn count_paid_subscribers(&self) -> Result<u64, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let count: i64 = users::table
            .filter(users::subscription_tier.ne(SubscriptionTier::Free.as_str()))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
