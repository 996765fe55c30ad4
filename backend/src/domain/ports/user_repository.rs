//! Port abstraction for user account persistence and its errors.
//!
//! Counter mutations are expressed as single conditional operations so the
//! adapter can close read-modify-write races inside the store.

use async_trait::async_trait;

use crate::domain::{
    Achievement, DuplicateAwardPolicy, Email, Error, NewUserAccount, SubscriptionTier,
    UserAccount, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// An account with the same email already exists.
        DuplicateEmail { email: String } => "user with email {email} already exists",
    }
}

impl From<UserPersistenceError> for Error {
    fn from(value: UserPersistenceError) -> Self {
        match value {
            UserPersistenceError::Connection { message } => Error::service_unavailable(message),
            UserPersistenceError::Query { message } => Error::internal(message),
            UserPersistenceError::DuplicateEmail { .. } => {
                Error::invalid_request("User already exists")
            }
        }
    }
}

/// Result of trying to consume one chat prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptReservation {
    /// The counter was incremented; `prompts_used` is the new value.
    Reserved {
        prompts_used: u32,
        tier: SubscriptionTier,
    },
    /// Free-tier cap reached; the counter is unchanged.
    LimitReached { prompts_used: u32 },
    UnknownUser,
}

/// Result of applying a paid subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionChange {
    /// Tier set and prompt counter reset.
    Applied,
    /// The payment reference was applied before; nothing changed.
    AlreadyApplied,
    UnknownUser,
}

/// Result of awarding an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwardOutcome {
    Awarded { total_points: u32 },
    AlreadyHeld { total_points: u32 },
    UnknownUser,
}

/// Account storage with atomic quota, subscription and award updates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account. Fails with `DuplicateEmail` if the email is taken.
    async fn create(&self, account: &NewUserAccount) -> Result<UserAccount, UserPersistenceError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, UserPersistenceError>;

    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserAccount>, UserPersistenceError>;

    /// Atomically increment `prompts_used` unless the account is free-tier
    /// and already at `free_limit`.
    async fn reserve_prompt(
        &self,
        id: &UserId,
        free_limit: u32,
    ) -> Result<PromptReservation, UserPersistenceError>;

    /// Give back a reserved prompt after a failed exchange. Never drops below zero.
    async fn release_prompt(&self, id: &UserId) -> Result<(), UserPersistenceError>;

    /// Set the tier and reset the prompt counter, once per payment reference.
    async fn apply_subscription(
        &self,
        id: &UserId,
        tier: SubscriptionTier,
        reference: &str,
    ) -> Result<SubscriptionChange, UserPersistenceError>;

    async fn update_sustainability_score(
        &self,
        id: &UserId,
        score: u8,
    ) -> Result<(), UserPersistenceError>;

    /// Append the achievement and add its points, honouring `policy`.
    async fn award_achievement(
        &self,
        id: &UserId,
        achievement: &Achievement,
        policy: DuplicateAwardPolicy,
    ) -> Result<AwardOutcome, UserPersistenceError>;

    /// Achievements held by the user, oldest first.
    async fn achievements(&self, id: &UserId) -> Result<Vec<Achievement>, UserPersistenceError>;

    async fn count_users(&self) -> Result<u64, UserPersistenceError>;

    /// Accounts on the premium or pro tier.
    async fn count_paid_subscribers(&self) -> Result<u64, UserPersistenceError>;
}
