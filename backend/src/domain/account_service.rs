//! Account registration and login.

use std::sync::Arc;

use tracing::info;

use crate::domain::ports::{PasswordHasher, TokenIssuer, UserRepository};
use crate::domain::{
    AccessToken, Error, LoginCredentials, NewUserAccount, Registration, UserAccount, UserId,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Token and account returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSession {
    /// Signed bearer token for the account.
    pub token: AccessToken,
    pub user: UserAccount,
}

/// Registration and password login.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Create a free-tier account. Existing emails are rejected.
    pub async fn register(&self, registration: &Registration) -> Result<UserAccount, Error> {
        if self
            .users
            .find_by_email(registration.email())
            .await?
            .is_some()
        {
            return Err(Error::invalid_request("User already exists"));
        }

        let password_hash = self.hasher.hash(registration.password()).await?;
        let account = self
            .users
            .create(&NewUserAccount {
                id: UserId::random(),
                email: registration.email().clone(),
                password_hash,
                profile: registration.profile().clone(),
            })
            .await?;
        info!(user_id = %account.id, "account registered");
        Ok(account)
    }

    /// Check credentials and issue a bearer token.
    ///
    /// Unknown emails and wrong passwords produce the same error.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginSession, Error> {
        let Some(user) = self.users.find_by_email(credentials.email()).await? else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        if !self
            .hasher
            .verify(credentials.password(), &user.password_hash)
            .await?
        {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }

        let token = self.tokens.issue(&user)?;
        info!(user_id = %user.id, "login succeeded");
        Ok(LoginSession { token, user })
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
