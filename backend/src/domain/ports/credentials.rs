//! Driven ports for password hashing and access token issuance.

use async_trait::async_trait;

use crate::domain::{AccessToken, Error, UserAccount};

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHashError {
        Hash { message: String } => "password hashing failed: {message}",
    }
}

define_port_error! {
    /// Errors raised by token issuing adapters.
    pub enum TokenIssueError {
        Sign { message: String } => "token signing failed: {message}",
    }
}

impl From<PasswordHashError> for Error {
    fn from(value: PasswordHashError) -> Self {
        Error::internal(value.to_string())
    }
}

impl From<TokenIssueError> for Error {
    fn from(value: TokenIssueError) -> Self {
        Error::internal(value.to_string())
    }
}

/// Hashing is CPU bound; adapters move it off the async executor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// `Ok(false)` for a mismatch; errors are reserved for malformed hashes.
    async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError>;
}

/// Issues and validates bearer tokens.
#[cfg_attr(test, mockall::automock)]
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, account: &UserAccount) -> Result<AccessToken, TokenIssueError>;
}
