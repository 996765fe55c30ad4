//! `PasswordHasher` backed by bcrypt.
//!
//! bcrypt is deliberately slow, so both operations run on Tokio's blocking
//! pool. Plaintext copies handed to the blocking task are zeroised on drop.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// bcrypt adapter with a configurable work factor.
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl BcryptPasswordHasher {
    /// Use `cost` rounds, clamped to bcrypt's accepted range.
    pub fn with_cost(cost: u32) -> Self {
        Self {
            cost: cost.clamp(4, 31),
        }
    }
}

fn join_error(error: tokio::task::JoinError) -> PasswordHashError {
    PasswordHashError::hash(format!("hashing task failed: {error}"))
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        let password = Zeroizing::new(password.to_owned());
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password.as_str(), cost))
            .await
            .map_err(join_error)?
            .map_err(|err| PasswordHashError::hash(err.to_string()))
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError> {
        let password = Zeroizing::new(password.to_owned());
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(password.as_str(), &hash))
            .await
            .map_err(join_error)?
            .map_err(|err| PasswordHashError::hash(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn hasher() -> BcryptPasswordHasher {
        BcryptPasswordHasher::with_cost(4)
    }

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hasher().hash("correct horse").await.expect("hash");
        assert!(hash.starts_with("$2"));
        assert!(hasher().verify("correct horse", &hash).await.expect("verify"));
        assert!(!hasher().verify("wrong horse", &hash).await.expect("verify"));
    }

    #[tokio::test]
    async fn malformed_hash_is_an_error() {
        let err = hasher()
            .verify("anything", "not-a-bcrypt-hash")
            .await
            .expect_err("malformed hash");
        assert!(matches!(err, PasswordHashError::Hash { .. }));
    }

    #[rstest]
    #[case(1, 4)]
    #[case(10, 10)]
    #[case(40, 31)]
    fn cost_is_clamped(#[case] requested: u32, #[case] expected: u32) {
        assert_eq!(BcryptPasswordHasher::with_cost(requested).cost, expected);
    }
}
