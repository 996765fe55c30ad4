//! `TokenIssuer` that signs HS256 JSON Web Tokens.

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{TokenIssueError, TokenIssuer};
use crate::domain::{AccessToken, UserAccount};

const ISSUER: &str = "farmwise";

/// Claims carried by access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub tier: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 signer with a fixed time-to-live.
pub struct JwtTokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl JwtTokenIssuer {
    /// Sign with `secret`; tokens expire after `ttl`.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            ttl,
        }
    }

    fn claims(&self, account: &UserAccount, now: i64) -> AccessClaims {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        AccessClaims {
            sub: account.id.to_string(),
            email: account.email.to_string(),
            tier: account.tier.as_str().to_owned(),
            iss: ISSUER.to_owned(),
            iat: now,
            exp: now.saturating_add(ttl),
        }
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, account: &UserAccount) -> Result<AccessToken, TokenIssueError> {
        let claims = self.claims(account, Utc::now().timestamp());
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map(AccessToken::new)
            .map_err(|err| TokenIssueError::sign(err.to_string()))
    }
}
