//! Credential adapters: bcrypt password hashing and HS256 access tokens.

mod bcrypt_hasher;
mod jwt_issuer;

pub use bcrypt_hasher::BcryptPasswordHasher;
pub use jwt_issuer::{AccessClaims, JwtTokenIssuer};
