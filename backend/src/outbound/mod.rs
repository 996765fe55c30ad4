//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **gemini**: generative model used for chat and farm advice
//! - **paystack**: hosted checkout, verification and signed webhooks
//! - **security**: bcrypt password hashing and JWT access tokens
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod gemini;
pub mod paystack;
pub mod persistence;
pub mod security;
