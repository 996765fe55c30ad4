//! Gemini outbound adapter.
//!
//! Thin HTTP implementation of the `AdvisoryModel` port against the
//! `generateContent` endpoint.

mod dto;
mod http_model;

pub use http_model::{GeminiConfig, GeminiHttpModel};
