//! Actix middleware shared by every route.
//!
//! [`Trace`] assigns the correlation id that domain errors and log lines
//! carry.

pub mod trace;

pub use trace::Trace;
