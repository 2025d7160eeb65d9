//! Subevent catalog management for event registration.
//!
//! The crate owns the subevent domain, the relation constraint validator that guards
//! administrative edits, participant selection checks, and the HTTP routes that expose them.

pub mod config;
pub mod error;
pub mod subevents;
pub mod telemetry;
