//! Core types shared by every steward component
//!
//! - [`error`] - the [`StewardError`] taxonomy and CLI-friendly rendering
//! - [`outcome`] - the [`Outcome`] value returned at pipeline boundaries
//!
//! Components below the pipeline boundary return `anyhow::Result` and raise
//! categorized failures as [`StewardError`] values; the update orchestrator and
//! the pack installer fold everything into an [`Outcome`] so nothing escapes
//! to the caller as an unhandled fault.

pub mod error;
pub mod outcome;

pub use error::{ErrorContext, StewardError, user_friendly_error};
pub use outcome::Outcome;
