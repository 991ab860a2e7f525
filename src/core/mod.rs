//! # Core Module
//!
//! Core domain types, configuration, and error handling for medscan.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add response module with terminal formatting for events and reminders
//! - 1.0.0: Initial creation with config and error modules

pub mod config;
pub mod error;
pub mod response;

#[cfg(test)]
pub(crate) mod http_stub;

// Re-export commonly used items
pub use config::Config;
pub use error::{MatchError, MedScanError};
pub use response::{format_drug_event, format_duration, format_notification, truncate_for_display};
