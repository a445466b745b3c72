//! # sessiongate-core
//!
//! Core types, settings, and error types for sessiongate.
//! This crate has no HTTP dependencies and provides the foundation for the other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Gate settings with defaults
//! - [`settings_loader`] - Loading settings from TOML and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::GateError;
pub use settings::{Settings, UserSeed};
