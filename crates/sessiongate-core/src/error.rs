//! Core error types for sessiongate.
//!
//! [`GateError`] covers the failure classes the gate can hit: malformed client
//! input, configuration problems and server faults.
//! Each variant maps to an HTTP status code via [`GateError::status_code`].

use thiserror::Error;

/// The primary error type for sessiongate.
///
/// Expected client-facing outcomes of a login attempt (no session, bad token,
/// bad credentials) are not errors; they are modelled as login outcomes in the
/// auth crate. `GateError` is reserved for malformed requests and faults.
#[derive(Error, Debug)]
pub enum GateError {
    // ── HTTP errors ──────────────────────────────────────────────────

    /// HTTP 400 Bad Request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 500 Internal Server Error.
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl GateError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `BadRequest` -> 400
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::InternalServerError(_)
            | Self::ConfigurationError(_)
            | Self::SerializationError(_)
            | Self::IoError(_) => 500,
        }
    }

    /// Returns `true` if this error is a server fault rather than a client error.
    pub const fn is_server_fault(&self) -> bool {
        self.status_code() >= 500
    }
}
