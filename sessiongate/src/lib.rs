//! # sessiongate
//!
//! A session-based login gate with CSRF protection.
//!
//! This is the meta-crate that re-exports the sub-crates. Depend on
//! `sessiongate` for everything, or on individual crates for finer-grained
//! control.

/// Settings, logging, and error types.
pub use sessiongate_core as core;

/// Sessions, CSRF tokens, password hashing, and the login gate.
pub use sessiongate_auth as auth;

/// HTTP surface: cookies, handlers, and the application builder.
#[cfg(feature = "server")]
pub use sessiongate_server as server;

/// In-process test client and fixtures.
#[cfg(feature = "testing")]
pub use sessiongate_test as test;
