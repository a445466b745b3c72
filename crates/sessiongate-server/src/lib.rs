//! # sessiongate-server
//!
//! The HTTP surface of sessiongate, built on axum.
//!
//! ## Endpoints
//!
//! | Method | Path | Purpose |
//! |---|---|---|
//! | `GET` | `/csrf-token` | Issue a CSRF token, creating a session if needed |
//! | `POST` | `/login` | Evaluate a login attempt |
//!
//! ## Modules
//!
//! - [`cookies`] - Signed session cookie
//! - [`handlers`] - Endpoint handlers and shared state
//! - [`error`] - Error and outcome responses
//! - [`server`] - [`GateApp`], router construction, and the session sweeper
//! - [`cli`] - Arguments for the `sessiongate` binary

// These clippy lints are intentionally allowed:
// - doc_markdown: backtick requirements for documentation items are too strict
// - missing_const_for_fn: builder methods may gain runtime logic later
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]

pub mod cli;
pub mod cookies;
pub mod error;
pub mod handlers;
pub mod server;

pub use cookies::SessionCookie;
pub use error::ApiError;
pub use handlers::AppState;
pub use server::{spawn_session_sweeper, GateApp};
