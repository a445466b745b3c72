//! # sessiongate-auth
//!
//! Sessions, CSRF tokens, and credential checking for sessiongate.
//!
//! - **Session store** keyed by opaque random keys (`session`)
//! - **CSRF tokens** bound to a session's secret and masked per issuance (`csrf`)
//! - **Password hashing** with Argon2 and bcrypt backends (`hashers`)
//! - **User records** and the repository they are looked up in (`user`, `backends`)
//! - **The login gate** that combines all three checks (`login`)
//!
//! Password hashing and verification run via `tokio::task::spawn_blocking`.
//! All traits are `Send + Sync` so stores and repositories can be shared
//! across request handlers.

pub mod backends;
pub mod csrf;
pub mod hashers;
pub mod login;
pub mod session;
pub mod user;

pub use backends::{CredentialVerifier, Credentials, InMemoryUserRepository, UserRepository};
pub use csrf::{generate_csrf_secret, issue_token, validate_token};
pub use hashers::{check_password, is_password_usable, make_password, PasswordHasher};
pub use login::{AuthOutcome, LoginGate};
pub use session::{generate_session_key, InMemorySessionStore, SessionData, SessionStore};
pub use user::User;
