//! User records consumed by the credential verifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sessiongate_core::GateError;

/// A user account as returned by a [`UserRepository`](crate::backends::UserRepository).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user's unique username.
    pub username: String,
    /// The encoded password hash. May be unusable (prefixed with `!`).
    pub password: String,
    /// Whether this account is active. Inactive accounts cannot log in.
    pub is_active: bool,
    /// When this account was created.
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Creates an active user with the given username and encoded password hash.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password_hash.into(),
            is_active: true,
            date_joined: Utc::now(),
        }
    }

    /// Creates an active user, hashing `raw_password` with the preferred hasher.
    pub async fn with_password(
        username: impl Into<String>,
        raw_password: &str,
    ) -> Result<Self, GateError> {
        let hash = crate::hashers::make_password(raw_password).await?;
        Ok(Self::new(username, hash))
    }

    /// Checks if the given raw password matches the stored hash.
    pub async fn check_password(&self, raw_password: &str) -> Result<bool, GateError> {
        crate::hashers::check_password(raw_password, &self.password).await
    }

    /// Returns `true` if this user has a usable password.
    pub fn has_usable_password(&self) -> bool {
        crate::hashers::is_password_usable(&self.password)
    }
}
