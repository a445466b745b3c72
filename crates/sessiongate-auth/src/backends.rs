//! Credential verification for sessiongate.
//!
//! ## Components
//!
//! - [`UserRepository`] - lookup of a user record by username (the data layer)
//! - [`InMemoryUserRepository`] - repository backed by a map, seeded from settings
//! - [`CredentialVerifier`] - checks a username/password pair against the repository
//!
//! Unknown usernames, inactive accounts, and wrong passwords all collapse to
//! the same "no user" result. Repository failures are errors, not rejections.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use sessiongate_core::{GateError, UserSeed};

use crate::hashers::run_dummy_verification;
use crate::user::User;

/// Credentials submitted with a login attempt.
///
/// Deserialized from the login request body; both fields are required.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// The username to authenticate with.
    pub username: String,
    /// The plaintext password to verify.
    pub password: String,
}

impl Credentials {
    /// Creates credentials from a username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source of user records, looked up by username.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns the user with the given username, or `Ok(None)` if there is none.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, GateError>;
}

/// A user repository held in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a repository from settings seeds, hashing plaintext passwords.
    pub async fn from_seeds(seeds: &[UserSeed]) -> Result<Self, GateError> {
        let repository = Self::new();
        for seed in seeds {
            let hash = match (&seed.password_hash, &seed.password) {
                (Some(hash), None) => hash.clone(),
                (None, Some(raw)) => crate::hashers::make_password(raw).await?,
                _ => {
                    return Err(GateError::ConfigurationError(format!(
                        "user '{}' must set exactly one of password or password_hash",
                        seed.username
                    )))
                }
            };
            let mut user = User::new(seed.username.clone(), hash);
            user.is_active = seed.is_active;
            repository.add_user(user).await;
        }
        tracing::info!(count = seeds.len(), "seeded user repository");
        Ok(repository)
    }

    /// Adds (or replaces) a user.
    pub async fn add_user(&self, user: User) {
        self.users.write().await.insert(user.username.clone(), user);
    }

    /// Returns the number of users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Returns `true` if there are no users.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, GateError> {
        Ok(self.users.read().await.get(username).cloned())
    }
}

/// Verifies submitted credentials against a [`UserRepository`].
#[derive(Clone)]
pub struct CredentialVerifier {
    repository: Arc<dyn UserRepository>,
}

impl CredentialVerifier {
    /// Creates a verifier over the given repository.
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// Returns the user if the credentials match an active account.
    ///
    /// Unknown username, inactive account, and wrong password all return
    /// `Ok(None)`. For an unknown username a throwaway hash is still verified
    /// so the two cases take comparable time.
    pub async fn verify(&self, credentials: &Credentials) -> Result<Option<User>, GateError> {
        let Some(user) = self
            .repository
            .find_by_username(&credentials.username)
            .await?
        else {
            run_dummy_verification(&credentials.password).await?;
            return Ok(None);
        };

        let matches = user.check_password(&credentials.password).await?;
        if matches && user.is_active {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier").finish_non_exhaustive()
    }
}
