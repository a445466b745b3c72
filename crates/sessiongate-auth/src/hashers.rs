//! Password hashing for sessiongate.
//!
//! Stored passwords are encoded hashes whose prefix identifies the algorithm:
//!
//! - [`Argon2Hasher`] - Argon2id, used for all new hashes
//! - [`BcryptHasher`] - bcrypt, verified for imported hashes
//!
//! Hashing and verification are CPU-bound and run on
//! `tokio::task::spawn_blocking` so they never stall the async runtime.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use sessiongate_core::GateError;

/// Marker prefix for unusable passwords (accounts with no usable password).
const UNUSABLE_PASSWORD_PREFIX: &str = "!";

/// Trait for password hashing backends.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Hashes a password and returns the encoded hash string.
    async fn hash(&self, password: &str) -> Result<String, GateError>;

    /// Verifies a password against an encoded hash.
    async fn verify(&self, password: &str, hash: &str) -> Result<bool, GateError>;
}

/// Argon2id password hasher (primary).
#[derive(Debug, Clone)]
pub struct Argon2Hasher;

#[async_trait]
impl PasswordHasher for Argon2Hasher {
    async fn hash(&self, password: &str) -> Result<String, GateError> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || {
            use argon2::password_hash::{rand_core::OsRng, PasswordHasher as _, SaltString};
            use argon2::Argon2;

            let salt = SaltString::generate(&mut OsRng);
            let hash = Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| GateError::InternalServerError(format!("Argon2 hash error: {e}")))?;
            Ok(hash.to_string())
        })
        .await
        .map_err(|e| GateError::InternalServerError(format!("Task join error: {e}")))?
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, GateError> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || {
            use argon2::password_hash::{PasswordHash, PasswordVerifier};
            use argon2::Argon2;

            let parsed_hash = PasswordHash::new(&hash)
                .map_err(|e| GateError::InternalServerError(format!("Invalid hash: {e}")))?;
            Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok())
        })
        .await
        .map_err(|e| GateError::InternalServerError(format!("Task join error: {e}")))?
    }
}

/// Bcrypt password hasher.
#[derive(Debug, Clone)]
pub struct BcryptHasher {
    /// The bcrypt cost parameter (default: 12).
    pub cost: u32,
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self { cost: 12 }
    }
}

#[async_trait]
impl PasswordHasher for BcryptHasher {
    async fn hash(&self, password: &str) -> Result<String, GateError> {
        let password = password.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || {
            bcrypt::hash(password, cost)
                .map_err(|e| GateError::InternalServerError(format!("Bcrypt hash error: {e}")))
        })
        .await
        .map_err(|e| GateError::InternalServerError(format!("Task join error: {e}")))?
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, GateError> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || {
            bcrypt::verify(password, &hash)
                .map_err(|e| GateError::InternalServerError(format!("Bcrypt verify error: {e}")))
        })
        .await
        .map_err(|e| GateError::InternalServerError(format!("Task join error: {e}")))?
    }
}

/// Identifies the hasher for a given encoded hash.
fn identify_hasher(encoded: &str) -> Option<Box<dyn PasswordHasher>> {
    if encoded.starts_with("$argon2") {
        Some(Box::new(Argon2Hasher))
    } else if encoded.starts_with("$2b$") || encoded.starts_with("$2a$") || encoded.starts_with("$2y$") {
        Some(Box::new(BcryptHasher::default()))
    } else {
        None
    }
}

/// Hashes a password with the preferred hasher (Argon2id).
pub async fn make_password(password: &str) -> Result<String, GateError> {
    Argon2Hasher.hash(password).await
}

/// Checks a password against an encoded hash.
///
/// Identifies the hasher from the hash prefix. Returns `false` for unusable
/// hashes and an error for hashes no hasher recognizes.
pub async fn check_password(password: &str, hash: &str) -> Result<bool, GateError> {
    if !is_password_usable(hash) {
        return Ok(false);
    }

    let hasher = identify_hasher(hash).ok_or_else(|| {
        GateError::InternalServerError(format!(
            "Unknown password hashing algorithm for hash: {}",
            hash.chars().take(8).collect::<String>()
        ))
    })?;

    hasher.verify(password, hash).await
}

/// Returns `true` if the encoded hash represents a usable password.
///
/// Empty hashes and hashes prefixed with `!` are unusable.
pub fn is_password_usable(hash: &str) -> bool {
    !hash.is_empty() && !hash.starts_with(UNUSABLE_PASSWORD_PREFIX)
}

static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

/// Runs a full password verification against a throwaway hash.
///
/// Used when the username is unknown so that the response takes as long as
/// a real verification. The result is always discarded.
pub async fn run_dummy_verification(password: &str) -> Result<(), GateError> {
    let hash = DUMMY_HASH
        .get_or_try_init(|| make_password("sessiongate-dummy-password"))
        .await?;
    Argon2Hasher.verify(password, hash).await.map(|_| ())
}
