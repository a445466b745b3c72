//! Session store for sessiongate.
//!
//! This module provides the [`SessionStore`] trait and [`InMemorySessionStore`],
//! the process-wide map from an opaque session key to a [`SessionData`] record.
//!
//! ## Absence is not an error
//!
//! Looking up an unknown, malformed, or expired key returns `Ok(None)`.
//! `Err` is reserved for a failing backend and surfaces as a server fault.
//!
//! ## Login record
//!
//! A successful login stamps `user` and `last_login` on the session. The
//! gate itself authorizes nothing further with them; they are logged and kept
//! for handlers mounted behind the login.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use tokio::sync::RwLock;

use sessiongate_core::GateError;

/// Number of random bytes in a session key (43 URL-safe base64 chars).
const SESSION_KEY_BYTES: usize = 32;

/// Data associated with a client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    /// The unique session key identifying this session.
    pub session_key: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session expires. `None` means it lives as long as the store.
    pub expire_date: Option<DateTime<Utc>>,
    /// The CSRF secret bound to this session, set on first token issuance.
    pub csrf_secret: Option<String>,
    /// Username recorded by the last successful login on this session.
    pub user: Option<String>,
    /// Timestamp of the last successful login on this session.
    pub last_login: Option<DateTime<Utc>>,
}

impl SessionData {
    /// Creates a new session with the given key and no expiry.
    pub fn new(session_key: String) -> Self {
        Self {
            session_key,
            created_at: Utc::now(),
            expire_date: None,
            csrf_secret: None,
            user: None,
            last_login: None,
        }
    }

    /// Creates a new session that expires after `lifetime_seconds`.
    pub fn with_lifetime(session_key: String, lifetime_seconds: u64) -> Self {
        let seconds = i64::try_from(lifetime_seconds).unwrap_or(i64::MAX);
        let mut session = Self::new(session_key);
        session.expire_date = Some(
            Duration::try_seconds(seconds)
                .and_then(|lifetime| session.created_at.checked_add_signed(lifetime))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        );
        session
    }

    /// Returns `true` if the session has expired.
    pub fn is_expired(&self) -> bool {
        self.expire_date.is_some_and(|expire| Utc::now() >= expire)
    }

    /// Returns `true` if a login has succeeded on this session.
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Generates a fresh, unguessable session key from the OS RNG.
pub fn generate_session_key() -> String {
    let mut bytes = [0u8; SESSION_KEY_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Returns `true` if `key` has the shape of a key produced by [`generate_session_key`].
pub fn is_well_formed_session_key(key: &str) -> bool {
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(key)
        .is_ok_and(|bytes| bytes.len() == SESSION_KEY_BYTES)
}

/// A backend for storing and retrieving sessions.
///
/// Implementations must be `Send + Sync`; the store is shared by every
/// in-flight request. Operations on one key must be atomic with respect to
/// each other.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates and stores a fresh session.
    async fn create(&self) -> Result<SessionData, GateError>;

    /// Loads a session. Unknown, malformed, or expired keys yield `Ok(None)`.
    async fn get(&self, session_key: &str) -> Result<Option<SessionData>, GateError>;

    /// Returns the session's CSRF secret, storing `candidate` if none exists yet.
    ///
    /// Returns `Ok(None)` if the session is absent.
    async fn get_or_init_csrf_secret(
        &self,
        session_key: &str,
        candidate: String,
    ) -> Result<Option<String>, GateError>;

    /// Records a successful login on the session.
    ///
    /// Returns `false` if the session is absent.
    async fn record_login(&self, session_key: &str, username: &str) -> Result<bool, GateError>;

    /// Deletes a session by its key.
    async fn delete(&self, session_key: &str) -> Result<(), GateError>;

    /// Removes all expired sessions and returns how many were removed.
    async fn clear_expired(&self) -> Result<usize, GateError>;

    /// Returns the number of stored sessions, expired ones included.
    async fn len(&self) -> Result<usize, GateError>;
}

/// An in-memory session store.
///
/// Stores all sessions in a thread-safe map. Sessions are lost when the
/// process exits.
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionData>>>,
    lifetime_seconds: Option<u64>,
}

impl InMemorySessionStore {
    /// Creates a store whose sessions never expire.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose sessions expire `lifetime_seconds` after creation.
    pub fn with_lifetime(lifetime_seconds: u64) -> Self {
        Self {
            sessions: Arc::default(),
            lifetime_seconds: Some(lifetime_seconds),
        }
    }

    /// Returns the configured session lifetime.
    pub const fn lifetime_seconds(&self) -> Option<u64> {
        self.lifetime_seconds
    }

    fn fresh_session(&self) -> SessionData {
        let key = generate_session_key();
        match self.lifetime_seconds {
            Some(lifetime) => SessionData::with_lifetime(key, lifetime),
            None => SessionData::new(key),
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self) -> Result<SessionData, GateError> {
        let mut sessions = self.sessions.write().await;
        let mut session = self.fresh_session();
        // A collision on 256 random bits would mean a broken RNG; regenerate anyway.
        while sessions.contains_key(&session.session_key) {
            session = self.fresh_session();
        }
        sessions.insert(session.session_key.clone(), session.clone());
        drop(sessions);

        tracing::debug!("session created");
        Ok(session)
    }

    async fn get(&self, session_key: &str) -> Result<Option<SessionData>, GateError> {
        if !is_well_formed_session_key(session_key) {
            return Ok(None);
        }
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_key)
            .filter(|s| !s.is_expired())
            .cloned())
    }

    async fn get_or_init_csrf_secret(
        &self,
        session_key: &str,
        candidate: String,
    ) -> Result<Option<String>, GateError> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(session_key).filter(|s| !s.is_expired()) else {
            return Ok(None);
        };
        Ok(Some(
            session.csrf_secret.get_or_insert(candidate).clone(),
        ))
    }

    async fn record_login(&self, session_key: &str, username: &str) -> Result<bool, GateError> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(session_key).filter(|s| !s.is_expired()) else {
            return Ok(false);
        };
        let now = Utc::now();
        let previous = session.last_login.replace(now);
        session.user = Some(username.to_string());
        drop(sessions);

        tracing::debug!(
            username,
            login_at = %now,
            previous_login = ?previous,
            "login recorded on session"
        );
        Ok(true)
    }

    async fn delete(&self, session_key: &str) -> Result<(), GateError> {
        self.sessions.write().await.remove(session_key);
        Ok(())
    }

    async fn clear_expired(&self) -> Result<usize, GateError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired());
        Ok(before - sessions.len())
    }

    async fn len(&self) -> Result<usize, GateError> {
        Ok(self.sessions.read().await.len())
    }
}
