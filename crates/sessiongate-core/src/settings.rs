//! Settings for sessiongate.
//!
//! [`Settings`] holds the whole gate configuration with sensible defaults.
//! Defaults reproduce an Express-style deployment: the session cookie is named
//! `connect.sid`, the CSRF token travels in `x-csrf-token`, and sessions live
//! for the lifetime of the process unless an age is configured.

use serde::{Deserialize, Serialize};

use crate::error::GateError;

/// Minimum accepted secret key length outside debug mode.
const MIN_SECRET_KEY_LEN: usize = 32;

/// A user account seeded into the in-memory user repository at startup.
///
/// Exactly one of `password` (plaintext, hashed at startup) or
/// `password_hash` (an encoded Argon2 or bcrypt hash) must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSeed {
    /// The account's username.
    pub username: String,
    /// Plaintext password, hashed when the repository is built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Pre-computed encoded password hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    /// Whether the account may log in.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

/// The complete set of gate settings.
///
/// # Examples
///
/// ```
/// use sessiongate_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.session_cookie_name, "connect.sid");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,
    /// The secret key used to sign session cookies.
    pub secret_key: String,
    /// Host the server binds to.
    pub host: String,
    /// Port the server binds to.
    pub port: u16,

    // ── Sessions ─────────────────────────────────────────────────────

    /// The name of the session cookie.
    pub session_cookie_name: String,
    /// Session lifetime in seconds. `None` keeps sessions for the process lifetime.
    pub session_cookie_age: Option<u64>,
    /// Whether the session cookie carries the `Secure` attribute.
    pub session_cookie_secure: bool,
    /// The `SameSite` attribute of the session cookie.
    pub session_cookie_samesite: String,
    /// Interval in seconds between sweeps of expired sessions. `None` disables sweeping.
    ///
    /// Sweeping only removes sessions that can expire. With
    /// `session_cookie_age` unset, every `GET /csrf-token` without a cookie
    /// adds a session that stays in memory until the process exits. Set both
    /// fields to bound the store.
    pub session_sweep_interval_secs: Option<u64>,

    // ── CSRF ─────────────────────────────────────────────────────────

    /// The request header carrying the CSRF token.
    pub csrf_header_name: String,

    // ── Login ────────────────────────────────────────────────────────

    /// Whether the success response echoes the submitted password.
    pub login_echo_password: bool,
    /// Accounts seeded into the in-memory user repository.
    pub users: Vec<UserSeed>,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level or filter directive (e.g. "info", "sessiongate=debug").
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Core
            debug: true,
            secret_key: String::new(),
            host: "127.0.0.1".to_string(),
            port: 3000,

            // Sessions
            session_cookie_name: "connect.sid".to_string(),
            session_cookie_age: None,
            session_cookie_secure: false,
            session_cookie_samesite: "Lax".to_string(),
            session_sweep_interval_secs: None,

            // CSRF
            csrf_header_name: "x-csrf-token".to_string(),

            // Login
            login_echo_password: true,
            users: Vec::new(),

            // Logging
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Returns the `host:port` address the server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Checks the settings for values the gate cannot run with.
    ///
    /// Outside debug mode the secret key must be at least 32 bytes. Every
    /// seeded user must carry exactly one of `password` or `password_hash`.
    pub fn validate(&self) -> Result<(), GateError> {
        if !self.debug && self.secret_key.len() < MIN_SECRET_KEY_LEN {
            return Err(GateError::ConfigurationError(format!(
                "secret_key must be at least {MIN_SECRET_KEY_LEN} bytes when debug is off"
            )));
        }

        if !matches!(
            self.session_cookie_samesite.as_str(),
            "Strict" | "Lax" | "None"
        ) {
            return Err(GateError::ConfigurationError(format!(
                "session_cookie_samesite must be Strict, Lax or None, got '{}'",
                self.session_cookie_samesite
            )));
        }

        if self.csrf_header_name.trim().is_empty() {
            return Err(GateError::ConfigurationError(
                "csrf_header_name must not be empty".to_string(),
            ));
        }

        for seed in &self.users {
            if seed.username.is_empty() {
                return Err(GateError::ConfigurationError(
                    "seeded user has an empty username".to_string(),
                ));
            }
            if seed.password.is_some() == seed.password_hash.is_some() {
                return Err(GateError::ConfigurationError(format!(
                    "user '{}' must set exactly one of password or password_hash",
                    seed.username
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert_eq!(s.session_cookie_name, "connect.sid");
        assert_eq!(s.csrf_header_name, "x-csrf-token");
        assert!(s.session_cookie_age.is_none());
        assert!(s.login_echo_password);
        assert!(s.users.is_empty());
        assert_eq!(s.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_validate_debug_allows_empty_secret() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_secret_in_production() {
        let s = Settings {
            debug: false,
            secret_key: "short".to_string(),
            ..Settings::default()
        };
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("secret_key"));
    }

    #[test]
    fn test_validate_accepts_long_secret_in_production() {
        let s = Settings {
            debug: false,
            secret_key: "k".repeat(48),
            ..Settings::default()
        };
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_samesite() {
        let s = Settings {
            session_cookie_samesite: "Sometimes".to_string(),
            ..Settings::default()
        };
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_user_seed_requires_one_password_form() {
        let both = Settings {
            users: vec![UserSeed {
                username: "user1".to_string(),
                password: Some("password1".to_string()),
                password_hash: Some("$argon2id$...".to_string()),
                is_active: true,
            }],
            ..Settings::default()
        };
        assert!(both.validate().is_err());

        let neither = Settings {
            users: vec![UserSeed {
                username: "user1".to_string(),
                ..UserSeed::default()
            }],
            ..Settings::default()
        };
        assert!(neither.validate().is_err());

        let one = Settings {
            users: vec![UserSeed {
                username: "user1".to_string(),
                password: Some("password1".to_string()),
                password_hash: None,
                is_active: true,
            }],
            ..Settings::default()
        };
        assert!(one.validate().is_ok());
    }

    #[test]
    fn test_settings_serde_roundtrip_keeps_users() {
        let s = Settings {
            users: vec![UserSeed {
                username: "user1".to_string(),
                password: Some("password1".to_string()),
                password_hash: None,
                is_active: true,
            }],
            ..Settings::default()
        };
        let json = serde_json::to_string(&s).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.users, s.users);
    }
}
