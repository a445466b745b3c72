//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `SESSIONGATE_SECRET_KEY` | `secret_key` |
//! | `SESSIONGATE_DEBUG` | `debug` |
//! | `SESSIONGATE_HOST` | `host` |
//! | `SESSIONGATE_PORT` | `port` |
//! | `SESSIONGATE_LOG_LEVEL` | `log_level` |
//! | `SESSIONGATE_SESSION_COOKIE_NAME` | `session_cookie_name` |
//! | `SESSIONGATE_SESSION_COOKIE_AGE` | `session_cookie_age` |
//! | `SESSIONGATE_SESSION_COOKIE_SECURE` | `session_cookie_secure` |
//! | `SESSIONGATE_CSRF_HEADER_NAME` | `csrf_header_name` |
//! | `SESSIONGATE_LOGIN_ECHO_PASSWORD` | `login_echo_password` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use sessiongate_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("sessiongate.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::GateError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Any fields not present in the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, GateError> {
    // Go through serde_json::Value so that missing keys fall back to defaults.
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| GateError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    let json_value = toml_to_json(toml_value);
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        GateError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, json_value);
    serde_json::from_value(merged).map_err(|e| {
        GateError::ConfigurationError(format!("Failed to deserialize settings from TOML: {e}"))
    })
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, GateError> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
        GateError::ConfigurationError(format!(
            "Failed to read TOML file '{}': {e}",
            path.as_ref().display()
        ))
    })?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, GateError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `SESSIONGATE_*` environment variable overrides to a settings struct.
///
/// Unparseable numeric values are ignored and leave the setting untouched.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides_from(settings, |key| std::env::var(key).ok());
}

fn apply_overrides_from(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("SESSIONGATE_SECRET_KEY") {
        settings.secret_key = val;
    }

    if let Some(val) = var("SESSIONGATE_DEBUG") {
        settings.debug = parse_bool(&val);
    }

    if let Some(val) = var("SESSIONGATE_HOST") {
        settings.host = val;
    }

    if let Some(val) = var("SESSIONGATE_PORT") {
        if let Ok(port) = val.parse::<u16>() {
            settings.port = port;
        }
    }

    if let Some(val) = var("SESSIONGATE_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = var("SESSIONGATE_SESSION_COOKIE_NAME") {
        settings.session_cookie_name = val;
    }

    if let Some(val) = var("SESSIONGATE_SESSION_COOKIE_AGE") {
        if let Ok(age) = val.parse::<u64>() {
            settings.session_cookie_age = Some(age);
        }
    }

    if let Some(val) = var("SESSIONGATE_SESSION_COOKIE_SECURE") {
        settings.session_cookie_secure = parse_bool(&val);
    }

    if let Some(val) = var("SESSIONGATE_CSRF_HEADER_NAME") {
        settings.csrf_header_name = val;
    }

    if let Some(val) = var("SESSIONGATE_LOGIN_ECHO_PASSWORD") {
        settings.login_echo_password = parse_bool(&val);
    }
}

fn parse_bool(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

// ============================================================
// Helpers
// ============================================================

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}
