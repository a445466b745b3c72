//! CSRF (Cross-Site Request Forgery) token issuance and validation.
//!
//! Each session carries a random CSRF secret, created the first time a token
//! is requested for it. Tokens handed to clients are the secret XOR-masked
//! with a fresh random mask, so every issuance returns a different string
//! while all of them stay valid for the session. Masking keeps the secret out
//! of compressed responses (BREACH).
//!
//! Tokens travel in the response body and come back in a request header;
//! they are never set as cookies.
//!
//! ## Validation
//!
//! [`validate_token`] is a single boolean gate: it fails when the session is
//! missing, when no token was ever issued for it, or when the presented value
//! does not match. Callers do not learn which.

use rand::RngCore;

use sessiongate_core::GateError;

use crate::session::{SessionData, SessionStore};

/// The length of a CSRF secret in bytes (produces 64-char hex string).
const CSRF_SECRET_LENGTH: usize = 32;

/// Generates a cryptographically random CSRF secret as a 64-character hex string.
pub fn generate_csrf_secret() -> String {
    let mut bytes = [0u8; CSRF_SECRET_LENGTH];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

/// Masks a CSRF secret using XOR masking.
///
/// Generates a random mask, XORs it with the secret bytes, and returns
/// the concatenation of mask and masked secret as a hex string.
pub fn mask_csrf_token(secret: &str) -> String {
    let Some(secret_bytes) = hex_decode(secret) else {
        return String::new();
    };

    let mut mask = vec![0u8; secret_bytes.len()];
    rand::thread_rng().fill_bytes(&mut mask);

    let masked: Vec<u8> = secret_bytes
        .iter()
        .zip(mask.iter())
        .map(|(t, m)| t ^ m)
        .collect();

    let mut result = mask;
    result.extend_from_slice(&masked);
    hex_encode(&result)
}

/// Unmasks a previously masked CSRF token back into the secret.
///
/// Returns an empty string for input that is not valid masked hex.
pub fn unmask_csrf_token(masked: &str) -> String {
    let Some(bytes) = hex_decode(masked) else {
        return String::new();
    };

    if bytes.is_empty() || bytes.len() % 2 != 0 {
        return String::new();
    }

    let half = bytes.len() / 2;
    let mask = &bytes[..half];
    let masked_secret = &bytes[half..];

    let unmasked: Vec<u8> = masked_secret
        .iter()
        .zip(mask.iter())
        .map(|(m, k)| m ^ k)
        .collect();

    hex_encode(&unmasked)
}

/// Issues a CSRF token bound to `session`.
///
/// Creates the session's secret on first use and returns a freshly masked
/// token. Earlier tokens for the same session remain valid. Returns `Ok(None)`
/// if the session vanished from the store (deleted or expired) in the meantime.
pub async fn issue_token(
    store: &dyn SessionStore,
    session: &SessionData,
) -> Result<Option<String>, GateError> {
    let secret = match &session.csrf_secret {
        Some(secret) => Some(secret.clone()),
        None => {
            store
                .get_or_init_csrf_secret(&session.session_key, generate_csrf_secret())
                .await?
        }
    };
    Ok(secret.map(|secret| mask_csrf_token(&secret)))
}

/// Validates a presented CSRF token against a session.
///
/// Returns `true` only if a session exists, a token was issued for it, and the
/// presented value is either a masked form of the session's secret or the
/// secret itself. The value is compared exactly as presented, surrounding
/// whitespace included. Comparison is constant-time.
pub fn validate_token(session: Option<&SessionData>, presented: Option<&str>) -> bool {
    let (Some(session), Some(presented)) = (session, presented) else {
        return false;
    };
    let Some(secret) = session.csrf_secret.as_deref() else {
        return false;
    };
    if presented.is_empty() || secret.is_empty() {
        return false;
    }

    let effective = if presented.len() == secret.len() * 2 {
        unmask_csrf_token(presented)
    } else {
        presented.to_string()
    };

    constant_time_eq(effective.as_bytes(), secret.as_bytes())
}

/// Constant-time byte comparison to prevent timing attacks.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Encodes bytes as a hex string.
fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
            let _ = write!(s, "{b:02x}");
            s
        })
}

/// Decodes a hex string into bytes.
fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    for i in (0..hex.len()).step_by(2) {
        let byte = u8::from_str_radix(&hex[i..i + 2], 16).ok()?;
        bytes.push(byte);
    }
    Some(bytes)
}
