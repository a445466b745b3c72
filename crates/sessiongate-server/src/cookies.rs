//! The signed session cookie.
//!
//! The cookie value is `<session_key>.<signature>`, where the signature is an
//! HMAC-SHA256 of the session key under the configured secret key. Both parts
//! are URL-safe base64 without padding, so the value needs no quoting.
//!
//! A cookie that is malformed or whose signature does not verify is treated
//! exactly like a missing cookie.

use std::fmt::Write;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use http::HeaderMap;
use percent_encoding::percent_decode_str;
use sha2::Sha256;

use sessiongate_core::Settings;

const SIGNING_SALT: &str = "sessiongate.session";

/// Signs, verifies, and formats the session cookie.
#[derive(Clone)]
pub struct SessionCookie {
    name: String,
    secret_key: String,
    path: String,
    secure: bool,
    samesite: String,
    max_age: Option<u64>,
}

impl SessionCookie {
    /// Creates a cookie codec with the default attributes for `name`.
    pub fn new(name: &str, secret_key: &str) -> Self {
        Self {
            name: name.to_string(),
            secret_key: secret_key.to_string(),
            path: "/".to_string(),
            secure: false,
            samesite: "Lax".to_string(),
            max_age: None,
        }
    }

    /// Creates a cookie codec from the session cookie settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.session_cookie_name, &settings.secret_key)
            .with_secure(settings.session_cookie_secure)
            .with_samesite(&settings.session_cookie_samesite)
            .with_max_age(settings.session_cookie_age)
    }

    /// Sets whether the cookie should be marked as secure.
    #[must_use]
    pub const fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the `SameSite` attribute.
    #[must_use]
    pub fn with_samesite(mut self, samesite: &str) -> Self {
        self.samesite = samesite.to_string();
        self
    }

    /// Sets the `Max-Age` attribute. `None` makes it a browser-session cookie.
    #[must_use]
    pub const fn with_max_age(mut self, max_age: Option<u64>) -> Self {
        self.max_age = max_age;
        self
    }

    /// Returns the cookie name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn mac(&self) -> Hmac<Sha256> {
        let key = format!("{SIGNING_SALT}:{}", self.secret_key);
        Hmac::<Sha256>::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size")
    }

    /// Signs a session key and returns the cookie value.
    pub fn sign(&self, session_key: &str) -> String {
        let mut mac = self.mac();
        mac.update(session_key.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{session_key}.{signature}")
    }

    /// Verifies a cookie value and returns the session key it carries.
    ///
    /// The value is percent-decoded first. Returns `None` for anything that
    /// does not verify.
    pub fn unsign(&self, value: &str) -> Option<String> {
        let decoded = percent_decode_str(value).decode_utf8().ok()?;
        let (session_key, signature) = decoded.rsplit_once('.')?;
        if session_key.is_empty() {
            return None;
        }
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        let mut mac = self.mac();
        mac.update(session_key.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(session_key.to_string())
    }

    /// Extracts and verifies the session key from the request's `Cookie` headers.
    ///
    /// If several cookies carry this name, the first one that verifies wins.
    pub fn session_key_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(http::header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|header| header.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .filter(|(name, _)| *name == self.name)
            .find_map(|(_, value)| self.unsign(value.trim()))
    }

    /// Builds the `Set-Cookie` header value for a session key.
    pub fn build_set_cookie(&self, session_key: &str) -> String {
        let mut cookie = format!("{}={}", self.name, self.sign(session_key));
        let _ = write!(cookie, "; Path={}", self.path);
        if let Some(max_age) = self.max_age {
            let _ = write!(cookie, "; Max-Age={max_age}");
        }
        cookie.push_str("; HttpOnly");
        if self.secure {
            cookie.push_str("; Secure");
        }
        if !self.samesite.is_empty() {
            let _ = write!(cookie, "; SameSite={}", self.samesite);
        }
        cookie
    }
}

impl std::fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("samesite", &self.samesite)
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}
