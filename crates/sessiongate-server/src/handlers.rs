//! Request handlers for the two endpoints.
//!
//! - `GET /csrf-token` issues a CSRF token for the caller's session, creating
//!   the session (and setting its cookie) when the request carried none.
//! - `POST /login` runs the [`LoginGate`] over the session cookie, the CSRF
//!   header, and the JSON credentials.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use sessiongate_auth::{issue_token, AuthOutcome, Credentials, LoginGate, SessionStore};
use sessiongate_core::GateError;

use crate::cookies::SessionCookie;
use crate::error::{rejection_response, ApiError};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The session store.
    pub sessions: Arc<dyn SessionStore>,
    /// The login state machine.
    pub gate: LoginGate,
    /// Session cookie codec.
    pub cookie: SessionCookie,
    /// Lowercased name of the header carrying the CSRF token.
    pub csrf_header: String,
    /// Whether a successful login echoes the submitted password.
    pub echo_password: bool,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cookie", &self.cookie)
            .field("csrf_header", &self.csrf_header)
            .field("echo_password", &self.echo_password)
            .finish_non_exhaustive()
    }
}

/// `GET /csrf-token`
pub async fn csrf_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let existing = match state.cookie.session_key_from_headers(&headers) {
        Some(key) => state.sessions.get(&key).await?,
        None => None,
    };

    let (mut session, mut is_new) = match existing {
        Some(session) => (session, false),
        None => (state.sessions.create().await?, true),
    };

    let token = match issue_token(&*state.sessions, &session).await? {
        Some(token) => token,
        None => {
            // The session expired or was removed between lookup and issuance.
            session = state.sessions.create().await?;
            is_new = true;
            issue_token(&*state.sessions, &session)
                .await?
                .ok_or_else(|| {
                    GateError::InternalServerError("fresh session vanished".to_string())
                })?
        }
    };

    tracing::debug!(
        new_session = is_new,
        authenticated = session.is_authenticated(),
        "issued CSRF token"
    );

    let mut response = Json(json!({ "csrfToken": token })).into_response();
    if is_new {
        let cookie = HeaderValue::from_str(&state.cookie.build_set_cookie(&session.session_key))
            .map_err(|e| GateError::InternalServerError(format!("Invalid cookie header: {e}")))?;
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(credentials) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected login body");
        GateError::BadRequest(rejection.body_text())
    })?;

    let session_key = state.cookie.session_key_from_headers(&headers);
    let presented_token = headers
        .get(state.csrf_header.as_str())
        .and_then(|value| value.to_str().ok());

    let outcome = state
        .gate
        .evaluate(session_key.as_deref(), presented_token, &credentials)
        .await?;

    if let Some(response) = rejection_response(&outcome) {
        tracing::warn!(
            username = %credentials.username,
            outcome = outcome.as_str(),
            "login rejected"
        );
        return Ok(response);
    }

    let AuthOutcome::Accepted(user) = outcome else {
        return Err(GateError::InternalServerError("unmapped login outcome".to_string()).into());
    };
    tracing::info!(username = %user.username, "login accepted");

    let body = if state.echo_password {
        json!({ "user": { "username": user.username, "password": credentials.password } })
    } else {
        json!({ "user": { "username": user.username } })
    };
    Ok(Json(body).into_response())
}
