//! Mapping of errors and login outcomes onto HTTP responses.
//!
//! Response bodies are always `{"error": "<message>"}` with a fixed message
//! per status. Internal details are logged and never sent to the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use sessiongate_auth::AuthOutcome;
use sessiongate_core::GateError;

/// Body for 401 responses.
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";
/// Body for 403 responses.
pub const FORBIDDEN: &str = "Forbidden";
/// Body for 500 responses.
pub const INTERNAL_ERROR: &str = "Internal server error";

/// An error returned from a handler.
#[derive(Debug)]
pub struct ApiError(pub GateError);

impl From<GateError> for ApiError {
    fn from(error: GateError) -> Self {
        Self(error)
    }
}

/// Builds a `{"error": message}` response.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.0.is_server_fault() {
            tracing::error!(error = %self.0, "request failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR);
        }

        match &self.0 {
            GateError::BadRequest(message) => error_response(status, message),
            other => error_response(status, &other.to_string()),
        }
    }
}

/// Builds the response for a rejected login outcome.
///
/// Returns `None` for [`AuthOutcome::Accepted`], whose body depends on the
/// submitted credentials.
pub fn rejection_response(outcome: &AuthOutcome) -> Option<Response> {
    match outcome {
        AuthOutcome::Accepted(_) => None,
        AuthOutcome::RejectedCredentials => Some(error_response(
            StatusCode::UNAUTHORIZED,
            INVALID_CREDENTIALS,
        )),
        AuthOutcome::RejectedNoSession | AuthOutcome::RejectedNoOrBadToken => {
            Some(error_response(StatusCode::FORBIDDEN, FORBIDDEN))
        }
    }
}
