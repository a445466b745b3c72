//! HTTP server integration for sessiongate.
//!
//! [`GateApp`] combines settings, a session store, and a user repository into
//! an axum router or a running server.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sessiongate_auth::InMemoryUserRepository;
//! use sessiongate_core::Settings;
//! use sessiongate_server::GateApp;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::default();
//! let users = InMemoryUserRepository::from_seeds(&settings.users).await?;
//! let app = GateApp::new(settings).user_repository(Arc::new(users));
//!
//! // app.run("127.0.0.1:3000").await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::routing::{get, post};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use sessiongate_auth::{
    CredentialVerifier, InMemorySessionStore, InMemoryUserRepository, LoginGate, SessionStore,
    UserRepository,
};
use sessiongate_core::logging::request_span;
use sessiongate_core::{GateError, Settings};

use crate::cookies::SessionCookie;
use crate::handlers::{csrf_token, login, AppState};

/// The sessiongate application.
///
/// Defaults to an [`InMemorySessionStore`] whose lifetime follows
/// `session_cookie_age`, and an empty [`InMemoryUserRepository`].
pub struct GateApp {
    settings: Settings,
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserRepository>,
}

impl GateApp {
    /// Creates a new `GateApp` with the given settings.
    pub fn new(settings: Settings) -> Self {
        let sessions = settings
            .session_cookie_age
            .map_or_else(InMemorySessionStore::new, InMemorySessionStore::with_lifetime);
        Self {
            settings,
            sessions: Arc::new(sessions),
            users: Arc::new(InMemoryUserRepository::new()),
        }
    }

    /// Replaces the session store.
    #[must_use]
    pub fn session_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Replaces the user repository.
    #[must_use]
    pub fn user_repository(mut self, users: Arc<dyn UserRepository>) -> Self {
        self.users = users;
        self
    }

    /// Returns a reference to the application settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the session store the app serves from.
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    fn state(&self) -> AppState {
        let verifier = CredentialVerifier::new(self.users.clone());
        AppState {
            sessions: self.sessions.clone(),
            gate: LoginGate::new(self.sessions.clone(), verifier),
            cookie: SessionCookie::from_settings(&self.settings),
            csrf_header: self.settings.csrf_header_name.to_ascii_lowercase(),
            echo_password: self.settings.login_echo_password,
        }
    }

    /// Converts the application into an axum router.
    pub fn into_axum_router(self) -> axum::Router {
        let state = self.state();

        axum::Router::new()
            .route("/csrf-token", get(csrf_token))
            .route("/login", post(login))
            .with_state(state)
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                let request_id = uuid::Uuid::new_v4().to_string();
                request_span(&request_id, request.method().as_str(), request.uri().path())
            }))
    }

    /// Runs the application as an HTTP server on the given address.
    ///
    /// Also runs the expired-session sweeper while serving when
    /// `session_sweep_interval_secs` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the address or encounters
    /// a runtime error.
    pub async fn run(self, addr: &str) -> Result<(), GateError> {
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            GateError::ConfigurationError(format!("Failed to bind to {addr}: {e}"))
        })?;

        let sweeper = self
            .settings
            .session_sweep_interval_secs
            .filter(|secs| *secs > 0)
            .map(|secs| spawn_session_sweeper(self.sessions.clone(), Duration::from_secs(secs)));
        let router = self.into_axum_router();

        tracing::info!("sessiongate listening on http://{addr}/");

        let result = axum::serve(listener, router)
            .await
            .map_err(|e| GateError::InternalServerError(format!("Server error: {e}")));

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        result
    }
}

impl std::fmt::Debug for GateApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateApp")
            .field("debug", &self.settings.debug)
            .field("cookie_name", &self.settings.session_cookie_name)
            .field("csrf_header", &self.settings.csrf_header_name)
            .finish_non_exhaustive()
    }
}

/// Spawns a task that removes expired sessions every `period`.
///
/// Store failures are logged and the sweep continues on the next tick.
pub fn spawn_session_sweeper(sessions: Arc<dyn SessionStore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match sessions.clear_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "swept expired sessions"),
                Err(e) => tracing::warn!(error = %e, "session sweep failed"),
            }
        }
    })
}
