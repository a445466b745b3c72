//! Fixtures for building a ready-to-test sessiongate application.

use std::sync::Arc;

use axum::Router;

use sessiongate_auth::{InMemoryUserRepository, User};
use sessiongate_core::Settings;
use sessiongate_server::GateApp;

/// Settings suitable for tests: a fixed secret key, everything else default.
pub fn test_settings() -> Settings {
    Settings {
        secret_key: "sessiongate-test-secret-key-0123456789abcdef".to_string(),
        ..Settings::default()
    }
}

/// Builds a router whose user repository holds the given `(username, password)` pairs.
pub async fn seeded_app(settings: Settings, users: &[(&str, &str)]) -> Router {
    let repository = InMemoryUserRepository::new();
    for (username, password) in users {
        let user = User::with_password(*username, password)
            .await
            .expect("test password should hash");
        repository.add_user(user).await;
    }
    GateApp::new(settings)
        .user_repository(Arc::new(repository))
        .into_axum_router()
}
