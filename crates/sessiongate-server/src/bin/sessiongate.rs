//! The `sessiongate` server binary.
//!
//! ```text
//! sessiongate --config sessiongate.toml --port 3000
//! ```

use std::sync::Arc;

use anyhow::Context;

use sessiongate_auth::InMemoryUserRepository;
use sessiongate_core::logging::setup_logging;
use sessiongate_server::{cli, GateApp};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli::command().get_matches();
    let settings = cli::settings_from_matches(&matches).context("failed to load settings")?;

    setup_logging(&settings);
    settings.validate().context("invalid settings")?;

    let users = InMemoryUserRepository::from_seeds(&settings.users)
        .await
        .context("failed to seed users")?;
    if users.is_empty().await {
        tracing::warn!("no users configured; every login will be rejected");
    }
    if settings.debug && settings.secret_key.is_empty() {
        tracing::warn!("secret_key is empty; session cookies are signed with an empty key");
    }

    let addr = settings.bind_address();
    GateApp::new(settings)
        .user_repository(Arc::new(users))
        .run(&addr)
        .await?;

    Ok(())
}
