//! # Task Manager API Server
//!
//! REST backend for users, projects, tasks, labels and task attachments.
//!
//! ## Startup
//!
//! 1. Load configuration from the environment (`.env` is honored)
//! 2. Connect to PostgreSQL and apply migrations
//! 3. Seed the default admin account when `SEED_ADMIN` is on
//! 4. Open the attachment directory and serve until Ctrl-C
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskmanager-api
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON log lines.

use std::sync::Arc;
use taskmanager_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskmanager_shared::{
    attachments::storage::LocalFileStorage,
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
        seed::ensure_admin_user,
    },
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "taskmanager_api=debug,taskmanager_shared=info,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!(
        "Task Manager API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(
        DatabaseConfig::from_url(&config.database.url)
            .with_max_connections(config.database.max_connections),
    )
    .await?;

    run_migrations(&pool).await?;

    if config.seed.admin_enabled && ensure_admin_user(&pool, &config.seed.admin_password).await? {
        tracing::warn!("Default admin account created; change its password");
    }

    let storage = LocalFileStorage::new(&config.storage.base_path).await?;
    tracing::info!(path = %storage.base_path().display(), "Attachment storage ready");

    let address = config.bind_address();
    let state = AppState::new(pool.clone(), config, Arc::new(storage));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Server listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
