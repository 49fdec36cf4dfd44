use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::retry::retry_with_backoff;
use common::store::postgres::PgCatalogStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::state::AppState;

/// Attempts to reach the database before giving up at startup.
const DB_CONNECT_ATTEMPTS: u8 = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("Failed to load config")?;

    info!(database = %config.database.redacted_url(), "Connecting to database");
    let store = retry_with_backoff(DB_CONNECT_ATTEMPTS, 500, 10_000, |_| {
        PgCatalogStore::connect(&config.database)
    })
    .await
    .context("Failed to connect to database")?;
    info!("Database connected");

    let state = AppState::new(
        Arc::new(store),
        Duration::from_secs(config.server.query_timeout_secs),
    );
    let app = server::build_router(state, &config.server.cors);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    info!("API docs at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
