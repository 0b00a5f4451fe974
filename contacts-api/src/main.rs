//! # Contacts API Server
//!
//! REST backend for user accounts and per-user contact lists.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p contacts-api
//! ```

use anyhow::Context;
use contacts_api::{
    app::{build_router, AppState},
    config::Config,
};
use contacts_shared::{
    avatar::HttpProber,
    db::{migrations::run_migrations, pool},
    mail::mailer_from_config,
    store::postgres::PgStore,
};
use std::{sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Timeout for avatar liveness probes
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "contacts_api=debug,contacts_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Contacts API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let pg = pool::connect(&pool::PoolSettings {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("Unable to connect to the database")?;

    run_migrations(&pg).await.context("Failed to run migrations")?;

    let mailer = mailer_from_config(&config.mail)?;
    if !config.mail.is_configured() {
        tracing::warn!("SMTP is not configured, emails will only be logged");
    }
    let prober = Arc::new(HttpProber::new(PROBE_TIMEOUT)?);

    let bind_address = config.bind_address();
    let state = AppState::new(Arc::new(PgStore::new(pg.clone())), mailer, prober, config);

    tokio::fs::create_dir_all(state.avatars.avatars_dir())
        .await
        .context("Failed to create avatars directory")?;

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool::close(pg).await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
