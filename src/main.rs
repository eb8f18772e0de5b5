mod api;
mod auth;
mod config;
mod db;
mod ingest;
mod media;
mod notify;
mod storage;
mod templates;

use std::sync::Arc;

use anyhow::Result;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::{
    api::AppState,
    auth::TokenAuthenticator,
    config::Config,
    media::FsMediaStore,
    notify::SmtpMailer,
    storage::postgres::{PgCaptureStore, PgReadingStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (ignore error if file absent — env vars may be set externally)
    let _ = dotenvy::dotenv();

    // Initialise tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    // Load config
    let config = Config::from_env()?;

    // Connect to DB and run migrations
    let pool = db::connect_and_migrate(&config.database_url).await?;
    info!("Database ready");

    // Wire the service seams
    let state = AppState {
        readings: Arc::new(PgReadingStore::new(pool.clone())),
        captures: Arc::new(PgCaptureStore::new(pool)),
        media: Arc::new(FsMediaStore::new(&config.media_dir)),
        mailer: Arc::new(SmtpMailer::new(&config)?),
        auth: Arc::new(TokenAuthenticator::new(
            config.admin_tokens.clone(),
            config.viewer_tokens.clone(),
        )),
        login_url: config.login_url.clone(),
    };

    // Start HTTP server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
