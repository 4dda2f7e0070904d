//! Tripmate Server — Application entry point.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tripmate_db::{DbManager, run_migrations};
use tripmate_server::{AppState, ServerConfig, create_router};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tripmate=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    if let Err(e) = run().await {
        error!(error = %e, "Tripmate server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting tripmate server...");

    let config = ServerConfig::from_env()?;

    let db = DbManager::connect(&config.db).await?;
    run_migrations(db.client()).await?;

    if config.stripe.is_none() {
        info!("No Stripe credentials configured, using the sandbox payment provider");
    }

    let state = Arc::new(AppState::new(db.client().clone(), &config)?);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Tripmate server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
