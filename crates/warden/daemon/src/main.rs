//! wardend - the Warden governance daemon.

mod api;
mod config;
mod error;
mod sweeper;

use clap::Parser;
use config::DaemonConfig;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use warden_service::GovernanceService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = DaemonConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let service = Arc::new(GovernanceService::new(config.governance()));

    let (admin, created) = service.seed_admin(
        &config.admin_mail,
        &config.admin_name,
        &config.admin_phone,
    )?;
    if created {
        // Shown exactly once; the key is not retrievable later.
        tracing::info!(
            mail = %admin.mail,
            api_key = %admin.api_key,
            "seeded bootstrap admin"
        );
    } else {
        tracing::info!(mail = %admin.mail, "bootstrap admin already present");
    }

    tokio::spawn(sweeper::run(
        Arc::clone(&service),
        config.sweep_interval_secs,
    ));

    let app = api::rest::create_router(api::rest::AppState { service });
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %config.bind, "wardend listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to install shutdown handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
