use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use clap::Parser;
use server::{build_router, config::Config, error, state::AppState};
use services::services::rate_limit::spawn_sweeper;
use tokio::net::TcpListener;
use tracing::info;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();
    utils::logging::init(config.debug_mode, config.log_level.as_deref());
    config.warn_on_defaults();
    error::expose_error_details(config.is_development());

    let address = format!("{}:{}", config.host, config.port);
    let development = config.is_development();
    let state = AppState::new(config)
        .await
        .context("failed to initialise data stores")?;
    let _sweeper = spawn_sweeper(state.limiters.all(), SWEEP_INTERVAL);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(address = %listener.local_addr()?, development, "SoulNote server listening");

    axum::serve(
        listener,
        build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
