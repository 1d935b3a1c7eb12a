mod config;
mod handler;
mod logging;
mod metrics;

use anyhow::Result;
use clap::Parser;

use std::net::{Ipv4Addr, SocketAddr};

use crate::config::ProxyConfig;
use crate::handler::state::ProxyState;

#[derive(Parser, Debug)]
#[command(version, about)]
pub(crate) struct Args {
    /// TOML config file. Built-in defaults apply when omitted.
    #[arg(long)]
    config_file: Option<String>,

    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long, action)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init(&args)?;

    let config: ProxyConfig = match &args.config_file {
        Some(config_file) => ProxyConfig::from_file(config_file)?,
        None => ProxyConfig::default(),
    };

    config.validate()?;

    let metrics_socket_addr =
        SocketAddr::new(Ipv4Addr::LOCALHOST.into(), config.metrics_port);
    metrics::init(metrics_socket_addr)?;

    let state = ProxyState::from_config(&config)?;
    tracing::info!(
        allowed_hosts = ?config.allowed_hosts,
        upstream_timeout_secs = config.upstream_timeout_secs,
        "Allowlist holds {} hosts.",
        state.allowlist.len()
    );

    let proxy_socket_addr = SocketAddr::new(config.listen_address, config.proxy_port);

    let listener = tokio::net::TcpListener::bind(proxy_socket_addr).await?;

    tracing::info!("Starting server on {proxy_socket_addr}...");

    axum::serve(listener, handler::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(?error, "Couldn't listen for Ctrl-C.");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(?error, "Couldn't listen for SIGTERM.");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections.");
}
