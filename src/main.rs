//! cinderd - Cinder IRC Daemon
//!
//! A single-node IRC server: plaintext and TLS listeners, trie-backed
//! client and channel registries, per-connection supervisors with
//! bounded write queues, and deterministic host cloaking.

mod config;
mod error;
mod handlers;
mod motd;
mod network;
mod security;
mod state;

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::config::Config;
use crate::handlers::Dispatcher;
use crate::network::Listener;
use crate::state::hub::Hub;

/// Resolve the configuration path from CLI arguments.
/// Supports `-c <path>`, `--config <path>`, or a bare path.
/// Falls back to `config.toml` when no argument is provided.
fn resolve_config_path() -> String {
    let mut args = std::env::args().skip(1);

    let raw_path = match args.next() {
        Some(flag) if flag == "-c" || flag == "--config" => args.next().unwrap_or_else(|| {
            eprintln!("Missing path after {}", flag);
            std::process::exit(1);
        }),
        Some(path) => path,
        None => "config.toml".to_string(),
    };

    match std::fs::canonicalize(Path::new(&raw_path)) {
        Ok(p) => p.to_string_lossy().into_owned(),
        Err(_) => raw_path,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = resolve_config_path();
    let config = Config::load(&config_path).map_err(|e| {
        eprintln!("ERROR: Failed to load config from {}: {}", config_path, e);
        e
    })?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();

    if let Err(errors) = config::validate(&config) {
        for err in &errors {
            error!(error = %err, "Configuration validation failed");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s)",
            errors.len()
        ));
    }

    info!(
        server = %config.server.name,
        network = %config.server.network,
        id = %config.server.id,
        "Starting cinderd"
    );

    let motd_lines = motd::load(config.files.motd.as_deref());
    info!(lines = motd_lines.len(), "MOTD loaded");

    let hub = Arc::new(Hub::new(&config, motd_lines));
    let dispatcher = Arc::new(Dispatcher::new());

    // Signal handler for graceful shutdown.
    {
        let shutdown_tx = hub.shutdown.clone();
        tokio::spawn(async move {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
            let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = sigint.recv() => info!("Received SIGINT - initiating graceful shutdown"),
                _ = sigterm.recv() => info!("Received SIGTERM - initiating graceful shutdown"),
            }

            let _ = shutdown_tx.send(());
        });
    }

    let listener = Listener::bind(&config, hub.clone(), dispatcher)?;
    listener.run().await;

    info!("Listener stopped, waiting for connections to close...");
    // Give supervisors a moment to flush their final ERROR lines.
    tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;

    Ok(())
}
