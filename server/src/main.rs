// Copyright (c) 2026 XARO Contributors. MIT License.
// See LICENSE for details.

//! # XARO Wallet Backend
//!
//! Entry point for the `xaro-server` binary. Parses CLI arguments, initializes
//! logging and metrics, and serves the HTTP/WS API over an in-memory store.
//!
//! The binary supports three subcommands:
//!
//! - `run`     starts the API server
//! - `code`    prints the transaction code for a hash
//! - `version` prints build version information

mod api;
mod cli;
mod error;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;

use xaro_ledger::config::{EVENT_CHANNEL_CAPACITY, TOKEN_SYMBOL};
use xaro_ledger::{generate_transaction_code, MemStorage};

use cli::{Commands, XaroCli};
use metrics::ServerMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = XaroCli::parse();

    match cli.command {
        Commands::Run(args) => run_server(args).await,
        Commands::Code(args) => print_code(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the API server and the metrics endpoint, then waits for either
/// to fail or for a shutdown signal.
async fn run_server(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "xaro_server=info,xaro_ledger=info,tower_http=debug",
        args.log_format,
    );

    tracing::info!(
        host = %args.host,
        port = args.port,
        metrics_port = args.metrics_port,
        "starting xaro-server"
    );

    // --- Storage ---
    // Records live for the lifetime of the process only.
    let storage = Arc::new(MemStorage::new());

    // --- Metrics ---
    let server_metrics = Arc::new(ServerMetrics::new());

    // --- Event broadcast ---
    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    // --- Application state ---
    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: Utc::now(),
        storage,
        metrics: Arc::clone(&server_metrics),
        event_tx,
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("{}:{}", args.host, args.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&server_metrics));
    let metrics_addr = format!("{}:{}", args.host, args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("xaro-server stopped");
    Ok(())
}

/// Prints the 45-digit transaction code for a hash to stdout.
fn print_code(args: cli::CodeArgs) -> Result<()> {
    let code = generate_transaction_code(&args.tx_hash)
        .with_context(|| format!("cannot derive a transaction code from {:?}", args.tx_hash))?;
    println!("{}", code);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("xaro-server {}", env!("CARGO_PKG_VERSION"));
    println!("token       {}", TOKEN_SYMBOL);
    println!("rustc       {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. If a handler cannot be
/// installed, that source is ignored and the other one still applies.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
