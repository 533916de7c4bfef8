//! # Svalbard Server
//!
//! HTTP front end for the custody coordinator. Wires the handlers selected in
//! [`ServerConfig`] into a [`CustodyCoordinator`](svalbard_core::CustodyCoordinator)
//! and serves the form endpoints from [`http`] until interrupted.

#![forbid(unsafe_code)]

pub mod config;
pub mod http;

pub use config::{ChannelConfig, ConfigError, ServerConfig, ShareStoreConfig};
pub use http::{app, router, status_for};

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use svalbard_core::CustodyCoordinator;
use tokio::net::TcpListener;

/// Run the server until Ctrl-C.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    config.validate()?;
    let addr = config.socket_addr()?;

    let coordinator = CustodyCoordinator::new(Arc::new(config.build_handlers()));
    let app = app(coordinator, Duration::from_secs(config.request_timeout_secs));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(
        %addr,
        share_store = ?config.share_store,
        channel = ?config.channel,
        token_ttl_secs = config.tokens.ttl_secs,
        "svalbard server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("svalbard server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
