//! # idp-server
//!
//! Axum server for the identity provider protocol core.
//!
//! This crate wires:
//! - Environment configuration ([`ServerConfig`])
//! - In-memory stores seeded with the root tenant and, when configured, a
//!   signing key loaded from PEM files
//! - The OIDC router plus health endpoints, wrapped in a trace layer
//! - A background task purging expired ephemeral records
//!
//! ## Usage
//!
//! ```ignore
//! use idp_server::{Server, ServerConfig};
//!
//! let config = ServerConfig::from_env()?;
//! let server = Server::new(config).await?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod bootstrap;
pub mod config;
pub mod router;

pub use config::ServerConfig;
pub use router::create_router;

use std::net::SocketAddr;

use axum::Router;
use idp_core::{SharedClock, SystemClock};
use idp_protocol_oidc::OidcState;
use idp_storage::{Stores, memory};
use tokio::net::TcpListener;

/// The identity provider server.
pub struct Server {
    config: ServerConfig,
    state: OidcState,
}

impl Server {
    /// Creates a server over fresh in-memory stores and the system clock.
    ///
    /// Seeds the root tenant and the configured signing key.
    pub async fn new(config: ServerConfig) -> anyhow::Result<Self> {
        Self::with_clock(config, SystemClock::shared()).await
    }

    /// Creates a server with an explicit clock.
    pub async fn with_clock(config: ServerConfig, clock: SharedClock) -> anyhow::Result<Self> {
        let stores = memory::stores(clock.clone());

        bootstrap::seed_root_tenant(&stores, &config.root_tenant_id).await?;
        if bootstrap::seed_signing_key(&stores, &config, &clock)
            .await?
            .is_none()
        {
            tracing::warn!("no signing key configured; token issuance will fail until one is added");
        }

        let state = OidcState::new(config.protocol_config(), stores, clock);
        Ok(Self { config, state })
    }

    /// Runs the server.
    ///
    /// This starts the HTTP server and blocks until it receives a shutdown signal.
    pub async fn run(self) -> anyhow::Result<()> {
        let purge = bootstrap::spawn_purge_task(self.stores().clone(), self.config.purge_interval());
        let app = create_router(self.state);

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!(base_url = %self.config.base_url, "Server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        purge.abort();
        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Returns the stores backing the server.
    #[must_use]
    pub const fn stores(&self) -> &Stores {
        &self.state.stores
    }

    /// Returns the OIDC endpoint state.
    #[must_use]
    pub const fn state(&self) -> &OidcState {
        &self.state
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Creates a router without starting the server.
    ///
    /// This is useful for integration testing.
    pub fn test_router(&self) -> Router {
        create_router(self.state.clone())
    }
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
