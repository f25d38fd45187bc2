//! # Attendance Runtime
//!
//! Wires the session engine to its adapters and serves the gateway. The
//! `main.rs` binary is a thin shell over [`AttendanceRuntime`]; the library
//! exists so the wiring can be exercised from tests.
//!
//! ## Startup Sequence
//!
//! 1. Load [`RuntimeConfig`] from the environment
//! 2. Seed the course directory and build the service container
//! 3. Bind the listener and serve the router
//! 4. On Ctrl+C: end every live session, then stop accepting connections

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod container;
pub mod gateway;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

pub use container::{ConfigError, RuntimeConfig, ServiceContainer};
pub use gateway::{router, AppState};

/// The attendance process.
pub struct AttendanceRuntime {
    container: ServiceContainer,
    shutdown_tx: watch::Sender<bool>,
}

impl AttendanceRuntime {
    /// Build the runtime from configuration.
    pub fn new(config: &RuntimeConfig) -> Result<Self, ConfigError> {
        info!("Creating attendance runtime");
        Ok(Self::with_container(ServiceContainer::new(config)?))
    }

    pub fn with_container(container: ServiceContainer) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            container,
            shutdown_tx,
        }
    }

    pub fn container(&self) -> &ServiceContainer {
        &self.container
    }

    /// The gateway router bound to this runtime's services.
    pub fn router(&self) -> Router {
        gateway::router(AppState {
            service: self.container.service.clone(),
            bus: self.container.bus.clone(),
        })
    }

    /// Serve on `listener` until [`AttendanceRuntime::shutdown`] is called.
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr().context("listener has no local address")?;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!(%addr, "Gateway listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                // A dropped sender also counts as shutdown.
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
            })
            .await
            .context("gateway server failed")?;

        info!("Gateway stopped");
        Ok(())
    }

    /// End every live session and stop the server.
    ///
    /// ## Shutdown Sequence
    ///
    /// 1. Expire live sessions (dashboards receive `SessionEnded`)
    /// 2. Signal the server to stop accepting connections
    pub async fn shutdown(&self) -> usize {
        info!("Initiating graceful shutdown...");

        let ended = self.container.service.shutdown().await;

        // Works with or without a running server.
        self.shutdown_tx.send_replace(true);

        info!(sessions_ended = ended, "Shutdown complete");
        ended
    }
}
