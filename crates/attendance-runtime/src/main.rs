//! # Attendance Runtime
//!
//! Serves rotating-token attendance sessions over HTTP and WebSocket.
//! Configuration comes from `ATTEND_*` environment variables, log levels
//! from `RUST_LOG` (default `info`).

use anyhow::{Context, Result};
use attendance_runtime::{AttendanceRuntime, RuntimeConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_LOG_LEVEL: &str = "info";
const SERVER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_LEVEL))
        .context("invalid log filter")?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = RuntimeConfig::from_env().context("invalid configuration")?;
    let runtime = Arc::new(AttendanceRuntime::new(&config).context("failed to build runtime")?);

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("cannot bind {}", config.bind))?;

    let mut server = {
        let runtime = Arc::clone(&runtime);
        tokio::spawn(async move { runtime.serve(listener).await })
    };

    info!("Attendance runtime is running. Press Ctrl+C to stop.");
    tokio::select! {
        signal = tokio::signal::ctrl_c() => signal?,
        finished = &mut server => {
            // The server only returns on its own when it failed.
            runtime.shutdown().await;
            return finished.context("server task panicked")?;
        }
    }

    runtime.shutdown().await;

    match tokio::time::timeout(SERVER_DRAIN_TIMEOUT, server).await {
        Ok(Ok(result)) => result?,
        Ok(Err(e)) => error!("Server task failed: {}", e),
        Err(_) => warn!("Open connections did not drain in time"),
    }

    Ok(())
}
