// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: configuration, startup, shutdown.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::net::TcpListener;
use tollgate_adapters::{InferenceAdapter, InferenceError, OllamaAdapter, TracedInference};
use tollgate_core::SystemClock;
use tollgate_engine::{Gateway, GatewayConfig, Reaper};
use tracing::{info, warn};

use crate::env;

/// Gateway with concrete adapter types (wrapped with tracing)
pub type DaemonGateway = Gateway<TracedInference<OllamaAdapter>, SystemClock>;

/// How long startup waits on the backend health probe
const BACKEND_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/tollgate)
    pub state_dir: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Address the listener binds
    pub listen_addr: String,
    /// Inference backend base URL
    pub backend_url: String,
    pub gateway: GatewayConfig,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;

        let defaults = GatewayConfig::default();
        let gateway = GatewayConfig {
            session_ttl: env::session_ttl().unwrap_or(defaults.session_ttl),
            session_sweep_interval: env::session_sweep_interval()
                .unwrap_or(defaults.session_sweep_interval),
            stream_sweep_interval: env::stream_sweep_interval()
                .unwrap_or(defaults.stream_sweep_interval),
            stream_idle_timeout: env::stream_idle_timeout()
                .unwrap_or(defaults.stream_idle_timeout),
            default_model: env::default_model().unwrap_or(defaults.default_model),
            max_in_flight_per_stream: env::max_in_flight()
                .unwrap_or(defaults.max_in_flight_per_stream),
            require_session: env::require_session(),
        };

        Ok(Self {
            log_path: state_dir.join("tollgated.log"),
            state_dir,
            listen_addr: env::listen_addr(),
            backend_url: env::backend_url(),
            gateway,
        })
    }
}

/// Daemon state during operation.
pub struct DaemonState {
    pub config: Config,
    pub gateway: DaemonGateway,
    /// When daemon started
    pub start_time: Instant,
    reaper: Reaper,
}

/// Result of daemon startup - the daemon state and the bound listener.
pub struct StartupResult {
    pub daemon: DaemonState,
    /// The TCP listener to spawn as a Listener task
    pub listener: TcpListener,
}

impl DaemonState {
    /// Close every stream, stop the sweeps and wait for them.
    pub async fn shutdown(self) {
        info!("Shutting down daemon...");
        let streams = self.gateway.active_stream_count();
        self.gateway.shutdown();
        self.reaper.join().await;
        info!(streams, "gateway stopped");
    }
}

/// Daemon lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to bind {0}: {1}")]
    BindFailed(String, std::io::Error),

    #[error("Backend client error: {0}")]
    Backend(#[from] InferenceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| LifecycleError::BindFailed(config.listen_addr.clone(), e))?;

    let inference = TracedInference::new(OllamaAdapter::new(config.backend_url.clone())?);
    match tokio::time::timeout(BACKEND_PROBE_TIMEOUT, inference.health_check()).await {
        Ok(Ok(())) => info!(url = %config.backend_url, "inference backend reachable"),
        Ok(Err(e)) => warn!(url = %config.backend_url, error = %e, "inference backend unavailable"),
        Err(_) => warn!(url = %config.backend_url, "inference backend probe timed out"),
    }

    let gateway = Gateway::new(inference, SystemClock, config.gateway.clone());
    let reaper = gateway.spawn_reaper();

    info!(
        session_ttl_ms = config.gateway.session_ttl.as_millis() as u64,
        stream_idle_ms = config.gateway.stream_idle_timeout.as_millis() as u64,
        max_in_flight = config.gateway.max_in_flight_per_stream,
        require_session = config.gateway.require_session,
        model = %config.gateway.default_model,
        "gateway started"
    );

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            gateway,
            start_time: Instant::now(),
            reaper,
        },
        listener,
    })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
