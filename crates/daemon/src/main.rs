// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tollgate Daemon (tollgated)
//!
//! Session & streaming gateway in front of a text-generation backend.
//!
//! Architecture:
//! - Listener Task: accepts connections, one task per connection
//! - Reaper Tasks: periodic credential and idle-stream sweeps
//! - Main Task: waits for a shutdown signal, then stops the gateway

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod env;
mod lifecycle;
mod listener;

use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tollgate_daemon::protocol;
use tracing::{error, info};

use crate::lifecycle::{Config, LifecycleError, StartupResult};
use crate::listener::{ListenCtx, Listener};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config is loaded
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("tollgated {}", protocol::PROTOCOL_VERSION);
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("tollgated {}", protocol::PROTOCOL_VERSION);
                println!("Tollgate Daemon - session & streaming gateway for a text-generation backend");
                println!();
                println!("USAGE:");
                println!("    tollgated");
                println!();
                println!("Listens on TOLLGATE_LISTEN_ADDR (default {}) and", env::DEFAULT_LISTEN_ADDR);
                println!("forwards chat to TOLLGATE_BACKEND_URL (default {}).", env::DEFAULT_BACKEND_URL);
                println!("Use the `tollgate` CLI to talk to it.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: tollgated [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    // Write startup marker to log (before tracing setup, so it is always there)
    write_startup_marker(&config)?;

    let log_guard = setup_logging(&config)?;

    info!("Starting gateway daemon");

    let StartupResult {
        daemon,
        listener: tcp_listener,
    } = match lifecycle::startup(&config).await {
        Ok(r) => r,
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let local_addr = tcp_listener.local_addr()?;
    let shutdown_notify = Arc::new(Notify::new());

    let listener = Listener::new(
        tcp_listener,
        daemon.gateway.clone(),
        ListenCtx {
            start_time: daemon.start_time,
            backend_url: daemon.config.backend_url.clone(),
            shutdown: Arc::clone(&shutdown_notify),
        },
    );
    let listener_task = tokio::spawn(listener.run());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("Daemon ready, listening on {}", local_addr);

    // Signal ready for parent process (e.g., systemd, test harness)
    println!("READY");

    tokio::select! {
        _ = shutdown_notify.notified() => info!("Shutdown requested via command"),
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }

    daemon.shutdown().await;
    let _ = listener_task.await;
    info!("Daemon stopped");
    Ok(())
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- tollgated: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- tollgated: starting (pid: ";

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;

    Ok(())
}

/// Write startup error synchronously to log file.
fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = config.log_path.parent().ok_or(LifecycleError::NoStateDir)?;
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::never(
        log_dir,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}
