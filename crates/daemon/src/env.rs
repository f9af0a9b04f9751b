// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Default bind address (the port the gateway has always used)
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:50051";

/// Default inference backend
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:11434";

/// Resolve state directory: TOLLGATE_STATE_DIR > XDG_STATE_HOME/tollgate > ~/.local/state/tollgate
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("TOLLGATE_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("tollgate"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/tollgate"))
}

pub fn listen_addr() -> String {
    non_empty("TOLLGATE_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
}

pub fn backend_url() -> String {
    non_empty("TOLLGATE_BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
}

pub fn default_model() -> Option<String> {
    non_empty("TOLLGATE_DEFAULT_MODEL")
}

pub fn session_ttl() -> Option<Duration> {
    duration_ms("TOLLGATE_SESSION_TTL_MS")
}

pub fn session_sweep_interval() -> Option<Duration> {
    duration_ms("TOLLGATE_SESSION_SWEEP_MS")
}

pub fn stream_sweep_interval() -> Option<Duration> {
    duration_ms("TOLLGATE_STREAM_SWEEP_MS")
}

pub fn stream_idle_timeout() -> Option<Duration> {
    duration_ms("TOLLGATE_STREAM_IDLE_MS")
}

pub fn max_in_flight() -> Option<usize> {
    std::env::var("TOLLGATE_MAX_IN_FLIGHT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
}

/// Session admission check for streams and single-shot chats
pub fn require_session() -> bool {
    matches!(
        std::env::var("TOLLGATE_REQUIRE_SESSION").as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.is_empty())
}

fn duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}
