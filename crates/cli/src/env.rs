// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

use std::time::Duration;

/// Address the daemon listens on unless `TOLLGATE_ADDR` says otherwise
pub const DEFAULT_ADDR: &str = "127.0.0.1:50051";

// --- Duration helper (private) ---

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

// --- Daemon address ---

pub fn daemon_addr() -> String {
    std::env::var("TOLLGATE_ADDR")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_ADDR.to_string())
}

// --- Timeouts ---

/// Timeout for unary requests (ping, register, status, shutdown)
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("TOLLGATE_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for a generated reply, single-shot or streamed
pub fn timeout_chat() -> Duration {
    parse_duration_ms("TOLLGATE_TIMEOUT_CHAT_MS").unwrap_or(Duration::from_secs(120))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
