// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Backend HTTP request timeout (default: 30000ms). Generation on a local
/// model can take tens of seconds.
pub fn backend_timeout() -> Duration {
    parse_duration_ms("TOLLGATE_BACKEND_TIMEOUT_MS").unwrap_or(Duration::from_secs(30))
}
