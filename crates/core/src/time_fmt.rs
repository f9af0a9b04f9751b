// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Short human-readable durations for CLI and log output.

/// Format seconds as `"5s"`, `"2m"`, `"1h30m"` or `"3d"`.
pub fn format_elapsed(secs: u64) -> String {
    match secs {
        0..=59 => format!("{}s", secs),
        60..=3599 => format!("{}m", secs / 60),
        3600..=86_399 => {
            let (h, m) = (secs / 3600, (secs % 3600) / 60);
            if m == 0 {
                format!("{}h", h)
            } else {
                format!("{}h{}m", h, m)
            }
        }
        _ => format!("{}d", secs / 86_400),
    }
}

/// Time left until `expires_at_ms`, or `"expired"` once it has passed.
pub fn format_expires_in(expires_at_ms: u64, now_ms: u64) -> String {
    if now_ms >= expires_at_ms {
        return "expired".to_string();
    }
    format_elapsed((expires_at_ms - now_ms) / 1000)
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
