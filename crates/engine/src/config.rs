// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway tuning knobs

use std::time::Duration;

/// Model used when a request leaves the model name empty.
pub const DEFAULT_MODEL: &str = "gemma3:4b";

/// Runtime configuration for a [`Gateway`](crate::Gateway).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Lifetime of sessions and tokens from the moment they are issued
    pub session_ttl: Duration,
    /// How often expired sessions and tokens are swept
    pub session_sweep_interval: Duration,
    /// How often idle streams are swept
    pub stream_sweep_interval: Duration,
    /// A stream with no inbound traffic for longer than this is reaped
    pub stream_idle_timeout: Duration,
    pub default_model: String,
    /// Concurrent backend calls allowed per stream before messages are
    /// answered with a busy reply
    pub max_in_flight_per_stream: usize,
    /// Reject streams and single-shot chats whose session id is not a live
    /// registered session
    pub require_session: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(5 * 60),
            session_sweep_interval: Duration::from_secs(60),
            stream_sweep_interval: Duration::from_secs(30),
            stream_idle_timeout: Duration::from_secs(5 * 60),
            default_model: DEFAULT_MODEL.to_string(),
            max_in_flight_per_stream: 8,
            require_session: false,
        }
    }
}

impl GatewayConfig {
    /// `model` unless empty, otherwise the default model.
    pub fn resolve_model(&self, model: &str) -> String {
        if model.is_empty() {
            self.default_model.clone()
        } else {
            model.to_string()
        }
    }
}
