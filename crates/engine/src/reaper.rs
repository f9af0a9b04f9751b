// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background sweeps for expired credentials and idle streams

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tollgate_adapters::InferenceAdapter;
use tollgate_core::{Clock, ShortId};

use crate::credentials::SweepStats;
use crate::gateway::Gateway;

/// Handles to the two sweep tasks. Both exit once the gateway shuts down.
pub struct Reaper {
    pub sessions: JoinHandle<()>,
    pub streams: JoinHandle<()>,
}

impl Reaper {
    /// Wait for both sweeps to stop.
    pub async fn join(self) {
        for (sweep, handle) in [("sessions", self.sessions), ("streams", self.streams)] {
            if let Err(e) = handle.await {
                tracing::error!(sweep, error = %e, "sweep task failed");
            }
        }
    }
}

impl<I, C> Gateway<I, C>
where
    I: InferenceAdapter,
    C: Clock,
{
    /// Remove expired sessions and tokens.
    pub fn sweep_sessions(&self) -> SweepStats {
        let stats = self.credentials.cleanup_expired();
        if !stats.is_empty() {
            tracing::info!(
                sessions = stats.sessions,
                tokens = stats.tokens,
                "expired credentials removed"
            );
        }
        if stats.live_sessions > 0 {
            tracing::info!(active = stats.live_sessions, "active sessions");
        }
        stats
    }

    /// Cancel and remove streams idle past the configured threshold.
    /// Returns how many were reaped.
    pub fn sweep_idle_streams(&self) -> usize {
        let reaped = self
            .streams
            .sweep_idle(self.clock.now(), self.config.stream_idle_timeout);
        for session_id in &reaped {
            tracing::info!(session_id = %session_id.short(8), "idle stream reaped");
        }
        reaped.len()
    }

    /// Start both periodic sweeps on the current runtime.
    pub fn spawn_reaper(&self) -> Reaper {
        let gateway = self.clone();
        let sessions = tokio::spawn(sweep_loop(
            self.config.session_sweep_interval,
            self.shutdown.clone(),
            move || {
                gateway.sweep_sessions();
            },
        ));

        let gateway = self.clone();
        let streams = tokio::spawn(sweep_loop(
            self.config.stream_sweep_interval,
            self.shutdown.clone(),
            move || {
                gateway.sweep_idle_streams();
            },
        ));

        Reaper { sessions, streams }
    }
}

async fn sweep_loop<F>(
    period: Duration,
    shutdown: tokio_util::sync::CancellationToken,
    mut sweep: F,
) where
    F: FnMut() + Send + 'static,
{
    // interval panics on a zero period
    let period = period.max(Duration::from_millis(1));
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => sweep(),
        }
    }
}

#[cfg(test)]
#[path = "reaper_tests.rs"]
mod tests;
