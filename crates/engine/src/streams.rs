// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of live duplex chat streams, keyed by session id.
//!
//! At most one entry per session id. Admitting a second stream for the same
//! id replaces the entry and cancels the stream it displaced.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tollgate_core::{SessionId, ShortId};

/// Identifies one admitted stream, distinguishing it from later streams
/// that reuse the same session id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(u64);

/// Registry entry for a live stream.
#[derive(Debug, Clone)]
pub struct StreamConversation {
    pub session_id: SessionId,
    pub model: String,
    pub created_at: Instant,
    pub last_activity: Instant,
    stream_id: StreamId,
    cancel: CancellationToken,
}

impl StreamConversation {
    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// Idle strictly longer than `threshold` at `now`.
    pub fn is_idle(&self, now: Instant, threshold: Duration) -> bool {
        now.saturating_duration_since(self.last_activity) > threshold
    }
}

#[derive(Default)]
struct StreamTable {
    next_id: u64,
    streams: HashMap<SessionId, StreamConversation>,
}

#[derive(Clone, Default)]
pub struct StreamRegistry {
    inner: Arc<Mutex<StreamTable>>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stream for `session_id`. An existing entry is replaced
    /// and its stream cancelled.
    pub fn admit(
        &self,
        session_id: SessionId,
        model: String,
        cancel: CancellationToken,
        now: Instant,
    ) -> StreamId {
        let mut table = self.inner.lock();
        table.next_id += 1;
        let stream_id = StreamId(table.next_id);
        let previous = table.streams.insert(
            session_id.clone(),
            StreamConversation {
                session_id: session_id.clone(),
                model,
                created_at: now,
                last_activity: now,
                stream_id,
                cancel,
            },
        );
        drop(table);

        if let Some(previous) = previous {
            previous.cancel.cancel();
            tracing::info!(session_id = %session_id.short(8), "stream replaced, previous cancelled");
        }
        stream_id
    }

    /// Refresh activity for the entry, if it still belongs to `stream_id`.
    pub fn touch(&self, session_id: &SessionId, stream_id: StreamId, now: Instant) -> bool {
        let mut table = self.inner.lock();
        match table.streams.get_mut(session_id) {
            Some(entry) if entry.stream_id == stream_id => {
                entry.last_activity = now;
                true
            }
            _ => false,
        }
    }

    /// Remove the entry only if it still belongs to `stream_id`.
    pub fn remove_if_owner(&self, session_id: &SessionId, stream_id: StreamId) -> bool {
        let mut table = self.inner.lock();
        let owned = table
            .streams
            .get(session_id)
            .is_some_and(|entry| entry.stream_id == stream_id);
        if owned {
            table.streams.remove(session_id);
        }
        owned
    }

    /// Cancel and remove every entry idle longer than `threshold`.
    /// Returns the reaped session ids.
    pub fn sweep_idle(&self, now: Instant, threshold: Duration) -> Vec<SessionId> {
        let mut reaped = Vec::new();
        let mut table = self.inner.lock();
        table.streams.retain(|session_id, entry| {
            if entry.is_idle(now, threshold) {
                entry.cancel.cancel();
                reaped.push(session_id.clone());
                false
            } else {
                true
            }
        });
        reaped
    }

    pub fn get(&self, session_id: &str) -> Option<StreamConversation> {
        self.inner.lock().streams.get(session_id).cloned()
    }

    pub fn count(&self) -> usize {
        self.inner.lock().streams.len()
    }
}

#[cfg(test)]
#[path = "streams_tests.rs"]
mod tests;
