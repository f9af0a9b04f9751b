// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway facade owning the registries and the inference backend

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tollgate_adapters::InferenceAdapter;
use tollgate_core::{Clock, Session, SessionId, ShortId};

use crate::config::GatewayConfig;
use crate::credentials::{AuthOutcome, CredentialRegistry, Registration};
use crate::error::GatewayError;
use crate::streams::StreamRegistry;

/// Reply to a single-shot chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
    pub timestamp_ms: u64,
}

/// Point-in-time counters for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayCounts {
    pub sessions: usize,
    pub tokens: usize,
    pub streams: usize,
}

/// Session & streaming gateway.
///
/// Cheap to clone; clones share the same registries and shutdown token.
#[derive(Clone)]
pub struct Gateway<I, C: Clock> {
    pub(crate) credentials: CredentialRegistry<C>,
    pub(crate) streams: StreamRegistry,
    pub(crate) inference: I,
    pub(crate) clock: C,
    pub(crate) config: Arc<GatewayConfig>,
    pub(crate) shutdown: CancellationToken,
}

impl<I, C> Gateway<I, C>
where
    I: InferenceAdapter,
    C: Clock,
{
    pub fn new(inference: I, clock: C, config: GatewayConfig) -> Self {
        Self {
            credentials: CredentialRegistry::new(
                clock.clone(),
                config.session_ttl,
                config.default_model.clone(),
            ),
            streams: StreamRegistry::new(),
            inference,
            clock,
            config: Arc::new(config),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn inference(&self) -> &I {
        &self.inference
    }

    pub fn credentials(&self) -> &CredentialRegistry<C> {
        &self.credentials
    }

    pub fn streams(&self) -> &StreamRegistry {
        &self.streams
    }

    /// Token that fires when the gateway shuts down. Every stream token is a
    /// child of it.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Close all streams and stop the background sweeps.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn register(
        &self,
        tenant_id: &str,
        agent_id: &str,
        model: &str,
    ) -> Result<Registration, GatewayError> {
        self.credentials.register(tenant_id, agent_id, model)
    }

    pub fn authenticate(&self, token: &str) -> Result<AuthOutcome, GatewayError> {
        self.credentials.authenticate(token)
    }

    pub fn session(&self, session_id: &str) -> Option<Session> {
        self.credentials.session(session_id)
    }

    /// Enforce the opt-in session admission check.
    pub(crate) fn admit_session(&self, session_id: &SessionId) -> Result<(), GatewayError> {
        if self.config.require_session && self.credentials.session(session_id.as_str()).is_none()
        {
            return Err(GatewayError::UnknownSession(session_id.clone()));
        }
        Ok(())
    }

    /// One-shot generation outside any stream.
    pub async fn single_chat(
        &self,
        session_id: &str,
        content: &str,
        model: &str,
    ) -> Result<ChatReply, GatewayError> {
        if session_id.is_empty() {
            return Err(GatewayError::invalid("session_id is required"));
        }
        if content.is_empty() {
            return Err(GatewayError::invalid("content is required"));
        }
        let session_id = SessionId::new(session_id);
        self.admit_session(&session_id)?;
        let model = self.config.resolve_model(model);

        tracing::info!(session_id = %session_id.short(8), model, "single chat");
        let content = self.inference.generate(&model, content).await?;

        Ok(ChatReply {
            content,
            timestamp_ms: self.clock.epoch_ms(),
        })
    }

    pub fn active_session_count(&self) -> usize {
        self.credentials.active_session_count()
    }

    pub fn active_stream_count(&self) -> usize {
        self.streams.count()
    }

    pub fn counts(&self) -> GatewayCounts {
        GatewayCounts {
            sessions: self.credentials.active_session_count(),
            tokens: self.credentials.active_token_count(),
            streams: self.streams.count(),
        }
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
