// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session and bearer-token registry.
//!
//! Sessions and tokens live in two tables behind one lock. Each record
//! carries its own expiry and the tables are swept independently, so a
//! token can outlive the session it names (and the other way round).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tollgate_core::{
    random_hex, AccessToken, Clock, Credential, Session, SessionId, ShortId, SESSION_ID_BYTES,
};

use crate::error::GatewayError;

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub session_id: SessionId,
    pub token: AccessToken,
    pub created_at_ms: u64,
    pub expires_at_ms: u64,
}

/// Result of a token check. Unknown and expired tokens are `valid: false`
/// with empty tenant/agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthOutcome {
    pub valid: bool,
    pub tenant_id: String,
    pub agent_id: String,
}

/// Entries removed by one expiry sweep, plus the sessions left live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub sessions: usize,
    pub tokens: usize,
    pub live_sessions: usize,
}

impl SweepStats {
    /// True if the sweep removed nothing
    pub fn is_empty(&self) -> bool {
        self.sessions == 0 && self.tokens == 0
    }
}

#[derive(Default)]
struct CredentialTables {
    sessions: HashMap<SessionId, Session>,
    tokens: HashMap<AccessToken, Credential>,
}

impl CredentialTables {
    fn sweep(&mut self, now_ms: u64) -> SweepStats {
        let sessions_before = self.sessions.len();
        let tokens_before = self.tokens.len();
        self.sessions.retain(|_, s| !s.is_expired(now_ms));
        self.tokens.retain(|_, t| !t.is_expired(now_ms));
        SweepStats {
            sessions: sessions_before - self.sessions.len(),
            tokens: tokens_before - self.tokens.len(),
            live_sessions: self.sessions.len(),
        }
    }
}

/// Cloneable handle to the shared credential tables.
#[derive(Clone)]
pub struct CredentialRegistry<C: Clock> {
    tables: Arc<Mutex<CredentialTables>>,
    clock: C,
    ttl: Duration,
    default_model: String,
}

impl<C: Clock> CredentialRegistry<C> {
    pub fn new(clock: C, ttl: Duration, default_model: impl Into<String>) -> Self {
        Self {
            tables: Arc::new(Mutex::new(CredentialTables::default())),
            clock,
            ttl,
            default_model: default_model.into(),
        }
    }

    /// Issue a new session and bearer token for a tenant/agent pair.
    ///
    /// Both records are stamped with the same creation time and expire
    /// `ttl` later, clamped to `u64::MAX`. An empty `model` selects the
    /// default model.
    pub fn register(
        &self,
        tenant_id: &str,
        agent_id: &str,
        model: &str,
    ) -> Result<Registration, GatewayError> {
        if tenant_id.is_empty() {
            return Err(GatewayError::invalid("tenant_id is required"));
        }
        if agent_id.is_empty() {
            return Err(GatewayError::invalid("agent_id is required"));
        }
        let model = if model.is_empty() {
            self.default_model.clone()
        } else {
            model.to_string()
        };

        let session_id = SessionId::new(random_hex(SESSION_ID_BYTES));
        let token = AccessToken::new(random_hex(SESSION_ID_BYTES));
        let created_at_ms = self.clock.epoch_ms();
        let ttl_ms = u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX);
        let expires_at_ms = created_at_ms.saturating_add(ttl_ms);

        let session = Session {
            session_id: session_id.clone(),
            tenant_id: tenant_id.to_string(),
            agent_id: agent_id.to_string(),
            model,
            created_at_ms,
            expires_at_ms,
        };
        let credential = Credential {
            tenant_id: tenant_id.to_string(),
            agent_id: agent_id.to_string(),
            session_id: session_id.clone(),
            created_at_ms,
            expires_at_ms,
        };

        {
            let mut tables = self.tables.lock();
            tables.sessions.insert(session_id.clone(), session);
            tables.tokens.insert(token.clone(), credential);
        }

        tracing::info!(
            tenant_id,
            agent_id,
            session_id = %session_id.short(8),
            "session registered"
        );

        Ok(Registration {
            session_id,
            token,
            created_at_ms,
            expires_at_ms,
        })
    }

    /// Check a bearer token.
    ///
    /// An expired token is evicted together with the session it references.
    pub fn authenticate(&self, token: &str) -> Result<AuthOutcome, GatewayError> {
        if token.is_empty() {
            return Err(GatewayError::invalid("jwt_token is required"));
        }
        let now_ms = self.clock.epoch_ms();

        let mut tables = self.tables.lock();
        let Some(credential) = tables.tokens.get(token) else {
            return Ok(AuthOutcome::default());
        };

        if credential.is_expired(now_ms) {
            let session_id = credential.session_id.clone();
            tables.tokens.remove(token);
            tables.sessions.remove(&session_id);
            drop(tables);
            tracing::info!(session_id = %session_id.short(8), "expired token evicted");
            return Ok(AuthOutcome::default());
        }

        Ok(AuthOutcome {
            valid: true,
            tenant_id: credential.tenant_id.clone(),
            agent_id: credential.agent_id.clone(),
        })
    }

    /// Look up a live session, evicting it if it has expired.
    pub fn session(&self, session_id: &str) -> Option<Session> {
        let now_ms = self.clock.epoch_ms();
        let mut tables = self.tables.lock();
        let expired = tables.sessions.get(session_id)?.is_expired(now_ms);
        if expired {
            tables.sessions.remove(session_id);
            return None;
        }
        tables.sessions.get(session_id).cloned()
    }

    /// Remove every session and token whose expiry has been reached.
    pub fn cleanup_expired(&self) -> SweepStats {
        let now_ms = self.clock.epoch_ms();
        self.tables.lock().sweep(now_ms)
    }

    /// Live session count (sweeps first).
    pub fn active_session_count(&self) -> usize {
        let now_ms = self.clock.epoch_ms();
        let mut tables = self.tables.lock();
        tables.sweep(now_ms);
        tables.sessions.len()
    }

    /// Live token count (sweeps first).
    pub fn active_token_count(&self) -> usize {
        let now_ms = self.clock.epoch_ms();
        let mut tables = self.tables.lock();
        tables.sweep(now_ms);
        tables.tokens.len()
    }
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
