// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session and credential records issued by the handshake.
//!
//! A session binds a tenant/agent pair to a model. A credential is the bearer
//! token handed out alongside it. The two are timestamped independently and
//! stored separately, so either may outlive the other.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Opaque session identifier (128-bit random, hex encoded).
    ///
    /// Also used by clients to tag duplex chat streams.
    #[derive(Default)]
    pub struct SessionId;
}

crate::define_id! {
    /// Opaque bearer token proving possession of a session.
    pub struct AccessToken;
}

/// A tenant/agent/model binding with its own expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub tenant_id: String,
    pub agent_id: String,
    pub model: String,
    pub created_at_ms: u64,
    pub expires_at_ms: u64,
}

impl Session {
    /// Expired once `now_ms` reaches `expires_at_ms`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// Bearer credential record.
///
/// `session_id` is a back-reference only; the registry does not keep the
/// two lifetimes in step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub tenant_id: String,
    pub agent_id: String,
    pub session_id: SessionId,
    pub created_at_ms: u64,
    pub expires_at_ms: u64,
}

impl Credential {
    /// Expired once `now_ms` reaches `expires_at_ms`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
