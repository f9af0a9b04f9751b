// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Register / Authenticate / SessionInfo handlers

use tollgate_adapters::InferenceAdapter;
use tollgate_core::Clock;
use tollgate_engine::Gateway;

use super::error_response;
use crate::protocol::Response;

pub(super) fn handle_register<I, C>(
    gateway: &Gateway<I, C>,
    tenant_id: &str,
    agent_id: &str,
    model: &str,
) -> Response
where
    I: InferenceAdapter,
    C: Clock,
{
    match gateway.register(tenant_id, agent_id, model) {
        Ok(r) => Response::Registered {
            session_id: r.session_id,
            token: r.token,
            expires_at_ms: r.expires_at_ms,
        },
        Err(e) => error_response(&e),
    }
}

pub(super) fn handle_authenticate<I, C>(gateway: &Gateway<I, C>, token: &str) -> Response
where
    I: InferenceAdapter,
    C: Clock,
{
    match gateway.authenticate(token) {
        Ok(auth) => Response::Authenticated {
            valid: auth.valid,
            tenant_id: auth.tenant_id,
            agent_id: auth.agent_id,
        },
        Err(e) => error_response(&e),
    }
}

pub(super) fn handle_session_info<I, C>(gateway: &Gateway<I, C>, session_id: &str) -> Response
where
    I: InferenceAdapter,
    C: Clock,
{
    Response::Session {
        session: gateway.session(session_id),
    }
}
