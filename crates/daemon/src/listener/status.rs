// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use tollgate_adapters::InferenceAdapter;
use tollgate_core::Clock;
use tollgate_engine::Gateway;

use super::ListenCtx;
use crate::protocol::{BackendStatus, Response};

/// Keeps a slow backend from stalling status past the client's timeout
const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub(super) async fn handle_status<I, C>(gateway: &Gateway<I, C>, ctx: &ListenCtx) -> Response
where
    I: InferenceAdapter,
    C: Clock,
{
    let counts = gateway.counts();
    let healthy = matches!(
        tokio::time::timeout(HEALTH_PROBE_TIMEOUT, gateway.inference().health_check()).await,
        Ok(Ok(()))
    );

    Response::Status {
        uptime_secs: ctx.start_time.elapsed().as_secs(),
        sessions_active: counts.sessions,
        tokens_active: counts.tokens,
        streams_active: counts.streams,
        backend: BackendStatus {
            url: ctx.backend_url.clone(),
            healthy,
        },
    }
}
