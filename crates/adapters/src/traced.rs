// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::inference::{InferenceAdapter, InferenceError};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any InferenceAdapter
#[derive(Clone)]
pub struct TracedInference<I> {
    inner: I,
}

impl<I> TracedInference<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }
}

#[async_trait]
impl<I: InferenceAdapter> InferenceAdapter for TracedInference<I> {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, InferenceError> {
        async {
            tracing::debug!(prompt_len = prompt.len(), "starting");
            let start = std::time::Instant::now();
            let result = self.inner.generate(model, prompt).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(text) => tracing::info!(elapsed_ms, reply_len = text.len(), "generated"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "generate failed"),
            }
            result
        }
        .instrument(tracing::info_span!("inference.generate", model))
        .await
    }

    async fn health_check(&self) -> Result<(), InferenceError> {
        let result = self.inner.health_check().await;
        tracing::info_span!("inference.health").in_scope(|| match &result {
            Ok(()) => tracing::debug!("backend healthy"),
            Err(e) => tracing::warn!(error = %e, "backend health check failed"),
        });
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
