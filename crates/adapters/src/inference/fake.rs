// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake inference adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{InferenceAdapter, InferenceError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Recorded generate call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceCall {
    pub model: String,
    pub prompt: String,
}

#[derive(Clone)]
enum Scripted {
    Reply(String),
    Fail(String),
}

struct FakeInferenceState {
    scripts: HashMap<String, Scripted>,
    delays: HashMap<String, Duration>,
    calls: Vec<InferenceCall>,
    healthy: bool,
}

/// Fake inference adapter for testing.
///
/// Unscripted prompts are answered with `"echo: {prompt}"`.
#[derive(Clone)]
pub struct FakeInferenceAdapter {
    inner: Arc<Mutex<FakeInferenceState>>,
}

impl Default for FakeInferenceAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeInferenceState {
                scripts: HashMap::new(),
                delays: HashMap::new(),
                calls: Vec::new(),
                healthy: true,
            })),
        }
    }
}

impl FakeInferenceAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `prompt` with `reply`
    pub fn set_reply(&self, prompt: &str, reply: &str) {
        self.inner
            .lock()
            .scripts
            .insert(prompt.to_string(), Scripted::Reply(reply.to_string()));
    }

    /// Fail generation for `prompt` with `message`
    pub fn set_failure(&self, prompt: &str, message: &str) {
        self.inner
            .lock()
            .scripts
            .insert(prompt.to_string(), Scripted::Fail(message.to_string()));
    }

    /// Delay the answer for `prompt` (uses tokio time, so paused tests can
    /// advance past it)
    pub fn set_delay(&self, prompt: &str, delay: Duration) {
        self.inner.lock().delays.insert(prompt.to_string(), delay);
    }

    /// Make `health_check` fail
    pub fn set_healthy(&self, healthy: bool) {
        self.inner.lock().healthy = healthy;
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<InferenceCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl InferenceAdapter for FakeInferenceAdapter {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, InferenceError> {
        let (script, delay) = {
            let mut inner = self.inner.lock();
            inner.calls.push(InferenceCall {
                model: model.to_string(),
                prompt: prompt.to_string(),
            });
            (
                inner.scripts.get(prompt).cloned(),
                inner.delays.get(prompt).copied(),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match script {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Fail(message)) => Err(InferenceError::Failed(message)),
            None => Ok(format!("echo: {}", prompt)),
        }
    }

    async fn health_check(&self) -> Result<(), InferenceError> {
        if self.inner.lock().healthy {
            Ok(())
        } else {
            Err(InferenceError::Failed("backend unavailable".to_string()))
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
