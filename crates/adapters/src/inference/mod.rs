// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inference backend adapters

mod ollama;

pub use ollama::{GenerateOptions, OllamaAdapter};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeInferenceAdapter, InferenceCall};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from inference calls
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("failed to call backend: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend returned non-success status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("generation failed: {0}")]
    Failed(String),
}

/// Adapter for the text-generation backend.
///
/// Implementations return the complete generated text or an error, never a
/// partial result. Callers do not retry.
#[async_trait]
pub trait InferenceAdapter: Clone + Send + Sync + 'static {
    /// Generate a completion for `prompt` with `model`
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, InferenceError>;

    /// Check that the backend is reachable.
    /// Default implementation reports healthy.
    async fn health_check(&self) -> Result<(), InferenceError> {
        Ok(())
    }
}
