// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ollama HTTP inference adapter

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{InferenceAdapter, InferenceError};

/// Optional generation parameters passed through to the backend.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// System prompt override
    pub system: Option<String>,
    /// Model options (temperature, num_ctx, ...) forwarded verbatim
    pub options: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a serde_json::Value>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    done: bool,
}

/// Non-streaming client for Ollama's `/api/generate`.
#[derive(Clone)]
pub struct OllamaAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaAdapter {
    /// Create an adapter using the configured backend timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, InferenceError> {
        Self::with_timeout(base_url, crate::env::backend_timeout())
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate with extra parameters.
    pub async fn generate_with_options(
        &self,
        model: &str,
        prompt: &str,
        opts: &GenerateOptions,
    ) -> Result<String, InferenceError> {
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            system: opts.system.as_deref(),
            options: opts.options.as_ref(),
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status { status, message });
        }

        let body = response.text().await?;
        let decoded: GenerateResponse = serde_json::from_str(&body)?;
        if !decoded.done {
            tracing::debug!(model, "backend reply not marked done");
        }
        Ok(decoded.response)
    }
}

#[async_trait]
impl InferenceAdapter for OllamaAdapter {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, InferenceError> {
        self.generate_with_options(model, prompt, &GenerateOptions::default())
            .await
    }

    async fn health_check(&self) -> Result<(), InferenceError> {
        let response = self
            .client
            .get(format!("{}/api/version", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status { status, message });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "ollama_tests.rs"]
mod tests;
