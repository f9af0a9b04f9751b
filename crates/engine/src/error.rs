// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the gateway engine

use thiserror::Error;
use tollgate_adapters::InferenceError;
use tollgate_core::SessionId;

/// Errors returned by gateway operations
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("session not found or expired: {0}")]
    UnknownSession(SessionId),
    #[error("failed to generate response: {0}")]
    Backend(#[from] InferenceError),
}

impl GatewayError {
    pub(crate) fn invalid(message: &str) -> Self {
        GatewayError::InvalidArgument(message.to_string())
    }

    /// True when the caller sent something unacceptable, as opposed to the
    /// gateway failing to serve a valid request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GatewayError::InvalidArgument(_) | GatewayError::UnknownSession(_)
        )
    }
}
