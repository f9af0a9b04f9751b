// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway protocol spoken between clients and the daemon.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.
//!
//! Unary calls are one [`Request`] frame answered by one [`Response`] frame.
//! A chat stream starts with [`Request::OpenChat`] / [`Response::ChatOpened`];
//! after that the client sends bare [`ChatMessage`] frames and the daemon
//! answers with [`ChatFrame`]s until the client half-closes.

use serde::{Deserialize, Serialize};
use tollgate_core::{AccessToken, ChatMessage, Session, SessionId};

#[path = "protocol_wire.rs"]
mod wire;
pub use wire::{
    decode, encode, read_frame, read_message, read_request, read_response, write_frame,
    write_message, write_request, write_response, ProtocolError, DEFAULT_TIMEOUT,
    MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};

/// Request from client to daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Issue a session and bearer token
    Register {
        tenant_id: String,
        agent_id: String,
        /// Empty selects the default model
        #[serde(default)]
        model: String,
    },

    /// Validate a bearer token
    Authenticate { token: String },

    /// Look up a live session
    SessionInfo { session_id: String },

    /// One-shot generation
    SingleChat {
        session_id: String,
        content: String,
        #[serde(default)]
        model: String,
    },

    /// Switch this connection to a duplex chat stream
    OpenChat,

    /// Get daemon status
    Status,

    /// Request daemon shutdown
    Shutdown,
}

/// Error classes reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidArgument,
    Internal,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::InvalidArgument => f.write_str("invalid argument"),
            ErrorCode::Internal => f.write_str("internal"),
        }
    }
}

/// Inference backend as seen by the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendStatus {
    pub url: String,
    pub healthy: bool,
}

/// Response from daemon to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Health check response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Daemon is shutting down
    ShuttingDown,

    Registered {
        session_id: SessionId,
        token: AccessToken,
        expires_at_ms: u64,
    },

    Authenticated {
        valid: bool,
        tenant_id: String,
        agent_id: String,
    },

    /// `None` if the session is unknown or expired
    Session { session: Option<Session> },

    ChatReply { content: String, timestamp_ms: u64 },

    /// Stream accepted; chat frames follow
    ChatOpened,

    Status {
        uptime_secs: u64,
        sessions_active: usize,
        tokens_active: usize,
        streams_active: usize,
        backend: BackendStatus,
    },

    /// Request failed
    Error { code: ErrorCode, message: String },
}

impl Response {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Response::Error {
            code,
            message: message.into(),
        }
    }
}

/// Daemon-to-client frame on an open chat stream.
///
/// Replies are bare chat messages. A stream error is the last frame before
/// the daemon closes the connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChatFrame {
    StreamError { code: ErrorCode, message: String },
    Message(ChatMessage),
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
