// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat messages carried on duplex streams.

use serde::{Deserialize, Serialize};

use crate::id::MessageId;
use crate::session::SessionId;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MessageKind {
    #[default]
    User,
    Assistant,
    System,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MessageKind::User => "user",
            MessageKind::Assistant => "assistant",
            MessageKind::System => "system",
        };
        f.write_str(s)
    }
}

/// One message on a chat stream, in either direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub message_id: MessageId,
    #[serde(default)]
    pub session_id: SessionId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub timestamp_ms: u64,
    /// Id of the inbound message this one answers. Replies to concurrently
    /// dispatched messages can arrive in any order; this is how clients
    /// pair them up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,
}

impl ChatMessage {
    /// Client-originated message with a fresh id.
    pub fn user(session_id: SessionId, content: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            message_id: MessageId::random(),
            session_id,
            content: content.into(),
            kind: MessageKind::User,
            timestamp_ms,
            reply_to: None,
        }
    }

    /// Gateway reply to `inbound`.
    pub fn reply(
        inbound: &ChatMessage,
        kind: MessageKind,
        content: impl Into<String>,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            message_id: MessageId::random(),
            session_id: inbound.session_id.clone(),
            content: content.into(),
            kind,
            timestamp_ms,
            reply_to: Some(inbound.message_id.clone()).filter(|id| !id.is_empty()),
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
