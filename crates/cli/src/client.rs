// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tollgate_core::{AccessToken, ChatMessage, Session, SessionId};
use tollgate_daemon::protocol::{self, ChatFrame, ErrorCode, ProtocolError};
use tollgate_daemon::{BackendStatus, Request, Response};

use crate::env::{daemon_addr, timeout_chat, timeout_ipc};

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running at {0}")]
    DaemonNotRunning(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Request rejected ({code}): {message}")]
    Rejected { code: ErrorCode, message: String },

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Credentials issued by `Register`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Registration {
    pub session_id: SessionId,
    pub token: AccessToken,
    pub expires_at_ms: u64,
}

/// Outcome of `Authenticate`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AuthResult {
    pub valid: bool,
    pub tenant_id: String,
    pub agent_id: String,
}

/// Single-shot generation result
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChatReply {
    pub content: String,
    pub timestamp_ms: u64,
}

/// Daemon status snapshot
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StatusReport {
    pub uptime_secs: u64,
    pub sessions_active: usize,
    pub tokens_active: usize,
    pub streams_active: usize,
    pub backend: BackendStatus,
}

/// Daemon client
pub struct DaemonClient {
    addr: String,
}

impl DaemonClient {
    /// Client for the address in `TOLLGATE_ADDR`
    pub fn from_env() -> Self {
        Self::new(daemon_addr())
    }

    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn connect(&self) -> Result<TcpStream, ClientError> {
        match TcpStream::connect(&self.addr).await {
            Ok(stream) => Ok(stream),
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                Err(ClientError::DaemonNotRunning(self.addr.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Send a request and receive a response with specific timeouts
    async fn send_with_timeout(
        &self,
        request: &Request,
        read_timeout: Duration,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = self.connect().await?;
        let (mut reader, mut writer) = stream.into_split();

        protocol::write_request(&mut writer, request, write_timeout).await?;
        let response = protocol::read_response(&mut reader, read_timeout).await?;
        Ok(response)
    }

    /// Send a request and receive a response
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        self.send_with_timeout(request, timeout_ipc(), timeout_ipc())
            .await
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.send(&Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Get daemon version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello {
            version: protocol::PROTOCOL_VERSION.to_string(),
        };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Err(unexpected(other)),
        }
    }

    pub async fn register(
        &self,
        tenant_id: &str,
        agent_id: &str,
        model: &str,
    ) -> Result<Registration, ClientError> {
        let request = Request::Register {
            tenant_id: tenant_id.to_string(),
            agent_id: agent_id.to_string(),
            model: model.to_string(),
        };
        match self.send(&request).await? {
            Response::Registered {
                session_id,
                token,
                expires_at_ms,
            } => Ok(Registration {
                session_id,
                token,
                expires_at_ms,
            }),
            other => Err(unexpected(other)),
        }
    }

    pub async fn authenticate(&self, token: &str) -> Result<AuthResult, ClientError> {
        let request = Request::Authenticate {
            token: token.to_string(),
        };
        match self.send(&request).await? {
            Response::Authenticated {
                valid,
                tenant_id,
                agent_id,
            } => Ok(AuthResult {
                valid,
                tenant_id,
                agent_id,
            }),
            other => Err(unexpected(other)),
        }
    }

    pub async fn session_info(&self, session_id: &str) -> Result<Option<Session>, ClientError> {
        let request = Request::SessionInfo {
            session_id: session_id.to_string(),
        };
        match self.send(&request).await? {
            Response::Session { session } => Ok(session),
            other => Err(unexpected(other)),
        }
    }

    /// One-shot generation. Waits up to the chat timeout for the backend.
    pub async fn single_chat(
        &self,
        session_id: &str,
        content: &str,
        model: &str,
    ) -> Result<ChatReply, ClientError> {
        let request = Request::SingleChat {
            session_id: session_id.to_string(),
            content: content.to_string(),
            model: model.to_string(),
        };
        match self
            .send_with_timeout(&request, timeout_chat(), timeout_ipc())
            .await?
        {
            Response::ChatReply {
                content,
                timestamp_ms,
            } => Ok(ChatReply {
                content,
                timestamp_ms,
            }),
            other => Err(unexpected(other)),
        }
    }

    pub async fn status(&self) -> Result<StatusReport, ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status {
                uptime_secs,
                sessions_active,
                tokens_active,
                streams_active,
                backend,
            } => Ok(StatusReport {
                uptime_secs,
                sessions_active,
                tokens_active,
                streams_active,
                backend,
            }),
            other => Err(unexpected(other)),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown).await? {
            Response::ShuttingDown => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Open a duplex chat stream
    pub async fn open_chat(&self) -> Result<(ChatReceiver, ChatSender), ClientError> {
        let stream = self.connect().await?;
        let (mut reader, mut writer) = stream.into_split();

        protocol::write_request(&mut writer, &Request::OpenChat, timeout_ipc()).await?;
        match protocol::read_response(&mut reader, timeout_ipc()).await? {
            Response::ChatOpened => Ok((ChatReceiver { reader }, ChatSender { writer })),
            other => Err(unexpected(other)),
        }
    }
}

/// Outbound half of an open chat stream
pub struct ChatSender {
    writer: OwnedWriteHalf,
}

impl ChatSender {
    pub async fn send(&mut self, message: &ChatMessage) -> Result<(), ClientError> {
        protocol::write_frame(&mut self.writer, message, timeout_ipc()).await?;
        Ok(())
    }

    /// Half-close: tells the daemon no more messages are coming
    pub async fn finish(mut self) -> Result<(), ClientError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Inbound half of an open chat stream
pub struct ChatReceiver {
    reader: OwnedReadHalf,
}

impl ChatReceiver {
    /// Next frame from the daemon, or `None` once it has closed the stream
    pub async fn next(&mut self) -> Result<Option<ChatFrame>, ClientError> {
        match protocol::read_frame(&mut self.reader).await {
            Ok(frame) => Ok(Some(frame)),
            Err(ProtocolError::ConnectionClosed) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Map a response that is not the expected variant to an error
fn unexpected(response: Response) -> ClientError {
    match response {
        Response::Error { code, message } => ClientError::Rejected { code, message },
        _ => ClientError::UnexpectedResponse,
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
