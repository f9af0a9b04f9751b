// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and handling
//! each on its own task. A connection carries either one unary request or,
//! after `OpenChat`, a whole chat stream.

mod chat;
mod handshake;
mod status;

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tollgate_adapters::InferenceAdapter;
use tollgate_core::Clock;
use tollgate_engine::{Gateway, GatewayError};
use tracing::{debug, error, warn};

use crate::protocol::{self, ErrorCode, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Shared per-daemon context handed to every connection.
pub struct ListenCtx {
    pub start_time: Instant,
    pub backend_url: String,
    /// Wakes the main loop for a `Shutdown` request
    pub shutdown: Arc<Notify>,
}

/// Listener task for accepting socket connections.
pub struct Listener<I, C: Clock> {
    socket: TcpListener,
    gateway: Gateway<I, C>,
    ctx: Arc<ListenCtx>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl<I, C> Listener<I, C>
where
    I: InferenceAdapter,
    C: Clock,
{
    pub fn new(socket: TcpListener, gateway: Gateway<I, C>, ctx: ListenCtx) -> Self {
        Self {
            socket,
            gateway,
            ctx: Arc::new(ctx),
        }
    }

    /// Accept connections until the gateway shuts down.
    pub async fn run(self) {
        let shutdown = self.gateway.shutdown_token();
        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.socket.accept() => accepted,
            };
            match accepted {
                Ok((stream, peer)) => {
                    let gateway = self.gateway.clone();
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, gateway, ctx).await {
                            match e {
                                ConnectionError::Protocol(
                                    protocol::ProtocolError::ConnectionClosed,
                                ) => debug!(%peer, "Client disconnected"),
                                ConnectionError::Protocol(protocol::ProtocolError::Timeout) => {
                                    warn!(%peer, "Connection timeout")
                                }
                                _ => error!(%peer, "Connection error: {}", e),
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
        debug!("listener stopped");
    }
}

/// Handle a single client connection.
async fn handle_connection<I, C>(
    stream: TcpStream,
    gateway: Gateway<I, C>,
    ctx: Arc<ListenCtx>,
) -> Result<(), ConnectionError>
where
    I: InferenceAdapter,
    C: Clock,
{
    let (mut reader, mut writer) = stream.into_split();

    let request = protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await?;

    // Status polling and pings at debug, everything else at info
    if matches!(request, Request::Ping | Request::Status) {
        debug!(request = ?request, "received request");
    } else {
        tracing::info!(request = request_name(&request), "received request");
    }

    if matches!(request, Request::OpenChat) {
        return chat::serve_stream(reader, writer, &gateway).await;
    }

    let response = handle_request(request, &gateway, &ctx).await;

    debug!("Sending response: {:?}", response);

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;

    Ok(())
}

/// Handle a single unary request and return a response.
async fn handle_request<I, C>(
    request: Request,
    gateway: &Gateway<I, C>,
    ctx: &ListenCtx,
) -> Response
where
    I: InferenceAdapter,
    C: Clock,
{
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Register {
            tenant_id,
            agent_id,
            model,
        } => handshake::handle_register(gateway, &tenant_id, &agent_id, &model),

        Request::Authenticate { token } => handshake::handle_authenticate(gateway, &token),

        Request::SessionInfo { session_id } => handshake::handle_session_info(gateway, &session_id),

        Request::SingleChat {
            session_id,
            content,
            model,
        } => chat::handle_single_chat(gateway, &session_id, &content, &model).await,

        // Routed to the stream handler before reaching here
        Request::OpenChat => Response::error(
            ErrorCode::Internal,
            "chat stream requested on a unary connection",
        ),

        Request::Status => status::handle_status(gateway, ctx).await,

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }
    }
}

/// Request names for logging. Bodies can hold tokens and prompts.
fn request_name(request: &Request) -> &'static str {
    match request {
        Request::Ping => "Ping",
        Request::Hello { .. } => "Hello",
        Request::Register { .. } => "Register",
        Request::Authenticate { .. } => "Authenticate",
        Request::SessionInfo { .. } => "SessionInfo",
        Request::SingleChat { .. } => "SingleChat",
        Request::OpenChat => "OpenChat",
        Request::Status => "Status",
        Request::Shutdown => "Shutdown",
    }
}

pub(crate) fn error_code(e: &GatewayError) -> ErrorCode {
    if e.is_client_error() {
        ErrorCode::InvalidArgument
    } else {
        ErrorCode::Internal
    }
}

pub(crate) fn error_response(e: &GatewayError) -> Response {
    Response::error(error_code(e), e.to_string())
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
