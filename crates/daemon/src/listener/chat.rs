// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-shot chat and duplex chat streams over a connection.
//!
//! A stream connection is split into a reader task that decodes inbound
//! chat messages and a writer task that drains the gateway's reply sink.
//! The gateway closes the sink when the stream ends, which ends the writer;
//! a terminal stream error is written after that.

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tollgate_adapters::InferenceAdapter;
use tollgate_core::{ChatMessage, Clock};
use tollgate_engine::{Gateway, ReplySink};
use tracing::{debug, warn};

use super::{error_code, error_response, ConnectionError};
use crate::protocol::{self, ChatFrame, ProtocolError, Response, DEFAULT_TIMEOUT};

/// Inbound messages buffered between the socket and the dispatcher
const INBOUND_BUFFER: usize = 32;

pub(super) async fn handle_single_chat<I, C>(
    gateway: &Gateway<I, C>,
    session_id: &str,
    content: &str,
    model: &str,
) -> Response
where
    I: InferenceAdapter,
    C: Clock,
{
    match gateway.single_chat(session_id, content, model).await {
        Ok(reply) => Response::ChatReply {
            content: reply.content,
            timestamp_ms: reply.timestamp_ms,
        },
        Err(e) => error_response(&e),
    }
}

pub(super) async fn serve_stream<I, C>(
    reader: OwnedReadHalf,
    mut writer: OwnedWriteHalf,
    gateway: &Gateway<I, C>,
) -> Result<(), ConnectionError>
where
    I: InferenceAdapter,
    C: Clock,
{
    protocol::write_response(&mut writer, &Response::ChatOpened, DEFAULT_TIMEOUT).await?;

    let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);
    let (sink, replies) = ReplySink::channel();

    let reader_task = tokio::spawn(read_inbound(reader, inbound_tx));
    let writer_task = tokio::spawn(write_replies(writer, replies));

    let outcome = gateway.run_stream(inbound_rx, sink).await;
    reader_task.abort();

    let writer = writer_task
        .await
        .map_err(|e| ConnectionError::Internal(e.to_string()))?;
    let Some(mut writer) = writer else {
        // Peer stopped accepting replies; nothing more can be delivered
        return Ok(());
    };

    match outcome {
        Ok(summary) => {
            debug!(received = summary.received, end = ?summary.end, "chat stream closed");
        }
        Err(e) => {
            warn!(error = %e, "chat stream rejected");
            let frame = ChatFrame::StreamError {
                code: error_code(&e),
                message: e.to_string(),
            };
            protocol::write_frame(&mut writer, &frame, DEFAULT_TIMEOUT).await?;
        }
    }

    writer.shutdown().await.map_err(ProtocolError::from)?;
    Ok(())
}

/// Decode inbound frames until the client half-closes or the transport fails.
/// Either way the dispatcher sees end-of-stream when `inbound` drops.
async fn read_inbound(mut reader: OwnedReadHalf, inbound: mpsc::Sender<ChatMessage>) {
    loop {
        match protocol::read_frame::<ChatMessage, _>(&mut reader).await {
            Ok(message) => {
                if inbound.send(message).await.is_err() {
                    break;
                }
            }
            Err(ProtocolError::ConnectionClosed) => {
                debug!("client half-closed chat stream");
                break;
            }
            Err(e) => {
                warn!(error = %e, "chat stream read failed");
                break;
            }
        }
    }
}

/// Write replies until the sink is sealed. Returns the write half unless a
/// write failed.
async fn write_replies(
    mut writer: OwnedWriteHalf,
    mut replies: mpsc::UnboundedReceiver<ChatMessage>,
) -> Option<OwnedWriteHalf> {
    while let Some(reply) = replies.recv().await {
        let frame = ChatFrame::Message(reply);
        if let Err(e) = protocol::write_frame(&mut writer, &frame, DEFAULT_TIMEOUT).await {
            warn!(error = %e, "chat reply write failed");
            return None;
        }
    }
    Some(writer)
}
