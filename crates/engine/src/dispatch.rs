// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Duplex chat stream dispatcher.
//!
//! The first inbound message names the session and admits the stream. Every
//! later message refreshes the stream's activity and is answered by its own
//! task, so replies may arrive in any order; each carries `reply_to`.
//! When the stream ends the reply sink is sealed before `run_stream`
//! returns, and replies still in flight are dropped.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tollgate_adapters::InferenceAdapter;
use tollgate_core::{ChatMessage, Clock, MessageKind, SessionId, ShortId};

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::streams::StreamId;

/// System reply for a message with no content.
pub const EMPTY_CONTENT_REPLY: &str = "Error: message content cannot be empty";

/// System reply when the stream already has the maximum number of messages
/// in flight.
pub const BUSY_REPLY: &str = "Error: too many messages in flight, retry later";

/// Outbound half of a stream.
///
/// Clones share one sender. After [`close`](Self::close) every `send`
/// returns false and the receiving side sees end-of-stream once drained.
#[derive(Clone)]
pub struct ReplySink {
    tx: Arc<Mutex<Option<mpsc::UnboundedSender<ChatMessage>>>>,
}

impl ReplySink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ChatMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    /// Queue a reply. False if the sink is sealed or the receiver is gone.
    pub fn send(&self, message: ChatMessage) -> bool {
        match self.tx.lock().as_ref() {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        }
    }

    pub fn close(&self) {
        self.tx.lock().take();
    }

    pub fn is_closed(&self) -> bool {
        self.tx.lock().is_none()
    }
}

/// How a stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// Inbound side finished (client half-close or transport error)
    Closed,
    /// Reaped for idleness, replaced by a newer stream for the same
    /// session, or the gateway shut down
    Cancelled,
}

/// Summary of a finished stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    /// None if the stream ended before its first message
    pub session_id: Option<SessionId>,
    pub received: usize,
    pub end: StreamEnd,
}

struct ActiveStream {
    session_id: SessionId,
    stream_id: StreamId,
    model: String,
    cancel: CancellationToken,
    permits: Arc<Semaphore>,
    tasks: JoinSet<()>,
    received: usize,
}

impl<I, C> Gateway<I, C>
where
    I: InferenceAdapter,
    C: Clock,
{
    /// Drive one duplex chat stream to completion.
    ///
    /// Returns `InvalidArgument` if the first message has no session id, or
    /// `UnknownSession` when the admission check is enabled and the session
    /// is not live. The sink is closed on every return path.
    pub async fn run_stream(
        &self,
        mut inbound: mpsc::Receiver<ChatMessage>,
        sink: ReplySink,
    ) -> Result<StreamSummary, GatewayError> {
        // Not in the registry yet, so the idle bound is enforced here
        let first = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => Err(StreamEnd::Cancelled),
            message = inbound.recv() => message.ok_or(StreamEnd::Closed),
            _ = tokio::time::sleep(self.config.stream_idle_timeout) => {
                tracing::info!("stream sent no message, closing");
                Err(StreamEnd::Cancelled)
            }
        };
        let first = match first {
            Ok(first) => first,
            Err(end) => {
                sink.close();
                return Ok(StreamSummary {
                    session_id: None,
                    received: 0,
                    end,
                });
            }
        };

        let mut stream = match self.open_stream(&first) {
            Ok(stream) => stream,
            Err(e) => {
                sink.close();
                return Err(e);
            }
        };
        self.handle_inbound(&mut stream, first, &sink);

        let end = loop {
            tokio::select! {
                biased;
                _ = stream.cancel.cancelled() => break StreamEnd::Cancelled,
                Some(joined) = stream.tasks.join_next(), if !stream.tasks.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(session_id = %stream.session_id.short(8), error = %e, "dispatch task failed");
                    }
                }
                message = inbound.recv() => match message {
                    Some(message) => self.handle_inbound(&mut stream, message, &sink),
                    None => break StreamEnd::Closed,
                },
            }
        };

        stream.cancel.cancel();
        sink.close();
        stream.tasks.abort_all();
        self.streams
            .remove_if_owner(&stream.session_id, stream.stream_id);

        tracing::info!(
            session_id = %stream.session_id.short(8),
            received = stream.received,
            ?end,
            "stream finished"
        );

        Ok(StreamSummary {
            session_id: Some(stream.session_id),
            received: stream.received,
            end,
        })
    }

    fn open_stream(&self, first: &ChatMessage) -> Result<ActiveStream, GatewayError> {
        if first.session_id.is_empty() {
            return Err(GatewayError::invalid("session_id is required in first message"));
        }
        let session_id = first.session_id.clone();
        self.admit_session(&session_id)?;

        // Streams always use the default model; the session's model is not consulted
        let model = self.config.default_model.clone();
        let cancel = self.shutdown.child_token();
        let stream_id = self.streams.admit(
            session_id.clone(),
            model.clone(),
            cancel.clone(),
            self.clock.now(),
        );
        tracing::info!(session_id = %session_id.short(8), model, "stream opened");

        Ok(ActiveStream {
            session_id,
            stream_id,
            model,
            cancel,
            permits: Arc::new(Semaphore::new(self.config.max_in_flight_per_stream.max(1))),
            tasks: JoinSet::new(),
            received: 0,
        })
    }

    fn handle_inbound(&self, stream: &mut ActiveStream, mut message: ChatMessage, sink: &ReplySink) {
        stream.received += 1;
        if message.session_id.is_empty() {
            message.session_id = stream.session_id.clone();
        }
        self.streams
            .touch(&stream.session_id, stream.stream_id, self.clock.now());

        if message.content.is_empty() {
            let reply = ChatMessage::reply(
                &message,
                MessageKind::System,
                EMPTY_CONTENT_REPLY,
                self.clock.epoch_ms(),
            );
            sink.send(reply);
            return;
        }

        let Ok(permit) = stream.permits.clone().try_acquire_owned() else {
            tracing::warn!(session_id = %stream.session_id.short(8), "stream saturated, message refused");
            let reply = ChatMessage::reply(
                &message,
                MessageKind::System,
                BUSY_REPLY,
                self.clock.epoch_ms(),
            );
            sink.send(reply);
            return;
        };

        let inference = self.inference.clone();
        let clock = self.clock.clone();
        let cancel = stream.cancel.clone();
        let model = stream.model.clone();
        let sink = sink.clone();
        stream.tasks.spawn(async move {
            let _permit = permit;
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                result = inference.generate(&model, &message.content) => result,
            };

            let reply = match result {
                Ok(text) => {
                    ChatMessage::reply(&message, MessageKind::Assistant, text, clock.epoch_ms())
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %message.session_id.short(8),
                        error = %e,
                        "backend error on stream"
                    );
                    ChatMessage::reply(
                        &message,
                        MessageKind::System,
                        format!("Error generating response: {e}"),
                        clock.epoch_ms(),
                    )
                }
            };

            if !sink.send(reply) {
                tracing::debug!(
                    session_id = %message.session_id.short(8),
                    "stream closed, reply discarded"
                );
            }
        });
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
