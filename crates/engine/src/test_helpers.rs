// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the engine crate.

use crate::{Gateway, GatewayConfig, GatewayError, ReplySink, StreamSummary};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tollgate_adapters::FakeInferenceAdapter;
use tollgate_core::{ChatMessage, Clock, FakeClock, SessionId};

/// Convenience alias for the fully-typed test gateway.
pub(crate) type TestGateway = Gateway<FakeInferenceAdapter, FakeClock>;

/// Test context holding the gateway and its fakes.
pub(crate) struct TestContext {
    pub gateway: TestGateway,
    pub inference: FakeInferenceAdapter,
    pub clock: FakeClock,
}

pub(crate) fn setup() -> TestContext {
    setup_with(GatewayConfig::default())
}

pub(crate) fn setup_with(config: GatewayConfig) -> TestContext {
    let inference = FakeInferenceAdapter::new();
    let clock = FakeClock::new();
    let gateway = Gateway::new(inference.clone(), clock.clone(), config);
    TestContext {
        gateway,
        inference,
        clock,
    }
}

/// A stream running on a spawned task, driven through channels.
pub(crate) struct StreamHarness {
    pub inbound: mpsc::Sender<ChatMessage>,
    pub replies: mpsc::UnboundedReceiver<ChatMessage>,
    pub task: JoinHandle<Result<StreamSummary, GatewayError>>,
}

impl StreamHarness {
    pub async fn send(&self, message: ChatMessage) {
        self.inbound.send(message).await.unwrap();
    }

    pub async fn next_reply(&mut self) -> ChatMessage {
        self.replies.recv().await.unwrap()
    }

    /// Half-close the inbound side and wait for the stream to finish.
    pub async fn finish(
        self,
    ) -> (
        Result<StreamSummary, GatewayError>,
        mpsc::UnboundedReceiver<ChatMessage>,
    ) {
        drop(self.inbound);
        (self.task.await.unwrap(), self.replies)
    }
}

pub(crate) fn open_stream(gateway: &TestGateway) -> StreamHarness {
    let (inbound, inbound_rx) = mpsc::channel(16);
    let (sink, replies) = ReplySink::channel();
    let gateway = gateway.clone();
    let task = tokio::spawn(async move { gateway.run_stream(inbound_rx, sink).await });
    StreamHarness {
        inbound,
        replies,
        task,
    }
}

pub(crate) fn user_message(ctx: &TestContext, session_id: &str, content: &str) -> ChatMessage {
    ChatMessage::user(SessionId::new(session_id), content, ctx.clock.epoch_ms())
}
