// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol::{ChatFrame, ProtocolError};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tollgate_adapters::FakeInferenceAdapter;
use tollgate_core::{ChatMessage, FakeClock, MessageKind, SessionId};
use tollgate_engine::GatewayConfig;

struct TestDaemon {
    addr: SocketAddr,
    gateway: Gateway<FakeInferenceAdapter, FakeClock>,
    inference: FakeInferenceAdapter,
    clock: FakeClock,
    shutdown: Arc<Notify>,
}

async fn start_with(config: GatewayConfig) -> TestDaemon {
    let socket = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    let inference = FakeInferenceAdapter::new();
    let clock = FakeClock::new();
    let gateway = Gateway::new(inference.clone(), clock.clone(), config);
    let shutdown = Arc::new(Notify::new());
    let ctx = ListenCtx {
        start_time: Instant::now(),
        backend_url: "http://backend.test".to_string(),
        shutdown: Arc::clone(&shutdown),
    };
    tokio::spawn(Listener::new(socket, gateway.clone(), ctx).run());
    TestDaemon {
        addr,
        gateway,
        inference,
        clock,
        shutdown,
    }
}

async fn start() -> TestDaemon {
    start_with(GatewayConfig::default()).await
}

async fn call(addr: SocketAddr, request: Request) -> Response {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    protocol::write_request(&mut writer, &request, DEFAULT_TIMEOUT)
        .await
        .unwrap();
    protocol::read_response(&mut reader, DEFAULT_TIMEOUT)
        .await
        .unwrap()
}

async fn open_chat(addr: SocketAddr) -> (OwnedReadHalf, OwnedWriteHalf) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();
    protocol::write_request(&mut writer, &Request::OpenChat, DEFAULT_TIMEOUT)
        .await
        .unwrap();
    let opened = protocol::read_response(&mut reader, DEFAULT_TIMEOUT)
        .await
        .unwrap();
    assert_eq!(opened, Response::ChatOpened);
    (reader, writer)
}

async fn send_chat(writer: &mut OwnedWriteHalf, message: &ChatMessage) {
    protocol::write_frame(writer, message, DEFAULT_TIMEOUT)
        .await
        .unwrap();
}

async fn next_frame(reader: &mut OwnedReadHalf) -> Result<ChatFrame, ProtocolError> {
    tokio::time::timeout(Duration::from_secs(5), protocol::read_frame(reader))
        .await
        .unwrap()
}

#[tokio::test]
async fn ping_and_hello() {
    let daemon = start().await;

    assert_eq!(call(daemon.addr, Request::Ping).await, Response::Pong);
    assert_eq!(
        call(
            daemon.addr,
            Request::Hello {
                version: "0.0.0".to_string()
            }
        )
        .await,
        Response::Hello {
            version: PROTOCOL_VERSION.to_string()
        }
    );
}

#[tokio::test]
async fn handshake_over_the_wire() {
    let daemon = start().await;

    let registered = call(
        daemon.addr,
        Request::Register {
            tenant_id: "t1".to_string(),
            agent_id: "a1".to_string(),
            model: "m1".to_string(),
        },
    )
    .await;
    let Response::Registered {
        session_id,
        token,
        expires_at_ms,
    } = registered
    else {
        panic!("expected Registered, got {registered:?}");
    };
    assert_eq!(expires_at_ms, FakeClock::START_EPOCH_MS + 300_000);

    let auth = call(
        daemon.addr,
        Request::Authenticate {
            token: token.to_string(),
        },
    )
    .await;
    assert_eq!(
        auth,
        Response::Authenticated {
            valid: true,
            tenant_id: "t1".to_string(),
            agent_id: "a1".to_string(),
        }
    );

    let info = call(
        daemon.addr,
        Request::SessionInfo {
            session_id: session_id.to_string(),
        },
    )
    .await;
    let Response::Session {
        session: Some(session),
    } = info
    else {
        panic!("expected live session, got {info:?}");
    };
    assert_eq!(session.model, "m1");

    daemon.clock.advance(Duration::from_secs(301));
    let auth = call(
        daemon.addr,
        Request::Authenticate {
            token: token.to_string(),
        },
    )
    .await;
    assert!(matches!(auth, Response::Authenticated { valid: false, .. }));
}

#[tokio::test]
async fn invalid_register_maps_to_invalid_argument() {
    let daemon = start().await;

    let response = call(
        daemon.addr,
        Request::Register {
            tenant_id: String::new(),
            agent_id: "a1".to_string(),
            model: String::new(),
        },
    )
    .await;

    assert_eq!(
        response,
        Response::error(ErrorCode::InvalidArgument, "tenant_id is required")
    );
}

#[tokio::test]
async fn single_chat_reply_and_backend_failure() {
    let daemon = start().await;
    daemon.inference.set_reply("hi", "hello");
    daemon.inference.set_failure("boom", "model crashed");

    let ok = call(
        daemon.addr,
        Request::SingleChat {
            session_id: "s1".to_string(),
            content: "hi".to_string(),
            model: String::new(),
        },
    )
    .await;
    assert_eq!(
        ok,
        Response::ChatReply {
            content: "hello".to_string(),
            timestamp_ms: FakeClock::START_EPOCH_MS,
        }
    );

    let failed = call(
        daemon.addr,
        Request::SingleChat {
            session_id: "s1".to_string(),
            content: "boom".to_string(),
            model: String::new(),
        },
    )
    .await;
    assert!(
        matches!(failed, Response::Error { code: ErrorCode::Internal, .. }),
        "got {failed:?}"
    );
}

#[tokio::test]
async fn status_reports_counts_and_backend() {
    let daemon = start().await;
    daemon.gateway.register("t1", "a1", "").unwrap();

    let status = call(daemon.addr, Request::Status).await;

    match status {
        Response::Status {
            sessions_active,
            tokens_active,
            streams_active,
            backend,
            ..
        } => {
            assert_eq!(sessions_active, 1);
            assert_eq!(tokens_active, 1);
            assert_eq!(streams_active, 0);
            assert_eq!(backend.url, "http://backend.test");
            assert!(backend.healthy);
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn shutdown_request_notifies_main_loop() {
    let daemon = start().await;
    let notified = daemon.shutdown.notified();

    let response = call(daemon.addr, Request::Shutdown).await;

    assert_eq!(response, Response::ShuttingDown);
    tokio::time::timeout(Duration::from_secs(1), notified)
        .await
        .unwrap();
}

#[tokio::test]
async fn chat_stream_end_to_end() {
    let daemon = start().await;
    daemon.inference.set_reply("hi", "hello");
    let (mut reader, mut writer) = open_chat(daemon.addr).await;

    let msg = ChatMessage::user(SessionId::new("s1"), "hi", daemon.clock.epoch_ms());
    send_chat(&mut writer, &msg).await;

    let ChatFrame::Message(reply) = next_frame(&mut reader).await.unwrap() else {
        panic!("expected a chat message");
    };
    assert_eq!(reply.kind, MessageKind::Assistant);
    assert_eq!(reply.content, "hello");
    assert_eq!(reply.reply_to, Some(msg.message_id.clone()));
    assert!(reply.timestamp_ms >= msg.timestamp_ms);
    assert_eq!(daemon.gateway.active_stream_count(), 1);

    // Half-close ends the stream; the daemon closes its side
    writer.shutdown().await.unwrap();
    let end = next_frame(&mut reader).await;
    assert!(matches!(end, Err(ProtocolError::ConnectionClosed)), "got {end:?}");
}

#[tokio::test]
async fn chat_stream_empty_content_keeps_stream_open() {
    let daemon = start().await;
    let (mut reader, mut writer) = open_chat(daemon.addr).await;

    send_chat(&mut writer, &ChatMessage::user(SessionId::new("s1"), "", 0)).await;
    let ChatFrame::Message(reply) = next_frame(&mut reader).await.unwrap() else {
        panic!("expected a chat message");
    };
    assert_eq!(reply.kind, MessageKind::System);
    assert_eq!(reply.content, "Error: message content cannot be empty");

    send_chat(&mut writer, &ChatMessage::user(SessionId::new("s1"), "hi", 0)).await;
    let ChatFrame::Message(reply) = next_frame(&mut reader).await.unwrap() else {
        panic!("expected a chat message");
    };
    assert_eq!(reply.content, "echo: hi");
}

#[tokio::test]
async fn chat_stream_without_session_gets_stream_error() {
    let daemon = start().await;
    let (mut reader, mut writer) = open_chat(daemon.addr).await;

    send_chat(&mut writer, &ChatMessage::user(SessionId::default(), "hi", 0)).await;

    let frame = next_frame(&mut reader).await.unwrap();
    assert_eq!(
        frame,
        ChatFrame::StreamError {
            code: ErrorCode::InvalidArgument,
            message: "session_id is required in first message".to_string(),
        }
    );
    assert!(matches!(
        next_frame(&mut reader).await,
        Err(ProtocolError::ConnectionClosed)
    ));
    assert!(daemon.inference.calls().is_empty());
}

#[tokio::test]
async fn chat_stream_admission_check_when_required() {
    let daemon = start_with(GatewayConfig {
        require_session: true,
        ..GatewayConfig::default()
    })
    .await;
    let (mut reader, mut writer) = open_chat(daemon.addr).await;

    send_chat(&mut writer, &ChatMessage::user(SessionId::new("nope"), "hi", 0)).await;

    let frame = next_frame(&mut reader).await.unwrap();
    assert!(
        matches!(
            frame,
            ChatFrame::StreamError {
                code: ErrorCode::InvalidArgument,
                ..
            }
        ),
        "got {frame:?}"
    );
}

#[tokio::test]
async fn idle_reaped_stream_is_closed_by_daemon() {
    let daemon = start().await;
    let (mut reader, mut writer) = open_chat(daemon.addr).await;
    send_chat(&mut writer, &ChatMessage::user(SessionId::new("s1"), "hi", 0)).await;
    next_frame(&mut reader).await.unwrap();

    daemon
        .clock
        .advance(daemon.gateway.config().stream_idle_timeout + Duration::from_secs(1));
    assert_eq!(daemon.gateway.sweep_idle_streams(), 1);

    let end = next_frame(&mut reader).await;
    assert!(matches!(end, Err(ProtocolError::ConnectionClosed)), "got {end:?}");
}

#[tokio::test]
async fn listener_stops_accepting_after_gateway_shutdown() {
    let daemon = start().await;
    assert_eq!(call(daemon.addr, Request::Ping).await, Response::Pong);

    daemon.gateway.shutdown();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let refused = async {
        let stream = TcpStream::connect(daemon.addr).await?;
        let (mut reader, mut writer) = stream.into_split();
        protocol::write_request(&mut writer, &Request::Ping, DEFAULT_TIMEOUT)
            .await
            .map_err(std::io::Error::other)?;
        protocol::read_response(&mut reader, Duration::from_millis(500))
            .await
            .map_err(std::io::Error::other)
    }
    .await;
    assert!(refused.is_err(), "got {refused:?}");
}
