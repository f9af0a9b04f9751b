// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tollgate stream` - duplex chat over stdin/stdout.
//!
//! Each non-empty stdin line becomes one user message. Replies are printed
//! as they arrive, which may not be send order. At end of input the stream
//! stays open until every message has been answered (or the chat timeout
//! passes), then half-closes.

use std::collections::HashSet;

use anyhow::Result;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tollgate_core::{ChatMessage, MessageId, SessionId};
use tollgate_daemon::ChatFrame;

use crate::client::{ChatReceiver, ClientError, DaemonClient};
use crate::env::timeout_chat;
use crate::output::{now_ms, OutputFormat};

#[derive(Args)]
pub struct StreamArgs {
    /// Session ID every message is tagged with
    #[arg(long)]
    pub session: String,
}

/// Message ids still waiting for a reply
#[derive(Debug, Default)]
struct PendingReplies {
    ids: HashSet<MessageId>,
}

impl PendingReplies {
    fn sent(&mut self, message: &ChatMessage) {
        self.ids.insert(message.message_id.clone());
    }

    /// Returns true if `reply` answered a pending message
    fn answered(&mut self, reply: &ChatMessage) -> bool {
        match &reply.reply_to {
            Some(id) => self.ids.remove(id),
            None => false,
        }
    }

    fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

pub async fn handle(args: StreamArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    if args.session.is_empty() {
        anyhow::bail!("--session must not be empty");
    }
    let session_id = SessionId::new(args.session);
    let (receiver, mut sender) = client.open_chat().await?;

    // Frame reads are not cancel safe, so they run on their own task
    let (frames_tx, mut frames) = mpsc::unbounded_channel();
    let reader_task = tokio::spawn(read_frames(receiver, frames_tx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = PendingReplies::default();
    let mut drain_deadline: Option<tokio::time::Instant> = None;

    loop {
        if drain_deadline.is_some() && pending.is_empty() {
            break;
        }
        tokio::select! {
            line = lines.next_line(), if drain_deadline.is_none() => match line? {
                Some(line) => {
                    let content = line.trim();
                    if content.is_empty() {
                        continue;
                    }
                    let message = ChatMessage::user(session_id.clone(), content, now_ms());
                    pending.sent(&message);
                    sender.send(&message).await?;
                }
                None => {
                    drain_deadline = Some(tokio::time::Instant::now() + timeout_chat());
                }
            },
            frame = frames.recv() => match frame {
                Some(Ok(ChatFrame::Message(reply))) => {
                    pending.answered(&reply);
                    print_reply(&reply, format)?;
                }
                Some(Ok(ChatFrame::StreamError { code, message })) => {
                    anyhow::bail!("stream closed by daemon ({code}): {message}");
                }
                Some(Err(e)) => return Err(e.into()),
                None => anyhow::bail!("daemon closed the stream"),
            },
            _ = sleep_until(drain_deadline), if drain_deadline.is_some() => {
                eprintln!("warn: {} message(s) still unanswered, closing stream", pending.len());
                break;
            }
        }
    }

    sender.finish().await?;

    // Anything the daemon flushes before closing its side
    while let Some(frame) = frames.recv().await {
        if let ChatFrame::Message(reply) = frame? {
            print_reply(&reply, format)?;
        }
    }
    let _ = reader_task.await;
    Ok(())
}

/// Forward frames until the daemon closes the stream or a read fails
async fn read_frames(
    mut receiver: ChatReceiver,
    frames: mpsc::UnboundedSender<Result<ChatFrame, ClientError>>,
) {
    loop {
        let frame = match receiver.next().await {
            Ok(Some(frame)) => Ok(frame),
            Ok(None) => break,
            Err(e) => Err(e),
        };
        let failed = frame.is_err();
        if frames.send(frame).is_err() || failed {
            break;
        }
    }
}

async fn sleep_until(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn print_reply(reply: &ChatMessage, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", format_reply(reply)),
        OutputFormat::Json => println!("{}", serde_json::to_string(reply)?),
    }
    Ok(())
}

fn format_reply(reply: &ChatMessage) -> String {
    format!("[{}] {}", reply.kind, reply.content)
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
