// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Tollgate session & streaming gateway engine

mod config;
mod credentials;
mod dispatch;
mod error;
mod gateway;
mod reaper;
mod streams;

#[cfg(test)]
mod test_helpers;

pub use config::{GatewayConfig, DEFAULT_MODEL};
pub use credentials::{AuthOutcome, CredentialRegistry, Registration, SweepStats};
pub use dispatch::{ReplySink, StreamEnd, StreamSummary, BUSY_REPLY, EMPTY_CONTENT_REPLY};
pub use error::GatewayError;
pub use gateway::{ChatReply, Gateway, GatewayCounts};
pub use reaper::Reaper;
pub use streams::{StreamConversation, StreamId, StreamRegistry};
