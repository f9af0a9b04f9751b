// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tollgate-core: Shared types for the Tollgate session & streaming gateway

pub mod clock;
pub mod id;
pub mod message;
pub mod session;
pub mod time_fmt;

pub use clock::{Clock, FakeClock, SystemClock};
pub use id::{random_hex, MessageId, ShortId, MESSAGE_ID_BYTES, SESSION_ID_BYTES};
pub use message::{ChatMessage, MessageKind};
pub use session::{AccessToken, Credential, Session, SessionId};
pub use time_fmt::{format_elapsed, format_expires_in};
