// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod chat;
pub mod daemon;
pub mod handshake;
pub mod stream;
