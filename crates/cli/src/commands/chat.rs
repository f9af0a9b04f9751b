// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tollgate chat` - one-shot generation

use anyhow::Result;
use clap::Args;

use crate::client::DaemonClient;
use crate::output::{print_json, OutputFormat};

#[derive(Args)]
pub struct ChatArgs {
    /// Session ID to tag the request with
    #[arg(long)]
    pub session: String,
    /// Model override (daemon default when omitted)
    #[arg(long, default_value = "")]
    pub model: String,
    /// Prompt text
    pub content: String,
}

pub async fn handle(args: ChatArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let reply = client
        .single_chat(&args.session, &args.content, &args.model)
        .await?;
    match format {
        OutputFormat::Text => println!("{}", reply.content),
        OutputFormat::Json => print_json(&reply)?,
    }
    Ok(())
}
