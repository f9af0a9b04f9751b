// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tollgate - client for the Tollgate session & streaming gateway

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod env;
mod output;

use output::OutputFormat;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{chat, daemon, handshake, stream};

use crate::client::DaemonClient;

#[derive(Parser)]
#[command(
    name = "tollgate",
    version,
    about = "Tollgate - session & streaming gateway client"
)]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a tenant/agent pair and receive a session and token
    Register(handshake::RegisterArgs),
    /// Check whether a token is still valid
    Auth(handshake::AuthArgs),
    /// Show a live session
    Session(handshake::SessionArgs),
    /// One-shot generation
    Chat(chat::ChatArgs),
    /// Duplex chat: one message per stdin line, replies on stdout
    Stream(stream::StreamArgs),
    /// Show daemon status
    Status,
    /// Check that the daemon is reachable
    Ping,
    /// Ask the daemon to shut down
    Shutdown,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(1);
    }
}

/// Format an anyhow error, deduplicating the chain.
///
/// If the top-level Display already contains the source error text, we skip
/// the "Caused by" chain. Otherwise we render the full chain so context
/// isn't lost.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            // No subcommand provided: print help and exit 0
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            return Ok(());
        }
    };

    let client = DaemonClient::from_env();

    match command {
        Commands::Register(args) => handshake::register(args, &client, format).await?,
        Commands::Auth(args) => handshake::auth(args, &client, format).await?,
        Commands::Session(args) => handshake::session(args, &client, format).await?,
        Commands::Chat(args) => chat::handle(args, &client, format).await?,
        Commands::Stream(args) => stream::handle(args, &client, format).await?,
        Commands::Status => daemon::status(&client, format).await?,
        Commands::Ping => daemon::ping(&client, format).await?,
        Commands::Shutdown => daemon::shutdown(&client).await?,
    }

    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
