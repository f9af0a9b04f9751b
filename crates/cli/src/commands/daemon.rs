// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tollgate status`, `tollgate ping`, `tollgate shutdown`

use std::fmt::Write;

use anyhow::Result;
use tollgate_core::format_elapsed;

use crate::client::{ClientError, DaemonClient, StatusReport};
use crate::output::{print_json, OutputFormat};

pub async fn status(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let report = match client.status().await {
        Ok(report) => report,
        Err(ClientError::DaemonNotRunning(addr)) => {
            match format {
                OutputFormat::Text => println!("tollgated not running at {}", addr),
                OutputFormat::Json => println!(r#"{{ "status": "not_running" }}"#),
            }
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Text => print!("{}", format_text(client.addr(), &report)),
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(())
}

pub async fn ping(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    client.ping().await?;
    let version = client.hello().await?;
    match format {
        OutputFormat::Text => println!("pong from tollgated {}", version),
        OutputFormat::Json => print_json(&serde_json::json!({ "version": version }))?,
    }
    Ok(())
}

pub async fn shutdown(client: &DaemonClient) -> Result<()> {
    client.shutdown().await?;
    println!("tollgated shutting down");
    Ok(())
}

fn format_text(addr: &str, report: &StatusReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "tollgated: running {} at {}",
        format_elapsed(report.uptime_secs),
        addr
    );
    let _ = writeln!(
        out,
        "sessions: {}  tokens: {}  streams: {}",
        report.sessions_active, report.tokens_active, report.streams_active
    );
    let health = if report.backend.healthy {
        "healthy"
    } else {
        "unreachable"
    };
    let _ = writeln!(out, "backend: {} ({})", report.backend.url, health);
    out
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
