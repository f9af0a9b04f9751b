// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tollgate register`, `tollgate auth`, `tollgate session`

use std::io::Write;

use anyhow::Result;
use clap::Args;
use tollgate_core::{format_expires_in, Session};

use crate::client::{AuthResult, DaemonClient, Registration};
use crate::output::{now_ms, print_json, OutputFormat};

#[derive(Args)]
pub struct RegisterArgs {
    /// Tenant the session belongs to
    #[arg(long)]
    pub tenant: String,
    /// Agent acting within the tenant
    #[arg(long)]
    pub agent: String,
    /// Model to bind (daemon default when omitted)
    #[arg(long, default_value = "")]
    pub model: String,
}

#[derive(Args)]
pub struct AuthArgs {
    /// Bearer token from `tollgate register`
    pub token: String,
}

#[derive(Args)]
pub struct SessionArgs {
    /// Session ID from `tollgate register`
    pub session_id: String,
}

pub async fn register(args: RegisterArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let registration = client
        .register(&args.tenant, &args.agent, &args.model)
        .await?;
    match format {
        OutputFormat::Text => format_registration(&mut std::io::stdout(), &registration, now_ms()),
        OutputFormat::Json => print_json(&registration)?,
    }
    Ok(())
}

pub async fn auth(args: AuthArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let result = client.authenticate(&args.token).await?;
    match format {
        OutputFormat::Text => format_auth(&mut std::io::stdout(), &result),
        OutputFormat::Json => print_json(&result)?,
    }
    if !result.valid {
        anyhow::bail!("token is invalid or expired");
    }
    Ok(())
}

pub async fn session(args: SessionArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let session = client.session_info(&args.session_id).await?;
    match format {
        OutputFormat::Text => match &session {
            Some(session) => format_session(&mut std::io::stdout(), session, now_ms()),
            None => anyhow::bail!("Session {} not found", args.session_id),
        },
        OutputFormat::Json => print_json(&session)?,
    }
    Ok(())
}

fn format_registration(w: &mut impl Write, registration: &Registration, now_ms: u64) {
    let _ = writeln!(w, "session: {}", registration.session_id);
    let _ = writeln!(w, "token:   {}", registration.token);
    let _ = writeln!(
        w,
        "expires: {}",
        format_expires_in(registration.expires_at_ms, now_ms)
    );
}

fn format_auth(w: &mut impl Write, result: &AuthResult) {
    if result.valid {
        let _ = writeln!(w, "valid: tenant {} agent {}", result.tenant_id, result.agent_id);
    } else {
        let _ = writeln!(w, "invalid");
    }
}

fn format_session(w: &mut impl Write, session: &Session, now_ms: u64) {
    let _ = writeln!(w, "session: {}", session.session_id);
    let _ = writeln!(w, "tenant:  {}", session.tenant_id);
    let _ = writeln!(w, "agent:   {}", session.agent_id);
    let _ = writeln!(w, "model:   {}", session.model);
    let _ = writeln!(
        w,
        "expires: {}",
        format_expires_in(session.expires_at_ms, now_ms)
    );
}

#[cfg(test)]
#[path = "handshake_tests.rs"]
mod tests;
