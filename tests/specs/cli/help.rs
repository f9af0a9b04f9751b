//! CLI help output specs
//!
//! Verify help text displays for all commands.

use crate::prelude::*;

#[test]
fn tollgate_no_args_shows_usage_and_exits_zero() {
    cli().passes().stdout_has("Usage:");
}

#[test]
fn tollgate_help_lists_commands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("register")
        .stdout_has("auth")
        .stdout_has("session")
        .stdout_has("chat")
        .stdout_has("stream")
        .stdout_has("status");
}

#[test]
fn tollgate_register_help_shows_flags() {
    cli()
        .args(&["register", "--help"])
        .passes()
        .stdout_has("--tenant")
        .stdout_has("--agent")
        .stdout_has("--model");
}

#[test]
fn tollgate_version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1");
}
