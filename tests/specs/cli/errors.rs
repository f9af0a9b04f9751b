//! CLI error specs
//!
//! Verify behavior when the daemon is not reachable.

use crate::prelude::*;

#[test]
fn status_reports_not_running_and_exits_zero() {
    let addr = free_addr();
    cli()
        .env("TOLLGATE_ADDR", addr.clone())
        .args(&["status"])
        .passes()
        .stdout_eq(&format!("tollgated not running at {addr}\n"));
}

#[test]
fn status_json_reports_not_running() {
    let out = cli()
        .env("TOLLGATE_ADDR", free_addr())
        .args(&["-o", "json", "status"])
        .passes();
    assert_eq!(out.json()["status"], "not_running");
}

#[test]
fn ping_fails_when_daemon_not_running() {
    cli()
        .env("TOLLGATE_ADDR", free_addr())
        .args(&["ping"])
        .fails()
        .stderr_has("Daemon not running");
}

#[test]
fn unknown_subcommand_fails() {
    cli().args(&["frobnicate"]).fails().stderr_has("frobnicate");
}
