//! Handshake specs
//!
//! Register, authenticate, and look up sessions through the CLI.

use serial_test::serial;

use crate::prelude::*;

fn register(daemon: &Daemon, tenant: &str, agent: &str) -> serde_json::Value {
    daemon
        .tollgate()
        .args(&["-o", "json", "register", "--tenant", tenant, "--agent", agent])
        .passes()
        .json()
}

#[test]
#[serial]
fn register_then_authenticate() {
    let daemon = Daemon::start();

    let registration = register(&daemon, "t1", "a1");
    let token = registration["token"].as_str().unwrap().to_string();
    let session_id = registration["session_id"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 32);
    assert_eq!(session_id.len(), 32);
    assert_ne!(token, session_id);

    daemon
        .tollgate()
        .args(&["auth", &token])
        .passes()
        .stdout_eq("valid: tenant t1 agent a1\n");
}

#[test]
#[serial]
fn register_text_output_lists_credentials() {
    let daemon = Daemon::start();

    daemon
        .tollgate()
        .args(&["register", "--tenant", "t1", "--agent", "a1"])
        .passes()
        .stdout_has("session: ")
        .stdout_has("token:   ")
        .stdout_has("expires: ");
}

#[test]
#[serial]
fn register_without_tenant_is_rejected() {
    let daemon = Daemon::start();

    daemon
        .tollgate()
        .args(&["register", "--tenant", "", "--agent", "a1"])
        .fails()
        .stderr_has("tenant_id is required");
}

#[test]
#[serial]
fn unknown_token_is_invalid() {
    let daemon = Daemon::start();

    daemon
        .tollgate()
        .args(&["auth", "not-a-token"])
        .fails()
        .stdout_eq("invalid\n")
        .stderr_has("token is invalid or expired");
}

#[test]
#[serial]
fn session_lookup_shows_default_model() {
    let daemon = Daemon::start();
    let registration = register(&daemon, "t1", "a1");
    let session_id = registration["session_id"].as_str().unwrap();

    daemon
        .tollgate()
        .args(&["session", session_id])
        .passes()
        .stdout_has("tenant:  t1")
        .stdout_has("model:   gemma3:4b");
}

#[test]
#[serial]
fn tokens_expire_after_session_ttl() {
    let daemon = Daemon::start_with(&[("TOLLGATE_SESSION_TTL_MS", "200")]);
    let registration = register(&daemon, "t1", "a1");
    let token = registration["token"].as_str().unwrap().to_string();

    std::thread::sleep(std::time::Duration::from_millis(300));

    daemon.tollgate().args(&["auth", &token]).fails();
    daemon
        .tollgate()
        .args(&["-o", "json", "session", registration["session_id"].as_str().unwrap()])
        .passes()
        .stdout_eq("null\n");
}
