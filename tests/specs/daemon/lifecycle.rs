//! Daemon lifecycle specs
//!
//! Verify startup, status, and shutdown of a real daemon process.

use serial_test::serial;

use crate::prelude::*;

#[test]
#[serial]
fn daemon_writes_startup_marker_to_log() {
    let daemon = Daemon::start();

    let log = daemon.log();
    assert!(log.contains("--- tollgated: starting (pid: "), "log: {log}");
}

#[test]
#[serial]
fn daemon_starts_even_when_backend_is_down() {
    let daemon = Daemon::start();

    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || daemon.log().contains("inference backend")),
        "log: {}",
        daemon.log()
    );
    daemon.tollgate().args(&["ping"]).passes().stdout_has("pong from tollgated");
}

#[test]
#[serial]
fn status_shows_counts_and_unreachable_backend() {
    let daemon = Daemon::start();

    daemon
        .tollgate()
        .args(&["status"])
        .passes()
        .stdout_has("tollgated: running")
        .stdout_has("sessions: 0  tokens: 0  streams: 0")
        .stdout_has(&format!("backend: {UNREACHABLE_BACKEND} (unreachable)"));
}

#[test]
#[serial]
fn status_json_counts_registered_sessions() {
    let daemon = Daemon::start();
    daemon
        .tollgate()
        .args(&["register", "--tenant", "t1", "--agent", "a1"])
        .passes();

    let status = daemon.tollgate().args(&["-o", "json", "status"]).passes().json();

    assert_eq!(status["sessions_active"], 1);
    assert_eq!(status["tokens_active"], 1);
    assert_eq!(status["streams_active"], 0);
    assert_eq!(status["backend"]["healthy"], false);
}

#[test]
#[serial]
fn shutdown_command_stops_the_daemon() {
    let mut daemon = Daemon::start();

    daemon
        .tollgate()
        .args(&["shutdown"])
        .passes()
        .stdout_has("shutting down");

    assert!(wait_for(SPEC_WAIT_MAX_MS, || daemon.has_exited()));
    assert!(daemon.log().contains("Daemon stopped"), "log: {}", daemon.log());
}

#[test]
#[serial]
fn daemon_fails_when_address_is_taken() {
    let first = Daemon::start();

    let assert = assert_cmd::Command::new(tollgated_binary())
        .env("TOLLGATE_STATE_DIR", first.state_path())
        .env("TOLLGATE_LISTEN_ADDR", first.addr())
        .env("TOLLGATE_BACKEND_URL", UNREACHABLE_BACKEND)
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .failure();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(!stdout.contains("READY"), "stdout: {stdout}");
    assert!(
        first.log().contains("Failed to start daemon"),
        "log: {}",
        first.log()
    );
}
