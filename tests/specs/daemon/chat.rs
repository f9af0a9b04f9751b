//! Chat specs
//!
//! Single-shot and streamed chat against a daemon whose backend is down.

use serial_test::serial;

use crate::prelude::*;

#[test]
#[serial]
fn single_chat_requires_content() {
    let daemon = Daemon::start();

    daemon
        .tollgate()
        .args(&["chat", "--session", "s1", ""])
        .fails()
        .stderr_has("content is required");
}

#[test]
#[serial]
fn single_chat_requires_session() {
    let daemon = Daemon::start();

    daemon
        .tollgate()
        .args(&["chat", "--session", "", "hello"])
        .fails()
        .stderr_has("session_id is required");
}

#[test]
#[serial]
fn single_chat_surfaces_backend_failure() {
    let daemon = Daemon::start();

    daemon
        .tollgate()
        .args(&["chat", "--session", "s1", "hello"])
        .fails()
        .stderr_has("failed to generate response");
}

#[test]
#[serial]
fn stream_reports_backend_failure_per_message() {
    let daemon = Daemon::start();

    daemon
        .tollgate()
        .args(&["stream", "--session", "s1"])
        .stdin("hello\n\nworld\n")
        .passes()
        .stdout_has("[system] Error generating response:")
        .stdout_lacks("[assistant]");
}

#[test]
#[serial]
fn stream_json_replies_are_correlated() {
    let daemon = Daemon::start();

    let out = daemon
        .tollgate()
        .args(&["-o", "json", "stream", "--session", "s1"])
        .stdin("one\ntwo\n")
        .passes();

    let replies: Vec<serde_json::Value> = out
        .stdout()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(replies.len(), 2);
    for reply in &replies {
        assert_eq!(reply["session_id"], "s1");
        assert_eq!(reply["kind"], "System");
        assert!(reply["reply_to"].is_string(), "reply: {reply}");
    }
    assert_ne!(replies[0]["reply_to"], replies[1]["reply_to"]);
}

#[test]
#[serial]
fn stream_with_unknown_session_is_rejected_when_required() {
    let daemon = Daemon::start_with(&[("TOLLGATE_REQUIRE_SESSION", "1")]);

    daemon
        .tollgate()
        .args(&["stream", "--session", "nope"])
        .stdin("hello\n")
        .fails()
        .stderr_has("stream closed by daemon (invalid argument)");
}

#[test]
#[serial]
fn stream_with_registered_session_is_admitted_when_required() {
    let daemon = Daemon::start_with(&[("TOLLGATE_REQUIRE_SESSION", "1")]);
    let registration = daemon
        .tollgate()
        .args(&["-o", "json", "register", "--tenant", "t1", "--agent", "a1"])
        .passes()
        .json();
    let session_id = registration["session_id"].as_str().unwrap();

    daemon
        .tollgate()
        .args(&["stream", "--session", session_id])
        .stdin("hello\n")
        .passes()
        .stdout_has("[system] Error generating response:");
}
