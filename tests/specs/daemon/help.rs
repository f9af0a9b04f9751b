//! Daemon help output specs

use crate::prelude::*;

fn tollgated() -> assert_cmd::Command {
    assert_cmd::Command::new(tollgated_binary())
}

#[test]
fn tollgated_help_mentions_environment() {
    let assert = tollgated().arg("--help").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(stdout.contains("USAGE:"), "stdout: {stdout}");
    assert!(stdout.contains("TOLLGATE_LISTEN_ADDR"), "stdout: {stdout}");
    assert!(stdout.contains("TOLLGATE_BACKEND_URL"), "stdout: {stdout}");
}

#[test]
fn tollgated_version_flag() {
    let assert = tollgated().arg("--version").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    assert!(stdout.starts_with("tollgated 0.1"), "stdout: {stdout}");
}

#[test]
fn tollgated_rejects_unexpected_argument() {
    let assert = tollgated().arg("--bogus").assert().failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("unexpected argument '--bogus'"), "stderr: {stderr}");
}
