//! Test helpers for behavioral specifications.
//!
//! Provides a small DSL for driving the `tollgate` CLI against a real
//! `tollgated` process.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::Duration;

// Aggressive timeouts for fast tests.
const TOLLGATE_TIMEOUT_IPC_MS: &str = "2000";
const TOLLGATE_TIMEOUT_CHAT_MS: &str = "5000";

/// Nothing listens on the discard port, so backend calls fail fast
pub const UNREACHABLE_BACKEND: &str = "http://127.0.0.1:9";

// Polling timeouts
pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 5000;

/// Returns the path to a binary, checking llvm-cov target directory first.
/// Falls back to resolving relative to the test binary itself.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    // The test binary lives at target/debug/deps/specs-<hash>
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

pub fn tollgate_binary() -> PathBuf {
    binary_path("tollgate")
}

pub fn tollgated_binary() -> PathBuf {
    binary_path("tollgated")
}

/// Create a CLI builder for tollgate commands
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// High-level CLI builder for fluent test assertions
pub struct CliBuilder {
    args: Vec<String>,
    envs: Vec<(String, String)>,
    stdin: Option<String>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            envs: vec![
                (
                    "TOLLGATE_TIMEOUT_IPC_MS".into(),
                    TOLLGATE_TIMEOUT_IPC_MS.into(),
                ),
                (
                    "TOLLGATE_TIMEOUT_CHAT_MS".into(),
                    TOLLGATE_TIMEOUT_CHAT_MS.into(),
                ),
            ],
            stdin: None,
        }
    }

    /// Add CLI arguments
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Set environment variable
    pub fn env(mut self, key: &str, value: impl Into<String>) -> Self {
        self.envs.push((key.to_string(), value.into()));
        self
    }

    /// Feed stdin
    pub fn stdin(mut self, input: &str) -> Self {
        self.stdin = Some(input.to_string());
        self
    }

    fn command(self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::new(tollgate_binary());
        cmd.args(&self.args);
        cmd.env_remove("TOLLGATE_ADDR");
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        if let Some(input) = self.stdin {
            cmd.write_stdin(input);
        }
        cmd.timeout(Duration::from_secs(30));
        cmd
    }

    /// Run and expect success (exit code 0)
    pub fn passes(self) -> RunAssert {
        let output = self.command().assert().success().get_output().clone();
        RunAssert { output }
    }

    /// Run and expect failure (non-zero exit code)
    pub fn fails(self) -> RunAssert {
        let output = self.command().assert().failure().get_output().clone();
        RunAssert { output }
    }
}

/// Result of a CLI run for chaining assertions
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    /// Parse stdout as JSON (for `-o json` runs)
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.output.stdout).unwrap_or_else(|e| {
            panic!("stdout is not JSON ({e}): {}", self.stdout());
        })
    }

    /// Assert stdout equals expected exactly.
    pub fn stdout_eq(self, expected: &str) -> Self {
        assert_eq!(self.stdout(), expected);
        self
    }

    /// Assert stdout contains substring.
    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    /// Assert stdout does not contain substring.
    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout should not contain '{}'\nstdout: {}",
            unexpected,
            stdout
        );
        self
    }

    /// Assert stderr contains substring.
    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr: {}",
            expected,
            stderr
        );
        self
    }
}

// =============================================================================
// Polling
// =============================================================================

/// Poll a condition until it returns true or timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(timeout_ms);
    let poll_interval = Duration::from_millis(SPEC_POLL_INTERVAL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

/// A loopback port nobody is listening on (bound, then released)
pub fn free_addr() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().to_string()
}

// =============================================================================
// Daemon
// =============================================================================

/// A running `tollgated` with an isolated state directory.
pub struct Daemon {
    child: Child,
    addr: String,
    state_dir: tempfile::TempDir,
}

impl Daemon {
    /// Start a daemon whose backend is unreachable
    pub fn start() -> Self {
        Self::start_with(&[])
    }

    /// Start with extra `TOLLGATE_*` settings
    pub fn start_with(envs: &[(&str, &str)]) -> Self {
        let state_dir = tempfile::tempdir().unwrap();
        let addr = free_addr();

        let mut cmd = Command::new(tollgated_binary());
        cmd.env("TOLLGATE_STATE_DIR", state_dir.path())
            .env("TOLLGATE_LISTEN_ADDR", &addr)
            .env("TOLLGATE_BACKEND_URL", UNREACHABLE_BACKEND)
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        for (key, value) in envs {
            cmd.env(key, value);
        }
        let mut child = cmd.spawn().expect("tollgated should spawn");

        let stdout = child.stdout.take().expect("stdout is piped");
        let mut line = String::new();
        BufReader::new(stdout).read_line(&mut line).unwrap();
        assert_eq!(
            line.trim(),
            "READY",
            "daemon did not become ready\nlog: {}",
            std::fs::read_to_string(state_dir.path().join("tollgated.log")).unwrap_or_default()
        );

        Self {
            child,
            addr,
            state_dir,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    /// Run tollgate against this daemon
    pub fn tollgate(&self) -> CliBuilder {
        cli().env("TOLLGATE_ADDR", self.addr.clone())
    }

    /// Read the daemon log file contents
    pub fn log(&self) -> String {
        std::fs::read_to_string(self.state_path().join("tollgated.log"))
            .unwrap_or_else(|_| "(no daemon log)".to_string())
    }

    /// True once the process has exited
    pub fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        if self.has_exited() {
            return;
        }
        let _ = self
            .tollgate()
            .command()
            .arg("shutdown")
            .output();
        let child = &mut self.child;
        if !wait_for(SPEC_WAIT_MAX_MS, || matches!(child.try_wait(), Ok(Some(_)))) {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
