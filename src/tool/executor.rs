//! External tool process execution.
//!
//! Runs one tool invocation to completion or to a bounded failure: an
//! availability probe, a spawn with stdin closed, a wall-clock timeout, an
//! incremental stdout cap, and exit-status classification. The competing
//! completion sources (timeout, cap breach, natural exit) resolve through a
//! single select loop, so exactly one outcome is produced per invocation and
//! the losing sources are inert. Children carry `kill_on_drop(true)` and are
//! killed explicitly on timeout and cap breach, so no process outlives its
//! invocation.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, warn};

/// Fixed bound for the availability probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Read chunk size for draining child streams.
const READ_CHUNK: usize = 8 * 1024;

/// One tool invocation, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnSpec {
    /// Executable path or name.
    pub program: String,
    /// Argument vector, passed to the process directly without a shell.
    pub args: Vec<String>,
    /// Working directory the child starts in.
    pub cwd: PathBuf,
    /// Wall-clock timeout for the whole invocation.
    pub timeout: Duration,
    /// Maximum accumulated stdout size in bytes.
    pub max_output_bytes: usize,
    /// Environment entries overriding the ambient process environment.
    pub env_overlay: BTreeMap<String, String>,
}

/// Two-variant result of one tool invocation, distinct from the protocol
/// envelope that eventually carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The tool exited zero; `output` is its aggregated text.
    Success {
        /// Trimmed stdout, with stderr appended as an annotated suffix
        /// when non-empty.
        output: String,
    },
    /// The invocation failed; `error` describes the specific cause.
    Failure {
        /// Human-readable failure message.
        error: String,
    },
}

impl Outcome {
    /// Shorthand failure constructor.
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    /// Whether this outcome is a success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Check that the tool binary can be launched at all.
///
/// Spawns `<tool> --version` with all streams closed and waits up to
/// [`PROBE_TIMEOUT`] for it to finish. Availability requires a zero exit:
/// a binary that rejects `--version` is treated as not being the tool.
pub async fn probe_tool(tool_path: &str) -> bool {
    let mut cmd = Command::new(tool_path);
    cmd.arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            debug!(tool_path, %err, "availability probe spawn failed");
            return false;
        }
    };

    match tokio::time::timeout(PROBE_TIMEOUT, child.wait()).await {
        Ok(Ok(status)) => status.success(),
        Ok(Err(err)) => {
            warn!(tool_path, %err, "availability probe wait failed");
            false
        }
        Err(_elapsed) => {
            child.kill().await.ok();
            false
        }
    }
}

/// Run one tool invocation to completion or to a bounded failure.
///
/// Probes availability first, then spawns and drives the child. All failure
/// paths return `Outcome::Failure`; this function never errors or panics
/// past its boundary.
pub async fn execute(spec: &SpawnSpec) -> Outcome {
    if !probe_tool(&spec.program).await {
        return Outcome::failure(format!(
            "tool not found at '{}': ensure it is installed and on PATH",
            spec.program
        ));
    }
    run_spawned(spec).await
}

/// Spawn the child described by `spec` and classify its completion.
///
/// Split out from [`execute`] so tests can drive arbitrary programs without
/// the `--version` probe in front.
pub async fn run_spawned(spec: &SpawnSpec) -> Outcome {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .current_dir(&spec.cwd)
        // The tool must never block waiting for interactive input.
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for (key, val) in &spec.env_overlay {
        if !val.is_empty() {
            cmd.env(key, val);
        }
    }

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => return Outcome::failure(format!("failed to start: {err}")),
    };

    let Some(stdout) = child.stdout.take() else {
        child.kill().await.ok();
        return Outcome::failure("failed to start: could not capture stdout");
    };
    let Some(stderr) = child.stderr.take() else {
        child.kill().await.ok();
        return Outcome::failure("failed to start: could not capture stderr");
    };

    drive(child, stdout, stderr, spec).await
}

/// Drive a spawned child to exactly one resolution.
///
/// The select loop races the deadline against incremental stream reads; the
/// exit status is awaited (under the same deadline) only once both streams
/// hit EOF, which cannot happen before the process is done writing. Stdout
/// is capped incrementally as data arrives; stderr is accumulated without an
/// independent cap (accepted asymmetry, bounded in practice by the tool's
/// own diagnostics volume).
async fn drive(
    mut child: Child,
    mut stdout: ChildStdout,
    mut stderr: ChildStderr,
    spec: &SpawnSpec,
) -> Outcome {
    let timeout_secs = spec.timeout.as_secs();
    let deadline = tokio::time::Instant::now() + spec.timeout;
    let sleep = tokio::time::sleep_until(deadline);
    tokio::pin!(sleep);

    let mut out_buf: Vec<u8> = Vec::new();
    let mut err_buf: Vec<u8> = Vec::new();
    let mut out_chunk = [0u8; READ_CHUNK];
    let mut err_chunk = [0u8; READ_CHUNK];
    let mut out_done = false;
    let mut err_done = false;

    while !(out_done && err_done) {
        tokio::select! {
            () = &mut sleep => {
                child.kill().await.ok();
                return Outcome::failure(format!("timed out after {timeout_secs} seconds"));
            }
            read = stdout.read(&mut out_chunk), if !out_done => {
                match read {
                    Ok(0) => out_done = true,
                    Ok(n) => {
                        out_buf.extend_from_slice(&out_chunk[..n]);
                        if out_buf.len() > spec.max_output_bytes {
                            child.kill().await.ok();
                            return Outcome::failure(format!(
                                "output exceeded maximum size of {}KB",
                                spec.max_output_bytes / 1024
                            ));
                        }
                    }
                    Err(err) => {
                        warn!(%err, "stdout read failed");
                        out_done = true;
                    }
                }
            }
            read = stderr.read(&mut err_chunk), if !err_done => {
                match read {
                    Ok(0) => err_done = true,
                    Ok(n) => err_buf.extend_from_slice(&err_chunk[..n]),
                    Err(err) => {
                        warn!(%err, "stderr read failed");
                        err_done = true;
                    }
                }
            }
        }
    }

    match tokio::time::timeout_at(deadline, child.wait()).await {
        Ok(status) => classify(status, &out_buf, &err_buf),
        Err(_elapsed) => {
            child.kill().await.ok();
            Outcome::failure(format!("timed out after {timeout_secs} seconds"))
        }
    }
}

/// Map a terminated child's status and streams onto an [`Outcome`].
fn classify(
    status: std::io::Result<std::process::ExitStatus>,
    out_buf: &[u8],
    err_buf: &[u8],
) -> Outcome {
    let stderr_text = String::from_utf8_lossy(err_buf);
    let stderr_trimmed = stderr_text.trim();

    match status {
        Ok(status) if status.success() => {
            let stdout_text = String::from_utf8_lossy(out_buf);
            let mut output = stdout_text.trim().to_owned();
            if !stderr_trimmed.is_empty() {
                output.push_str("\n[stderr]: ");
                output.push_str(stderr_trimmed);
            }
            Outcome::Success { output }
        }
        Ok(status) => {
            let detail = if stderr_trimmed.is_empty() {
                "unknown error"
            } else {
                stderr_trimmed
            };
            status.code().map_or_else(
                || Outcome::failure(format!("terminated by signal: {detail}")),
                |code| Outcome::failure(format!("exited with code {code}: {detail}")),
            )
        }
        Err(err) => Outcome::failure(format!("failed to wait for process: {err}")),
    }
}
