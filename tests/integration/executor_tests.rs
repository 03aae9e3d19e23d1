//! Integration tests for the process executor.
//!
//! These spawn real child processes (`sh`, `sleep`), so they are gated to
//! Unix hosts.

#![cfg(unix)]

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use gemini_bridge::tool::executor::{execute, probe_tool, run_spawned, Outcome, SpawnSpec};

fn spec(program: &str, args: &[&str]) -> SpawnSpec {
    SpawnSpec {
        program: program.to_owned(),
        args: args.iter().map(|&a| a.to_owned()).collect(),
        cwd: std::env::temp_dir(),
        timeout: Duration::from_secs(30),
        max_output_bytes: 1024 * 1024,
        env_overlay: BTreeMap::new(),
    }
}

#[tokio::test]
async fn zero_exit_yields_trimmed_stdout() {
    let outcome = run_spawned(&spec("/bin/sh", &["-c", "echo '  hello  '"])).await;

    match outcome {
        Outcome::Success { output } => assert_eq!(output, "hello"),
        Outcome::Failure { error } => panic!("expected success, got failure: {error}"),
    }
}

#[tokio::test]
async fn stderr_is_appended_as_annotated_suffix() {
    let outcome = run_spawned(&spec("/bin/sh", &["-c", "echo out; echo diag >&2"])).await;

    match outcome {
        Outcome::Success { output } => assert_eq!(output, "out\n[stderr]: diag"),
        Outcome::Failure { error } => panic!("expected success, got failure: {error}"),
    }
}

#[tokio::test]
async fn nonzero_exit_reports_code_and_stderr() {
    let outcome = run_spawned(&spec("/bin/sh", &["-c", "echo broken >&2; exit 3"])).await;

    match outcome {
        Outcome::Failure { error } => {
            assert!(
                error.contains("exited with code 3"),
                "error must carry the exit code: {error}"
            );
            assert!(error.contains("broken"), "error must carry stderr: {error}");
        }
        Outcome::Success { output } => panic!("expected failure, got success: {output}"),
    }
}

#[tokio::test]
async fn nonzero_exit_without_stderr_says_unknown_error() {
    let outcome = run_spawned(&spec("/bin/sh", &["-c", "exit 1"])).await;

    match outcome {
        Outcome::Failure { error } => {
            assert!(error.contains("unknown error"), "got: {error}");
        }
        Outcome::Success { output } => panic!("expected failure, got success: {output}"),
    }
}

#[tokio::test]
async fn timeout_kills_the_child_within_the_bound() {
    let mut slow = spec("sleep", &["5"]);
    slow.timeout = Duration::from_secs(1);

    let started = Instant::now();
    let outcome = run_spawned(&slow).await;
    let elapsed = started.elapsed();

    match outcome {
        Outcome::Failure { error } => assert!(
            error.contains("timed out after 1 seconds"),
            "error must state the timeout: {error}"
        ),
        Outcome::Success { output } => panic!("expected timeout, got success: {output}"),
    }
    assert!(
        elapsed < Duration::from_secs(3),
        "resolution must arrive near the 1s bound, took {elapsed:?}"
    );
}

#[tokio::test]
async fn output_cap_terminates_an_unbounded_producer() {
    // 10 KB of stdout against a 1 KB cap.
    let mut capped = spec("/bin/sh", &["-c", "head -c 10240 /dev/zero"]);
    capped.max_output_bytes = 1024;

    let outcome = run_spawned(&capped).await;

    match outcome {
        Outcome::Failure { error } => assert!(
            error.contains("exceeded maximum size of 1KB"),
            "error must state the cap: {error}"
        ),
        Outcome::Success { output } => panic!("expected cap breach, got success: {output}"),
    }
}

#[tokio::test]
async fn spawn_failure_is_reported_without_probe() {
    let outcome = run_spawned(&spec("/nonexistent/no-such-binary", &[])).await;

    match outcome {
        Outcome::Failure { error } => assert!(
            error.contains("failed to start"),
            "error must state the spawn failure: {error}"
        ),
        Outcome::Success { output } => panic!("expected failure, got success: {output}"),
    }
}

#[tokio::test]
async fn execute_reports_missing_tool_before_spawning() {
    let outcome = execute(&spec("/nonexistent/no-such-binary", &[])).await;

    match outcome {
        Outcome::Failure { error } => assert!(
            error.contains("tool not found at '/nonexistent/no-such-binary'"),
            "error must name the missing tool: {error}"
        ),
        Outcome::Success { output } => panic!("expected failure, got success: {output}"),
    }
}

#[tokio::test]
async fn probe_requires_a_clean_version_exit() {
    // `true` ignores `--version` and exits zero; `false` exits nonzero.
    assert!(probe_tool("/bin/true").await);
    assert!(!probe_tool("/bin/false").await);
    assert!(!probe_tool("/nonexistent/no-such-binary").await);
}

#[tokio::test]
async fn env_overlay_reaches_the_child() {
    let mut with_env = spec("/bin/sh", &["-c", "printf '%s' \"$GEMINI_API_KEY\""]);
    with_env
        .env_overlay
        .insert("GEMINI_API_KEY".to_owned(), "sk-overlay".to_owned());

    let outcome = run_spawned(&with_env).await;

    match outcome {
        Outcome::Success { output } => assert_eq!(output, "sk-overlay"),
        Outcome::Failure { error } => panic!("expected success, got failure: {error}"),
    }
}

#[tokio::test]
async fn stdin_is_closed_so_readers_see_eof() {
    // `cat` with no input exits immediately when stdin is closed.
    let outcome = run_spawned(&spec("/bin/sh", &["-c", "cat; echo done"])).await;

    match outcome {
        Outcome::Success { output } => assert_eq!(output, "done"),
        Outcome::Failure { error } => panic!("expected success, got failure: {error}"),
    }
}
