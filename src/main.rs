#![forbid(unsafe_code)]

//! `gemini-bridge` server binary.
//!
//! Bootstraps configuration from the environment, then either serves the
//! JSON-RPC loop on stdin/stdout (default) or executes a one-shot prompt.

use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use gemini_bridge::config::ConfigStore;
use gemini_bridge::rpc::envelope::{Request, RequestId, PROTOCOL_VERSION};
use gemini_bridge::rpc::router::Router;
use gemini_bridge::{transport, AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "gemini-bridge", about = "JSON-RPC bridge for the Gemini CLI", version, long_about = None)]
struct Cli {
    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Start the JSON-RPC server on stdin/stdout (default).
    Serve,
    /// Execute a single prompt and exit.
    Run {
        /// Prompt to execute.
        #[arg(long, short = 'p')]
        prompt: String,

        /// Paths to include (files or directories).
        #[arg(long, num_args = 1..)]
        paths: Vec<String>,

        /// Directory to analyze.
        #[arg(long)]
        dir: Option<String>,

        /// Analyze the directory recursively.
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        recursive: bool,

        /// Timeout in seconds.
        #[arg(long)]
        timeout: Option<u64>,

        /// Maximum output size in KB.
        #[arg(long)]
        max_output_kb: Option<u64>,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let config = Arc::new(ConfigStore::from_env());
    let router = Router::new(config)?;

    match args.command {
        None | Some(Cmd::Serve) => serve(&router).await,
        Some(Cmd::Run {
            prompt,
            paths,
            dir,
            recursive,
            timeout,
            max_output_kb,
        }) => {
            let params = one_shot_params(prompt, paths, dir, recursive, timeout, max_output_kb);
            run_one_shot(&router, params).await;
            Ok(())
        }
    }
}

async fn serve(router: &Router) -> Result<()> {
    info!("gemini-bridge server bootstrap");

    let ct = CancellationToken::new();
    let signal_ct = ct.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown signal received");
        signal_ct.cancel();
    });

    transport::serve_stdio(router, ct).await?;
    info!("gemini-bridge shut down");
    Ok(())
}

/// Select the method and params for a one-shot invocation: explicit paths
/// win over a directory, which wins over a bare prompt.
fn one_shot_params(
    prompt: String,
    paths: Vec<String>,
    dir: Option<String>,
    recursive: bool,
    timeout: Option<u64>,
    max_output_kb: Option<u64>,
) -> (&'static str, Value) {
    let options = json!({ "timeout": timeout, "maxOutputKB": max_output_kb });

    if !paths.is_empty() {
        (
            "analyzeFiles",
            json!({ "paths": paths, "prompt": prompt, "options": options }),
        )
    } else if let Some(dir) = dir {
        (
            "analyzeDir",
            json!({ "dir": dir, "prompt": prompt, "recursive": recursive, "options": options }),
        )
    } else {
        ("rawPrompt", json!({ "prompt": prompt, "options": options }))
    }
}

/// Dispatch a one-shot request and print its outcome, exiting nonzero on
/// any protocol error or operation failure.
async fn run_one_shot(router: &Router, (method, params): (&'static str, Value)) {
    let request = Request {
        version: PROTOCOL_VERSION.to_owned(),
        id: RequestId::Number(1),
        method: method.to_owned(),
        params: Some(params),
    };

    let response = router.dispatch(request).await;

    if let Some(error) = response.error {
        eprintln!("Error: {}", error.message);
        std::process::exit(1);
    }

    let result = response.result.unwrap_or(Value::Null);
    if result.get("ok").and_then(Value::as_bool) == Some(true) {
        let output = result.get("output").and_then(Value::as_str).unwrap_or("");
        println!("{output}");
    } else {
        let error = result
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr; stdout is reserved for protocol responses.
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
