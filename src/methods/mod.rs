//! Method dispatch: one operation per protocol method.
//!
//! Each operation validates its parameters, resolves paths where the method
//! takes them, builds the tool argument vector, and delegates to the
//! process executor. Every failure past the params-shape boundary is an
//! operation-level [`Outcome::Failure`], never an error or panic.

pub mod params;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{ConfigStore, ToolDefaults};
use crate::tool::executor::{self, Outcome, SpawnSpec};
use crate::tool::{args, paths};
use crate::{AppError, Result};

use params::{
    AnalyzeDirParams, AnalyzeFilesParams, ConfigGetParams, ConfigSetParams, RawPromptParams,
    ToolOptions, VerifyFeatureParams,
};

/// The fixed method set, resolved from the wire name before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Analyze a list of files with a prompt.
    AnalyzeFiles,
    /// Analyze one directory with a prompt.
    AnalyzeDir,
    /// Check whether a feature is implemented in the codebase.
    VerifyFeature,
    /// Run a prompt with no path context.
    RawPrompt,
    /// Read one configuration value.
    ConfigGet,
    /// Write one configuration value.
    ConfigSet,
}

impl Method {
    /// All methods in advertisement order.
    pub const ALL: [Self; 6] = [
        Self::AnalyzeFiles,
        Self::AnalyzeDir,
        Self::VerifyFeature,
        Self::RawPrompt,
        Self::ConfigGet,
        Self::ConfigSet,
    ];

    /// Resolve a wire method name; unknown names are rejected explicitly.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "analyzeFiles" => Some(Self::AnalyzeFiles),
            "analyzeDir" => Some(Self::AnalyzeDir),
            "verifyFeature" => Some(Self::VerifyFeature),
            "rawPrompt" => Some(Self::RawPrompt),
            "config.get" => Some(Self::ConfigGet),
            "config.set" => Some(Self::ConfigSet),
            _ => None,
        }
    }

    /// Wire name of the method.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::AnalyzeFiles => "analyzeFiles",
            Self::AnalyzeDir => "analyzeDir",
            Self::VerifyFeature => "verifyFeature",
            Self::RawPrompt => "rawPrompt",
            Self::ConfigGet => "config.get",
            Self::ConfigSet => "config.set",
        }
    }
}

/// Dispatches validated requests to tool invocations and config operations.
#[derive(Debug)]
pub struct Dispatcher {
    config: Arc<ConfigStore>,
    cwd: PathBuf,
}

impl Dispatcher {
    /// Create a dispatcher rooted at the current working directory.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the working directory cannot be determined.
    pub fn new(config: Arc<ConfigStore>) -> Result<Self> {
        let cwd = std::env::current_dir().map_err(AppError::from)?;
        Ok(Self::with_cwd(config, cwd))
    }

    /// Create a dispatcher with an explicit working directory.
    #[must_use]
    pub fn with_cwd(config: Arc<ConfigStore>, cwd: PathBuf) -> Self {
        Self { config, cwd }
    }

    /// Run one operation. Infallible by contract: all failures surface as
    /// [`Outcome::Failure`].
    pub async fn run(&self, method: Method, params: Value) -> Outcome {
        debug!(method = method.name(), "dispatching operation");
        match method {
            Method::AnalyzeFiles => self.analyze_files(params).await,
            Method::AnalyzeDir => self.analyze_dir(params).await,
            Method::VerifyFeature => self.verify_feature(params).await,
            Method::RawPrompt => self.raw_prompt(params).await,
            Method::ConfigGet => self.config_get(params),
            Method::ConfigSet => self.config_set(params),
        }
    }

    async fn analyze_files(&self, params: Value) -> Outcome {
        let p: AnalyzeFilesParams = match decode(params) {
            Ok(p) => p,
            Err(failure) => return failure,
        };
        let Some(path_list) = p.paths.filter(|list| !list.is_empty()) else {
            return Outcome::failure("missing or empty paths array");
        };
        let Some(prompt) = p.prompt.filter(|s| !s.is_empty()) else {
            return Outcome::failure("missing or invalid prompt");
        };

        let resolved = match paths::resolve_paths(&path_list, &self.cwd).await {
            Ok(resolved) => resolved,
            Err(err) => return Outcome::failure(err.to_string()),
        };

        let defaults = self.config.snapshot();
        let flags = merge_flags(p.options.as_ref(), &defaults);
        let argv = args::file_args(&resolved.relative, &prompt, &flags);
        executor::execute(&self.spawn_spec(argv, p.options.as_ref(), &defaults)).await
    }

    async fn analyze_dir(&self, params: Value) -> Outcome {
        let p: AnalyzeDirParams = match decode(params) {
            Ok(p) => p,
            Err(failure) => return failure,
        };
        let Some(dir) = p.dir.filter(|s| !s.is_empty()) else {
            return Outcome::failure("missing or invalid directory path");
        };
        let Some(prompt) = p.prompt.filter(|s| !s.is_empty()) else {
            return Outcome::failure("missing or invalid prompt");
        };

        let resolved = match paths::resolve_paths(std::slice::from_ref(&dir), &self.cwd).await {
            Ok(resolved) => resolved,
            Err(err) => return Outcome::failure(err.to_string()),
        };
        let Some(dir_path) = resolved.relative.first() else {
            return Outcome::failure(format!("invalid path '{dir}'"));
        };

        let defaults = self.config.snapshot();
        let flags = merge_flags(p.options.as_ref(), &defaults);
        let argv = args::dir_args(dir_path, &prompt, p.recursive.unwrap_or(true), &flags);
        executor::execute(&self.spawn_spec(argv, p.options.as_ref(), &defaults)).await
    }

    async fn verify_feature(&self, params: Value) -> Outcome {
        let p: VerifyFeatureParams = match decode(params) {
            Ok(p) => p,
            Err(failure) => return failure,
        };
        let Some(question) = p.feature_question.filter(|s| !s.is_empty()) else {
            return Outcome::failure("missing or invalid feature question");
        };

        let prompt = verification_prompt(&question);
        let defaults = self.config.snapshot();
        let flags = merge_flags(p.options.as_ref(), &defaults);

        // With explicit paths, verify against those; otherwise sweep the
        // working directory recursively.
        let argv = match p.paths.filter(|list| !list.is_empty()) {
            Some(path_list) => {
                let resolved = match paths::resolve_paths(&path_list, &self.cwd).await {
                    Ok(resolved) => resolved,
                    Err(err) => return Outcome::failure(err.to_string()),
                };
                args::file_args(&resolved.relative, &prompt, &flags)
            }
            None => args::dir_args(std::path::Path::new("."), &prompt, true, &flags),
        };

        executor::execute(&self.spawn_spec(argv, p.options.as_ref(), &defaults)).await
    }

    async fn raw_prompt(&self, params: Value) -> Outcome {
        let p: RawPromptParams = match decode(params) {
            Ok(p) => p,
            Err(failure) => return failure,
        };
        let Some(prompt) = p.prompt.filter(|s| !s.is_empty()) else {
            return Outcome::failure("missing or invalid prompt");
        };

        let defaults = self.config.snapshot();
        let flags = merge_flags(p.options.as_ref(), &defaults);
        let argv = args::raw_args(&prompt, &flags);
        executor::execute(&self.spawn_spec(argv, p.options.as_ref(), &defaults)).await
    }

    fn config_get(&self, params: Value) -> Outcome {
        let p: ConfigGetParams = match decode(params) {
            Ok(p) => p,
            Err(failure) => return failure,
        };
        let Some(key) = p.key.filter(|s| !s.is_empty()) else {
            return Outcome::failure("missing or invalid configuration key");
        };

        match self.config.get(&key) {
            Ok(value) => {
                let payload = json!({ "key": key, "value": value });
                let output = serde_json::to_string_pretty(&payload)
                    .unwrap_or_else(|_| payload.to_string());
                Outcome::Success { output }
            }
            Err(err) => Outcome::failure(err.to_string()),
        }
    }

    fn config_set(&self, params: Value) -> Outcome {
        let p: ConfigSetParams = match decode(params) {
            Ok(p) => p,
            Err(failure) => return failure,
        };
        let Some(key) = p.key.filter(|s| !s.is_empty()) else {
            return Outcome::failure("missing or invalid configuration key");
        };
        let Some(value) = p.value else {
            return Outcome::failure("missing configuration value");
        };

        let rendered = value.to_string();
        match self.config.set(&key, value) {
            Ok(()) => Outcome::Success {
                output: format!("Configuration updated: {key} = {rendered}"),
            },
            Err(err) => Outcome::failure(err.to_string()),
        }
    }

    fn spawn_spec(
        &self,
        argv: Vec<String>,
        options: Option<&ToolOptions>,
        defaults: &ToolDefaults,
    ) -> SpawnSpec {
        let timeout_seconds = options
            .and_then(|opts| opts.timeout)
            .unwrap_or(defaults.timeout_seconds);
        let max_output_kb = options
            .and_then(|opts| opts.max_output_kb)
            .unwrap_or(defaults.max_output_kb);

        SpawnSpec {
            program: defaults.tool_path.clone(),
            args: argv,
            cwd: self.cwd.clone(),
            timeout: Duration::from_secs(timeout_seconds),
            max_output_bytes: usize::try_from(max_output_kb)
                .unwrap_or(usize::MAX)
                .saturating_mul(1024),
            env_overlay: defaults.env_overlay.clone(),
        }
    }
}

/// Decode a params object into a method's parameter struct; a shape
/// mismatch inside the object becomes an operation failure naming the
/// first failing field via serde's error text.
fn decode<T: DeserializeOwned>(params: Value) -> std::result::Result<T, Outcome> {
    serde_json::from_value(params)
        .map_err(|err| Outcome::failure(format!("invalid parameters: {err}")))
}

/// Caller-supplied flags first, configured default flags appended.
fn merge_flags(options: Option<&ToolOptions>, defaults: &ToolDefaults) -> Vec<String> {
    let mut flags = options
        .and_then(|opts| opts.additional_flags.clone())
        .unwrap_or_default();
    flags.extend(defaults.flags.iter().cloned());
    flags
}

/// Expand a feature question into the instructional verification prompt
/// sent to the tool.
fn verification_prompt(question: &str) -> String {
    format!(
        "{question}\n\n\
         Please analyze the codebase and provide a detailed answer including:\n\
         1. Whether the feature is implemented (Yes/No)\n\
         2. If implemented, show the relevant files and functions\n\
         3. If not implemented, explain what would be needed\n\
         4. Include code examples where applicable"
    )
}
