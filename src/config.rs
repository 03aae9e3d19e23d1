//! In-memory configuration store for the bridge.
//!
//! A flat map over a fixed key schema: tool path, default timeout, default
//! output cap, default extra flags, and the environment overlay passed to
//! spawned tool processes. Built once at startup from defaults plus
//! environment variables, mutated only through [`ConfigStore::set`], never
//! persisted.

use std::collections::BTreeMap;
use std::env;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::{AppError, Result};

/// Wire name of the tool path key.
pub const KEY_TOOL_PATH: &str = "geminiPath";
/// Wire name of the default timeout key (seconds).
pub const KEY_DEFAULT_TIMEOUT: &str = "defaultTimeout";
/// Wire name of the default output cap key (KB).
pub const KEY_DEFAULT_MAX_OUTPUT_KB: &str = "defaultMaxOutputKB";
/// Wire name of the default extra flags key.
pub const KEY_DEFAULT_FLAGS: &str = "defaultFlags";
/// Wire name of the child-process environment overlay key.
pub const KEY_ENV_OVERLAY: &str = "envOverlay";

/// Environment variable that overrides the tool path at startup.
pub const TOOL_PATH_ENV: &str = "GEMINI_CLI_PATH";

/// Environment variables copied into the child-process overlay at startup
/// when set and non-empty.
const OVERLAY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_GENAI_USE_VERTEXAI"];

/// Immutable snapshot of the configuration values one invocation needs.
///
/// Captured once at invocation start so a concurrent `config.set` cannot
/// change the parameters of a run already in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDefaults {
    /// Executable path or name of the external tool.
    pub tool_path: String,
    /// Default wall-clock timeout in seconds.
    pub timeout_seconds: u64,
    /// Default stdout cap in KB.
    pub max_output_kb: u64,
    /// Default extra flags appended after caller-supplied flags.
    pub flags: Vec<String>,
    /// Environment overlay applied to the child process.
    pub env_overlay: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
struct Values {
    tool_path: String,
    timeout_seconds: u64,
    max_output_kb: u64,
    flags: Vec<String>,
    env_overlay: BTreeMap<String, String>,
}

impl Default for Values {
    fn default() -> Self {
        Self {
            tool_path: "gemini".to_owned(),
            timeout_seconds: 300,
            max_output_kb: 1024,
            flags: Vec::new(),
            env_overlay: BTreeMap::new(),
        }
    }
}

/// Process-wide mutable configuration store.
///
/// Reads and writes are serialized by an internal lock; callers take a
/// [`ToolDefaults`] snapshot at invocation start rather than holding the
/// lock across a run.
#[derive(Debug, Default)]
pub struct ConfigStore {
    values: Mutex<Values>,
}

impl ConfigStore {
    /// Create a store holding only the built-in defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Create a store from built-in defaults overlaid by environment
    /// variables: [`TOOL_PATH_ENV`] replaces the tool path, and each
    /// non-empty variable in the overlay list is forwarded to spawned
    /// tool processes.
    #[must_use]
    pub fn from_env() -> Self {
        let mut values = Values::default();

        if let Ok(path) = env::var(TOOL_PATH_ENV) {
            if !path.is_empty() {
                values.tool_path = path;
            }
        }

        for &key in OVERLAY_ENV_VARS {
            if let Ok(val) = env::var(key) {
                if !val.is_empty() {
                    values.env_overlay.insert(key.to_owned(), val);
                }
            }
        }

        Self {
            values: Mutex::new(values),
        }
    }

    /// Capture the defaults one invocation runs with.
    #[must_use]
    pub fn snapshot(&self) -> ToolDefaults {
        let values = self.lock();
        ToolDefaults {
            tool_path: values.tool_path.clone(),
            timeout_seconds: values.timeout_seconds,
            max_output_kb: values.max_output_kb,
            flags: values.flags.clone(),
            env_overlay: values.env_overlay.clone(),
        }
    }

    /// Look up a configuration value by wire key.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for a key outside the fixed schema.
    pub fn get(&self, key: &str) -> Result<Value> {
        let values = self.lock();
        match key {
            KEY_TOOL_PATH => Ok(Value::String(values.tool_path.clone())),
            KEY_DEFAULT_TIMEOUT => Ok(Value::from(values.timeout_seconds)),
            KEY_DEFAULT_MAX_OUTPUT_KB => Ok(Value::from(values.max_output_kb)),
            KEY_DEFAULT_FLAGS => Ok(Value::from(values.flags.clone())),
            KEY_ENV_OVERLAY => serde_json::to_value(&values.env_overlay)
                .map_err(|err| AppError::Config(err.to_string())),
            other => Err(AppError::Config(format!(
                "unknown configuration key: {other}"
            ))),
        }
    }

    /// Update a configuration value by wire key.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for a key outside the fixed schema or a
    /// value of the wrong shape for that key.
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut values = self.lock();
        match key {
            KEY_TOOL_PATH => {
                values.tool_path = expect_string(key, value)?;
            }
            KEY_DEFAULT_TIMEOUT => {
                values.timeout_seconds = expect_positive(key, value)?;
            }
            KEY_DEFAULT_MAX_OUTPUT_KB => {
                values.max_output_kb = expect_positive(key, value)?;
            }
            KEY_DEFAULT_FLAGS => {
                values.flags = serde_json::from_value(value).map_err(|_| {
                    AppError::Config(format!("{key} must be an array of strings"))
                })?;
            }
            KEY_ENV_OVERLAY => {
                values.env_overlay = serde_json::from_value(value).map_err(|_| {
                    AppError::Config(format!("{key} must be an object of string values"))
                })?;
            }
            other => {
                return Err(AppError::Config(format!(
                    "unknown configuration key: {other}"
                )));
            }
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Values> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn expect_string(key: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) if !s.is_empty() => Ok(s),
        _ => Err(AppError::Config(format!(
            "{key} must be a non-empty string"
        ))),
    }
}

fn expect_positive(key: &str, value: Value) -> Result<u64> {
    match value.as_u64() {
        Some(n) if n > 0 => Ok(n),
        _ => Err(AppError::Config(format!(
            "{key} must be a positive integer"
        ))),
    }
}
