//! Per-method parameter structs.
//!
//! Every field is optional at the serde layer; presence and content are
//! checked by the dispatcher so a missing field produces an operation
//! failure naming that field, not a deserialization error.

use serde::Deserialize;
use serde_json::Value;

/// Per-invocation overrides shared by all tool-running methods.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolOptions {
    /// Wall-clock timeout override in seconds.
    pub timeout: Option<u64>,
    /// Stdout cap override in KB.
    #[serde(rename = "maxOutputKB")]
    pub max_output_kb: Option<u64>,
    /// Extra flags appended to the argument vector, before the configured
    /// default flags.
    #[serde(rename = "additionalFlags")]
    pub additional_flags: Option<Vec<String>>,
}

/// Parameters for `analyzeFiles`.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeFilesParams {
    /// File paths to analyze.
    pub paths: Option<Vec<String>>,
    /// Question or instruction for the analysis.
    pub prompt: Option<String>,
    /// Invocation overrides.
    pub options: Option<ToolOptions>,
}

/// Parameters for `analyzeDir`.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeDirParams {
    /// Directory to analyze.
    pub dir: Option<String>,
    /// Question or instruction for the analysis.
    pub prompt: Option<String>,
    /// Whether to include the directory recursively; defaults to true.
    pub recursive: Option<bool>,
    /// Invocation overrides.
    pub options: Option<ToolOptions>,
}

/// Parameters for `verifyFeature`.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyFeatureParams {
    /// Question about the feature to verify.
    #[serde(rename = "featureQuestion")]
    pub feature_question: Option<String>,
    /// Optional specific paths to check; the working directory is analyzed
    /// recursively when absent.
    pub paths: Option<Vec<String>>,
    /// Invocation overrides.
    pub options: Option<ToolOptions>,
}

/// Parameters for `rawPrompt`.
#[derive(Debug, Default, Deserialize)]
pub struct RawPromptParams {
    /// Prompt to execute without any path context.
    pub prompt: Option<String>,
    /// Invocation overrides.
    pub options: Option<ToolOptions>,
}

/// Parameters for `config.get`.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigGetParams {
    /// Configuration key to read.
    pub key: Option<String>,
}

/// Parameters for `config.set`.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigSetParams {
    /// Configuration key to write.
    pub key: Option<String>,
    /// New value; shape is validated per key by the store.
    pub value: Option<Value>,
}
