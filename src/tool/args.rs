//! Argument vector construction for tool invocations.
//!
//! The tool takes its prompt via `-p <text>`; file and directory context is
//! embedded inside the prompt text itself using `@path` references, never as
//! separate argv tokens. Vectors are returned as discrete tokens so the
//! spawn layer can bypass the shell entirely.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Prompt flag expected as the first argv token.
pub const PROMPT_FLAG: &str = "-p";

/// Marker prefix for path references embedded in the prompt text.
pub const PATH_MARKER: char = '@';

/// Build argv for analyzing a set of files: `-p "@a @b <prompt>"` plus any
/// extra flags as separate tokens.
#[must_use]
pub fn file_args(paths: &[PathBuf], prompt: &str, extra_flags: &[String]) -> Vec<String> {
    let mut full_prompt = String::new();
    for path in paths {
        let _ = write!(full_prompt, "{PATH_MARKER}{} ", path.display());
    }
    full_prompt.push_str(prompt);

    let mut args = vec![PROMPT_FLAG.to_owned(), full_prompt];
    args.extend(extra_flags.iter().cloned());
    args
}

/// Build argv for analyzing a directory. A trailing `/` on the reference
/// selects recursive inclusion.
#[must_use]
pub fn dir_args(dir: &Path, prompt: &str, recursive: bool, extra_flags: &[String]) -> Vec<String> {
    let dir_ref = if recursive {
        format!("{PATH_MARKER}{}/", dir.display())
    } else {
        format!("{PATH_MARKER}{}", dir.display())
    };

    let mut args = vec![PROMPT_FLAG.to_owned(), format!("{dir_ref} {prompt}")];
    args.extend(extra_flags.iter().cloned());
    args
}

/// Build argv for a raw prompt with no path context.
#[must_use]
pub fn raw_args(prompt: &str, extra_flags: &[String]) -> Vec<String> {
    let mut args = vec![PROMPT_FLAG.to_owned(), prompt.to_owned()];
    args.extend(extra_flags.iter().cloned());
    args
}
