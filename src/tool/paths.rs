//! Resolution and validation of caller-supplied paths.
//!
//! Each input path is checked for existence and kind (file or directory)
//! before any process is spawned, and is produced in two index-aligned
//! forms: absolute, and relative to the working directory the tool runs in.

use std::path::{Path, PathBuf};

use crate::{AppError, Result};

/// Validated forms of the caller's input paths.
///
/// `absolute` and `relative` are index-aligned and equal in length to the
/// input list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Absolute form of each input path.
    pub absolute: Vec<PathBuf>,
    /// Form of each input path relative to the working directory; used for
    /// the path references embedded in the tool prompt.
    pub relative: Vec<PathBuf>,
}

/// Resolve and validate a list of caller-supplied path strings against `cwd`.
///
/// # Errors
///
/// Returns `AppError::Path` naming the offending input when a path does not
/// exist or is neither a file nor a directory.
pub async fn resolve_paths(paths: &[String], cwd: &Path) -> Result<ResolvedPaths> {
    let mut resolved = ResolvedPaths {
        absolute: Vec::with_capacity(paths.len()),
        relative: Vec::with_capacity(paths.len()),
    };

    for input in paths {
        let path = Path::new(input);
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        };

        let metadata = tokio::fs::metadata(&absolute)
            .await
            .map_err(|err| AppError::Path(format!("invalid path '{input}': {err}")))?;
        if !metadata.is_file() && !metadata.is_dir() {
            return Err(AppError::Path(format!(
                "invalid path '{input}': neither file nor directory"
            )));
        }

        // The tool runs from cwd, so relative inputs pass through unchanged;
        // absolute inputs under cwd are rebased onto it.
        let relative = if path.is_absolute() {
            absolute
                .strip_prefix(cwd)
                .map_or_else(|_| absolute.clone(), Path::to_path_buf)
        } else {
            path.to_path_buf()
        };

        resolved.absolute.push(absolute);
        resolved.relative.push(relative);
    }

    Ok(resolved)
}
