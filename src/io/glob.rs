//! Input pattern expansion for splitting several files in one invocation.
//!
//! ```no_run
//! use datashear::io::glob::expand_inputs;
//!
//! // every monthly export, in sorted order
//! let inputs = expand_inputs("exports/2024-*/orders.csv")?;
//! # Ok::<(), datashear::SplitError>(())
//! ```

use crate::error::{Result, SplitError};
use glob::glob;
use std::path::{Path, PathBuf};

/// Whether `s` contains glob metacharacters.
#[must_use]
pub fn is_pattern(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// Expand a glob pattern into the sorted list of matching regular files.
///
/// A string without metacharacters is returned as-is, so the caller's usual
/// missing-input check still reports [`SplitError::InputNotFound`].
///
/// # Errors
/// - [`SplitError::InvalidPattern`] if the pattern cannot be parsed or a match
///   cannot be read
/// - [`SplitError::NoMatches`] if nothing matches
pub fn expand_inputs(pattern: &str) -> Result<Vec<PathBuf>> {
    if !is_pattern(pattern) {
        return Ok(vec![Path::new(pattern).to_path_buf()]);
    }

    let paths = glob(pattern).map_err(|e| SplitError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let mut result = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| SplitError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        if path.is_file() {
            result.push(path);
        }
    }

    if result.is_empty() {
        return Err(SplitError::NoMatches {
            pattern: pattern.to_string(),
        });
    }
    result.sort();
    Ok(result)
}
