//! Error type shared by every split operation.
//!
//! All failures surface synchronously as a [`SplitError`]; nothing is retried
//! internally. Files completed before the failure stay on disk.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = SplitError> = std::result::Result<T, E>;

/// Everything that can go wrong while splitting a CSV file.
#[derive(Debug, Error)]
pub enum SplitError {
    /// The input path does not exist.
    #[error("input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// The input yielded no record at all, not even a header.
    #[error("CSV file is empty: {}", path.display())]
    EmptyInput { path: PathBuf },

    /// A policy limit was zero or negative.
    #[error("{name} must be greater than 0 (got {value})")]
    InvalidPolicy { name: &'static str, value: i64 },

    /// The configured delimiter or quote cannot be used.
    #[error("invalid CSV dialect: {reason}")]
    InvalidDialect { reason: String },

    /// Splitting into a fixed number of files needs at least one data row.
    #[error("CSV file has no data rows: {}", path.display())]
    NoDataRows { path: PathBuf },

    /// Creating, writing, flushing or closing an output file failed.
    #[error("write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading or decoding the input failed mid-scan.
    #[error("read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A record could not be serialized.
    #[error("encode CSV record")]
    Encode {
        #[source]
        source: csv::Error,
    },

    #[error("invalid glob pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("no files found matching pattern: {pattern}")]
    NoMatches { pattern: String },

    /// The options file could not be read.
    #[error("read options file {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The options file is not valid JSON for [`SplitOptions`](crate::SplitOptions).
    #[error("parse options file {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SplitError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// `true` for errors raised before any output file is touched.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InputNotFound { .. }
                | Self::EmptyInput { .. }
                | Self::InvalidPolicy { .. }
                | Self::InvalidDialect { .. }
                | Self::NoDataRows { .. }
        )
    }
}
