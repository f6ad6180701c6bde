//! Row-boundary policies.
//!
//! A [`SplitPolicy`] answers two questions for the engine:
//!
//! - before writing a row: must the current file be closed first? (byte budget)
//! - after writing a row: is the current file now full? (row count)
//!
//! Limits are validated on construction, so a `SplitPolicy` value is always
//! usable. Constructors take `i64` so that callers passing user input get a
//! typed [`SplitError::InvalidPolicy`] for zero and negative values.

use crate::error::{Result, SplitError};
use serde::Serialize;
use std::fmt;
use std::num::NonZeroU64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "policy", content = "limit", rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Close each file once it holds `limit` data rows.
    ByRowCount(NonZeroU64),
    /// Keep each file's encoded size (header included, when present) at or
    /// under `limit` bytes.
    ///
    /// A file always accepts its first data row, even when that row, or the
    /// header plus that row, is larger than `limit`. Oversize rows therefore
    /// land alone in their own file instead of being rejected.
    ByByteSize(NonZeroU64),
}

/// Running totals for the file currently open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileProgress {
    /// Data rows written, header excluded.
    pub rows: u64,
    /// Bytes written, header included.
    pub bytes: u64,
}

impl SplitPolicy {
    /// # Errors
    /// [`SplitError::InvalidPolicy`] if `rows_per_file <= 0`.
    pub fn by_row_count(rows_per_file: i64) -> Result<Self> {
        positive("rows per file", rows_per_file).map(Self::ByRowCount)
    }

    /// # Errors
    /// [`SplitError::InvalidPolicy`] if `bytes_per_file <= 0`.
    pub fn by_byte_size(bytes_per_file: i64) -> Result<Self> {
        positive("size per file", bytes_per_file).map(Self::ByByteSize)
    }

    #[must_use]
    pub fn limit(&self) -> u64 {
        match self {
            Self::ByRowCount(n) | Self::ByByteSize(n) => n.get(),
        }
    }

    /// Whether the open file must be closed before a row of `row_bytes` is written.
    #[must_use]
    pub fn rolls_before(&self, current: FileProgress, row_bytes: u64) -> bool {
        match self {
            Self::ByRowCount(_) => false,
            Self::ByByteSize(limit) => {
                current.rows > 0 && current.bytes.saturating_add(row_bytes) > limit.get()
            }
        }
    }

    /// Whether the open file is complete after the last write.
    #[must_use]
    pub fn closes_after(&self, current: FileProgress) -> bool {
        match self {
            Self::ByRowCount(limit) => current.rows >= limit.get(),
            Self::ByByteSize(_) => false,
        }
    }

    /// A row that exceeds the budget on its own, regardless of the file it lands in.
    #[must_use]
    pub fn is_oversize_row(&self, row_bytes: u64) -> bool {
        matches!(self, Self::ByByteSize(limit) if row_bytes > limit.get())
    }
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByRowCount(n) => write!(f, "{n} rows per file"),
            Self::ByByteSize(n) => write!(f, "{n} bytes per file"),
        }
    }
}

fn positive(name: &'static str, value: i64) -> Result<NonZeroU64> {
    u64::try_from(value)
        .ok()
        .and_then(NonZeroU64::new)
        .ok_or(SplitError::InvalidPolicy { name, value })
}
