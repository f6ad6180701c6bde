//! High-level entry points.
//!
//! [`Splitter`] ties an input path, an output directory and a
//! [`FileNameTemplate`] to a [`SplitEngine`]. The free functions
//! [`split_by_row_count`] and [`split_by_byte_size`] cover the common case of
//! writing parts next to the input.
//!
//! ```no_run
//! use datashear::{MemoryReporter, Splitter};
//!
//! # fn main() -> datashear::Result<()> {
//! let parts = Splitter::new("exports/orders.csv", "exports/parts")?
//!     .with_prefix("2024")
//!     .with_observer(MemoryReporter::new())
//!     .by_size(50 * 1024 * 1024, true)?;
//! for p in &parts {
//!     println!("{}", p.display());
//! }
//! # Ok(())
//! # }
//! ```

use crate::engine::{SplitEngine, SplitSummary, count_data_rows};
use crate::error::{Result, SplitError};
use crate::io::csv::RecordStream;
use crate::naming::{FileNameTemplate, ensure_output_dir};
use crate::observer::SplitObserver;
use crate::options::SplitOptions;
use crate::policy::SplitPolicy;
use std::path::{Path, PathBuf};
use tracing::info;

/// Splits one input file into a directory of parts.
pub struct Splitter {
    input: PathBuf,
    names: FileNameTemplate,
    options: SplitOptions,
    observers: Vec<Box<dyn SplitObserver>>,
}

impl Splitter {
    /// Prepare to split `input` into `output_dir`, creating the directory if needed.
    ///
    /// # Errors
    /// - [`SplitError::InputNotFound`] if `input` does not exist
    /// - [`SplitError::Write`] if `output_dir` cannot be created
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Result<Self> {
        let input = input.into();
        if !input.exists() {
            return Err(SplitError::InputNotFound { path: input });
        }
        let output_dir = output_dir.into();
        ensure_output_dir(&output_dir)?;
        Ok(Self {
            names: FileNameTemplate::for_input(&input, output_dir),
            input,
            options: SplitOptions::default(),
            observers: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.names = self.names.with_prefix(prefix);
        self
    }

    #[must_use]
    pub fn with_base_name(mut self, base: impl Into<String>) -> Self {
        self.names = self.names.with_base_name(base);
        self
    }

    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.names = self.names.with_suffix(suffix);
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: SplitOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl SplitObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    #[must_use]
    pub fn input(&self) -> &Path {
        &self.input
    }

    #[must_use]
    pub fn names(&self) -> &FileNameTemplate {
        &self.names
    }

    /// Split into files of at most `rows_per_file` data rows each.
    ///
    /// # Errors
    /// See [`Splitter::run`]; also [`SplitError::InvalidPolicy`] for `rows_per_file <= 0`.
    pub fn by_rows(self, rows_per_file: i64, repeat_header: bool) -> Result<Vec<PathBuf>> {
        let policy = SplitPolicy::by_row_count(rows_per_file)?;
        Ok(self.run_with(policy, repeat_header)?.into_paths())
    }

    /// Split into files of at most `bytes_per_file` encoded bytes each.
    ///
    /// # Errors
    /// See [`Splitter::run`]; also [`SplitError::InvalidPolicy`] for `bytes_per_file <= 0`.
    pub fn by_size(self, bytes_per_file: i64, repeat_header: bool) -> Result<Vec<PathBuf>> {
        let policy = SplitPolicy::by_byte_size(bytes_per_file)?;
        Ok(self.run_with(policy, repeat_header)?.into_paths())
    }

    /// Split into `files` parts of (nearly) equal row counts.
    ///
    /// The data rows are counted first with a scan that keeps nothing; the split
    /// itself is then a regular row-count split with `ceil(rows / files)` rows
    /// per file. Fewer than `files` parts are produced when there are fewer rows
    /// than files.
    ///
    /// # Errors
    /// - [`SplitError::InvalidPolicy`] for `files <= 0`
    /// - [`SplitError::NoDataRows`] if the input has a header but no rows
    /// - anything [`Splitter::run`] returns
    pub fn by_file_count(self, files: i64, repeat_header: bool) -> Result<Vec<PathBuf>> {
        if files <= 0 {
            return Err(SplitError::InvalidPolicy {
                name: "number of files",
                value: files,
            });
        }
        let rows = count_data_rows(&self.input, &self.options)?;
        if rows == 0 {
            return Err(SplitError::NoDataRows { path: self.input });
        }
        let per_file = rows.div_ceil(files.unsigned_abs());
        info!(rows, files, per_file, "sizing parts by file count");
        let policy = SplitPolicy::by_row_count(i64::try_from(per_file).unwrap_or(i64::MAX))?;
        Ok(self.run_with(policy, repeat_header)?.into_paths())
    }

    /// Run a split with `policy`, repeating headers as configured in the options.
    ///
    /// # Errors
    /// - [`SplitError::EmptyInput`] if the input has no header
    /// - [`SplitError::Read`] / [`SplitError::Write`] on I/O failure
    /// - [`SplitError::InvalidDialect`] if the options' dialect is unusable
    pub fn run(self, policy: SplitPolicy) -> Result<SplitSummary> {
        let repeat_header = self.options.repeat_header;
        self.run_with(policy, repeat_header)
    }

    fn run_with(self, policy: SplitPolicy, repeat_header: bool) -> Result<SplitSummary> {
        let Self {
            input,
            names,
            options,
            observers,
        } = self;
        let mut stream = RecordStream::open(&input, &options.dialect)?;
        let mut engine = SplitEngine::new(options)?;
        for observer in observers {
            engine.add_observer(observer);
        }
        engine.split(&mut stream, policy, repeat_header, &names)
    }
}

fn sibling_dir(input: &Path) -> PathBuf {
    input
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

/// Split `input` into files of `rows_per_file` data rows, written next to it.
///
/// # Errors
/// - [`SplitError::InputNotFound`] if `input` does not exist
/// - [`SplitError::InvalidPolicy`] for `rows_per_file <= 0`
/// - [`SplitError::EmptyInput`] for an input with no header
/// - [`SplitError::Read`] / [`SplitError::Write`] on I/O failure
pub fn split_by_row_count(
    input: impl AsRef<Path>,
    rows_per_file: i64,
    repeat_header: bool,
) -> Result<Vec<PathBuf>> {
    let input = input.as_ref();
    let policy = SplitPolicy::by_row_count(rows_per_file)?;
    Splitter::new(input, sibling_dir(input))?
        .run_with(policy, repeat_header)
        .map(SplitSummary::into_paths)
}

/// Split `input` into files of at most `bytes_per_file` bytes, written next to it.
///
/// # Errors
/// Same as [`split_by_row_count`], with [`SplitError::InvalidPolicy`] for
/// `bytes_per_file <= 0`.
pub fn split_by_byte_size(
    input: impl AsRef<Path>,
    bytes_per_file: i64,
    repeat_header: bool,
) -> Result<Vec<PathBuf>> {
    let input = input.as_ref();
    let policy = SplitPolicy::by_byte_size(bytes_per_file)?;
    Splitter::new(input, sibling_dir(input))?
        .run_with(policy, repeat_header)
        .map(SplitSummary::into_paths)
}
