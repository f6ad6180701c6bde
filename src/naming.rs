//! Output file naming and output directory provisioning.
//!
//! The engine never picks names itself: for each file it opens it asks an
//! [`OutputNamer`] for the path of index `n` (1-based). [`FileNameTemplate`] is
//! the default namer; closures `Fn(usize) -> PathBuf` work too.
//!
//! ```
//! use datashear::FileNameTemplate;
//! use std::path::Path;
//!
//! let names = FileNameTemplate::for_input(Path::new("in/orders.csv"), "out")
//!     .with_prefix("2024");
//! assert_eq!(names.file_name(3), "2024_orders_part_3.csv");
//! ```

use crate::error::{Result, SplitError};
use crate::io::compression::strip_codec_extension;
use std::fs;
use std::path::{Path, PathBuf};

/// Segment separator in generated file names.
pub const SEPARATOR: &str = "_";

/// Suffix used when none is configured.
pub const DEFAULT_SUFFIX: &str = "part";

/// Supplies the path for each output file.
pub trait OutputNamer {
    /// Path of output file number `index` (starting at 1).
    fn path_for(&self, index: usize) -> PathBuf;
}

impl<F> OutputNamer for F
where
    F: Fn(usize) -> PathBuf,
{
    fn path_for(&self, index: usize) -> PathBuf {
        self(index)
    }
}

/// `[prefix_]base[_suffix]_index.ext` inside a fixed directory.
///
/// Empty prefix or suffix segments are left out. `base` defaults to the input
/// file stem and `ext` to the input extension, after stripping any compression
/// extension (`orders.csv.gz` names outputs `orders_part_1.csv`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameTemplate {
    dir: PathBuf,
    prefix: String,
    base: String,
    suffix: String,
    extension: String,
}

impl FileNameTemplate {
    pub fn for_input(input: &Path, dir: impl Into<PathBuf>) -> Self {
        let logical = strip_codec_extension(input);
        let base = logical
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = logical
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        Self {
            dir: dir.into(),
            prefix: String::new(),
            base,
            suffix: DEFAULT_SUFFIX.to_string(),
            extension,
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Replace the input-derived base name. An empty string keeps the default.
    #[must_use]
    pub fn with_base_name(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        if !base.is_empty() {
            self.base = base;
        }
        self
    }

    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name (no directory) for output `index`.
    #[must_use]
    pub fn file_name(&self, index: usize) -> String {
        let index = index.to_string();
        let parts: Vec<&str> = [
            self.prefix.as_str(),
            self.base.as_str(),
            self.suffix.as_str(),
            index.as_str(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
        format!("{}{}", parts.join(SEPARATOR), self.extension)
    }
}

impl OutputNamer for FileNameTemplate {
    fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(self.file_name(index))
    }
}

/// Create `dir` and any missing parents. Existing directories are left alone.
///
/// # Errors
/// [`SplitError::Write`] if the directory cannot be created.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|e| SplitError::write(dir, e))
}
