//! Sample datasets and temporary input files.

use anyhow::{Context, Result};
use csv::{Terminator, WriterBuilder};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Header of the [`people_rows`] dataset.
#[must_use]
pub fn people_header() -> Vec<String> {
    ["ID", "Name", "Age", "City"].map(String::from).to_vec()
}

/// `n` rows of `ID,Name,Age,City`, numbered from 1.
///
/// ```
/// use datashear::testing::people_rows;
///
/// let rows = people_rows(3);
/// assert_eq!(rows[0], ["1", "Person_1", "21", "City_1"]);
/// ```
#[must_use]
pub fn people_rows(n: usize) -> Vec<Vec<String>> {
    (1..=n)
        .map(|i| {
            vec![
                i.to_string(),
                format!("Person_{i}"),
                (20 + i % 50).to_string(),
                format!("City_{}", i % 5),
            ]
        })
        .collect()
}

/// Rows whose fields exercise quoting: embedded delimiters, quotes, line
/// breaks and multibyte text.
#[must_use]
pub fn awkward_rows() -> Vec<Vec<String>> {
    [
        ["1", "plain", "text"],
        ["2", "has,comma", "x"],
        ["3", "say \"hi\"", "y"],
        ["4", "line\nbreak", "z"],
        ["5", "crlf\r\ninside", ""],
        ["6", "日本語", "naïve café"],
        ["7", "", ""],
    ]
    .into_iter()
    .map(|r| r.map(String::from).to_vec())
    .collect()
}

/// Write `header` followed by `rows` to `path` as `\n`-terminated CSV.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_csv<H, S>(path: &Path, header: &[H], rows: &[Vec<S>]) -> Result<()>
where
    H: AsRef<str>,
    S: AsRef<str>,
{
    let mut w = WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    w.write_record(header.iter().map(AsRef::<str>::as_ref))?;
    for row in rows {
        w.write_record(row.iter().map(AsRef::<str>::as_ref))?;
    }
    w.flush().with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

/// A temporary directory for split inputs and outputs, removed on drop.
pub struct CsvWorkspace {
    dir: TempDir,
}

impl CsvWorkspace {
    /// # Errors
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir().context("create temp dir")?,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a CSV file named `name` inside the workspace and return its path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write_csv<H, S>(&self, name: &str, header: &[H], rows: &[Vec<S>]) -> Result<PathBuf>
    where
        H: AsRef<str>,
        S: AsRef<str>,
    {
        let path = self.dir.path().join(name);
        write_csv(&path, header, rows)?;
        Ok(path)
    }

    /// Write raw bytes to `name` inside the workspace and return its path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write_raw(&self, name: &str, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    /// Names of the files in the workspace root, sorted.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be listed.
    pub fn file_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(self.dir.path())? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}
