//! Forward-only CSV record input.
//!
//! [`RecordStream`] wraps a `csv::Reader` over a (possibly decompressed) byte
//! stream. It hands out one record at a time into a caller-owned
//! `StringRecord`, so a full scan holds a single row in memory.
//!
//! # Design notes
//! - Headers are not special to the reader (`has_headers(false)`); the engine
//!   asks for the header explicitly with [`RecordStream::read_header`].
//! - Rows may have differing field counts (`flexible(true)`); fields are opaque.
//! - Blank lines are skipped by the underlying reader. A leading UTF-8 BOM is
//!   dropped from the header.

use crate::error::{Result, SplitError};
use crate::io::compression::auto_detect_reader;
use crate::options::Dialect;
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

const BOM: char = '\u{feff}';

/// Outcome of reading the first record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderRead {
    /// The stream ended before any record.
    Exhausted,
    /// The header record. Zero or more data rows may follow.
    Present(StringRecord),
}

/// A forward-only stream of CSV records.
pub struct RecordStream {
    reader: csv::Reader<Box<dyn Read>>,
    source: PathBuf,
    records_read: u64,
}

impl RecordStream {
    /// Open `path` for streaming, decompressing it if needed.
    ///
    /// # Errors
    /// - [`SplitError::InputNotFound`] if `path` does not exist
    /// - [`SplitError::InvalidDialect`] if the dialect is unusable
    /// - [`SplitError::Read`] if the file cannot be opened or decoded
    pub fn open(path: impl AsRef<Path>, dialect: &Dialect) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SplitError::InputNotFound {
                path: path.to_path_buf(),
            },
            _ => SplitError::read(path, e.into()),
        })?;
        let rdr = auto_detect_reader(f, path).map_err(|e| SplitError::read(path, e.into()))?;
        Self::build(rdr, path.to_path_buf(), dialect)
    }

    /// Stream records from an arbitrary reader. `label` names the source in
    /// errors and logs.
    ///
    /// # Errors
    /// [`SplitError::InvalidDialect`] if the dialect is unusable.
    pub fn from_reader(
        reader: impl Read + 'static,
        label: impl Into<PathBuf>,
        dialect: &Dialect,
    ) -> Result<Self> {
        Self::build(Box::new(reader), label.into(), dialect)
    }

    fn build(reader: Box<dyn Read>, source: PathBuf, dialect: &Dialect) -> Result<Self> {
        let (delimiter, quote) = dialect.as_bytes()?;
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .quote(quote)
            .from_reader(reader);
        Ok(Self {
            reader,
            source,
            records_read: 0,
        })
    }

    /// The path or label this stream reads from.
    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Records consumed so far, header included.
    #[must_use]
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Read the first record.
    ///
    /// # Errors
    /// [`SplitError::Read`] on I/O or decoding failure.
    pub fn read_header(&mut self) -> Result<HeaderRead> {
        let mut header = StringRecord::new();
        if !self.next_into(&mut header)? {
            return Ok(HeaderRead::Exhausted);
        }
        if header.get(0).is_some_and(|f| f.starts_with(BOM)) {
            header = header
                .iter()
                .enumerate()
                .map(|(i, f)| if i == 0 { f.trim_start_matches(BOM) } else { f })
                .collect();
        }
        Ok(HeaderRead::Present(header))
    }

    /// Overwrite `record` with the next record. Returns `false` at end of input.
    ///
    /// # Errors
    /// [`SplitError::Read`] on I/O failure, invalid UTF-8 or malformed quoting.
    pub fn next_into(&mut self, record: &mut StringRecord) -> Result<bool> {
        let more = self
            .reader
            .read_record(record)
            .map_err(|e| SplitError::read(&self.source, e))?;
        if more {
            self.records_read += 1;
        }
        Ok(more)
    }

    /// Consume the rest of the stream and return how many records it held.
    ///
    /// # Errors
    /// [`SplitError::Read`] on I/O or decoding failure.
    pub fn count_remaining(&mut self) -> Result<u64> {
        let mut scratch = StringRecord::new();
        let mut total = 0u64;
        while self.next_into(&mut scratch)? {
            total += 1;
        }
        Ok(total)
    }
}
