//! Split configuration: CSV dialect, header handling and empty-data behavior.
//!
//! [`SplitOptions`] is plain data. Build it in code with the `with_*` methods,
//! or load it from a JSON file with [`SplitOptions::from_json_file`]; missing
//! keys fall back to [`Default`].
//!
//! ```
//! use datashear::{Dialect, EmptyDataPolicy, LineTerminator, SplitOptions};
//!
//! let opts = SplitOptions::default()
//!     .with_dialect(Dialect::default().with_delimiter(';').with_terminator(LineTerminator::Lf))
//!     .with_repeat_header(false)
//!     .with_empty_data(EmptyDataPolicy::HeaderOnlyFile);
//! assert!(!opts.repeat_header);
//! ```

use crate::error::{Result, SplitError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Record terminator written after every output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTerminator {
    /// `\r\n`, the RFC 4180 terminator.
    #[default]
    Crlf,
    /// `\n`
    Lf,
}

impl From<LineTerminator> for csv::Terminator {
    fn from(t: LineTerminator) -> Self {
        match t {
            LineTerminator::Crlf => csv::Terminator::CRLF,
            LineTerminator::Lf => csv::Terminator::Any(b'\n'),
        }
    }
}

/// The CSV dialect used for both reading the input and encoding the outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dialect {
    pub delimiter: char,
    pub quote: char,
    pub terminator: LineTerminator,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            terminator: LineTerminator::Crlf,
        }
    }
}

impl Dialect {
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    #[must_use]
    pub fn with_terminator(mut self, terminator: LineTerminator) -> Self {
        self.terminator = terminator;
        self
    }

    /// Delimiter and quote as single bytes.
    ///
    /// # Errors
    /// Returns [`SplitError::InvalidDialect`] if either is not ASCII, is a
    /// line break, or if both are the same character.
    pub fn as_bytes(&self) -> Result<(u8, u8)> {
        let delimiter = ascii_byte("delimiter", self.delimiter)?;
        let quote = ascii_byte("quote", self.quote)?;
        if delimiter == quote {
            return Err(SplitError::InvalidDialect {
                reason: format!("delimiter and quote are both {:?}", self.delimiter),
            });
        }
        Ok((delimiter, quote))
    }
}

fn ascii_byte(what: &str, c: char) -> Result<u8> {
    if !c.is_ascii() || c == '\r' || c == '\n' {
        return Err(SplitError::InvalidDialect {
            reason: format!("{what} must be a single ASCII character other than a line break, got {c:?}"),
        });
    }
    Ok(c as u8)
}

/// What to produce when the input has a header but no data rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyDataPolicy {
    /// No output file at all.
    #[default]
    NoOutput,
    /// A single output file holding only the header.
    HeaderOnlyFile,
}

/// Options shared by every split run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    pub dialect: Dialect,
    /// Repeat the header at the top of every output file, not just the first.
    pub repeat_header: bool,
    pub empty_data: EmptyDataPolicy,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            repeat_header: true,
            empty_data: EmptyDataPolicy::NoOutput,
        }
    }
}

impl SplitOptions {
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    #[must_use]
    pub fn with_repeat_header(mut self, repeat_header: bool) -> Self {
        self.repeat_header = repeat_header;
        self
    }

    #[must_use]
    pub fn with_empty_data(mut self, empty_data: EmptyDataPolicy) -> Self {
        self.empty_data = empty_data;
        self
    }

    /// Load options from a JSON document. Missing keys keep their defaults.
    ///
    /// # Errors
    /// [`SplitError::ConfigRead`] if the file cannot be read,
    /// [`SplitError::ConfigParse`] if it is not valid JSON for these options.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SplitError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SplitError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
