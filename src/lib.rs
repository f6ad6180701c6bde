//! # datashear
//!
//! A **streaming CSV splitter**. `datashear` reads a CSV file once and writes
//! it out as a sequence of smaller CSV files, either a fixed number of data rows
//! per file or a byte-size ceiling per file, optionally repeating the header in
//! every part.
//!
//! ## Key Features
//!
//! - **Single pass, bounded memory** - one row, one encode buffer and one output
//!   buffer at a time, whatever the input size
//! - **Exact byte budgeting** - each row is encoded once; the encoded length is
//!   both what the size policy measures and what is written
//! - **Correct CSV output** - fields with delimiters, quotes or line breaks are
//!   quoted and escaped
//! - **Compressed input** - gzip, zstd, bzip2 and xz are decompressed
//!   transparently (each behind a feature flag)
//! - **Observers** - hook into file rollovers for metrics or memory reporting
//!
//! ## Quick Start
//!
//! ```no_run
//! use datashear::{split_by_byte_size, split_by_row_count};
//!
//! # fn main() -> datashear::Result<()> {
//! // 10,000 data rows per file, header in every file
//! let parts = split_by_row_count("orders.csv", 10_000, true)?;
//!
//! // at most 5 MiB per file, header only in the first
//! let parts = split_by_byte_size("orders.csv", 5 * 1024 * 1024, false)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Policies
//!
//! A [`SplitPolicy`] decides where each output file ends:
//! - [`SplitPolicy::ByRowCount`] closes a file after `limit` data rows.
//! - [`SplitPolicy::ByByteSize`] closes a file before a row that would push it
//!   over `limit` bytes. Header bytes count when the file carries the header. A
//!   file always accepts its first row, so a single row larger than the limit
//!   ends up alone in its own file.
//!
//! ### Engine
//!
//! [`SplitEngine`] runs the read-decide-write loop over a [`RecordStream`] and
//! asks an [`OutputNamer`] where each file goes. It is reusable; every call to
//! [`SplitEngine::split`] starts from a clean state.
//!
//! ### Splitter
//!
//! [`Splitter`] is the configurable front end: output directory, file naming,
//! [`SplitOptions`] and observers, plus splitting into a given number of files.
//!
//! ## Errors
//!
//! Every operation returns [`Result<T, SplitError>`](SplitError). Invalid
//! limits and empty inputs are rejected before any file is created. If a read
//! or write fails midway, files already completed stay on disk and the open
//! file is flushed and closed before the error is returned.
//!
//! ## Feature Flags
//!
//! - `compression-gzip` (default) - read `.gz` inputs
//! - `compression-zstd` (default) - read `.zst` inputs
//! - `compression-bzip2` (default) - read `.bz2` inputs
//! - `compression-xz` (default) - read `.xz` inputs

pub mod codec;
pub mod engine;
pub mod error;
pub mod io;
pub mod metrics;
pub mod naming;
pub mod observer;
pub mod options;
pub mod policy;
pub mod splitter;
pub mod testing;

pub use codec::CsvRecordCodec;
pub use engine::{OutputFile, SplitEngine, SplitSummary, count_data_rows};
pub use error::{Result, SplitError};
pub use io::glob::expand_inputs;
pub use io::{HeaderRead, RecordStream};
pub use metrics::MetricsCollector;
pub use naming::{FileNameTemplate, OutputNamer, ensure_output_dir};
pub use observer::{MemoryReporter, NoopObserver, SplitObserver};
pub use options::{Dialect, EmptyDataPolicy, LineTerminator, SplitOptions};
pub use policy::{FileProgress, SplitPolicy};
pub use splitter::{Splitter, split_by_byte_size, split_by_row_count};
