//! The streaming split engine.
//!
//! [`SplitEngine::split`] reads the header once, then pulls data rows one at a
//! time from a [`RecordStream`]. Each row is encoded exactly once into a
//! reusable buffer. The buffer length is the row's encoded size, which the
//! [`SplitPolicy`] uses to decide whether the row goes to a new file. The same
//! buffer is then appended to the open output file, so the bytes the policy
//! budgeted are exactly the bytes that reach the disk.
//!
//! # Memory
//! A run holds one input record, one encode buffer and one buffered output file.
//! Nothing grows with the input.
//!
//! # File lifecycle
//! Each output file goes `Unopened -> Open -> Closed` and never reopens. A file
//! is opened lazily, when the first row assigned to it arrives. It is closed when
//! the policy says it is full, before a row that would overflow it, at end of
//! input, or when the run fails. On failure, files that were already closed
//! stay on disk and the open file is flushed and released before the error is
//! returned.
//!
//! # Headers
//! File #1 always starts with the header. Later files get it only when
//! `repeat_header` is set. Header bytes count toward the byte budget of every
//! file that carries them.

use crate::codec::CsvRecordCodec;
use crate::error::{Result, SplitError};
use crate::io::csv::{HeaderRead, RecordStream};
use crate::naming::OutputNamer;
use crate::observer::SplitObserver;
use crate::options::{EmptyDataPolicy, SplitOptions};
use crate::policy::{FileProgress, SplitPolicy};
use csv::StringRecord;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A finished output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFile {
    /// 1-based position in the output sequence.
    pub index: usize,
    pub path: PathBuf,
    /// Data rows, header excluded.
    pub rows: u64,
    /// Bytes on disk, header included.
    pub bytes: u64,
    pub has_header: bool,
}

/// Result of a successful split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitSummary {
    pub source: PathBuf,
    pub policy: SplitPolicy,
    /// Output files in order.
    pub files: Vec<OutputFile>,
    /// Data rows read from the input (and written across all files).
    pub rows: u64,
    /// Bytes written across all files.
    pub bytes: u64,
}

impl SplitSummary {
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    #[must_use]
    pub fn into_paths(self) -> Vec<PathBuf> {
        self.files.into_iter().map(|f| f.path).collect()
    }
}

/// An output file in the `Open` state. Owns its handle; dropping it releases
/// the file on every path, including unwinding.
struct OpenFile {
    index: usize,
    path: PathBuf,
    writer: BufWriter<File>,
    progress: FileProgress,
    has_header: bool,
}

impl OpenFile {
    fn create(index: usize, path: PathBuf) -> Result<Self> {
        let file = File::create(&path).map_err(|e| SplitError::write(&path, e))?;
        Ok(Self {
            index,
            path,
            writer: BufWriter::new(file),
            progress: FileProgress::default(),
            has_header: false,
        })
    }

    fn write_header(&mut self, encoded: &[u8]) -> Result<()> {
        self.append(encoded)?;
        self.has_header = true;
        Ok(())
    }

    fn write_row(&mut self, encoded: &[u8]) -> Result<()> {
        self.append(encoded)?;
        self.progress.rows += 1;
        Ok(())
    }

    fn append(&mut self, encoded: &[u8]) -> Result<()> {
        self.writer
            .write_all(encoded)
            .map_err(|e| SplitError::write(&self.path, e))?;
        self.progress.bytes += encoded.len() as u64;
        Ok(())
    }

    /// `Open -> Closed`: flush and release the handle.
    fn close(self) -> Result<OutputFile> {
        let Self {
            index,
            path,
            writer,
            progress,
            has_header,
        } = self;
        let file = writer
            .into_inner()
            .map_err(|e| SplitError::write(&path, e.into_error()))?;
        drop(file);
        Ok(OutputFile {
            index,
            path,
            rows: progress.rows,
            bytes: progress.bytes,
            has_header,
        })
    }
}

/// Holds the file currently being filled. Empty means the next file is still
/// `Unopened`; closed files leave the slot and become [`OutputFile`]s.
#[derive(Default)]
struct FileSlot(Option<OpenFile>);

impl FileSlot {
    fn progress(&self) -> Option<FileProgress> {
        self.0.as_ref().map(|f| f.progress)
    }

    fn get_or_open(&mut self, open: impl FnOnce() -> Result<OpenFile>) -> Result<&mut OpenFile> {
        let file = match self.0.take() {
            Some(file) => file,
            None => open()?,
        };
        Ok(self.0.insert(file))
    }

    fn take(&mut self) -> Option<OpenFile> {
        self.0.take()
    }
}

fn open_output(
    namer: &dyn OutputNamer,
    index: usize,
    header: &[u8],
    repeat_header: bool,
) -> Result<OpenFile> {
    let mut file = OpenFile::create(index, namer.path_for(index))?;
    if index == 1 || repeat_header {
        file.write_header(header)?;
    }
    debug!(index, path = %file.path.display(), header = file.has_header, "opened output file");
    Ok(file)
}

/// Per-call state. Built fresh by every [`SplitEngine::split`] call so nothing
/// carries over between runs.
struct SplitRun<'a> {
    policy: SplitPolicy,
    repeat_header: bool,
    namer: &'a dyn OutputNamer,
    observers: &'a mut [Box<dyn SplitObserver>],
    header: Vec<u8>,
    slot: FileSlot,
    closed: Vec<OutputFile>,
}

impl SplitRun<'_> {
    /// The open file, opening the next one first if the slot is `Unopened`.
    fn ensure_open(&mut self) -> Result<&mut OpenFile> {
        let index = self.closed.len() + 1;
        let (namer, header, repeat_header) =
            (self.namer, self.header.as_slice(), self.repeat_header);
        self.slot
            .get_or_open(|| open_output(namer, index, header, repeat_header))
    }

    fn write_row(&mut self, encoded: &[u8]) -> Result<()> {
        let policy = self.policy;
        let size = encoded.len() as u64;
        if self
            .slot
            .progress()
            .is_some_and(|current| policy.rolls_before(current, size))
        {
            self.close_current()?;
        }

        if policy.is_oversize_row(size) {
            warn!(
                index = self.closed.len() + 1,
                row_bytes = size,
                limit = policy.limit(),
                "row exceeds the size limit on its own; it gets a file of its own"
            );
        }

        let file = self.ensure_open()?;
        file.write_row(encoded)?;
        if policy.closes_after(file.progress) {
            self.close_current()?;
        }
        Ok(())
    }

    fn close_current(&mut self) -> Result<()> {
        let Some(file) = self.slot.take() else {
            return Ok(());
        };
        let closed = file.close()?;
        debug!(
            index = closed.index,
            rows = closed.rows,
            bytes = closed.bytes,
            "closed output file"
        );
        for observer in self.observers.iter_mut() {
            observer.on_file_closed(&closed);
        }
        self.closed.push(closed);
        Ok(())
    }

    /// Release the open file after a failure. The original error wins over
    /// anything that goes wrong here.
    fn abort(&mut self) {
        if let Some(mut file) = self.slot.take() {
            if let Err(e) = file.writer.flush() {
                warn!(path = %file.path.display(), error = %e, "flush failed while aborting");
            }
            warn!(
                index = file.index,
                path = %file.path.display(),
                rows = file.progress.rows,
                "split aborted; closing partial output file"
            );
        }
    }
}

/// Splits a record stream into output files under a [`SplitPolicy`].
///
/// The engine only keeps configuration and observers. It can be reused for
/// any number of `split` calls, each independent of the others.
///
/// ```no_run
/// use datashear::{FileNameTemplate, RecordStream, SplitEngine, SplitOptions, SplitPolicy};
/// use std::path::Path;
///
/// # fn main() -> datashear::Result<()> {
/// let opts = SplitOptions::default();
/// let mut engine = SplitEngine::new(opts.clone())?;
/// let input = Path::new("orders.csv");
/// let mut stream = RecordStream::open(input, &opts.dialect)?;
/// let names = FileNameTemplate::for_input(input, "out");
/// let summary = engine.split(&mut stream, SplitPolicy::by_byte_size(1 << 20)?, true, &names)?;
/// println!("{} files", summary.files.len());
/// # Ok(())
/// # }
/// ```
pub struct SplitEngine {
    codec: CsvRecordCodec,
    options: SplitOptions,
    observers: Vec<Box<dyn SplitObserver>>,
}

impl SplitEngine {
    /// # Errors
    /// [`SplitError::InvalidDialect`] if the options' dialect is unusable.
    pub fn new(options: SplitOptions) -> Result<Self> {
        Ok(Self {
            codec: CsvRecordCodec::new(&options.dialect)?,
            options,
            observers: Vec::new(),
        })
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl SplitObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn SplitObserver>) {
        self.observers.push(observer);
    }

    #[must_use]
    pub fn options(&self) -> &SplitOptions {
        &self.options
    }

    #[must_use]
    pub fn codec(&self) -> &CsvRecordCodec {
        &self.codec
    }

    /// Split `input` into files named by `namer`.
    ///
    /// # Errors
    /// - [`SplitError::EmptyInput`] if the stream has no header; no file is created
    /// - [`SplitError::Read`] if reading the input fails mid-scan
    /// - [`SplitError::Write`] if creating, writing or closing an output fails
    ///
    /// Files closed before a failure are left on disk.
    pub fn split(
        &mut self,
        input: &mut RecordStream,
        policy: SplitPolicy,
        repeat_header: bool,
        namer: &dyn OutputNamer,
    ) -> Result<SplitSummary> {
        let source = input.source().to_path_buf();
        let header = match input.read_header()? {
            HeaderRead::Exhausted => return Err(SplitError::EmptyInput { path: source }),
            HeaderRead::Present(header) => header,
        };
        let header = self.codec.encode(&header)?;
        if let SplitPolicy::ByByteSize(limit) = policy
            && header.len() as u64 > limit.get()
        {
            // the header is still written; each file carrying it holds the header plus one row
            warn!(
                header_bytes = header.len(),
                limit = limit.get(),
                "header alone exceeds the size limit"
            );
        }

        for observer in &mut self.observers {
            observer.on_split_started(&source, &policy);
        }

        let mut run = SplitRun {
            policy,
            repeat_header,
            namer,
            observers: &mut self.observers,
            header,
            slot: FileSlot::default(),
            closed: Vec::new(),
        };

        let rows = match drive(&mut run, &self.codec, input, self.options.empty_data) {
            Ok(rows) => rows,
            Err(e) => {
                run.abort();
                return Err(e);
            }
        };

        let files = run.closed;
        let summary = SplitSummary {
            bytes: files.iter().map(|f| f.bytes).sum(),
            source,
            policy,
            files,
            rows,
        };
        info!(
            source = %summary.source.display(),
            %policy,
            files = summary.files.len(),
            rows = summary.rows,
            bytes = summary.bytes,
            "split finished"
        );
        for observer in &mut self.observers {
            observer.on_split_finished(&summary);
        }
        Ok(summary)
    }
}

/// The read-decide-write loop. Returns the number of data rows written.
fn drive(
    run: &mut SplitRun<'_>,
    codec: &CsvRecordCodec,
    input: &mut RecordStream,
    empty_data: EmptyDataPolicy,
) -> Result<u64> {
    let mut record = StringRecord::new();
    let mut encoded = Vec::new();
    let mut rows = 0u64;

    while input.next_into(&mut record)? {
        encoded.clear();
        codec.encode_into(&record, &mut encoded)?;
        run.write_row(&encoded)?;
        rows += 1;
    }

    if rows == 0 && empty_data == EmptyDataPolicy::HeaderOnlyFile {
        run.ensure_open()?;
    }
    run.close_current()?;
    Ok(rows)
}

/// Count the data rows of `path` without keeping any of them.
///
/// # Errors
/// - [`SplitError::InputNotFound`] / [`SplitError::Read`] from opening or reading
/// - [`SplitError::EmptyInput`] if there is no header
pub fn count_data_rows(path: &Path, options: &SplitOptions) -> Result<u64> {
    let mut stream = RecordStream::open(path, &options.dialect)?;
    match stream.read_header()? {
        HeaderRead::Exhausted => Err(SplitError::EmptyInput {
            path: path.to_path_buf(),
        }),
        HeaderRead::Present(_) => stream.count_remaining(),
    }
}
