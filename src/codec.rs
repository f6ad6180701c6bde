//! CSV record encoding and exact encoded-size measurement.
//!
//! The byte-size split policy relies on [`CsvRecordCodec::measure`] agreeing
//! byte-for-byte with what [`CsvRecordCodec::encode`] produces. Both go
//! through the same `csv::Writer` configuration, so they cannot drift: the
//! only difference is the sink (a `Vec<u8>` versus a byte counter).
//!
//! Quoting follows `QuoteStyle::Necessary`: a field is quoted when it contains
//! the delimiter, the quote character, `\r` or `\n`, and embedded quotes are
//! doubled.

use crate::error::{Result, SplitError};
use crate::options::{Dialect, LineTerminator};
use csv::{QuoteStyle, WriterBuilder};
use std::io::{self, Write};

/// Internal buffer for the per-record writer. Longer fields are flushed in
/// pieces, so this only bounds the scratch allocation.
const RECORD_BUFFER: usize = 1024;

/// Encodes rows as CSV records under a fixed dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvRecordCodec {
    delimiter: u8,
    quote: u8,
    terminator: LineTerminator,
}

impl Default for CsvRecordCodec {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            terminator: LineTerminator::Crlf,
        }
    }
}

impl CsvRecordCodec {
    /// Build a codec for `dialect`.
    ///
    /// # Errors
    /// Returns [`SplitError::InvalidDialect`] if the dialect's delimiter or
    /// quote is unusable.
    pub fn new(dialect: &Dialect) -> Result<Self> {
        let (delimiter, quote) = dialect.as_bytes()?;
        Ok(Self {
            delimiter,
            quote,
            terminator: dialect.terminator,
        })
    }

    fn writer<W: Write>(&self, sink: W) -> csv::Writer<W> {
        WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote(self.quote)
            .quote_style(QuoteStyle::Necessary)
            .double_quote(true)
            .terminator(self.terminator.into())
            .flexible(true)
            .has_headers(false)
            .buffer_capacity(RECORD_BUFFER)
            .from_writer(sink)
    }

    /// The exact bytes appended to an output file for `row`, terminator included.
    ///
    /// # Errors
    /// Returns [`SplitError::Encode`] if the record cannot be serialized.
    pub fn encode<I, T>(&self, row: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut out = Vec::new();
        self.encode_into(row, &mut out)?;
        Ok(out)
    }

    /// Append the encoding of `row` to `buf` and return the number of bytes added.
    ///
    /// # Errors
    /// Returns [`SplitError::Encode`] if the record cannot be serialized.
    pub fn encode_into<I, T>(&self, row: I, buf: &mut Vec<u8>) -> Result<u64>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let before = buf.len();
        let mut wtr = self.writer(&mut *buf);
        wtr.write_record(row)
            .map_err(|source| SplitError::Encode { source })?;
        wtr.flush()
            .map_err(|e| SplitError::Encode { source: e.into() })?;
        drop(wtr);
        Ok((buf.len() - before) as u64)
    }

    /// `encode(row).len()`, computed without keeping the encoded bytes.
    ///
    /// # Errors
    /// Returns [`SplitError::Encode`] if the record cannot be serialized.
    pub fn measure<I, T>(&self, row: I) -> Result<u64>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut counter = ByteCounter::default();
        let mut wtr = self.writer(&mut counter);
        wtr.write_record(row)
            .map_err(|source| SplitError::Encode { source })?;
        wtr.flush()
            .map_err(|e| SplitError::Encode { source: e.into() })?;
        drop(wtr);
        Ok(counter.written)
    }
}

/// A sink that only counts.
#[derive(Default)]
struct ByteCounter {
    written: u64,
}

impl Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crlf() -> CsvRecordCodec {
        CsvRecordCodec::default()
    }

    #[test]
    fn plain_fields_are_joined() {
        let bytes = crlf().encode(["1", "John", "Doe"]).unwrap();
        assert_eq!(bytes, b"1,John,Doe\r\n");
    }

    #[test]
    fn special_fields_are_quoted() {
        let bytes = crlf()
            .encode(["1", "John \"Johnny\" Doe", "CEO, Manager", "a\nb"])
            .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "1,\"John \"\"Johnny\"\" Doe\",\"CEO, Manager\",\"a\nb\"\r\n"
        );
    }

    #[test]
    fn lf_terminator() {
        let dialect = Dialect::default().with_terminator(LineTerminator::Lf);
        let codec = CsvRecordCodec::new(&dialect).unwrap();
        assert_eq!(codec.encode(["a", "b"]).unwrap(), b"a,b\n");
    }

    #[test]
    fn custom_delimiter_changes_quoting() {
        let dialect = Dialect::default().with_delimiter(';');
        let codec = CsvRecordCodec::new(&dialect).unwrap();
        assert_eq!(codec.encode(["a,b", "c;d"]).unwrap(), b"a,b;\"c;d\"\r\n");
    }

    #[test]
    fn encode_into_appends() {
        let codec = crlf();
        let mut buf = b"x".to_vec();
        let n = codec.encode_into(["a"], &mut buf).unwrap();
        assert_eq!(n, 3);
        assert_eq!(buf, b"xa\r\n");
    }

    #[test]
    fn measure_counts_utf8_bytes() {
        let codec = crlf();
        let row = ["5", "Émile François", "emile@société.fr"];
        let encoded = codec.encode(row).unwrap();
        assert_eq!(codec.measure(row).unwrap(), encoded.len() as u64);
        assert!(encoded.len() > "5,Émile François,emile@société.fr\r\n".chars().count());
    }
}
