//! Transparent decompression of split inputs.
//!
//! Inputs are often shipped compressed (`export.csv.gz`). Readers opened through
//! [`auto_detect_reader`] are wrapped in the matching decoder, so the split
//! engine always sees plain CSV bytes. Outputs are always written uncompressed:
//! the byte-size policy budgets the bytes that land on disk, and a compressor in
//! between would make that budget meaningless.
//!
//! ## Built-in codecs
//!
//! When enabled via feature flags:
//! - **Gzip** (`.gz`) via `flate2` (feature `compression-gzip`)
//! - **Zstd** (`.zst`) via `zstd` (feature `compression-zstd`)
//! - **Bzip2** (`.bz2`) via `bzip2` (feature `compression-bzip2`)
//! - **Xz** (`.xz`) via `xz2` (feature `compression-xz`)
//!
//! ## Detection
//! The file extension is checked first. Magic bytes at the start of the stream
//! are the fallback, so a gzip file without a `.gz` suffix is still decoded.
//! Files named as plain text (`.csv`, `.tsv`, `.txt`) are never sniffed: their
//! first bytes are header text, which may happen to look like a signature.
//!
//! ## Custom codecs
//! ```
//! use datashear::io::compression::{register_codec, CompressionCodec};
//! use std::io::Read;
//! use std::sync::Arc;
//!
//! struct Passthrough;
//! impl CompressionCodec for Passthrough {
//!     fn name(&self) -> &str { "passthrough" }
//!     fn extensions(&self) -> &[&str] { &[".raw"] }
//!     fn magic_bytes(&self) -> Option<&[u8]> { None }
//!     fn wrap_reader_dyn(&self, r: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
//!         Ok(r)
//!     }
//! }
//!
//! register_codec(Arc::new(Passthrough));
//! ```

use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Extensions whose contents are taken as plain text without sniffing.
const PLAIN_TEXT_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

/// Global codec registry.
static CODEC_REGISTRY: RwLock<Option<Vec<Arc<dyn CompressionCodec>>>> = RwLock::new(None);

fn init_registry() -> Vec<Arc<dyn CompressionCodec>> {
    vec![
        #[cfg(feature = "compression-gzip")]
        Arc::new(GzipCodec),
        #[cfg(feature = "compression-zstd")]
        Arc::new(ZstdCodec),
        #[cfg(feature = "compression-bzip2")]
        Arc::new(Bzip2Codec),
        #[cfg(feature = "compression-xz")]
        Arc::new(XzCodec),
    ]
}

fn registry() -> Vec<Arc<dyn CompressionCodec>> {
    let mut lock = CODEC_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    lock.get_or_insert_with(init_registry).clone()
}

/// Register a custom decompression codec, consulted after the built-in ones.
pub fn register_codec(codec: Arc<dyn CompressionCodec>) {
    let mut lock = CODEC_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    lock.get_or_insert_with(init_registry).push(codec);
}

/// A pluggable input decoder.
///
/// Implementations live in a global registry and must be `Send + Sync`.
pub trait CompressionCodec: Send + Sync {
    /// Human-readable codec name (e.g. "gzip").
    fn name(&self) -> &str;

    /// Lowercase extensions with the leading dot (e.g. `&[".gz", ".gzip"]`).
    fn extensions(&self) -> &[&str];

    /// Signature at the start of a compressed stream, if the format has one.
    fn magic_bytes(&self) -> Option<&[u8]>;

    /// Whether `head`, the first buffered bytes of a stream, starts a stream of
    /// this format. Defaults to a prefix match on [`magic_bytes`](Self::magic_bytes).
    fn matches_head(&self, head: &[u8]) -> bool {
        self.magic_bytes().is_some_and(|magic| head.starts_with(magic))
    }

    /// Wrap `reader` so that reads yield decompressed bytes.
    ///
    /// # Errors
    /// Returns an error if the decoder cannot be initialized.
    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> io::Result<Box<dyn Read>>;
}

fn detect_from_extension(path: &Path) -> Option<(Arc<dyn CompressionCodec>, usize)> {
    let name = path.to_string_lossy().to_lowercase();
    registry().into_iter().find_map(|codec| {
        let ext_len = codec
            .extensions()
            .iter()
            .find(|ext| name.ends_with(*ext))
            .map(|ext| ext.len())?;
        Some((codec, ext_len))
    })
}

fn detect_from_magic<R: BufRead>(reader: &mut R) -> Option<Arc<dyn CompressionCodec>> {
    let buf = reader.fill_buf().ok()?;
    if buf.is_empty() {
        return None;
    }
    registry().into_iter().find(|codec| codec.matches_head(buf))
}

fn is_plain_text(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            PLAIN_TEXT_EXTENSIONS
                .iter()
                .any(|plain| ext.eq_ignore_ascii_case(plain))
        })
}

/// Wrap `reader` with a decoder chosen from `path_hint`'s extension, or from
/// the stream's magic bytes when the extension says nothing. Plain input comes
/// back buffered and unchanged.
///
/// # Errors
/// Returns an error if the selected decoder fails to initialize.
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> io::Result<Box<dyn Read>> {
    let path_hint = path_hint.as_ref();
    if let Some((codec, _)) = detect_from_extension(path_hint) {
        return codec.wrap_reader_dyn(Box::new(reader));
    }

    let mut buf_reader = BufReader::new(reader);
    if is_plain_text(path_hint) {
        return Ok(Box::new(buf_reader));
    }
    if let Some(codec) = detect_from_magic(&mut buf_reader) {
        return codec.wrap_reader_dyn(Box::new(buf_reader));
    }

    Ok(Box::new(buf_reader))
}

/// `path` without a trailing compression extension: `data.csv.gz` becomes
/// `data.csv`. Paths without one are returned unchanged.
#[must_use]
pub fn strip_codec_extension(path: &Path) -> PathBuf {
    let Some((_, ext_len)) = detect_from_extension(path) else {
        return path.to_path_buf();
    };
    let full = path.to_string_lossy();
    // extensions are ASCII, so the cut always lands on a char boundary
    let cut = full.len().saturating_sub(ext_len);
    PathBuf::from(&full[..cut])
}

// ============================================================================
// Built-in codecs
// ============================================================================

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn extensions(&self) -> &[&str] {
        &[".gz", ".gzip"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x1f, 0x8b])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> io::Result<Box<dyn Read>> {
        use flate2::read::MultiGzDecoder;
        Ok(Box::new(MultiGzDecoder::new(reader)))
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl CompressionCodec for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn extensions(&self) -> &[&str] {
        &[".zst", ".zstd"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x28, 0xb5, 0x2f, 0xfd])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> io::Result<Box<dyn Read>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
    }
}

#[cfg(feature = "compression-bzip2")]
struct Bzip2Codec;

#[cfg(feature = "compression-bzip2")]
impl CompressionCodec for Bzip2Codec {
    fn name(&self) -> &str {
        "bzip2"
    }

    fn extensions(&self) -> &[&str] {
        &[".bz2", ".bzip2"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(b"BZh")
    }

    // "BZh" is printable text, so also require the block size digit and the
    // first block (or end-of-stream) signature
    fn matches_head(&self, head: &[u8]) -> bool {
        const BLOCK: [u8; 6] = [0x31, 0x41, 0x59, 0x26, 0x53, 0x59];
        const END_OF_STREAM: [u8; 6] = [0x17, 0x72, 0x45, 0x38, 0x50, 0x90];
        match head {
            [b'B', b'Z', b'h', level, rest @ ..] if (b'1'..=b'9').contains(level) => {
                rest.starts_with(&BLOCK) || rest.starts_with(&END_OF_STREAM)
            }
            _ => false,
        }
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> io::Result<Box<dyn Read>> {
        use bzip2::read::BzDecoder;
        Ok(Box::new(BzDecoder::new(reader)))
    }
}

#[cfg(feature = "compression-xz")]
struct XzCodec;

#[cfg(feature = "compression-xz")]
impl CompressionCodec for XzCodec {
    fn name(&self) -> &str {
        "xz"
    }

    fn extensions(&self) -> &[&str] {
        &[".xz"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> io::Result<Box<dyn Read>> {
        use xz2::read::XzDecoder;
        Ok(Box::new(XzDecoder::new(reader)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn plain_input_passes_through() {
        let mut out = String::new();
        auto_detect_reader(Cursor::new(b"a,b\n1,2\n".to_vec()), "in.csv")
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "a,b\n1,2\n");
    }

    #[test]
    fn bz_prefixed_header_is_not_bzip2() {
        let mut out = String::new();
        auto_detect_reader(Cursor::new(b"BZ_ID,name\n".to_vec()), "in.csv")
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "BZ_ID,name\n");
    }

    #[test]
    fn bzip2_lookalike_header_stays_plain() {
        for hint in ["plain.csv", "no_extension"] {
            let mut out = String::new();
            auto_detect_reader(Cursor::new(b"BZh_code,name\n1,a\n".to_vec()), hint)
                .unwrap()
                .read_to_string(&mut out)
                .unwrap();
            assert_eq!(out, "BZh_code,name\n1,a\n", "{hint}");
        }
    }

    #[cfg(feature = "compression-bzip2")]
    #[test]
    fn bzip2_detected_by_full_stream_header() {
        use bzip2::Compression;
        use bzip2::write::BzEncoder;
        use std::io::Write;

        let mut enc = BzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"id\n1\n").unwrap();
        let bz = enc.finish().unwrap();

        let mut out = String::new();
        auto_detect_reader(Cursor::new(bz), "no_extension")
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "id\n1\n");
    }

    #[test]
    fn strip_leaves_plain_paths_alone() {
        assert_eq!(
            strip_codec_extension(Path::new("dir/data.csv")),
            PathBuf::from("dir/data.csv")
        );
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn strip_removes_codec_suffix() {
        assert_eq!(
            strip_codec_extension(Path::new("dir/data.csv.gz")),
            PathBuf::from("dir/data.csv")
        );
        assert_eq!(
            strip_codec_extension(Path::new("DATA.CSV.GZ")),
            PathBuf::from("DATA.CSV")
        );
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn gzip_detected_by_magic_without_extension() {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"id\n1\n").unwrap();
        let gz = enc.finish().unwrap();

        let mut out = String::new();
        auto_detect_reader(Cursor::new(gz), "no_extension")
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "id\n1\n");
    }
}
