//! Input plumbing: record streaming, transparent decompression, pattern expansion.

pub mod compression;
pub mod csv;
pub mod glob;

pub use self::csv::{HeaderRead, RecordStream};
