//! Error types for BSP parsing and rewriting.

use std::path::PathBuf;
use thiserror::Error;

use crate::parser::BspVersion;

/// Errors that can occur while reading or writing BSP files.
#[derive(Error, Debug)]
pub enum BspError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed primary header: {0}")]
    MalformedPrimaryHeader(#[source] std::io::Error),

    #[error("Cannot open input {}: {source}", .path.display())]
    CannotOpenInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create output {}: {source}", .path.display())]
    CannotCreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Short copy of primary region: expected {expected} bytes, copied {copied}")]
    ShortCopy { expected: u64, copied: u64 },

    #[error("Failed to flush output: {0}")]
    OutputFlushFailed(#[source] std::io::Error),

    /// The extension directory ended before its declared entry count.
    #[error("Extension directory truncated: header says {expected} entries, found {found}")]
    TruncatedExtensionDirectory { expected: i32, found: usize },

    #[error("Unsupported BSP version: {0}")]
    UnsupportedVersion(BspVersion),

    #[error("Lump {name} out of bounds: {offset}+{length} exceeds file size {file_len}")]
    LumpOutOfBounds {
        name: String,
        offset: u64,
        length: u64,
        file_len: u64,
    },

    #[error("Malformed texture directory: {0}")]
    MalformedTextureDirectory(String),

    #[error("Invalid lump name {0:?}: must be 1-24 bytes without NUL")]
    InvalidLumpName(String),

    #[error("Extension region too large: offset {0} does not fit in 32 bits")]
    ExtensionTooLarge(u64),

    #[error("Output path {} is the input file", .0.display())]
    OutputIsInput(PathBuf),

    #[error("Detailed print of {0} not supported")]
    UnsupportedDetail(String),
}

/// A convenience `Result` type alias using [`BspError`].
pub type Result<T> = std::result::Result<T, BspError>;
