use ark_types::Handle;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("invalid package magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported package version: {0}")]
    UnsupportedVersion(u32),

    #[error("package trailer checksum mismatch")]
    TrailerMismatch,

    #[error("CRC32 mismatch in {section} section")]
    CrcMismatch { section: &'static str },

    #[error("corrupt package at offset {offset}: {reason}")]
    CorruptEntry { offset: u64, reason: String },

    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("document serialization error: {0}")]
    Serialization(String),

    #[error("package has no embedded handle")]
    MissingHandle,

    #[error("package set already contains {0}")]
    DuplicatePackage(Handle),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PackageResult<T> = Result<T, PackageError>;
