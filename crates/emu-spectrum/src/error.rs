//! Error types for snapshot codecs and the emulator task.

use thiserror::Error;

/// A snapshot could not be decoded, encoded or applied.
///
/// Decoding never touches a live machine, so any of these leaves the
/// running state as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("snapshot has invalid size: expected {expected} bytes, got {actual}")]
    InvalidSize { expected: usize, actual: usize },

    #[error("invalid interrupt mode {0}")]
    InvalidInterruptMode(u8),

    #[error("compressed memory image has no end marker")]
    MissingEndMarker,

    #[error("decompressed memory is {actual} bytes, expected {expected}")]
    DecompressedLength { expected: usize, actual: usize },

    #[error("unsupported Z80 snapshot version")]
    UnsupportedVersion,

    #[error("unsupported feature: {0}")]
    UnsupportedHardware(&'static str),

    #[error("unsupported hardware mode {0}")]
    UnsupportedHardwareMode(u8),

    #[error("memory block for unknown page {0}")]
    InvalidPage(u8),

    #[error("memory page {page} is {length} bytes, expected 16384")]
    PageLength { page: u8, length: usize },

    #[error("expected 3 memory pages, found {0}")]
    PageCount(usize),

    #[error("trailing data after the last memory block")]
    TrailingData,

    #[error("cannot simulate RETN: stack pointer too low to push PC")]
    RetnSimulation,

    #[error("snapshot data is truncated")]
    Truncated,

    #[error("unrecognized snapshot format: {0}")]
    UnknownFormat(String),
}

/// Errors surfaced by [`crate::Spectrum48k`] and [`crate::Emulator`].
#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("ROM must be {expected} bytes, got {actual}")]
    Rom { expected: usize, actual: usize },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("emulator task has terminated")]
    Terminated,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;
pub type EmulatorResult<T> = Result<T, EmulatorError>;
