//! Error types for artifact persistence.

use std::path::PathBuf;

/// Errors raised while reading or writing artifacts and run files.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An I/O error occurred while reading or writing a file.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not an artifact or its header is truncated.
    #[error("invalid artifact header in {path}: {reason}")]
    InvalidHeader {
        /// The artifact file path.
        path: PathBuf,
        /// Description of the header problem.
        reason: String,
    },

    /// The artifact was written by an incompatible format version.
    #[error("version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The artifact file path.
        path: PathBuf,
        /// The format version this build understands.
        expected: u32,
        /// The format version found in the file.
        actual: u32,
    },

    /// The artifact holds a different kind of payload than requested.
    #[error("{path} holds a {actual} artifact, expected {expected}")]
    KindMismatch {
        /// The artifact file path.
        path: PathBuf,
        /// The requested kind.
        expected: String,
        /// The kind recorded in the header.
        actual: String,
    },

    /// The stored checksum does not match the payload.
    #[error("checksum mismatch in {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The artifact file path.
        path: PathBuf,
        /// The checksum recorded in the header.
        expected: String,
        /// The checksum computed from the payload.
        actual: String,
    },

    /// Encoding or decoding the header, payload or a JSON file failed.
    #[error("serialization error in {path}: {reason}")]
    Serialization {
        /// The file being encoded or decoded.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// The payload could not be compressed or decompressed.
    #[error("compression error in {path}: {source}")]
    Compression {
        /// The artifact file path.
        path: PathBuf,
        /// The underlying zlib error.
        source: std::io::Error,
    },
}
