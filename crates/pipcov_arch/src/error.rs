//! Error types for device loading.

use std::path::PathBuf;

use pipcov_store::StoreError;

use crate::node::NodeParseError;

/// Errors that make a device unusable. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ArchError {
    /// No blob exists for the requested device.
    #[error("unknown device '{name}': {path} not found")]
    UnknownDevice {
        /// Requested device name.
        name: String,
        /// Where the blob was looked for.
        path: PathBuf,
    },

    /// The blob describes a different device than requested.
    #[error("device blob is for '{found}', expected '{expected}'")]
    NameMismatch {
        /// Requested device name.
        expected: String,
        /// Name recorded in the blob.
        found: String,
    },

    /// A `synthetic-` name without valid `<W>x<H>` dimensions.
    #[error("invalid synthetic device name '{0}': expected synthetic-<W>x<H>")]
    BadSyntheticName(String),

    /// The blob could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A node name in the device data is malformed.
    #[error(transparent)]
    Node(#[from] NodeParseError),
}
