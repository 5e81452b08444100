//! Persistence for device descriptions and coverage results.
//!
//! Every binary file pipcov writes is an artifact: a small header carrying
//! magic bytes, a format version, the kind of payload and a checksum,
//! followed by a zlib-compressed bincode payload. Reading validates every
//! header field; unlike a cache, a bad artifact is a hard error since the
//! run cannot continue without it.
//!
//! The [`layout`] module fixes where runs put their files.

#![warn(missing_docs)]

pub mod artifact;
pub mod error;
pub mod layout;

pub use artifact::{read_artifact, read_header, write_artifact, ArtifactHeader, ArtifactKind};
pub use error::StoreError;
pub use layout::{list_min_configs, read_json, write_json, RelocLayout, RunLayout};
