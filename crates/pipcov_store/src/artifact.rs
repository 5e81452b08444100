//! Versioned, checksummed artifact files.
//!
//! On-disk format: a 4-byte little-endian header length, the bincode-encoded
//! [`ArtifactHeader`], then the zlib-compressed bincode payload. The
//! checksum covers the compressed bytes so corruption is caught before
//! decompression is attempted.

use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use pipcov_common::ContentHash;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Magic bytes identifying a pipcov artifact.
const ARTIFACT_MAGIC: [u8; 4] = *b"PCOV";

/// Current artifact format version. Increment on breaking changes to the
/// header or to any persisted payload type.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// What an artifact's payload holds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// A device description (`.pcdev`).
    Device,
    /// A finalized minimal configuration.
    MinConfig,
    /// A relocated destination configuration.
    Relocated,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Device => write!(f, "device"),
            ArtifactKind::MinConfig => write!(f, "min-config"),
            ArtifactKind::Relocated => write!(f, "relocated"),
        }
    }
}

/// Header prepended to every artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactHeader {
    /// Magic bytes: must be `b"PCOV"`.
    pub magic: [u8; 4],
    /// Artifact format version.
    pub format_version: u32,
    /// Payload kind.
    pub kind: ArtifactKind,
    /// pipcov version that produced this artifact.
    pub producer: String,
    /// Digest of the compressed payload.
    pub checksum: ContentHash,
}

/// Serializes `value` and writes it to `path` as an artifact of `kind`.
///
/// Parent directories are created as needed.
pub fn write_artifact<T: Serialize>(path: &Path, kind: ArtifactKind, value: &T) -> Result<(), StoreError> {
    let serialization = |reason: String| StoreError::Serialization {
        path: path.to_path_buf(),
        reason,
    };
    let compression = |source| StoreError::Compression {
        path: path.to_path_buf(),
        source,
    };

    let raw = bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| serialization(e.to_string()))?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw).map_err(compression)?;
    let payload = encoder.finish().map_err(compression)?;

    let header = ArtifactHeader {
        magic: ARTIFACT_MAGIC,
        format_version: ARTIFACT_FORMAT_VERSION,
        kind,
        producer: env!("CARGO_PKG_VERSION").to_string(),
        checksum: ContentHash::from_bytes(&payload),
    };
    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(|e| serialization(e.to_string()))?;

    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, &output).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and validates only the header of an artifact.
pub fn read_header(path: &Path) -> Result<ArtifactHeader, StoreError> {
    let raw = read_file(path)?;
    split(path, &raw).map(|(header, _)| header)
}

/// Reads an artifact of `kind` from `path`, validating magic, version, kind
/// and checksum before decoding the payload.
pub fn read_artifact<T: DeserializeOwned>(path: &Path, kind: ArtifactKind) -> Result<T, StoreError> {
    let raw = read_file(path)?;
    let (header, payload) = split(path, &raw)?;

    if header.kind != kind {
        return Err(StoreError::KindMismatch {
            path: path.to_path_buf(),
            expected: kind.to_string(),
            actual: header.kind.to_string(),
        });
    }

    let actual = ContentHash::from_bytes(payload);
    if actual != header.checksum {
        return Err(StoreError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: header.checksum.to_string(),
            actual: actual.to_string(),
        });
    }

    let mut decoded = Vec::new();
    ZlibDecoder::new(payload)
        .read_to_end(&mut decoded)
        .map_err(|source| StoreError::Compression {
            path: path.to_path_buf(),
            source,
        })?;
    let (value, _) = bincode::serde::decode_from_slice(&decoded, bincode::config::standard())
        .map_err(|e| StoreError::Serialization {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(value)
}

fn read_file(path: &Path) -> Result<Vec<u8>, StoreError> {
    std::fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Splits raw file bytes into a validated header and the payload slice.
fn split<'a>(path: &Path, raw: &'a [u8]) -> Result<(ArtifactHeader, &'a [u8]), StoreError> {
    let invalid = |reason: &str| StoreError::InvalidHeader {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let len_bytes: [u8; 4] = raw
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| invalid("file shorter than header length prefix"))?;
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    let header_bytes = raw
        .get(4..4 + header_len)
        .ok_or_else(|| invalid("truncated header"))?;

    let header: ArtifactHeader =
        bincode::serde::decode_from_slice(header_bytes, bincode::config::standard())
            .map_err(|e| invalid(&e.to_string()))?
            .0;

    if header.magic != ARTIFACT_MAGIC {
        return Err(invalid("bad magic bytes"));
    }
    if header.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(StoreError::VersionMismatch {
            path: path.to_path_buf(),
            expected: ARTIFACT_FORMAT_VERSION,
            actual: header.format_version,
        });
    }
    Ok((header, &raw[4 + header_len..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        capacities: BTreeMap<String, u8>,
        cuts: Vec<(u32, Vec<String>)>,
    }

    fn sample() -> Sample {
        let mut capacities = BTreeMap::new();
        capacities.insert("CLEL_R_X1Y1/ALUT".to_string(), 1);
        capacities.insert("CLEM_X1Y1/CLUT".to_string(), 0);
        Sample {
            name: "synthetic-4x4".into(),
            capacities,
            cuts: vec![(0, vec!["INT_X1Y1/NN1END0".into(), "INT_X1Y1/NN1BEG0".into()])],
        }
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("iteration_0").join("min_config_0.pcov");
        write_artifact(&path, ArtifactKind::MinConfig, &sample()).unwrap();
        let back: Sample = read_artifact(&path, ArtifactKind::MinConfig).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn header_is_readable_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dev.pcdev");
        write_artifact(&path, ArtifactKind::Device, &sample()).unwrap();
        let header = read_header(&path).unwrap();
        assert_eq!(header.kind, ArtifactKind::Device);
        assert_eq!(header.format_version, ARTIFACT_FORMAT_VERSION);
        assert_eq!(header.producer, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pcov");
        write_artifact(&path, ArtifactKind::Relocated, &sample()).unwrap();
        let err = read_artifact::<Sample>(&path, ArtifactKind::MinConfig).unwrap_err();
        assert!(matches!(err, StoreError::KindMismatch { .. }));
    }

    #[test]
    fn corrupted_payload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pcov");
        write_artifact(&path, ArtifactKind::MinConfig, &sample()).unwrap();
        let mut raw = std::fs::read(&path).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        std::fs::write(&path, &raw).unwrap();
        let err = read_artifact::<Sample>(&path, ArtifactKind::MinConfig).unwrap_err();
        assert!(matches!(err, StoreError::ChecksumMismatch { .. }));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pcov");
        write_artifact(&path, ArtifactKind::MinConfig, &sample()).unwrap();
        let mut raw = std::fs::read(&path).unwrap();
        // The magic array is the first field after the length prefix.
        raw[4] = b'X';
        std::fs::write(&path, &raw).unwrap();
        let err = read_artifact::<Sample>(&path, ArtifactKind::MinConfig).unwrap_err();
        assert!(matches!(err, StoreError::InvalidHeader { .. }));
    }

    #[test]
    fn truncated_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pcov");
        std::fs::write(&path, [1u8, 0]).unwrap();
        let err = read_artifact::<Sample>(&path, ArtifactKind::MinConfig).unwrap_err();
        assert!(matches!(err, StoreError::InvalidHeader { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_artifact::<Sample>(&dir.path().join("none.pcov"), ArtifactKind::MinConfig)
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
