//! Run-directory layout for coverage and relocation outputs.
//!
//! ```text
//! <out_dir>/iteration_<n>/min_config_<i>.pcov
//! <out_dir>/iteration_<n>/summary.json
//! <reloc_dir>/relocated_<i>[_<region>].pcov
//! <reloc_dir>/relocated_<i>[_<region>].fasm
//! <reloc_dir>/coverage.json
//! ```

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

const MIN_CONFIG_PREFIX: &str = "min_config_";
const MIN_CONFIG_EXT: &str = "pcov";

/// Paths of one coverage run (`path_finder`).
#[derive(Debug, Clone)]
pub struct RunLayout {
    root: PathBuf,
    iteration: u32,
}

impl RunLayout {
    /// Creates the layout for iteration `iteration` under `out_dir`.
    pub fn new(out_dir: &Path, iteration: u32) -> Self {
        Self {
            root: out_dir.to_path_buf(),
            iteration,
        }
    }

    /// The iteration directory holding the minimal configurations.
    pub fn iteration_dir(&self) -> PathBuf {
        self.root.join(format!("iteration_{}", self.iteration))
    }

    /// Creates the iteration directory.
    pub fn ensure_dirs(&self) -> Result<(), StoreError> {
        let dir = self.iteration_dir();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io { path: dir, source })
    }

    /// Path of minimal configuration `index`.
    pub fn min_config_path(&self, index: usize) -> PathBuf {
        self.iteration_dir()
            .join(format!("{MIN_CONFIG_PREFIX}{index}.{MIN_CONFIG_EXT}"))
    }

    /// Path of the JSON run summary.
    pub fn summary_path(&self) -> PathBuf {
        self.iteration_dir().join("summary.json")
    }
}

/// Lists the minimal configuration files in `dir`, ordered by index.
///
/// Files not named `min_config_<i>.pcov` are ignored.
pub fn list_min_configs(dir: &Path) -> Result<Vec<(usize, PathBuf)>, StoreError> {
    let io = |source| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io)? {
        let path = entry.map_err(io)?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(MIN_CONFIG_EXT) {
            continue;
        }
        let index = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_prefix(MIN_CONFIG_PREFIX))
            .and_then(|s| s.parse::<usize>().ok());
        if let Some(index) = index {
            found.push((index, path));
        }
    }
    found.sort();
    Ok(found)
}

/// Paths of one relocation run (`relocate_CUTs`).
#[derive(Debug, Clone)]
pub struct RelocLayout {
    root: PathBuf,
}

impl RelocLayout {
    /// Creates the layout rooted at `out_dir`.
    pub fn new(out_dir: &Path) -> Self {
        Self {
            root: out_dir.to_path_buf(),
        }
    }

    /// Creates the output directory.
    pub fn ensure_dirs(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })
    }

    fn stem(index: usize, region: Option<&str>) -> String {
        match region {
            Some(region) => format!("relocated_{index}_{region}"),
            None => format!("relocated_{index}"),
        }
    }

    /// Path of the relocated configuration built from minimal config `index`.
    pub fn relocated_path(&self, index: usize, region: Option<&str>) -> PathBuf {
        self.root.join(format!("{}.pcov", Self::stem(index, region)))
    }

    /// Path of the FASM text for the same configuration.
    pub fn fasm_path(&self, index: usize, region: Option<&str>) -> PathBuf {
        self.root.join(format!("{}.fasm", Self::stem(index, region)))
    }

    /// Path of the aggregated coverage report.
    pub fn coverage_path(&self) -> PathBuf {
        self.root.join("coverage.json")
    }
}

/// Writes `value` as pretty-printed JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| StoreError::Serialization {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    std::fs::write(path, json).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a JSON file written by [`write_json`].
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|e| StoreError::Serialization {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn run_paths() {
        let layout = RunLayout::new(Path::new("/out"), 3);
        assert_eq!(layout.iteration_dir(), PathBuf::from("/out/iteration_3"));
        assert_eq!(
            layout.min_config_path(7),
            PathBuf::from("/out/iteration_3/min_config_7.pcov")
        );
        assert_eq!(layout.summary_path(), PathBuf::from("/out/iteration_3/summary.json"));
    }

    #[test]
    fn reloc_paths() {
        let layout = RelocLayout::new(Path::new("/r"));
        assert_eq!(layout.relocated_path(0, None), PathBuf::from("/r/relocated_0.pcov"));
        assert_eq!(
            layout.fasm_path(2, Some("X0Y1")),
            PathBuf::from("/r/relocated_2_X0Y1.fasm")
        );
        assert_eq!(layout.coverage_path(), PathBuf::from("/r/coverage.json"));
    }

    #[test]
    fn lists_min_configs_in_index_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["min_config_10.pcov", "min_config_2.pcov", "summary.json", "other.pcov"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let found = list_min_configs(dir.path()).unwrap();
        let indices: Vec<usize> = found.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![2, 10]);
    }

    #[test]
    fn json_roundtrip() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Summary {
            configs: usize,
            remaining: usize,
        }
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::new(dir.path(), 0);
        layout.ensure_dirs().unwrap();
        let summary = Summary {
            configs: 3,
            remaining: 12,
        };
        write_json(&layout.summary_path(), &summary).unwrap();
        let back: Summary = read_json(&layout.summary_path()).unwrap();
        assert_eq!(back, summary);
    }
}
