//! Persisted form of a finished configuration.

use std::collections::BTreeSet;
use std::path::Path;

use pipcov_arch::ClockGroup;
use pipcov_common::Coord;
use pipcov_store::{list_min_configs, read_artifact, write_artifact, ArtifactKind, StoreError};
use serde::{Deserialize, Serialize};

use crate::alloc::Allocation;
use crate::clock::Domain;
use crate::cut::Cut;
use crate::ids::CutId;
use crate::min_config::MinConfig;

/// A clock group's role, by coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockAssignment {
    /// Coordinate of the group.
    pub coord: Coord,
    /// The group.
    pub group: ClockGroup,
    /// Its role.
    pub domain: Domain,
}

/// Everything a minimal configuration needs to be relocated or resumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinConfigSnapshot {
    /// Device name.
    pub device: String,
    /// Origin coordinate.
    pub origin: Coord,
    /// Graph window radius.
    pub radius: i32,
    /// Index within the run.
    pub index: usize,
    /// Committed Cuts.
    pub cuts: Vec<Cut>,
    /// LUT, SubLUT and FF tables.
    pub allocation: Allocation,
    /// Bound clock groups.
    pub clocks: Vec<ClockAssignment>,
    /// Nodes used by Cuts.
    pub used_nodes: Vec<(String, CutId)>,
    /// Nodes blocked as side effects.
    pub blocked_nodes: Vec<String>,
}

impl MinConfigSnapshot {
    /// Captures a configuration built on `device`.
    pub fn capture(config: &MinConfig<'_>, device: &str) -> Self {
        let graph = config.graph();
        Self {
            device: device.to_string(),
            origin: graph.origin(),
            radius: graph.radius(),
            index: config.index(),
            cuts: config.cuts().to_vec(),
            allocation: config.allocation().clone(),
            clocks: config
                .clocks()
                .bindings()
                .map(|(coord, group, domain)| ClockAssignment { coord, group, domain })
                .collect(),
            used_nodes: config
                .ledger()
                .used_nodes()
                .map(|(n, cut)| (graph.name(n).to_string(), cut))
                .collect(),
            blocked_nodes: config
                .ledger()
                .blocked_nodes()
                .map(|n| graph.name(n).to_string())
                .collect(),
        }
    }

    /// Every PIP covered by the configuration's Cuts.
    pub fn covered(&self) -> BTreeSet<(String, String)> {
        self.cuts
            .iter()
            .flat_map(|c| c.covered_pips().iter().cloned())
            .collect()
    }

    /// Writes the snapshot as a `min-config` artifact.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        write_artifact(path, ArtifactKind::MinConfig, self)
    }

    /// Reads a snapshot written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        read_artifact(path, ArtifactKind::MinConfig)
    }
}

/// Loads every `min_config_<i>.pcov` of `dir` in index order.
pub fn load_min_configs(dir: &Path) -> Result<Vec<(usize, MinConfigSnapshot)>, StoreError> {
    list_min_configs(dir)?
        .into_iter()
        .map(|(i, path)| Ok((i, MinConfigSnapshot::load(&path)?)))
        .collect()
}

/// PIPs covered by the configurations stored in `dir`.
pub fn load_covered(dir: &Path) -> Result<BTreeSet<(String, String)>, StoreError> {
    let mut covered = BTreeSet::new();
    for (_, snapshot) in load_min_configs(dir)? {
        covered.extend(snapshot.covered());
    }
    Ok(covered)
}
