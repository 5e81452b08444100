//! Destination configurations.
//!
//! A [`Config`] accumulates relocated Cuts. It owns the resource index
//! (`used_nodes`), clock-group bindings and LUT/FF tables of one output
//! bitstream; [`Config::try_add`] either merges a [`DCut`] completely or
//! leaves the configuration untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use pipcov_arch::{ClockGroup, NodeInfo};
use pipcov_common::Coord;
use pipcov_route::{AllocError, Allocation, CutId, Domain, Journal};
use pipcov_store::{read_artifact, write_artifact, ArtifactKind, StoreError};
use serde::{Deserialize, Serialize};

use crate::dcut::DCut;
use crate::error::Conflict;

/// One relocated output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    index: usize,
    region: Option<String>,
    used_nodes: BTreeMap<String, BTreeSet<String>>,
    clocks: BTreeMap<(Coord, ClockGroup), Domain>,
    alloc: Allocation,
    dcuts: Vec<DCut>,
}

impl Config {
    /// An empty configuration built from minimal configuration `index`,
    /// optionally restricted to one clock region.
    pub fn new(index: usize, region: Option<String>) -> Self {
        Self {
            index,
            region,
            used_nodes: BTreeMap::new(),
            clocks: BTreeMap::new(),
            alloc: Allocation::new(),
            dcuts: Vec::new(),
        }
    }

    /// Index of the minimal configuration.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Clock region filter.
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Accepted relocated Cuts.
    pub fn dcuts(&self) -> &[DCut] {
        &self.dcuts
    }

    /// LUT, SubLUT and FF tables.
    pub fn allocation(&self) -> &Allocation {
        &self.alloc
    }

    /// Bound clock groups.
    pub fn clocks(&self) -> impl Iterator<Item = (Coord, ClockGroup, Domain)> + '_ {
        self.clocks.iter().map(|(&(c, g), &d)| (c, g, d))
    }

    /// Returns `true` if `port` of `tile` is used.
    pub fn is_used(&self, tile: &str, port: &str) -> bool {
        self.used_nodes.get(tile).is_some_and(|p| p.contains(port))
    }

    /// Used `(tile, port)` pairs.
    pub fn used_nodes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.used_nodes
            .iter()
            .flat_map(|(t, ports)| ports.iter().map(move |p| (t.as_str(), p.as_str())))
    }

    /// Number of accepted Cuts.
    pub fn len(&self) -> usize {
        self.dcuts.len()
    }

    /// Returns `true` if no Cut was accepted.
    pub fn is_empty(&self) -> bool {
        self.dcuts.is_empty()
    }

    fn check_nodes(&self, dcut: &DCut) -> Result<(), Conflict> {
        for node in &dcut.nodes {
            let Some((tile, port)) = node.split_once('/') else {
                continue;
            };
            if self.is_used(tile, port) {
                return Err(Conflict::NodeInUse {
                    tile: tile.to_string(),
                    port: port.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_clocks(&self, dcut: &DCut) -> Result<Vec<(Coord, ClockGroup, Domain)>, Conflict> {
        let mut bindings: Vec<(Coord, ClockGroup, Domain)> = Vec::new();
        for (_, node) in &dcut.ffs {
            let Ok(info) = NodeInfo::parse(node) else {
                continue;
            };
            let (Some(coord), Some(group), Some(domain)) = (info.coord, info.clock_group(), Domain::of_role(info.role))
            else {
                continue;
            };
            let bound = |c: Coord, g: ClockGroup| {
                self.clocks
                    .get(&(c, g))
                    .copied()
                    .or_else(|| bindings.iter().find(|b| b.0 == c && b.1 == g).map(|b| b.2))
            };
            let own = bound(coord, group);
            if own == Some(domain.other()) || bound(coord, group.sibling()) == Some(domain) {
                return Err(Conflict::Clock { coord, group, domain });
            }
            if own.is_none() {
                bindings.push((coord, group, domain));
            }
        }
        Ok(bindings)
    }

    fn check_alloc(&self, dcut: &DCut) -> Result<(), AllocError> {
        for req in &dcut.subluts {
            self.alloc.check_sublut(req)?;
        }
        for (id, _) in &dcut.ffs {
            if self.alloc.ff(id).is_some() {
                return Err(AllocError::FfInUse(id.clone()));
            }
        }
        Ok(())
    }

    /// Merges `dcut` if none of its nodes, clock groups, LUT halves or FFs
    /// collide with what is already placed.
    pub fn try_add(&mut self, dcut: DCut) -> Result<(), Conflict> {
        self.check_nodes(&dcut)?;
        let bindings = self.check_clocks(&dcut)?;
        self.check_alloc(&dcut)?;

        // Two SubLUTs of one Cut may share a LUT, so allocate on a copy.
        let cut = CutId::from_raw(self.dcuts.len() as u32);
        let mut alloc = self.alloc.clone();
        let mut journal = Journal::default();
        for req in &dcut.subluts {
            alloc.add_sublut(req.clone(), cut, &mut journal)?;
        }
        for (id, node) in &dcut.ffs {
            alloc.use_ff(id.clone(), node, cut, &mut journal)?;
        }

        self.alloc = alloc;
        for node in &dcut.nodes {
            if let Some((tile, port)) = node.split_once('/') {
                self.used_nodes
                    .entry(tile.to_string())
                    .or_default()
                    .insert(port.to_string());
            }
        }
        for (c, g, d) in bindings {
            self.clocks.insert((c, g), d);
        }
        self.dcuts.push(dcut);
        Ok(())
    }

    /// Tags every used LUT and FF blocked.
    pub fn finalize(&mut self) {
        self.alloc.finalize();
    }

    /// Writes the configuration as a `relocated` artifact.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        write_artifact(path, ArtifactKind::Relocated, self)
    }

    /// Reads a configuration written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        read_artifact(path, ArtifactKind::Relocated)
    }
}
