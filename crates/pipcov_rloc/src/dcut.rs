//! Relocated Cuts.

use std::collections::BTreeSet;

use pipcov_arch::{relocate_node, relocate_tile, Device, NodeInfo};
use pipcov_common::Coord;
use pipcov_route::{Cut, CutEdge, CutId, EdgeKind, FfId, LutId, MinConfigSnapshot, SubLutRequest};
use serde::{Deserialize, Serialize};

use crate::error::RelocError;

/// A Cut translated onto another origin and checked against the fabric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DCut {
    /// Minimal configuration the Cut came from.
    pub config: usize,
    /// The Cut within it.
    pub cut: CutId,
    /// Origin it was built at.
    pub origin: Coord,
    /// Where it now sits.
    pub target: Coord,
    /// The PIP under test.
    pub pip: (String, String),
    /// Every non-virtual node.
    pub nodes: Vec<String>,
    /// Every non-virtual edge.
    pub edges: Vec<CutEdge>,
    /// PIPs exercised by the main path.
    pub covered: Vec<(String, String)>,
    /// SubLUTs to allocate.
    pub subluts: Vec<SubLutRequest>,
    /// FFs to bind, with the pin they are bound through.
    pub ffs: Vec<(FfId, String)>,
}

/// Remembers which tiles were already checked for one translation.
struct TileCheck<'d> {
    device: &'d Device,
    seen: BTreeSet<String>,
}

impl<'d> TileCheck<'d> {
    fn new(device: &'d Device) -> Self {
        Self {
            device,
            seen: BTreeSet::new(),
        }
    }

    fn check(&mut self, original: &str, moved: &str) -> Result<(), RelocError> {
        if self.seen.contains(moved) {
            return Ok(());
        }
        let found = self
            .device
            .tile(moved)
            .ok_or_else(|| RelocError::MissingTile(moved.to_string()))?;
        let expected = self
            .device
            .tile(original)
            .ok_or_else(|| RelocError::MissingTile(original.to_string()))?;
        if found.tile_type != expected.tile_type {
            return Err(RelocError::TileType {
                tile: moved.to_string(),
                expected: expected.tile_type.clone(),
                found: found.tile_type.clone(),
            });
        }
        self.seen.insert(moved.to_string());
        Ok(())
    }
}

impl DCut {
    /// Translates `cut` of `snapshot` onto `target`.
    ///
    /// Every tile must exist with the same type, every wire must exist and
    /// every PIP must exist in its tile's type.
    pub fn relocate(
        device: &Device,
        snapshot: &MinConfigSnapshot,
        cut: &Cut,
        target: Coord,
    ) -> Result<Self, RelocError> {
        let (dx, dy) = snapshot.origin.delta_to(target);
        let mut tiles = TileCheck::new(device);
        let mv = |name: &str| relocate_node(name, dx, dy);

        let mut nodes = Vec::new();
        for node in cut.nodes() {
            let moved = mv(node)?;
            let from = NodeInfo::parse(node)?;
            let to = NodeInfo::parse(&moved)?;
            tiles.check(&from.tile, &to.tile)?;
            nodes.push(moved);
        }

        let mut edges = Vec::with_capacity(cut.edges.len());
        for e in &cut.edges {
            let (from, to) = (mv(&e.from)?, mv(&e.to)?);
            match e.kind {
                EdgeKind::Wire => {
                    if !device.has_wire(&from, &to) {
                        return Err(RelocError::MissingWire { from, to });
                    }
                }
                EdgeKind::Pip => {
                    let tail = NodeInfo::parse(&from)?;
                    let head = NodeInfo::parse(&to)?;
                    let exists = tail.tile == head.tile
                        && device
                            .tile(&tail.tile)
                            .is_some_and(|t| device.has_pip(&t.tile_type, &tail.port, &head.port));
                    if !exists {
                        return Err(RelocError::MissingPip { from, to });
                    }
                }
                EdgeKind::RouteThrough | EdgeKind::Virtual => {}
            }
            edges.push(CutEdge {
                from,
                to,
                kind: e.kind,
            });
        }

        let covered = cut
            .covered_pips()
            .iter()
            .map(|(a, b)| -> Result<_, RelocError> { Ok((mv(a)?, mv(b)?)) })
            .collect::<Result<Vec<_>, _>>()?;

        let mut subluts = Vec::with_capacity(cut.subluts.len());
        for &id in &cut.subluts {
            let s = snapshot.allocation.sublut(id);
            subluts.push(SubLutRequest {
                lut: LutId {
                    tile: relocate_tile(&s.lut.tile, dx, dy),
                    label: s.lut.label,
                },
                function: s.function,
                inputs: s
                    .inputs
                    .iter()
                    .map(|(pin, n)| -> Result<_, RelocError> { Ok((*pin, mv(n)?)) })
                    .collect::<Result<_, _>>()?,
                output: s.output.as_deref().map(|o| mv(o)).transpose()?.map(|o| (o, s.muxed)),
            });
        }

        let mut ffs = Vec::with_capacity(cut.ffs.len());
        for id in &cut.ffs {
            let Some(ff) = snapshot.allocation.ff(id) else {
                continue;
            };
            let moved = FfId {
                tile: relocate_tile(&id.tile, dx, dy),
                label: id.label,
                index: id.index,
            };
            ffs.push((moved, mv(&ff.node)?));
        }

        Ok(Self {
            config: snapshot.index,
            cut: cut.id,
            origin: snapshot.origin,
            target,
            pip: (mv(&cut.pip.0)?, mv(&cut.pip.1)?),
            nodes,
            edges,
            covered,
            subluts,
            ffs,
        })
    }

    /// PIP edges of the relocated Cut, main path and NotPath.
    pub fn pips(&self) -> impl Iterator<Item = &CutEdge> {
        self.edges.iter().filter(|e| e.kind == EdgeKind::Pip)
    }
}
