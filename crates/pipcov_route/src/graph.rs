//! The Architecture Graph: routing resources of a coordinate window.
//!
//! Nodes are parsed once from their `TILE/PORT` names into an arena; edges
//! are PIPs of interconnect tiles, inter-tile wires, LUT route-throughs and
//! the virtual edges from the global source to every FF output and from
//! every FF input to the global sink. The graph is immutable after
//! construction: blocking lives in the [`Ledger`](crate::ledger::Ledger) and
//! weights in [`EdgeCosts`](crate::costs::EdgeCosts).

use std::collections::{BTreeSet, HashMap};

use pipcov_arch::{
    node_name, virtual_node, ClockGroup, Device, FfIndex, Label, NodeInfo, Role, SiteFlavor,
    TileKind, SINK_PORT, SOURCE_PORT,
};
use pipcov_common::{Coord, Ident, Interner};
use serde::{Deserialize, Serialize};

use crate::ids::{EdgeId, NodeId};

/// What kind of resource an edge is.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Programmable interconnect point inside an interconnect tile.
    Pip,
    /// Fixed connection between two tiles.
    Wire,
    /// LUT input to CLB output through the LUT used as a buffer.
    RouteThrough,
    /// Global source to FF output, or FF input to global sink.
    Virtual,
}

/// A node of the graph.
#[derive(Debug, Clone)]
pub struct GraphNode {
    /// `TILE/PORT`.
    pub name: String,
    /// Parsed attributes.
    pub info: NodeInfo,
    /// Interned port name.
    pub port: Ident,
}

/// A directed edge.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Edge {
    /// Driving node.
    pub from: NodeId,
    /// Driven node.
    pub to: NodeId,
    /// Resource kind.
    pub kind: EdgeKind,
}

/// Virtual edges of one clock group, split by the role they give the FF.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClockEdges {
    /// `SOURCE -> FF output` edges.
    pub launch: Vec<EdgeId>,
    /// `FF input -> SINK` edges.
    pub sample: Vec<EdgeId>,
}

/// Incremental graph construction with name-based deduplication.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<GraphNode>,
    by_name: HashMap<String, NodeId>,
    edges: Vec<Edge>,
    edge_index: HashMap<(NodeId, NodeId), EdgeId>,
    interner: Interner,
}

impl GraphBuilder {
    /// Creates a builder holding only the virtual source and sink.
    pub fn new() -> Self {
        let mut b = Self::default();
        b.add_node(&virtual_node(SOURCE_PORT));
        b.add_node(&virtual_node(SINK_PORT));
        b
    }

    /// Returns the node for `name`, adding it on first use.
    pub fn add_node(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let info = match NodeInfo::parse(name) {
            Ok(info) => info,
            Err(_) => NodeInfo::from_parts(name, ""),
        };
        let port = self.interner.get_or_intern(&info.port);
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(GraphNode {
            name: name.to_string(),
            info,
            port,
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Adds an edge between two named nodes. Repeated edges are ignored.
    pub fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind) -> EdgeId {
        let a = self.add_node(from);
        let b = self.add_node(to);
        if let Some(&e) = self.edge_index.get(&(a, b)) {
            return e;
        }
        let e = EdgeId::from_raw(self.edges.len() as u32);
        self.edges.push(Edge { from: a, to: b, kind });
        self.edge_index.insert((a, b), e);
        e
    }

    fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Freezes the graph.
    pub fn finish(self, origin: Coord, radius: i32) -> ArchGraph {
        let n = self.nodes.len();
        let mut out_edges = vec![Vec::new(); n];
        let mut in_edges = vec![Vec::new(); n];
        let mut clock_edges: HashMap<(Coord, ClockGroup), ClockEdges> = HashMap::new();
        for (i, edge) in self.edges.iter().enumerate() {
            let id = EdgeId::from_raw(i as u32);
            out_edges[edge.from.index()].push(id);
            in_edges[edge.to.index()].push(id);
            if edge.kind != EdgeKind::Virtual {
                continue;
            }
            let (ff, launch) = if edge.from == SOURCE {
                (&self.nodes[edge.to.index()], true)
            } else {
                (&self.nodes[edge.from.index()], false)
            };
            if let (Some(coord), Some(group)) = (ff.info.coord, ff.info.clock_group()) {
                let entry = clock_edges.entry((coord, group)).or_default();
                if launch {
                    entry.launch.push(id);
                } else {
                    entry.sample.push(id);
                }
            }
        }
        ArchGraph {
            origin,
            radius,
            nodes: self.nodes,
            by_name: self.by_name,
            edges: self.edges,
            edge_index: self.edge_index,
            out_edges,
            in_edges,
            clock_edges,
            interner: self.interner,
        }
    }
}

/// The global virtual source; always node 0.
pub const SOURCE: NodeId = NodeId::from_raw(0);
/// The global virtual sink; always node 1.
pub const SINK: NodeId = NodeId::from_raw(1);

/// Directed routing-resource graph of one coordinate window.
#[derive(Debug)]
pub struct ArchGraph {
    origin: Coord,
    radius: i32,
    nodes: Vec<GraphNode>,
    by_name: HashMap<String, NodeId>,
    edges: Vec<Edge>,
    edge_index: HashMap<(NodeId, NodeId), EdgeId>,
    out_edges: Vec<Vec<EdgeId>>,
    in_edges: Vec<Vec<EdgeId>>,
    clock_edges: HashMap<(Coord, ClockGroup), ClockEdges>,
    interner: Interner,
}

impl ArchGraph {
    /// Builds the graph of every tile within Chebyshev distance `radius`
    /// of `origin`.
    pub fn build(device: &Device, origin: Coord, radius: i32) -> Self {
        let window: BTreeSet<Coord> = device
            .int_coords()
            .iter()
            .copied()
            .filter(|c| c.chebyshev(origin) <= radius)
            .collect();
        let mut b = GraphBuilder::new();
        let source = virtual_node(SOURCE_PORT);
        let sink = virtual_node(SINK_PORT);

        for &coord in &window {
            for tile in device.tiles_at(coord) {
                match tile.kind {
                    TileKind::Int => {
                        for pip in device.pips_of_tile(&tile.name) {
                            b.add_edge(
                                &node_name(&tile.name, &pip.src),
                                &node_name(&tile.name, &pip.dst),
                                EdgeKind::Pip,
                            );
                        }
                    }
                    TileKind::LogicWest | TileKind::LogicEast => {
                        let Some(flavor) = SiteFlavor::of_prefix(&tile.tile_type) else {
                            continue;
                        };
                        let port = |role: Role| flavor.port(role).map(|p| node_name(&tile.name, &p));
                        for label in Label::all() {
                            add_logic_edges(&mut b, label, &port, &source, &sink);
                        }
                    }
                    TileKind::Virtual | TileKind::Other => {}
                }
            }
        }

        // Wires are added only between nodes already in the window.
        let names: Vec<String> = b.nodes.iter().map(|n| n.name.clone()).collect();
        for name in &names {
            for to in device.wires_from(name) {
                if b.contains(to) {
                    b.add_edge(name, to, EdgeKind::Wire);
                }
            }
        }
        b.finish(origin, radius)
    }

    /// Centre of the window.
    pub fn origin(&self) -> Coord {
        self.origin
    }

    /// Window radius.
    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The node with the given id.
    pub fn node(&self, id: NodeId) -> &GraphNode {
        &self.nodes[id.index()]
    }

    /// Name of a node.
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.index()].name
    }

    /// Looks up a node by name.
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// The edge with the given id.
    pub fn edge(&self, id: EdgeId) -> Edge {
        self.edges[id.index()]
    }

    /// Looks up the edge `from -> to`.
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.edge_index.get(&(from, to)).copied()
    }

    /// All edge ids.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> {
        (0..self.edges.len() as u32).map(EdgeId::from_raw)
    }

    /// Outgoing edges of a node.
    pub fn out_edges(&self, id: NodeId) -> &[EdgeId] {
        &self.out_edges[id.index()]
    }

    /// Incoming edges of a node.
    pub fn in_edges(&self, id: NodeId) -> &[EdgeId] {
        &self.in_edges[id.index()]
    }

    /// Returns `true` if `id` names a node of this graph.
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// `(src, dst)` names of an edge.
    pub fn edge_names(&self, id: EdgeId) -> (String, String) {
        let e = self.edge(id);
        (self.name(e.from).to_string(), self.name(e.to).to_string())
    }

    /// Looks up an edge by endpoint names.
    pub fn edge_by_names(&self, from: &str, to: &str) -> Option<EdgeId> {
        self.edge_between(self.node_id(from)?, self.node_id(to)?)
    }

    /// PIP edges of the interconnect tile at `coord`.
    pub fn pips_at(&self, coord: Coord) -> Vec<EdgeId> {
        self.edge_ids()
            .filter(|&e| {
                let edge = self.edge(e);
                let info = &self.node(edge.from).info;
                edge.kind == EdgeKind::Pip && info.tile_kind == TileKind::Int && info.coord == Some(coord)
            })
            .collect()
    }

    /// Virtual edges of a clock group.
    pub fn clock_edges(&self, coord: Coord, group: ClockGroup) -> Option<&ClockEdges> {
        self.clock_edges.get(&(coord, group))
    }

    /// The port interner.
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Number of non-virtual edges along a node path.
    pub fn path_length(&self, path: &[NodeId]) -> u32 {
        path.windows(2)
            .filter_map(|w| self.edge_between(w[0], w[1]))
            .filter(|&e| self.edge(e).kind != EdgeKind::Virtual)
            .count() as u32
    }
}

fn add_logic_edges(
    b: &mut GraphBuilder,
    label: Label,
    port: &impl Fn(Role) -> Option<String>,
    source: &str,
    sink: &str,
) {
    let outputs = [Role::LutOutput { label }, Role::MuxOutput { label }];
    for pin in 1..=6 {
        let Some(input) = port(Role::LutInput { label, pin }) else {
            continue;
        };
        for out in outputs {
            if let Some(out) = port(out) {
                b.add_edge(&input, &out, EdgeKind::RouteThrough);
            }
        }
    }
    for index in [FfIndex::Primary, FfIndex::Secondary] {
        if let Some(q) = port(Role::FfOutput { label, index }) {
            b.add_edge(source, &q, EdgeKind::Virtual);
        }
        if let Some(d) = port(Role::FfInput { label, index }) {
            b.add_edge(&d, sink, EdgeKind::Virtual);
        }
    }
}
