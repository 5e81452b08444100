//! What the router sees: the graph filtered through a configuration's
//! ledger, weighted by the shared costs, plus transient helper nodes.

use std::collections::{HashMap, HashSet};

use pipcov_arch::{virtual_node, Role};
use pipcov_common::Ident;

use crate::costs::EdgeCosts;
use crate::graph::{ArchGraph, EdgeKind};
use crate::ids::NodeId;
use crate::ledger::Ledger;

/// A weighted directed graph the router can search.
pub trait Network {
    /// Pushes `(next, cost)` for every usable edge leaving `node`.
    fn successors(&self, node: NodeId, out: &mut Vec<(NodeId, f64)>);

    /// Pushes `(prev, cost)` for every usable edge entering `node`.
    fn predecessors(&self, node: NodeId, out: &mut Vec<(NodeId, f64)>);

    /// Port name used for conflict-free routing; `None` for virtual and
    /// helper nodes, which never conflict.
    fn port(&self, node: NodeId) -> Option<Ident>;

    /// Returns `true` if the node may not appear on a path.
    fn is_blocked(&self, node: NodeId) -> bool;
}

/// Helper nodes and zero-or-weighted dummy edges layered over a graph for
/// one search. Helper ids start right after the graph's last node.
#[derive(Debug, Clone, Default)]
pub struct Overlay {
    first: u32,
    names: Vec<String>,
    out: HashMap<NodeId, Vec<(NodeId, f64)>>,
    into: HashMap<NodeId, Vec<(NodeId, f64)>>,
}

impl Overlay {
    /// An empty overlay for `graph`.
    pub fn new(graph: &ArchGraph) -> Self {
        Self {
            first: graph.node_count() as u32,
            ..Self::default()
        }
    }

    /// Adds a helper node named `VIRTUAL/<port>`.
    pub fn add_node(&mut self, port: &str) -> NodeId {
        let id = NodeId::from_raw(self.first + self.names.len() as u32);
        self.names.push(virtual_node(port));
        id
    }

    /// Adds a dummy edge.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, cost: f64) {
        self.out.entry(from).or_default().push((to, cost));
        self.into.entry(to).or_default().push((from, cost));
    }

    /// Returns `true` if `node` is a helper of this overlay.
    pub fn is_helper(&self, node: NodeId) -> bool {
        node.as_raw() >= self.first && ((node.as_raw() - self.first) as usize) < self.names.len()
    }

    /// Name of a helper node.
    pub fn name(&self, node: NodeId) -> Option<&str> {
        if !self.is_helper(node) {
            return None;
        }
        self.names
            .get((node.as_raw() - self.first) as usize)
            .map(String::as_str)
    }

    fn leaving(&self, node: NodeId) -> &[(NodeId, f64)] {
        self.out.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    fn entering(&self, node: NodeId) -> &[(NodeId, f64)] {
        self.into.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// The graph as one search of one configuration sees it.
pub struct SearchView<'a> {
    graph: &'a ArchGraph,
    ledger: &'a Ledger,
    costs: &'a EdgeCosts,
    overlay: Option<&'a Overlay>,
    forbid_route_through: bool,
    entry_only: HashSet<NodeId>,
    extra_blocked: HashSet<NodeId>,
    allowed: HashSet<NodeId>,
}

impl<'a> SearchView<'a> {
    /// A view with no helpers and no extra restrictions.
    pub fn new(graph: &'a ArchGraph, ledger: &'a Ledger, costs: &'a EdgeCosts) -> Self {
        Self {
            graph,
            ledger,
            costs,
            overlay: None,
            forbid_route_through: false,
            entry_only: HashSet::new(),
            extra_blocked: HashSet::new(),
            allowed: HashSet::new(),
        }
    }

    /// Layers helper nodes over the graph.
    pub fn with_overlay(mut self, overlay: &'a Overlay) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Drops every LUT route-through edge.
    pub fn forbid_route_through(mut self) -> Self {
        self.forbid_route_through = true;
        self
    }

    /// Nodes that may only be entered from a helper node.
    pub fn entry_only(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.entry_only.extend(nodes);
        self
    }

    /// Blocks nodes for this search only.
    pub fn block(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.extra_blocked.extend(nodes);
        self
    }

    /// Lets otherwise used or blocked nodes appear on the path.
    pub fn allow(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.allowed.extend(nodes);
        self
    }

    fn is_helper(&self, node: NodeId) -> bool {
        self.overlay.is_some_and(|o| o.is_helper(node))
    }

    fn edge_usable(&self, kind: EdgeKind) -> bool {
        !(self.forbid_route_through && kind == EdgeKind::RouteThrough)
    }
}

impl Network for SearchView<'_> {
    fn successors(&self, node: NodeId, out: &mut Vec<(NodeId, f64)>) {
        if let Some(overlay) = self.overlay {
            out.extend_from_slice(overlay.leaving(node));
            if overlay.is_helper(node) {
                return;
            }
        }
        for &e in self.graph.out_edges(node) {
            let edge = self.graph.edge(e);
            if self.ledger.is_edge_blocked(e)
                || !self.edge_usable(edge.kind)
                || self.entry_only.contains(&edge.to)
            {
                continue;
            }
            out.push((edge.to, self.costs.get(e)));
        }
    }

    fn predecessors(&self, node: NodeId, out: &mut Vec<(NodeId, f64)>) {
        if let Some(overlay) = self.overlay {
            out.extend_from_slice(overlay.entering(node));
            if overlay.is_helper(node) {
                return;
            }
        }
        if self.entry_only.contains(&node) {
            return;
        }
        for &e in self.graph.in_edges(node) {
            let edge = self.graph.edge(e);
            if self.ledger.is_edge_blocked(e) || !self.edge_usable(edge.kind) {
                continue;
            }
            out.push((edge.from, self.costs.get(e)));
        }
    }

    fn port(&self, node: NodeId) -> Option<Ident> {
        if self.is_helper(node) || !self.graph.contains(node) {
            return None;
        }
        let n = self.graph.node(node);
        (n.info.role != Role::Virtual).then_some(n.port)
    }

    fn is_blocked(&self, node: NodeId) -> bool {
        if self.is_helper(node) {
            return false;
        }
        if self.extra_blocked.contains(&node) {
            return true;
        }
        if self.allowed.contains(&node) {
            return false;
        }
        !self.ledger.is_free(node)
    }
}
