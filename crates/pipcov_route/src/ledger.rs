//! The resource ledger: which nodes and edges a configuration has consumed.
//!
//! The graph itself is never edited. Every node carries a [`NodeState`] and
//! every edge a block counter; the router consults both. All mutations go
//! through methods that append their inverse to a [`Journal`], so rolling
//! back a failed Cut is a replay of the journal in reverse.

use pipcov_common::{InternalError, PipcovResult};
use serde::{Deserialize, Serialize};

use crate::alloc::AllocChange;
use crate::clock::ClockBinding;
use crate::graph::ArchGraph;
use crate::ids::{CutId, EdgeId, NodeId};

/// Occupancy of one routing resource.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum NodeState {
    /// Available to the router.
    #[default]
    Free,
    /// Part of a Cut.
    Used(CutId),
    /// Unavailable for the rest of the configuration.
    Blocked,
}

/// One reversible mutation of configuration state.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// A node changed state; `prev` is what it was.
    Node {
        /// The node.
        node: NodeId,
        /// Its state before the change.
        prev: NodeState,
    },
    /// An edge block counter was incremented.
    EdgeBlocked(EdgeId),
    /// A clock group was bound.
    Clock(ClockBinding),
    /// An allocation table entry changed.
    Alloc(AllocChange),
}

/// Ordered log of changes made since the last commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Journal {
    changes: Vec<Change>,
}

impl Journal {
    /// Appends a change.
    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    /// Current position, to roll back to later.
    pub fn mark(&self) -> usize {
        self.changes.len()
    }

    /// Removes and returns the newest change if it was made after `mark`.
    pub fn pop_after(&mut self, mark: usize) -> Option<Change> {
        if self.changes.len() > mark {
            self.changes.pop()
        } else {
            None
        }
    }

    /// Forgets every change; they can no longer be undone.
    pub fn clear(&mut self) {
        self.changes.clear();
    }

    /// Number of recorded changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns `true` if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Node states and edge block counters of one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    nodes: Vec<NodeState>,
    edge_blocks: Vec<u32>,
}

impl Ledger {
    /// A ledger with every resource free.
    pub fn new(graph: &ArchGraph) -> Self {
        Self {
            nodes: vec![NodeState::Free; graph.node_count()],
            edge_blocks: vec![0; graph.edge_count()],
        }
    }

    /// State of a node. Nodes outside the graph (search helpers) are free.
    pub fn state(&self, node: NodeId) -> NodeState {
        self.nodes.get(node.index()).copied().unwrap_or_default()
    }

    /// Returns `true` if the node is free.
    pub fn is_free(&self, node: NodeId) -> bool {
        self.state(node) == NodeState::Free
    }

    /// Returns `true` if the edge is blocked at least once.
    pub fn is_edge_blocked(&self, edge: EdgeId) -> bool {
        self.edge_blocks[edge.index()] > 0
    }

    /// Marks a free node as used by `cut`.
    pub fn use_node(&mut self, node: NodeId, cut: CutId, journal: &mut Journal) -> PipcovResult<()> {
        let prev = self.state(node);
        if prev != NodeState::Free {
            return Err(InternalError::new(format!(
                "node {node} claimed by {cut} is already {prev:?}"
            )));
        }
        self.set(node, NodeState::Used(cut), journal);
        Ok(())
    }

    /// Blocks a node if it is still free; used or blocked nodes are left as
    /// they are.
    pub fn block_node(&mut self, node: NodeId, journal: &mut Journal) {
        if self.is_free(node) {
            self.set(node, NodeState::Blocked, journal);
        }
    }

    fn set(&mut self, node: NodeId, state: NodeState, journal: &mut Journal) {
        let slot = &mut self.nodes[node.index()];
        journal.push(Change::Node { node, prev: *slot });
        *slot = state;
    }

    /// Increments an edge's block counter.
    pub fn block_edge(&mut self, edge: EdgeId, journal: &mut Journal) {
        self.edge_blocks[edge.index()] += 1;
        journal.push(Change::EdgeBlocked(edge));
    }

    /// Increments an edge's block counter without journaling; the caller
    /// keeps its own record.
    pub(crate) fn block_edge_unjournaled(&mut self, edge: EdgeId) {
        self.edge_blocks[edge.index()] += 1;
    }

    /// Decrements an edge's block counter.
    pub(crate) fn unblock_edge(&mut self, edge: EdgeId) -> PipcovResult<()> {
        let count = &mut self.edge_blocks[edge.index()];
        if *count == 0 {
            return Err(InternalError::new(format!("unblocking edge {edge} that is not blocked")));
        }
        *count -= 1;
        Ok(())
    }

    /// Puts a node back into a recorded state.
    pub(crate) fn restore_node(&mut self, node: NodeId, prev: NodeState) {
        self.nodes[node.index()] = prev;
    }

    /// Every node currently used by a Cut.
    pub fn used_nodes(&self) -> impl Iterator<Item = (NodeId, CutId)> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, s)| match s {
            NodeState::Used(cut) => Some((NodeId::from_raw(i as u32), *cut)),
            _ => None,
        })
    }

    /// Every blocked node.
    pub fn blocked_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == NodeState::Blocked)
            .map(|(i, _)| NodeId::from_raw(i as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, GraphBuilder};
    use pipcov_common::Coord;

    fn graph() -> ArchGraph {
        let mut b = GraphBuilder::new();
        b.add_edge("INT_X0Y0/A", "INT_X0Y0/B", EdgeKind::Pip);
        b.finish(Coord::new(0, 0), 0)
    }

    #[test]
    fn use_then_undo() {
        let g = graph();
        let mut ledger = Ledger::new(&g);
        let before = ledger.clone();
        let mut journal = Journal::default();
        let a = g.node_id("INT_X0Y0/A").unwrap();
        ledger.use_node(a, CutId::from_raw(0), &mut journal).unwrap();
        assert_eq!(ledger.state(a), NodeState::Used(CutId::from_raw(0)));
        assert_eq!(ledger.used_nodes().count(), 1);
        match journal.pop_after(0) {
            Some(Change::Node { node, prev }) => ledger.restore_node(node, prev),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(ledger, before);
    }

    #[test]
    fn double_use_is_internal_error() {
        let g = graph();
        let mut ledger = Ledger::new(&g);
        let mut journal = Journal::default();
        let a = g.node_id("INT_X0Y0/A").unwrap();
        ledger.use_node(a, CutId::from_raw(0), &mut journal).unwrap();
        assert!(ledger.use_node(a, CutId::from_raw(1), &mut journal).is_err());
    }

    #[test]
    fn block_node_leaves_used_nodes() {
        let g = graph();
        let mut ledger = Ledger::new(&g);
        let mut journal = Journal::default();
        let a = g.node_id("INT_X0Y0/A").unwrap();
        let b = g.node_id("INT_X0Y0/B").unwrap();
        ledger.use_node(a, CutId::from_raw(0), &mut journal).unwrap();
        ledger.block_node(a, &mut journal);
        ledger.block_node(b, &mut journal);
        assert_eq!(ledger.state(a), NodeState::Used(CutId::from_raw(0)));
        assert_eq!(ledger.state(b), NodeState::Blocked);
        assert_eq!(journal.len(), 2);
        assert_eq!(ledger.blocked_nodes().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn edge_counters_nest() {
        let g = graph();
        let mut ledger = Ledger::new(&g);
        let mut journal = Journal::default();
        let e = EdgeId::from_raw(0);
        ledger.block_edge(e, &mut journal);
        ledger.block_edge_unjournaled(e);
        ledger.unblock_edge(e).unwrap();
        assert!(ledger.is_edge_blocked(e));
        ledger.unblock_edge(e).unwrap();
        assert!(!ledger.is_edge_blocked(e));
        assert!(ledger.unblock_edge(e).is_err());
    }

    #[test]
    fn helper_nodes_are_free() {
        let g = graph();
        let ledger = Ledger::new(&g);
        assert!(ledger.is_free(NodeId::from_raw(1000)));
    }

    #[test]
    fn journal_marks() {
        let mut journal = Journal::default();
        journal.push(Change::EdgeBlocked(EdgeId::from_raw(0)));
        let mark = journal.mark();
        journal.push(Change::EdgeBlocked(EdgeId::from_raw(1)));
        assert_eq!(journal.pop_after(mark), Some(Change::EdgeBlocked(EdgeId::from_raw(1))));
        assert_eq!(journal.pop_after(mark), None);
        assert_eq!(journal.len(), 1);
    }
}
