//! Minimum path length through each PIP under test.
//!
//! Distances count non-virtual edges and ignore blocking, so they are a
//! lower bound for any path a configuration can still route. They serve two
//! purposes: the coverage queue is ordered shortest first, and a routed path
//! longer than its PIP's minimum plus a slack is rejected as pathological.

use std::collections::{HashMap, VecDeque};

use crate::graph::{ArchGraph, EdgeKind, SINK, SOURCE};
use crate::ids::{EdgeId, NodeId};

/// Per-PIP minimum SOURCE -> PIP -> SINK length.
#[derive(Debug, Clone, Default)]
pub struct PipLengths {
    lengths: HashMap<EdgeId, u32>,
    unreachable: Vec<EdgeId>,
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

fn distances(graph: &ArchGraph, start: NodeId, dir: Direction) -> Vec<Option<u32>> {
    let mut dist = vec![None; graph.node_count()];
    let mut deque = VecDeque::new();
    dist[start.index()] = Some(0);
    deque.push_back(start);
    while let Some(n) = deque.pop_front() {
        let d = dist[n.index()].unwrap_or(0);
        let edges = match dir {
            Direction::Forward => graph.out_edges(n),
            Direction::Backward => graph.in_edges(n),
        };
        for &e in edges {
            let edge = graph.edge(e);
            let next = match dir {
                Direction::Forward => edge.to,
                Direction::Backward => edge.from,
            };
            let w = u32::from(edge.kind != EdgeKind::Virtual);
            let nd = d + w;
            if dist[next.index()].map_or(true, |old| nd < old) {
                dist[next.index()] = Some(nd);
                // 0-1 BFS: free edges go to the front.
                if w == 0 {
                    deque.push_front(next);
                } else {
                    deque.push_back(next);
                }
            }
        }
    }
    dist
}

impl PipLengths {
    /// Computes lengths for `pips`. PIPs unreachable from the source or
    /// unable to reach the sink are set aside.
    pub fn compute(graph: &ArchGraph, pips: &[EdgeId]) -> Self {
        let from_source = distances(graph, SOURCE, Direction::Forward);
        let to_sink = distances(graph, SINK, Direction::Backward);
        let mut out = Self::default();
        for &pip in pips {
            let edge = graph.edge(pip);
            match (from_source[edge.from.index()], to_sink[edge.to.index()]) {
                (Some(a), Some(b)) => {
                    out.lengths.insert(pip, a + 1 + b);
                }
                _ => out.unreachable.push(pip),
            }
        }
        out
    }

    /// Minimum length of a PIP, `None` if unreachable or not computed.
    pub fn get(&self, pip: EdgeId) -> Option<u32> {
        self.lengths.get(&pip).copied()
    }

    /// PIPs excluded because no path can use them.
    pub fn unreachable(&self) -> &[EdgeId] {
        &self.unreachable
    }

    /// Reachable PIPs ordered shortest first, ties by id.
    pub fn ordered(&self) -> Vec<EdgeId> {
        let mut pips: Vec<EdgeId> = self.lengths.keys().copied().collect();
        pips.sort_by_key(|&p| (self.lengths[&p], p));
        pips
    }

    /// Number of reachable PIPs.
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    /// Returns `true` if no PIP is reachable.
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use pipcov_arch::synthetic;
    use pipcov_common::Coord;

    const Q: &str = "CLEL_R_X0Y0/CLE_CLE_L_SITE_0_AQ";
    const X: &str = "CLEL_R_X0Y0/CLE_CLE_L_SITE_0_BX";

    fn chain() -> ArchGraph {
        let mut b = GraphBuilder::new();
        b.add_edge("VIRTUAL/SOURCE", Q, EdgeKind::Virtual);
        b.add_edge(Q, "INT_X0Y0/OUT", EdgeKind::Wire);
        b.add_edge("INT_X0Y0/OUT", "INT_X0Y0/MID", EdgeKind::Pip);
        b.add_edge("INT_X0Y0/MID", "INT_X0Y0/IN", EdgeKind::Pip);
        b.add_edge("INT_X0Y0/IN", X, EdgeKind::Wire);
        b.add_edge(X, "VIRTUAL/SINK", EdgeKind::Virtual);
        b.add_edge("INT_X0Y0/DEAD", "INT_X0Y0/MID", EdgeKind::Pip);
        b.finish(Coord::new(0, 0), 0)
    }

    #[test]
    fn lengths_count_non_virtual_edges() {
        let g = chain();
        let p1 = g.edge_by_names("INT_X0Y0/OUT", "INT_X0Y0/MID").unwrap();
        let p2 = g.edge_by_names("INT_X0Y0/MID", "INT_X0Y0/IN").unwrap();
        let dead = g.edge_by_names("INT_X0Y0/DEAD", "INT_X0Y0/MID").unwrap();
        let lengths = PipLengths::compute(&g, &[p1, p2, dead]);
        assert_eq!(lengths.get(p1), Some(4));
        assert_eq!(lengths.get(p2), Some(4));
        assert_eq!(lengths.get(dead), None);
        assert_eq!(lengths.unreachable(), &[dead]);
        assert_eq!(lengths.len(), 2);
    }

    #[test]
    fn ordered_shortest_first() {
        let dev = synthetic::build(4, 4);
        let g = ArchGraph::build(&dev, Coord::new(1, 1), 2);
        let pips = g.pips_at(Coord::new(1, 1));
        let lengths = PipLengths::compute(&g, &pips);
        let ordered = lengths.ordered();
        assert_eq!(ordered.len(), lengths.len());
        for w in ordered.windows(2) {
            assert!(lengths.get(w[0]) <= lengths.get(w[1]));
        }
        // The synthetic fabric at X1Y1 has a west logic tile, so every PIP
        // has some way in and out within radius 2.
        assert!(lengths.unreachable().is_empty());
    }
}
