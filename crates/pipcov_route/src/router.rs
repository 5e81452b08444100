//! Alternating bidirectional Dijkstra.
//!
//! Two searches grow from the source (forward) and the target (backward),
//! one settled node at a time in turn. Whenever a relaxed node has been
//! reached from both sides the joined path becomes a candidate; the search
//! ends as soon as one node is settled by both sides. With `conflict_free`
//! set, a candidate that passes through two nodes with the same port name is
//! rejected and the previous best is kept.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::ids::NodeId;
use crate::view::Network;

/// Why a route was not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RouteFailure {
    /// Source and target are not connected under current blocking.
    #[error("no path")]
    NoPath,
    /// A path exists but exceeds the length limit of its PIP.
    #[error("path length {length} exceeds limit {limit}")]
    OverLength {
        /// Non-virtual edges on the path.
        length: u32,
        /// Allowed maximum.
        limit: u32,
    },
    /// Every connecting path reused a port name.
    #[error("every path reuses a port")]
    PortConflict,
}

#[derive(Debug, Clone, Copy)]
struct State {
    cost: f64,
    seq: u64,
    node: NodeId,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on cost, then first pushed first.
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
struct Side {
    fringe: BinaryHeap<State>,
    settled: HashMap<NodeId, f64>,
    seen: HashMap<NodeId, f64>,
    pred: HashMap<NodeId, NodeId>,
}

impl Side {
    fn start(node: NodeId, seq: &mut u64) -> Self {
        let mut side = Side::default();
        side.seen.insert(node, 0.0);
        side.fringe.push(State {
            cost: 0.0,
            seq: *seq,
            node,
        });
        *seq += 1;
        side
    }

    /// Walks predecessors from `node` back to this side's start.
    fn trace(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = vec![node];
        let mut cur = node;
        while let Some(&prev) = self.pred.get(&cur) {
            out.push(prev);
            cur = prev;
        }
        out
    }
}

/// Returns `true` if no port name occurs twice on `path`.
pub fn ports_unique<N: Network>(net: &N, path: &[NodeId]) -> bool {
    let mut seen = HashSet::new();
    path.iter()
        .filter_map(|&n| net.port(n))
        .all(|port| seen.insert(port))
}

/// Finds the cheapest path from `source` to `target`.
///
/// Blocked nodes never appear on the path; a blocked source or target is
/// [`RouteFailure::NoPath`]. With `conflict_free`, only candidates passing
/// [`ports_unique`] are accepted, and [`RouteFailure::PortConflict`] is
/// returned if connecting paths existed but all were rejected.
pub fn find_path<N: Network>(
    net: &N,
    source: NodeId,
    target: NodeId,
    conflict_free: bool,
) -> Result<Vec<NodeId>, RouteFailure> {
    if net.is_blocked(source) || net.is_blocked(target) {
        return Err(RouteFailure::NoPath);
    }
    if source == target {
        return Ok(vec![source]);
    }

    let mut seq = 0u64;
    let mut sides = [Side::start(source, &mut seq), Side::start(target, &mut seq)];
    let mut best: Option<(f64, Vec<NodeId>)> = None;
    let mut rejected = false;
    let mut neighbors = Vec::new();
    let mut dir = 1;

    while !sides[0].fringe.is_empty() && !sides[1].fringe.is_empty() {
        dir = 1 - dir;
        let Some(State { cost, node: v, .. }) = sides[dir].fringe.pop() else {
            break;
        };
        if sides[dir].settled.contains_key(&v) {
            continue;
        }
        sides[dir].settled.insert(v, cost);
        if sides[1 - dir].settled.contains_key(&v) {
            break;
        }

        neighbors.clear();
        if dir == 0 {
            net.successors(v, &mut neighbors);
        } else {
            net.predecessors(v, &mut neighbors);
        }
        for &(w, edge_cost) in &neighbors {
            if net.is_blocked(w) || sides[dir].settled.contains_key(&w) {
                continue;
            }
            let length = cost + edge_cost;
            let improves = sides[dir].seen.get(&w).map_or(true, |&old| length < old);
            if !improves {
                continue;
            }
            let side = &mut sides[dir];
            side.seen.insert(w, length);
            side.pred.insert(w, v);
            side.fringe.push(State {
                cost: length,
                seq,
                node: w,
            });
            seq += 1;

            let (Some(&a), Some(&b)) = (sides[0].seen.get(&w), sides[1].seen.get(&w)) else {
                continue;
            };
            let total = a + b;
            if best.as_ref().is_some_and(|(d, _)| *d <= total) {
                continue;
            }
            let mut path = sides[0].trace(w);
            path.reverse();
            path.extend(sides[1].trace(w).into_iter().skip(1));
            if conflict_free && !ports_unique(net, &path) {
                rejected = true;
                continue;
            }
            best = Some((total, path));
        }
    }

    match best {
        Some((_, path)) => Ok(path),
        None if rejected => Err(RouteFailure::PortConflict),
        None => Err(RouteFailure::NoPath),
    }
}

/// Routes conflict-free first and falls back to a relaxed search.
///
/// The flag is `true` when only the relaxed search found the path.
pub fn find_path_relaxing<N: Network>(
    net: &N,
    source: NodeId,
    target: NodeId,
) -> Result<(Vec<NodeId>, bool), RouteFailure> {
    match find_path(net, source, target, true) {
        Ok(path) => Ok((path, false)),
        Err(_) => find_path(net, source, target, false).map(|path| (path, true)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipcov_common::{Ident, Interner};

    /// A hand-built network with explicit ports and blocking.
    struct Toy {
        edges: Vec<(u32, u32, f64)>,
        ports: Vec<Option<Ident>>,
        blocked: HashSet<u32>,
    }

    impl Toy {
        fn new(interner: &Interner, ports: &[&str], edges: &[(u32, u32, f64)]) -> Self {
            Self {
                edges: edges.to_vec(),
                ports: ports
                    .iter()
                    .map(|p| (!p.is_empty()).then(|| interner.get_or_intern(p)))
                    .collect(),
                blocked: HashSet::new(),
            }
        }
    }

    impl Network for Toy {
        fn successors(&self, node: NodeId, out: &mut Vec<(NodeId, f64)>) {
            for &(a, b, c) in &self.edges {
                if a == node.as_raw() {
                    out.push((NodeId::from_raw(b), c));
                }
            }
        }

        fn predecessors(&self, node: NodeId, out: &mut Vec<(NodeId, f64)>) {
            for &(a, b, c) in &self.edges {
                if b == node.as_raw() {
                    out.push((NodeId::from_raw(a), c));
                }
            }
        }

        fn port(&self, node: NodeId) -> Option<Ident> {
            self.ports[node.index()]
        }

        fn is_blocked(&self, node: NodeId) -> bool {
            self.blocked.contains(&node.as_raw())
        }
    }

    fn n(i: u32) -> NodeId {
        NodeId::from_raw(i)
    }

    fn raw(path: &[NodeId]) -> Vec<u32> {
        path.iter().map(|n| n.as_raw()).collect()
    }

    #[test]
    fn finds_cheapest_path() {
        let interner = Interner::new();
        let toy = Toy::new(
            &interner,
            &["a", "b", "c", "d"],
            &[(0, 1, 1.0), (1, 3, 1.0), (0, 2, 0.5), (2, 3, 0.5)],
        );
        assert_eq!(raw(&find_path(&toy, n(0), n(3), false).unwrap()), vec![0, 2, 3]);
    }

    #[test]
    fn blocked_nodes_are_avoided() {
        let interner = Interner::new();
        let mut toy = Toy::new(
            &interner,
            &["a", "b", "c", "d"],
            &[(0, 1, 1.0), (1, 3, 1.0), (0, 2, 0.5), (2, 3, 0.5)],
        );
        toy.blocked.insert(2);
        assert_eq!(raw(&find_path(&toy, n(0), n(3), false).unwrap()), vec![0, 1, 3]);
        toy.blocked.insert(1);
        assert_eq!(find_path(&toy, n(0), n(3), false), Err(RouteFailure::NoPath));
    }

    #[test]
    fn blocked_endpoints_fail() {
        let interner = Interner::new();
        let mut toy = Toy::new(&interner, &["a", "b"], &[(0, 1, 1.0)]);
        toy.blocked.insert(1);
        assert_eq!(find_path(&toy, n(0), n(1), false), Err(RouteFailure::NoPath));
    }

    #[test]
    fn conflict_free_rejects_reused_port() {
        let interner = Interner::new();
        // 0 -> 1 -> 3 reuses port "x"; 0 -> 2 -> 3 is dearer but clean.
        let toy = Toy::new(
            &interner,
            &["x", "y", "z", "x"],
            &[(0, 1, 1.0), (1, 3, 1.0), (0, 2, 5.0), (2, 3, 5.0)],
        );
        let relaxed = find_path(&toy, n(0), n(3), false).unwrap();
        assert_eq!(raw(&relaxed), vec![0, 1, 3]);
        assert!(!ports_unique(&toy, &relaxed));
    }

    #[test]
    fn conflict_free_keeps_clean_candidate() {
        let interner = Interner::new();
        // Start and end share no port; the cheap middle node reuses the
        // start's port.
        let toy = Toy::new(
            &interner,
            &["s", "s", "m", "t"],
            &[(0, 1, 1.0), (1, 3, 1.0), (0, 2, 5.0), (2, 3, 5.0)],
        );
        let path = find_path(&toy, n(0), n(3), true).unwrap();
        assert_eq!(raw(&path), vec![0, 2, 3]);
        assert!(ports_unique(&toy, &path));
    }

    #[test]
    fn port_conflict_when_all_candidates_rejected() {
        let interner = Interner::new();
        let toy = Toy::new(&interner, &["p", "q", "p"], &[(0, 1, 1.0), (1, 2, 1.0)]);
        assert_eq!(find_path(&toy, n(0), n(2), true), Err(RouteFailure::PortConflict));
        let (path, relaxed) = find_path_relaxing(&toy, n(0), n(2)).unwrap();
        assert_eq!(raw(&path), vec![0, 1, 2]);
        assert!(relaxed);

        let clean = Toy::new(&interner, &["p", "q", "r"], &[(0, 1, 1.0), (1, 2, 1.0)]);
        assert_eq!(find_path_relaxing(&clean, n(0), n(2)).map(|(_, r)| r), Ok(false));
    }

    #[test]
    fn dummy_nodes_do_not_conflict() {
        let interner = Interner::new();
        let toy = Toy::new(&interner, &["", "a", ""], &[(0, 1, 0.0), (1, 2, 0.0)]);
        assert_eq!(raw(&find_path(&toy, n(0), n(2), true).unwrap()), vec![0, 1, 2]);
    }

    #[test]
    fn trivial_path() {
        let interner = Interner::new();
        let toy = Toy::new(&interner, &["a"], &[]);
        assert_eq!(raw(&find_path(&toy, n(0), n(0), true).unwrap()), vec![0]);
    }
}
