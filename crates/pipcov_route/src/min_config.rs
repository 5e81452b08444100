//! MinConfig: one test configuration, built one Cut at a time.
//!
//! A Cut attempt is a transaction over the configuration's ledger, clock
//! bindings and allocation tables. Every mutation is journaled; a failed
//! attempt replays the journal backwards and leaves the configuration
//! exactly as it found it. Only the shared [`EdgeCosts`] survive a failure,
//! which is how an over-long PIP gets steered away from.
//!
//! An attempt runs in four steps:
//!
//! 1. *Estimation*: a helper node linked to the heads of all queued PIPs is
//!    routed to the sink, then the source is routed to a helper linked from
//!    the tails of the queued PIPs with that head. The queued PIP joining the
//!    two is the candidate.
//! 2. *Main path*: the two legs are re-routed precisely, conflict-free first,
//!    and checked against the PIP's length limit.
//! 3. *Allocation*: both FFs and a buffer SubLUT per route-through.
//! 4. *NotPath*: a branch of the input leg is routed, without
//!    route-throughs, to a free input of the launch FF's own LUT, which
//!    inverts it back into the FF.

use std::collections::{HashMap, HashSet};

use pipcov_arch::{node_name, FfIndex, NodeInfo, Role, SiteFlavor};
use pipcov_common::{Coord, InternalError, PipcovResult};

use crate::alloc::{AllocError, Allocation, FfId, LutFunction, LutId, SubLutRequest};
use crate::clock::ClockCoordinator;
use crate::costs::{CostParams, EdgeCosts};
use crate::cut::{Cut, CutEdge};
use crate::error::FatalError;
use crate::graph::{ArchGraph, EdgeKind, SINK, SOURCE};
use crate::ids::{CutId, EdgeId, NodeId, SubLutId};
use crate::ledger::{Change, Journal, Ledger};
use crate::lengths::PipLengths;
use crate::router::{find_path, find_path_relaxing, RouteFailure};
use crate::view::{Overlay, SearchView};

const PIP_HEAD: &str = "PIP_HEAD";
const PIP_TAIL: &str = "PIP_TAIL";
const BRANCH: &str = "BRANCH";
const NOT_LUT: &str = "NOT_LUT";

/// LUT inputs the inverter may use; pin 6 would take the whole LUT.
const NOT_PINS: std::ops::RangeInclusive<u8> = 1..=5;

/// Why a Cut attempt was abandoned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptFailure {
    /// No queued PIP can be reached from the source and reach the sink.
    #[error("no queued PIP is routable")]
    NoCandidate,
    /// The leg from the source to the PIP tail failed.
    #[error("path_in: {0}")]
    PathIn(RouteFailure),
    /// The leg from the PIP head to the sink failed.
    #[error("path_out: {0}")]
    PathOut(RouteFailure),
    /// The joined main path was rejected.
    #[error("main path: {0}")]
    MainPath(RouteFailure),
    /// The inverter path failed.
    #[error("not path: {0}")]
    NotPath(RouteFailure),
    /// An FF or LUT was unavailable.
    #[error(transparent)]
    Alloc(AllocError),
}

/// A routed and allocated Cut waiting to be committed or rolled back.
#[derive(Debug)]
pub struct PendingCut {
    mark: usize,
    cut: Cut,
    pip: EdgeId,
    edges: Vec<EdgeId>,
    covered: Vec<EdgeId>,
}

impl PendingCut {
    /// The Cut as it would be committed.
    pub fn cut(&self) -> &Cut {
        &self.cut
    }

    /// The PIP under test.
    pub fn pip(&self) -> EdgeId {
        self.pip
    }
}

/// Result of the routing half of an attempt.
#[derive(Debug)]
pub enum Attempt {
    /// Everything routed and allocated; state changes are still journaled.
    Built(PendingCut),
    /// The attempt failed and was rolled back.
    Abandoned {
        /// The candidate PIP, if estimation picked one.
        pip: Option<EdgeId>,
        /// What failed.
        reason: AttemptFailure,
    },
}

/// Result of a complete attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The Cut is part of the configuration.
    Committed(CutId),
    /// The attempt failed and was rolled back.
    Abandoned {
        /// The candidate PIP, if estimation picked one.
        pip: Option<EdgeId>,
        /// What failed.
        reason: AttemptFailure,
    },
}

type Step<T> = PipcovResult<Result<T, AttemptFailure>>;

struct Estimate {
    pip: EdgeId,
    path_in: Vec<NodeId>,
    path_out: Vec<NodeId>,
}

struct Built {
    cut: Cut,
    pip: EdgeId,
    edges: Vec<EdgeId>,
    covered: Vec<EdgeId>,
}

/// One test configuration.
#[derive(Debug)]
pub struct MinConfig<'g> {
    graph: &'g ArchGraph,
    index: usize,
    length_slack: u32,
    params: CostParams,
    ledger: Ledger,
    journal: Journal,
    clocks: ClockCoordinator,
    alloc: Allocation,
    cuts: Vec<Cut>,
    covered: Vec<EdgeId>,
    parents: HashMap<NodeId, NodeId>,
    forest: HashSet<EdgeId>,
    finalized: bool,
}

impl<'g> MinConfig<'g> {
    /// Creates an empty configuration over `graph`.
    pub fn new(graph: &'g ArchGraph, index: usize, length_slack: u32, params: CostParams) -> Self {
        Self {
            graph,
            index,
            length_slack,
            params,
            ledger: Ledger::new(graph),
            journal: Journal::default(),
            clocks: ClockCoordinator::new(),
            alloc: Allocation::new(),
            cuts: Vec::new(),
            covered: Vec::new(),
            parents: HashMap::new(),
            forest: HashSet::new(),
            finalized: false,
        }
    }

    /// Index of this configuration within its run.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The graph this configuration routes on.
    pub fn graph(&self) -> &'g ArchGraph {
        self.graph
    }

    /// Origin of the graph window.
    pub fn origin(&self) -> Coord {
        self.graph.origin()
    }

    /// Node states.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Clock-group bindings.
    pub fn clocks(&self) -> &ClockCoordinator {
        &self.clocks
    }

    /// LUT, SubLUT and FF tables.
    pub fn allocation(&self) -> &Allocation {
        &self.alloc
    }

    /// Committed Cuts in order.
    pub fn cuts(&self) -> &[Cut] {
        &self.cuts
    }

    /// PIP edges exercised by the committed Cuts.
    pub fn covered(&self) -> &[EdgeId] {
        &self.covered
    }

    /// `(child, parent)` pairs of the committed edge forest.
    pub fn forest(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.parents.iter().map(|(&c, &p)| (c, p))
    }

    /// Returns `true` once [`finalize`](Self::finalize) ran.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn fatal(&self, cut: Option<CutId>) -> impl Fn(InternalError) -> FatalError {
        let origin = self.origin();
        move |source| FatalError::internal(origin, cut, source)
    }

    /// Attempts one Cut for one of the `queue` PIPs and commits it.
    pub fn try_cut(
        &mut self,
        queue: &[EdgeId],
        lengths: &PipLengths,
        costs: &mut EdgeCosts,
    ) -> Result<AttemptOutcome, FatalError> {
        match self.attempt(queue, lengths, costs)? {
            Attempt::Built(pending) => Ok(AttemptOutcome::Committed(self.commit(pending, costs)?)),
            Attempt::Abandoned { pip, reason } => Ok(AttemptOutcome::Abandoned { pip, reason }),
        }
    }

    /// Routes and allocates a Cut without committing it.
    ///
    /// A failed attempt is rolled back before returning.
    pub fn attempt(
        &mut self,
        queue: &[EdgeId],
        lengths: &PipLengths,
        costs: &mut EdgeCosts,
    ) -> Result<Attempt, FatalError> {
        let id = CutId::from_raw(self.cuts.len() as u32);
        if self.finalized {
            return Err(self.fatal(Some(id))(InternalError::new("attempt on a finalized configuration")));
        }
        let mark = self.journal.mark();
        let Some(estimate) = self.estimate(queue, costs) else {
            return Ok(Attempt::Abandoned {
                pip: None,
                reason: AttemptFailure::NoCandidate,
            });
        };
        let pip = estimate.pip;
        match self.build(id, estimate, lengths, costs).map_err(self.fatal(Some(id)))? {
            Ok(built) => Ok(Attempt::Built(PendingCut {
                mark,
                cut: built.cut,
                pip: built.pip,
                edges: built.edges,
                covered: built.covered,
            })),
            Err(reason) => {
                self.rollback_to(mark).map_err(self.fatal(Some(id)))?;
                Ok(Attempt::Abandoned { pip: Some(pip), reason })
            }
        }
    }

    /// Undoes a pending Cut.
    pub fn rollback(&mut self, pending: PendingCut) -> Result<(), FatalError> {
        let id = pending.cut.id;
        self.rollback_to(pending.mark).map_err(self.fatal(Some(id)))
    }

    fn rollback_to(&mut self, mark: usize) -> PipcovResult<()> {
        while let Some(change) = self.journal.pop_after(mark) {
            match change {
                Change::Node { node, prev } => self.ledger.restore_node(node, prev),
                Change::EdgeBlocked(e) => self.ledger.unblock_edge(e)?,
                Change::Clock(binding) => self.clocks.restore(&mut self.ledger, &binding)?,
                Change::Alloc(change) => self.alloc.undo(change)?,
            }
        }
        Ok(())
    }

    /// Merges a pending Cut into the configuration.
    ///
    /// Fails with [`FatalError::Collision`] if any of its edges is already
    /// committed or drives a node that already has a driver.
    pub fn commit(&mut self, pending: PendingCut, costs: &mut EdgeCosts) -> Result<CutId, FatalError> {
        let id = pending.cut.id;
        for &e in &pending.edges {
            let edge = self.graph.edge(e);
            let reason = if self.forest.contains(&e) {
                Some("edge already committed")
            } else if self.parents.contains_key(&edge.to) {
                Some("node already driven")
            } else {
                None
            };
            if let Some(reason) = reason {
                let (from, to) = self.graph.edge_names(e);
                return Err(FatalError::Collision {
                    origin: self.origin(),
                    cut: id,
                    from,
                    to,
                    reason,
                });
            }
            self.forest.insert(e);
            self.parents.insert(edge.to, edge.from);
        }
        costs.bump(pending.pip, self.params.covered_pip_penalty);
        self.covered.extend(pending.covered);
        self.journal.clear();
        self.cuts.push(pending.cut);
        Ok(id)
    }

    /// Tags every used LUT, SubLUT and FF blocked. No further Cuts can be
    /// attempted.
    pub fn finalize(&mut self) {
        self.alloc.finalize();
        self.journal.clear();
        self.finalized = true;
    }

    fn estimate(&self, queue: &[EdgeId], costs: &EdgeCosts) -> Option<Estimate> {
        let graph = self.graph;
        let usable: Vec<EdgeId> = queue
            .iter()
            .copied()
            .filter(|&p| {
                let e = graph.edge(p);
                self.ledger.is_free(e.from) && self.ledger.is_free(e.to)
            })
            .collect();

        let mut dead_heads = HashSet::new();
        loop {
            // Cheapest queued PIP per head, heads in queue order.
            let mut heads: Vec<NodeId> = Vec::new();
            let mut head_cost: HashMap<NodeId, f64> = HashMap::new();
            for &p in &usable {
                let v = graph.edge(p).to;
                if dead_heads.contains(&v) {
                    continue;
                }
                let c = costs.get(p);
                match head_cost.get_mut(&v) {
                    Some(old) => *old = old.min(c),
                    None => {
                        heads.push(v);
                        head_cost.insert(v, c);
                    }
                }
            }
            if heads.is_empty() {
                return None;
            }

            let mut overlay = Overlay::new(graph);
            let h = overlay.add_node(PIP_HEAD);
            for &v in &heads {
                overlay.add_edge(h, v, head_cost[&v]);
            }
            let view = SearchView::new(graph, &self.ledger, costs).with_overlay(&overlay);
            let out = find_path(&view, h, SINK, false).ok()?;
            let v = *out.get(1)?;

            let mut overlay = Overlay::new(graph);
            let t = overlay.add_node(PIP_TAIL);
            for &p in &usable {
                let e = graph.edge(p);
                if e.to == v {
                    overlay.add_edge(e.from, t, costs.get(p));
                }
            }
            let view = SearchView::new(graph, &self.ledger, costs)
                .with_overlay(&overlay)
                .block([v]);
            match find_path(&view, SOURCE, t, false) {
                Ok(mut path_in) => {
                    path_in.pop();
                    let u = *path_in.last()?;
                    let pip = graph.edge_between(u, v)?;
                    return Some(Estimate {
                        pip,
                        path_in,
                        path_out: out[1..].to_vec(),
                    });
                }
                Err(_) => {
                    dead_heads.insert(v);
                }
            }
        }
    }

    fn build(&mut self, id: CutId, est: Estimate, lengths: &PipLengths, costs: &mut EdgeCosts) -> Step<Built> {
        let graph = self.graph;
        let pip = est.pip;
        let edge = graph.edge(pip);
        let (u, v) = (edge.from, edge.to);

        let out_first = self.route_through_before_tail(&est.path_in) || est.path_out.len() < est.path_in.len();
        let mut path_in = Vec::new();
        let mut path_out = Vec::new();
        let mut relaxed = false;
        for leg_out in [out_first, !out_first] {
            if leg_out {
                match self.route_leg(id, v, SINK, u, costs)? {
                    Ok((p, r)) => {
                        path_out = p;
                        relaxed |= r;
                    }
                    Err(f) => return Ok(Err(AttemptFailure::PathOut(f))),
                }
            } else {
                match self.route_leg(id, SOURCE, u, v, costs)? {
                    Ok((p, r)) => {
                        path_in = p;
                        relaxed |= r;
                    }
                    Err(f) => return Ok(Err(AttemptFailure::PathIn(f))),
                }
            }
        }

        let mut main = path_in.clone();
        main.extend_from_slice(&path_out);
        let length = graph.path_length(&main);
        let limit = lengths
            .get(pip)
            .map_or(u32::MAX, |l| l.saturating_add(self.length_slack));
        if length > limit {
            costs.bump(pip, self.params.over_length_penalty);
            return Ok(Err(AttemptFailure::MainPath(RouteFailure::OverLength { length, limit })));
        }

        let (ffs, mut subluts) = match self.allocate_main(id, &main)? {
            Ok(parts) => parts,
            Err(f) => return Ok(Err(f)),
        };
        let (not_path, not_sublut, not_relaxed) = match self.route_not_path(id, &main, &path_in, costs)? {
            Ok(parts) => parts,
            Err(f) => return Ok(Err(f)),
        };
        relaxed |= not_relaxed;
        subluts.push(not_sublut);

        let mut edges = Vec::new();
        let mut covered = Vec::new();
        for (path, on_main) in [(&main, true), (&not_path, false)] {
            for w in path.windows(2) {
                let e = graph.edge_between(w[0], w[1]).ok_or_else(|| {
                    InternalError::new(format!(
                        "routed path steps over missing edge {} -> {}",
                        graph.name(w[0]),
                        graph.name(w[1])
                    ))
                })?;
                match graph.edge(e).kind {
                    EdgeKind::Virtual => continue,
                    EdgeKind::Pip if on_main => covered.push(e),
                    _ => {}
                }
                edges.push(e);
            }
        }

        let names = |p: &[NodeId]| -> Vec<String> { p.iter().map(|&n| graph.name(n).to_string()).collect() };
        let cut = Cut {
            id,
            origin: graph.origin(),
            config: self.index,
            pip: graph.edge_names(pip),
            main_path: names(&main),
            path_in: names(&path_in),
            path_out: names(&path_out),
            not_path: names(&not_path),
            relaxed,
            edges: edges
                .iter()
                .map(|&e| {
                    let (from, to) = graph.edge_names(e);
                    CutEdge {
                        from,
                        to,
                        kind: graph.edge(e).kind,
                    }
                })
                .collect(),
            covered: covered.iter().map(|&e| graph.edge_names(e)).collect(),
            subluts,
            ffs,
        };
        Ok(Ok(Built {
            cut,
            pip,
            edges,
            covered,
        }))
    }

    /// `true` if the estimated input leg reaches the tail through a LUT
    /// route-through right before it.
    fn route_through_before_tail(&self, path_in: &[NodeId]) -> bool {
        let n = path_in.len();
        n >= 3
            && self
                .graph
                .edge_between(path_in[n - 3], path_in[n - 2])
                .is_some_and(|e| self.graph.edge(e).kind == EdgeKind::RouteThrough)
    }

    /// Routes one leg of the main path, claims its nodes and binds the
    /// clock group of the FF it reaches.
    fn route_leg(
        &mut self,
        id: CutId,
        from: NodeId,
        to: NodeId,
        avoid: NodeId,
        costs: &EdgeCosts,
    ) -> PipcovResult<Result<(Vec<NodeId>, bool), RouteFailure>> {
        let found = {
            let view = SearchView::new(self.graph, &self.ledger, costs).block([avoid]);
            find_path_relaxing(&view, from, to)
        };
        let (path, relaxed) = match found {
            Ok(found) => found,
            Err(f) => return Ok(Err(f)),
        };
        for &n in &path {
            if n == SOURCE || n == SINK {
                continue;
            }
            self.ledger.use_node(n, id, &mut self.journal)?;
            self.clocks.set(self.graph, &mut self.ledger, n, &mut self.journal)?;
        }
        Ok(Ok((path, relaxed)))
    }

    /// Binds both FFs of the main path and a buffer SubLUT per
    /// route-through.
    fn allocate_main(&mut self, id: CutId, main: &[NodeId]) -> Step<(Vec<FfId>, Vec<SubLutId>)> {
        let graph = self.graph;
        if main.len() < 4 {
            return Err(InternalError::new(format!("main path of {} nodes", main.len())));
        }
        let mut ffs = Vec::new();
        for n in [main[1], main[main.len() - 2]] {
            let info = &graph.node(n).info;
            let (ff, other) = match info.role {
                Role::FfOutput { label, index } => (ff_id(info, label, index), Role::FfInput { label, index }),
                Role::FfInput { label, index } => (ff_id(info, label, index), Role::FfOutput { label, index }),
                _ => {
                    return Err(InternalError::new(format!(
                        "main path endpoint {} is not an FF pin",
                        graph.name(n)
                    )))
                }
            };
            if let Err(e) = self.alloc.use_ff(ff.clone(), graph.name(n), id, &mut self.journal) {
                return Ok(Err(AttemptFailure::Alloc(e)));
            }
            if let Some(o) = self.sibling_pin(info, other) {
                self.ledger.block_node(o, &mut self.journal);
            }
            ffs.push(ff);
        }

        let mut subluts = Vec::new();
        for w in main.windows(2) {
            let Some(e) = graph.edge_between(w[0], w[1]) else {
                continue;
            };
            if graph.edge(e).kind != EdgeKind::RouteThrough {
                continue;
            }
            let (a, b) = (graph.node(w[0]), graph.node(w[1]));
            let Role::LutInput { label, pin } = a.info.role else {
                return Err(InternalError::new(format!("route-through from non-LUT pin {}", a.name)));
            };
            let req = SubLutRequest {
                lut: LutId {
                    tile: a.info.tile.clone(),
                    label,
                },
                function: LutFunction::Buffer,
                inputs: vec![(pin, a.name.clone())],
                output: Some((b.name.clone(), matches!(b.info.role, Role::MuxOutput { .. }))),
            };
            match self.alloc.add_sublut(req, id, &mut self.journal) {
                Ok(s) => subluts.push(s),
                Err(e) => return Ok(Err(AttemptFailure::Alloc(e))),
            }
            self.block_lut_side_effects(&a.info, label);
        }
        Ok(Ok((ffs, subluts)))
    }

    /// Routes the inverter feedback from a branch of `path_in` into the
    /// launch FF's LUT and allocates the inverter.
    fn route_not_path(
        &mut self,
        id: CutId,
        main: &[NodeId],
        path_in: &[NodeId],
        costs: &EdgeCosts,
    ) -> Step<(Vec<NodeId>, SubLutId, bool)> {
        let graph = self.graph;
        let launch = &graph.node(main[1]).info;
        let Some(label) = launch.role.label() else {
            return Err(InternalError::new(format!("launch pin {} has no label", graph.name(main[1]))));
        };
        let lut = LutId {
            tile: launch.tile.clone(),
            label,
        };
        let request = SubLutRequest {
            lut: lut.clone(),
            function: LutFunction::Not,
            inputs: vec![(1, String::new())],
            output: None,
        };
        if let Err(e) = self.alloc.check_sublut(&request) {
            return Ok(Err(AttemptFailure::Alloc(e)));
        }

        // The PIP tail may branch too: fanning out of it gives no node a
        // second driver.
        let branches: Vec<NodeId> = path_in
            .get(1..)
            .unwrap_or(&[])
            .iter()
            .copied()
            .filter(|&n| {
                let role = graph.node(n).info.role;
                matches!(role, Role::FfOutput { .. } | Role::Wire) || role.is_clb_output()
            })
            .collect();
        let pins: Vec<(u8, NodeId)> = NOT_PINS
            .filter_map(|pin| {
                self.sibling_pin(launch, Role::LutInput { label, pin })
                    .filter(|&n| self.ledger.is_free(n))
                    .map(|n| (pin, n))
            })
            .collect();
        if branches.is_empty() || pins.is_empty() {
            return Ok(Err(AttemptFailure::NotPath(RouteFailure::NoPath)));
        }

        let found = {
            let mut overlay = Overlay::new(graph);
            let b = overlay.add_node(BRANCH);
            let z = overlay.add_node(NOT_LUT);
            for &n in &branches {
                overlay.add_edge(b, n, 0.0);
            }
            for &(_, n) in &pins {
                overlay.add_edge(n, z, 0.0);
            }
            let view = SearchView::new(graph, &self.ledger, costs)
                .with_overlay(&overlay)
                .forbid_route_through()
                .entry_only(branches.iter().copied())
                .allow(branches.iter().copied());
            find_path_relaxing(&view, b, z)
        };
        let (path, relaxed) = match found {
            Ok((path, relaxed)) if path.len() >= 4 => (path[1..path.len() - 1].to_vec(), relaxed),
            Ok(_) => return Ok(Err(AttemptFailure::NotPath(RouteFailure::NoPath))),
            Err(f) => return Ok(Err(AttemptFailure::NotPath(f))),
        };
        for &n in &path[1..] {
            self.ledger.use_node(n, id, &mut self.journal)?;
        }

        let last = path[path.len() - 1];
        let Some(&(pin, _)) = pins.iter().find(|(_, n)| *n == last) else {
            return Err(InternalError::new(format!("not path ends at {}", graph.name(last))));
        };
        let req = SubLutRequest {
            lut,
            function: LutFunction::Not,
            inputs: vec![(pin, graph.name(last).to_string())],
            output: None,
        };
        let sublut = match self.alloc.add_sublut(req, id, &mut self.journal) {
            Ok(s) => s,
            Err(e) => return Ok(Err(AttemptFailure::Alloc(e))),
        };
        self.block_lut_side_effects(launch, label);
        Ok(Ok((path, sublut, relaxed)))
    }

    /// Another pin of the logic tile `info` belongs to.
    fn sibling_pin(&self, info: &NodeInfo, role: Role) -> Option<NodeId> {
        let flavor = SiteFlavor::of_prefix(&info.prefix)?;
        let port = flavor.port(role)?;
        self.graph.node_id(&node_name(&info.tile, &port))
    }

    /// Blocks LUT pins the current SubLUTs make unusable: the 6th input
    /// once the LUT is split, the muxed output once O5 is taken, everything
    /// at capacity 0. Once no inverter fits, neither FF of the label can
    /// launch a Cut.
    fn block_lut_side_effects(&mut self, info: &NodeInfo, label: pipcov_arch::Label) {
        let id = LutId {
            tile: info.tile.clone(),
            label,
        };
        let Some(lut) = self.alloc.lut(&id) else {
            return;
        };
        let mut roles = Vec::new();
        if lut.subluts.iter().any(|&s| self.alloc.sublut(s).occupancy() == 1) {
            roles.push(Role::LutInput { label, pin: 6 });
        }
        if lut.o5.is_some() {
            roles.push(Role::MuxOutput { label });
        }
        if lut.capacity == 0 {
            roles.extend((1..=6).map(|pin| Role::LutInput { label, pin }));
            roles.push(Role::LutOutput { label });
            roles.push(Role::MuxOutput { label });
        }
        let no_inverter = lut.o5.is_some() || lut.capacity == 0;
        let nodes: Vec<NodeId> = roles.into_iter().filter_map(|r| self.sibling_pin(info, r)).collect();
        for n in nodes {
            self.ledger.block_node(n, &mut self.journal);
        }
        if no_inverter {
            self.block_launch(info, label);
        }
    }

    /// Blocks the `SOURCE -> FF output` edges of both FFs of `label`.
    fn block_launch(&mut self, info: &NodeInfo, label: pipcov_arch::Label) {
        for index in [FfIndex::Primary, FfIndex::Secondary] {
            let Some(q) = self.sibling_pin(info, Role::FfOutput { label, index }) else {
                continue;
            };
            if let Some(e) = self.graph.edge_between(SOURCE, q) {
                if !self.ledger.is_edge_blocked(e) {
                    self.ledger.block_edge(e, &mut self.journal);
                }
            }
        }
    }
}

fn ff_id(info: &NodeInfo, label: pipcov_arch::Label, index: pipcov_arch::FfIndex) -> FfId {
    FfId {
        tile: info.tile.clone(),
        label,
        index,
    }
}
