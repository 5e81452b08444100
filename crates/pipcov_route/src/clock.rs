//! Clock Domain/Group Coordinator.
//!
//! Every FF of one clock group shares a clock net, so within one
//! configuration a group either launches or samples. The first FF of a
//! group used by a Cut binds the group; binding blocks the group's virtual
//! edges of the other role and the conflicting sibling group's edges of the
//! same role. The blocked edges are logged in the [`ClockBinding`] so
//! rollback unblocks exactly those and nothing else.

use std::collections::BTreeMap;
use std::fmt;

use pipcov_arch::{ClockGroup, Role};
use pipcov_common::{Coord, InternalError, PipcovResult};
use serde::{Deserialize, Serialize};

use crate::graph::ArchGraph;
use crate::ids::{EdgeId, NodeId};
use crate::ledger::{Change, Journal, Ledger};

/// Role of a clock group within one configuration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Domain {
    /// FFs drive test paths.
    Launch,
    /// FFs capture test paths.
    Sample,
}

impl Domain {
    /// The complementary role.
    pub fn other(self) -> Self {
        match self {
            Domain::Launch => Domain::Sample,
            Domain::Sample => Domain::Launch,
        }
    }

    /// Domain an FF pin puts its group into, if it is an FF pin.
    pub fn of_role(role: Role) -> Option<Self> {
        match role {
            Role::FfOutput { .. } => Some(Domain::Launch),
            Role::FfInput { .. } => Some(Domain::Sample),
            _ => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Launch => write!(f, "launch"),
            Domain::Sample => write!(f, "sample"),
        }
    }
}

/// A recorded binding, with the edges it blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockBinding {
    /// Coordinate of the group.
    pub coord: Coord,
    /// The group.
    pub group: ClockGroup,
    /// Its role.
    pub domain: Domain,
    /// Virtual edges blocked when the group was bound.
    pub blocked_edges: Vec<EdgeId>,
}

/// Group-to-domain assignments of one configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClockCoordinator {
    bindings: BTreeMap<(Coord, ClockGroup), Domain>,
}

impl ClockCoordinator {
    /// Creates a coordinator with every group unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current domain of a group.
    pub fn domain(&self, coord: Coord, group: ClockGroup) -> Option<Domain> {
        self.bindings.get(&(coord, group)).copied()
    }

    /// All bound groups in coordinate order.
    pub fn bindings(&self) -> impl Iterator<Item = (Coord, ClockGroup, Domain)> + '_ {
        self.bindings.iter().map(|(&(c, g), &d)| (c, g, d))
    }

    /// Binds the group of `ff` to the domain its pin implies.
    ///
    /// Nodes that are not FF pins are ignored.
    pub fn set(
        &mut self,
        graph: &ArchGraph,
        ledger: &mut Ledger,
        ff: NodeId,
        journal: &mut Journal,
    ) -> PipcovResult<()> {
        let info = &graph.node(ff).info;
        let (Some(coord), Some(group), Some(domain)) =
            (info.coord, info.clock_group(), Domain::of_role(info.role))
        else {
            return Ok(());
        };
        self.bind(graph, ledger, coord, group, domain, journal)
    }

    /// Binds `group` at `coord` to `domain`.
    ///
    /// Binding an already bound group to the same domain does nothing; to
    /// the other domain it is an internal error.
    pub fn bind(
        &mut self,
        graph: &ArchGraph,
        ledger: &mut Ledger,
        coord: Coord,
        group: ClockGroup,
        domain: Domain,
        journal: &mut Journal,
    ) -> PipcovResult<()> {
        match self.domain(coord, group) {
            Some(d) if d == domain => return Ok(()),
            Some(d) => {
                return Err(InternalError::new(format!(
                    "clock group {group} at {coord} is {d}, cannot rebind to {domain}"
                )))
            }
            None => {}
        }

        let mut blocked_edges = Vec::new();
        if let Some(own) = graph.clock_edges(coord, group) {
            blocked_edges.extend(match domain {
                Domain::Launch => &own.sample,
                Domain::Sample => &own.launch,
            });
        }
        if let Some(sibling) = graph.clock_edges(coord, group.sibling()) {
            blocked_edges.extend(match domain {
                Domain::Launch => &sibling.launch,
                Domain::Sample => &sibling.sample,
            });
        }
        for &e in &blocked_edges {
            ledger.block_edge_unjournaled(e);
        }
        self.bindings.insert((coord, group), domain);
        journal.push(Change::Clock(ClockBinding {
            coord,
            group,
            domain,
            blocked_edges,
        }));
        Ok(())
    }

    /// Undoes one binding: unsets the group and unblocks exactly the edges
    /// it blocked.
    pub(crate) fn restore(&mut self, ledger: &mut Ledger, binding: &ClockBinding) -> PipcovResult<()> {
        if self.bindings.remove(&(binding.coord, binding.group)) != Some(binding.domain) {
            return Err(InternalError::new(format!(
                "restoring clock group {} at {} which is not bound to {}",
                binding.group, binding.coord, binding.domain
            )));
        }
        for &e in &binding.blocked_edges {
            ledger.unblock_edge(e)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipcov_arch::{synthetic, Half, Side};

    fn setup() -> (ArchGraph, Ledger) {
        let dev = synthetic::build(3, 3);
        let g = ArchGraph::build(&dev, Coord::new(1, 1), 0);
        let ledger = Ledger::new(&g);
        (g, ledger)
    }

    const EAST_BOTTOM: ClockGroup = ClockGroup {
        side: Side::East,
        half: Half::Bottom,
    };

    #[test]
    fn set_derives_domain_from_pin() {
        let (g, mut ledger) = setup();
        let mut clocks = ClockCoordinator::new();
        let mut journal = Journal::default();
        let q = g.node_id("CLEL_R_X1Y1/CLE_CLE_L_SITE_0_AQ").unwrap();
        clocks.set(&g, &mut ledger, q, &mut journal).unwrap();
        assert_eq!(clocks.domain(Coord::new(1, 1), EAST_BOTTOM), Some(Domain::Launch));

        // LUT pins do not bind anything.
        let a1 = g.node_id("CLEL_R_X1Y1/CLE_CLE_L_SITE_0_A1").unwrap();
        clocks.set(&g, &mut ledger, a1, &mut journal).unwrap();
        assert_eq!(clocks.bindings().count(), 1);
    }

    #[test]
    fn binding_blocks_opposite_role_and_sibling() {
        let (g, mut ledger) = setup();
        let mut clocks = ClockCoordinator::new();
        let mut journal = Journal::default();
        let c = Coord::new(1, 1);
        clocks
            .bind(&g, &mut ledger, c, EAST_BOTTOM, Domain::Launch, &mut journal)
            .unwrap();
        let own = g.clock_edges(c, EAST_BOTTOM).unwrap();
        let sib = g.clock_edges(c, EAST_BOTTOM.sibling()).unwrap();
        assert!(own.sample.iter().all(|&e| ledger.is_edge_blocked(e)));
        assert!(own.launch.iter().all(|&e| !ledger.is_edge_blocked(e)));
        assert!(sib.launch.iter().all(|&e| ledger.is_edge_blocked(e)));
        assert!(sib.sample.iter().all(|&e| !ledger.is_edge_blocked(e)));
    }

    #[test]
    fn rebind_same_domain_is_noop_other_is_error() {
        let (g, mut ledger) = setup();
        let mut clocks = ClockCoordinator::new();
        let mut journal = Journal::default();
        let c = Coord::new(1, 1);
        clocks
            .bind(&g, &mut ledger, c, EAST_BOTTOM, Domain::Sample, &mut journal)
            .unwrap();
        clocks
            .bind(&g, &mut ledger, c, EAST_BOTTOM, Domain::Sample, &mut journal)
            .unwrap();
        assert_eq!(journal.len(), 1);
        assert!(clocks
            .bind(&g, &mut ledger, c, EAST_BOTTOM, Domain::Launch, &mut journal)
            .is_err());
    }

    #[test]
    fn restore_is_exact() {
        let (g, mut ledger) = setup();
        let before = ledger.clone();
        let mut clocks = ClockCoordinator::new();
        let mut journal = Journal::default();
        let c = Coord::new(1, 1);
        let top = ClockGroup {
            side: Side::West,
            half: Half::Top,
        };
        clocks
            .bind(&g, &mut ledger, c, EAST_BOTTOM, Domain::Launch, &mut journal)
            .unwrap();
        clocks
            .bind(&g, &mut ledger, c, top, Domain::Sample, &mut journal)
            .unwrap();
        while let Some(change) = journal.pop_after(0) {
            let Change::Clock(binding) = change else {
                panic!("unexpected change");
            };
            clocks.restore(&mut ledger, &binding).unwrap();
        }
        assert_eq!(ledger, before);
        assert_eq!(clocks, ClockCoordinator::new());
    }

    #[test]
    fn overlapping_blocks_nest() {
        let (g, mut ledger) = setup();
        let mut clocks = ClockCoordinator::new();
        let mut journal = Journal::default();
        let c = Coord::new(1, 1);
        // The sibling's launch binding blocks our launch edges a second time.
        clocks
            .bind(&g, &mut ledger, c, EAST_BOTTOM, Domain::Sample, &mut journal)
            .unwrap();
        clocks
            .bind(&g, &mut ledger, c, EAST_BOTTOM.sibling(), Domain::Launch, &mut journal)
            .unwrap();
        let Some(Change::Clock(last)) = journal.pop_after(1) else {
            panic!("expected clock change");
        };
        clocks.restore(&mut ledger, &last).unwrap();
        // Still blocked by the first binding.
        let own = g.clock_edges(c, EAST_BOTTOM).unwrap();
        assert!(own.launch.iter().all(|&e| ledger.is_edge_blocked(e)));
    }
}
