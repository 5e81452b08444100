//! Edge weights shared by every configuration of one coverage run.
//!
//! Costs start from a base weight per edge kind and are raised whenever a
//! PIP gets covered or produces an over-long path, steering later searches
//! elsewhere. When progress stalls the whole table is reset to its base.

use pipcov_arch::Role;
use serde::{Deserialize, Serialize};

use crate::graph::{ArchGraph, EdgeKind};
use crate::ids::EdgeId;

/// Cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostParams {
    /// Weight of every non-virtual edge.
    pub base: f64,
    /// Added to LUT route-through edges.
    pub route_through_penalty: f64,
    /// Added to edges entering a muxed CLB output.
    pub mux_penalty: f64,
    /// Added to a PIP each time a Cut covers it.
    pub covered_pip_penalty: f64,
    /// Added to a PIP whose path exceeded its length limit.
    pub over_length_penalty: f64,
}

impl Default for CostParams {
    fn default() -> Self {
        Self {
            base: 1.0,
            route_through_penalty: 4.0,
            mux_penalty: 2.0,
            covered_pip_penalty: 8.0,
            over_length_penalty: 16.0,
        }
    }
}

/// Current and base weight of every edge of one graph.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeCosts {
    base: Vec<f64>,
    current: Vec<f64>,
}

impl EdgeCosts {
    /// Computes base costs: virtual edges are free, route-throughs and
    /// edges into muxed outputs carry their penalties.
    pub fn new(graph: &ArchGraph, params: &CostParams) -> Self {
        let base: Vec<f64> = graph
            .edge_ids()
            .map(|e| {
                let edge = graph.edge(e);
                if edge.kind == EdgeKind::Virtual {
                    return 0.0;
                }
                let mut cost = params.base;
                if edge.kind == EdgeKind::RouteThrough {
                    cost += params.route_through_penalty;
                }
                if matches!(graph.node(edge.to).info.role, Role::MuxOutput { .. }) {
                    cost += params.mux_penalty;
                }
                cost
            })
            .collect();
        Self {
            current: base.clone(),
            base,
        }
    }

    /// Current weight of an edge.
    pub fn get(&self, edge: EdgeId) -> f64 {
        self.current[edge.index()]
    }

    /// Base weight of an edge.
    pub fn base(&self, edge: EdgeId) -> f64 {
        self.base[edge.index()]
    }

    /// Raises the weight of an edge.
    pub fn bump(&mut self, edge: EdgeId, amount: f64) {
        self.current[edge.index()] += amount;
    }

    /// Restores every weight to its base.
    pub fn reset(&mut self) {
        self.current.clone_from(&self.base);
    }

    /// Returns `true` if no weight differs from its base.
    pub fn is_pristine(&self) -> bool {
        self.current == self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use pipcov_common::Coord;

    fn graph() -> ArchGraph {
        let mut b = GraphBuilder::new();
        b.add_edge("INT_X0Y0/A", "INT_X0Y0/B", EdgeKind::Pip);
        b.add_edge(
            "CLEL_R_X0Y0/CLE_CLE_L_SITE_0_A1",
            "CLEL_R_X0Y0/CLE_CLE_L_SITE_0_A_O",
            EdgeKind::RouteThrough,
        );
        b.add_edge(
            "CLEL_R_X0Y0/CLE_CLE_L_SITE_0_A1",
            "CLEL_R_X0Y0/CLE_CLE_L_SITE_0_AMUX",
            EdgeKind::RouteThrough,
        );
        b.add_edge("VIRTUAL/SOURCE", "CLEL_R_X0Y0/CLE_CLE_L_SITE_0_AQ", EdgeKind::Virtual);
        b.finish(Coord::new(0, 0), 0)
    }

    #[test]
    fn reform_costs() {
        let g = graph();
        let params = CostParams::default();
        let costs = EdgeCosts::new(&g, &params);
        assert_eq!(costs.get(EdgeId::from_raw(0)), 1.0);
        assert_eq!(costs.get(EdgeId::from_raw(1)), 5.0);
        assert_eq!(costs.get(EdgeId::from_raw(2)), 7.0);
        assert_eq!(costs.get(EdgeId::from_raw(3)), 0.0);
    }

    #[test]
    fn bump_and_reset() {
        let g = graph();
        let mut costs = EdgeCosts::new(&g, &CostParams::default());
        let e = EdgeId::from_raw(0);
        costs.bump(e, 8.0);
        assert_eq!(costs.get(e), 9.0);
        assert_eq!(costs.base(e), 1.0);
        assert!(!costs.is_pristine());
        costs.reset();
        assert_eq!(costs.get(e), 1.0);
        assert!(costs.is_pristine());
    }
}
