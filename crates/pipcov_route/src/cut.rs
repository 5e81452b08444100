//! A committed test unit.

use pipcov_common::Coord;
use serde::{Deserialize, Serialize};

use crate::alloc::FfId;
use crate::graph::EdgeKind;
use crate::ids::{CutId, SubLutId};

/// An edge of a Cut, by endpoint names.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct CutEdge {
    /// Driving node.
    pub from: String,
    /// Driven node.
    pub to: String,
    /// Resource kind.
    pub kind: EdgeKind,
}

/// One routed launch -> PIP -> capture path and its inverter feedback.
///
/// Everything is stored by name so a Cut survives its graph and can be
/// relocated onto other coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cut {
    /// Position within its configuration.
    pub id: CutId,
    /// Origin coordinate of the configuration.
    pub origin: Coord,
    /// Index of the configuration within the run.
    pub config: usize,
    /// The PIP under test, `(tail, head)`.
    pub pip: (String, String),
    /// `SOURCE -> launch FF -> .. -> PIP -> .. -> capture FF -> SINK`.
    pub main_path: Vec<String>,
    /// Main path up to the PIP tail.
    pub path_in: Vec<String>,
    /// Main path from the PIP head.
    pub path_out: Vec<String>,
    /// Branch node of `path_in` to a free input of the launch LUT.
    pub not_path: Vec<String>,
    /// `true` if some leg only routed with port reuse allowed.
    pub relaxed: bool,
    /// Every non-virtual edge of the main path and the NotPath.
    pub edges: Vec<CutEdge>,
    /// PIP edges of the main path.
    pub covered: Vec<(String, String)>,
    /// SubLUTs allocated for this Cut.
    pub subluts: Vec<SubLutId>,
    /// FFs bound by this Cut.
    pub ffs: Vec<FfId>,
}

impl Cut {
    /// PIPs this Cut exercises.
    pub fn covered_pips(&self) -> &[(String, String)] {
        &self.covered
    }

    /// Non-virtual nodes of the main path and the NotPath, each once.
    ///
    /// The NotPath starts on its branch node, which the main path already
    /// lists.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.main_path
            .iter()
            .chain(self.not_path.iter().skip(1))
            .map(String::as_str)
            .filter(|n| !n.starts_with(pipcov_arch::VIRTUAL_TILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_skip_virtual_and_branch() {
        let cut = Cut {
            id: CutId::from_raw(0),
            origin: Coord::new(0, 0),
            config: 0,
            pip: ("INT_X0Y0/A".into(), "INT_X0Y0/B".into()),
            main_path: vec![
                "VIRTUAL/SOURCE".into(),
                "INT_X0Y0/A".into(),
                "INT_X0Y0/B".into(),
                "VIRTUAL/SINK".into(),
            ],
            path_in: vec!["VIRTUAL/SOURCE".into(), "INT_X0Y0/A".into()],
            path_out: vec!["INT_X0Y0/B".into(), "VIRTUAL/SINK".into()],
            not_path: vec!["INT_X0Y0/A".into(), "INT_X0Y0/C".into()],
            relaxed: false,
            edges: Vec::new(),
            covered: vec![("INT_X0Y0/A".into(), "INT_X0Y0/B".into())],
            subluts: Vec::new(),
            ffs: Vec::new(),
        };
        let nodes: Vec<&str> = cut.nodes().collect();
        assert_eq!(nodes, vec!["INT_X0Y0/A", "INT_X0Y0/B", "INT_X0Y0/C"]);
        assert_eq!(cut.covered_pips().len(), 1);
    }

    #[test]
    fn cut_edges_sort_by_endpoints_then_kind() {
        let edge = |from: &str, kind| CutEdge {
            from: from.into(),
            to: "INT_X0Y0/B".into(),
            kind,
        };
        let mut edges = vec![
            edge("INT_X0Y0/A", EdgeKind::Wire),
            edge("INT_X0Y0/A", EdgeKind::Pip),
            edge("CLEL_R_X0Y0/CLE_CLE_L_SITE_0_AQ", EdgeKind::Wire),
        ];
        edges.sort();
        assert_eq!(edges[0].from, "CLEL_R_X0Y0/CLE_CLE_L_SITE_0_AQ");
        assert_eq!(edges[1].kind, EdgeKind::Pip);
        assert_eq!(edges[2].kind, EdgeKind::Wire);
    }
}
