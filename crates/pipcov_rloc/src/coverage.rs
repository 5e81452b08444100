//! PIP coverage across relocated configurations.

use std::collections::{BTreeMap, BTreeSet};

use pipcov_arch::{Device, NodeInfo};
use pipcov_common::Coord;
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// How often a concrete PIP was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipCount {
    /// Interconnect tile.
    pub tile: String,
    /// Source port.
    pub src: String,
    /// Destination port.
    pub dst: String,
    /// Accepted Cuts covering it.
    pub count: usize,
}

/// The `coverage.json` report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Distinct PIPs covered.
    pub covered: usize,
    /// PIPs of every interconnect tile that received a Cut.
    pub total: usize,
    /// `covered / total`.
    pub ratio: f64,
    /// Coordinates that received a Cut.
    pub coordinates: usize,
    /// Per-PIP counts.
    pub pips: Vec<PipCount>,
}

/// Accept counts per concrete PIP.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coverage {
    counts: BTreeMap<(String, String, String), usize>,
    coords: BTreeSet<Coord>,
}

impl Coverage {
    /// No coverage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts the PIPs covered by every Cut of `config`.
    pub fn add(&mut self, config: &Config) {
        for dcut in config.dcuts() {
            self.coords.insert(dcut.target);
            for (tail, head) in &dcut.covered {
                let (Ok(t), Ok(h)) = (NodeInfo::parse(tail), NodeInfo::parse(head)) else {
                    continue;
                };
                *self.counts.entry((t.tile, t.port, h.port)).or_default() += 1;
            }
        }
    }

    /// Adds the counts of `other`.
    pub fn merge(&mut self, other: Coverage) {
        for (pip, n) in other.counts {
            *self.counts.entry(pip).or_default() += n;
        }
        self.coords.extend(other.coords);
    }

    /// Times PIP `src -> dst` of `tile` was covered.
    pub fn count(&self, tile: &str, src: &str, dst: &str) -> usize {
        self.counts
            .get(&(tile.to_string(), src.to_string(), dst.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Distinct PIPs covered.
    pub fn covered(&self) -> usize {
        self.counts.len()
    }

    /// Coordinates that received a Cut.
    pub fn coordinates(&self) -> &BTreeSet<Coord> {
        &self.coords
    }

    /// All PIPs of the interconnect tiles at the covered coordinates.
    pub fn total(&self, device: &Device) -> usize {
        self.coords
            .iter()
            .filter_map(|&c| device.int_tile(c))
            .map(|t| device.pips_of_tile(&t.name).len())
            .sum()
    }

    /// Builds the JSON report.
    pub fn report(&self, device: &Device) -> CoverageReport {
        let total = self.total(device);
        CoverageReport {
            covered: self.covered(),
            total,
            ratio: if total == 0 {
                0.0
            } else {
                self.covered() as f64 / total as f64
            },
            coordinates: self.coords.len(),
            pips: self
                .counts
                .iter()
                .map(|((tile, src, dst), &count)| PipCount {
                    tile: tile.clone(),
                    src: src.clone(),
                    dst: dst.clone(),
                    count,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dcut::DCut;
    use pipcov_arch::synthetic;
    use pipcov_route::CutId;

    fn dcut(target: Coord, covered: &[(&str, &str)]) -> DCut {
        DCut {
            config: 0,
            cut: CutId::from_raw(0),
            origin: Coord::new(1, 1),
            target,
            pip: (covered[0].0.into(), covered[0].1.into()),
            nodes: Vec::new(),
            edges: Vec::new(),
            covered: covered.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect(),
            subluts: Vec::new(),
            ffs: Vec::new(),
        }
    }

    #[test]
    fn counts_and_ratio() {
        let dev = synthetic::build(3, 3);
        let mut a = Config::new(0, None);
        a.try_add(dcut(
            Coord::new(1, 1),
            &[("INT_X1Y1/NN1END0", "INT_X1Y1/SS1BEG1"), ("INT_X1Y1/WW1END0", "INT_X1Y1/IMUX_E6")],
        ))
        .unwrap();
        let mut b = Config::new(1, None);
        b.try_add(dcut(Coord::new(1, 1), &[("INT_X1Y1/NN1END0", "INT_X1Y1/SS1BEG1")]))
            .unwrap();

        let mut cov = Coverage::new();
        cov.add(&a);
        let mut other = Coverage::new();
        other.add(&b);
        cov.merge(other);

        assert_eq!(cov.count("INT_X1Y1", "NN1END0", "SS1BEG1"), 2);
        assert_eq!(cov.count("INT_X1Y1", "WW1END0", "IMUX_E6"), 1);
        assert_eq!(cov.count("INT_X0Y0", "NN1END0", "SS1BEG1"), 0);
        let report = cov.report(&dev);
        assert_eq!(report.covered, 2);
        assert_eq!(report.coordinates, 1);
        assert_eq!(report.total, 448);
        assert!((report.ratio - 2.0 / 448.0).abs() < 1e-12);
    }

    #[test]
    fn empty_coverage_has_zero_ratio() {
        let dev = synthetic::build(2, 2);
        let report = Coverage::new().report(&dev);
        assert_eq!(report.total, 0);
        assert_eq!(report.ratio, 0.0);
    }
}
