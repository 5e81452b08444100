//! FASM feature emission for relocated configurations.
//!
//! One line per enabled feature, sorted by tile then feature:
//!
//! ```text
//! CLEL_R_X1Y1.SLICE_X3Y1.ALUT.INIT[63:0] = 64'h00000000FFFF0000
//! CLEL_R_X1Y1.SLICE_X3Y1.AFF.ZINI
//! CLEL_R_X1Y1.SLICE_X3Y1.FFMUXA1.D5
//! INT_X1Y1.SS1BEG1.NN1END0
//! ```

use pipcov_arch::{Device, FfIndex, NodeInfo, Role};
use pipcov_route::{LutHalf, LutId};

use crate::config::Config;

/// One enabled feature.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FasmFeature {
    /// Tile name.
    pub tile: String,
    /// Feature path within the tile, e.g. `SLICE_X3Y1.ALUT.INIT[63:0]`.
    pub feature: String,
    /// 64-bit value, for LUT INIT vectors.
    pub value: Option<u64>,
}

impl FasmFeature {
    /// A feature with no value.
    pub fn new(tile: &str, feature: &str) -> Self {
        Self {
            tile: tile.to_string(),
            feature: feature.to_string(),
            value: None,
        }
    }

    /// A feature with a 64-bit value.
    pub fn with_value(tile: &str, feature: &str, value: u64) -> Self {
        Self {
            value: Some(value),
            ..Self::new(tile, feature)
        }
    }

    /// The FASM line, without newline.
    pub fn to_fasm_line(&self) -> String {
        match self.value {
            Some(v) => format!("{}.{} = 64'h{v:016X}", self.tile, self.feature),
            None => format!("{}.{}", self.tile, self.feature),
        }
    }
}

/// Features of one configuration.
#[derive(Debug, Clone, Default)]
pub struct FasmOutput {
    features: Vec<FasmFeature>,
}

impl FasmOutput {
    /// No features.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a feature.
    pub fn add(&mut self, feature: FasmFeature) {
        self.features.push(feature);
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if nothing was added.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Features in insertion order.
    pub fn features(&self) -> &[FasmFeature] {
        &self.features
    }

    /// Renders sorted, deduplicated lines.
    pub fn render(&self) -> String {
        let mut sorted = self.features.clone();
        sorted.sort();
        sorted.dedup();
        sorted
            .iter()
            .map(|f| f.to_fasm_line() + "\n")
            .collect()
    }

    /// Collects the PIP, LUT INIT, FF and mux features of `config`.
    pub fn from_config(device: &Device, config: &Config) -> Self {
        let mut out = Self::new();
        let site = |tile: &str| device.site_of(tile).unwrap_or(tile).to_string();

        for dcut in config.dcuts() {
            for e in dcut.pips() {
                let (Ok(tail), Ok(head)) = (NodeInfo::parse(&e.from), NodeInfo::parse(&e.to)) else {
                    continue;
                };
                out.add(FasmFeature::new(&tail.tile, &format!("{}.{}", head.port, tail.port)));
            }
        }

        let alloc = config.allocation();
        for (id, _) in alloc.luts() {
            out.add(FasmFeature::with_value(
                &id.tile,
                &format!("{}.{}LUT.INIT[63:0]", site(&id.tile), id.label),
                alloc.truth_table(id),
            ));
        }

        for (id, ff) in alloc.ffs() {
            let bel = match id.index {
                FfIndex::Primary => format!("{}FF", id.label),
                FfIndex::Secondary => format!("{}FF2", id.label),
            };
            out.add(FasmFeature::new(&id.tile, &format!("{}.{bel}.ZINI", site(&id.tile))));

            // A launch FF is fed back from the O5 half of its own LUT.
            let launch = NodeInfo::parse(&ff.node).is_ok_and(|n| matches!(n.role, Role::FfOutput { .. }));
            let lut = LutId {
                tile: id.tile.clone(),
                label: id.label,
            };
            let fed_by_o5 = alloc
                .lut(&lut)
                .and_then(|l| l.o5)
                .is_some_and(|s| alloc.sublut(s).output.is_none());
            if launch && fed_by_o5 {
                let n = match id.index {
                    FfIndex::Primary => 1,
                    FfIndex::Secondary => 2,
                };
                out.add(FasmFeature::new(&id.tile, &format!("{}.FFMUX{}{n}.D5", site(&id.tile), id.label)));
            }
        }

        for s in alloc.subluts() {
            if s.muxed && s.half == LutHalf::Full {
                out.add(FasmFeature::new(
                    &s.lut.tile,
                    &format!("{}.OUTMUX{}.D6", site(&s.lut.tile), s.lut.label),
                ));
            }
        }
        out
    }
}
