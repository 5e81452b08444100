//! Relocation driver.
//!
//! Every Cut of a minimal configuration is translated onto every compatible
//! coordinate and merged into one destination [`Config`] per minimal
//! configuration. With clock-region filters, one `Config` is built per
//! (minimal configuration, region) pair; those are independent and run on a
//! rayon pool, each worker owning its destination.

use std::collections::BTreeSet;

use pipcov_arch::Device;
use pipcov_common::Coord;
use pipcov_diagnostics::{code, Diagnostic, DiagnosticSink};
use pipcov_route::MinConfigSnapshot;
use pipcov_store::{write_json, RelocLayout, StoreError};
use rayon::prelude::*;

use crate::config::Config;
use crate::coverage::{Coverage, CoverageReport};
use crate::dcut::DCut;
use crate::error::RlocError;
use crate::fasm::FasmOutput;

/// How relocation is sharded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelocationOptions {
    /// Clock regions to fill; empty means the whole device, serially.
    pub regions: Vec<String>,
    /// Worker threads; 0 uses rayon's default.
    pub workers: usize,
}

/// Relocates the minimal configurations of one origin.
pub struct Relocator<'a> {
    device: &'a Device,
    origin: Coord,
    sink: &'a DiagnosticSink,
}

impl<'a> Relocator<'a> {
    /// A relocator for configurations built at `origin`.
    pub fn new(device: &'a Device, origin: Coord, sink: &'a DiagnosticSink) -> Self {
        Self { device, origin, sink }
    }

    /// Interconnect coordinates with the origin's tile-type set, optionally
    /// within one clock region, ordered by `(y, x)`.
    pub fn targets(&self, region: Option<&str>) -> Vec<Coord> {
        let shape = self.device.tile_types_at(self.origin);
        let mut targets: Vec<Coord> = self
            .device
            .int_coords()
            .iter()
            .copied()
            .filter(|&c| region.map_or(true, |r| self.device.clock_region(c) == Some(r)))
            .filter(|&c| self.device.tile_types_at(c) == shape)
            .collect();
        targets.sort_by_key(|c| (c.y, c.x));
        targets
    }

    /// Packs the Cuts of `snapshot` onto `targets`.
    pub fn relocate(&self, snapshot: &MinConfigSnapshot, targets: &[Coord], region: Option<&str>) -> Config {
        let mut config = Config::new(snapshot.index, region.map(str::to_string));
        let mut invalid = 0usize;
        let mut conflicts = 0usize;
        for cut in &snapshot.cuts {
            for &target in targets {
                let dcut = match DCut::relocate(self.device, snapshot, cut, target) {
                    Ok(d) => d,
                    Err(_) => {
                        invalid += 1;
                        continue;
                    }
                };
                if config.try_add(dcut).is_err() {
                    conflicts += 1;
                }
            }
        }
        config.finalize();

        let placed: BTreeSet<Coord> = config.dcuts().iter().map(|d| d.target).collect();
        let location = match region {
            Some(r) => format!("{} config {} region {r}", self.origin, snapshot.index),
            None => format!("{} config {}", self.origin, snapshot.index),
        };
        self.sink.emit(
            Diagnostic::note(
                code::RELOCATED,
                format!(
                    "placed {} Cut copies at {} coordinates",
                    config.len(),
                    placed.len()
                ),
            )
            .at(location)
            .with_note(format!(
                "{} of {} copies did not fit the fabric, {conflicts} collided",
                invalid,
                snapshot.cuts.len() * targets.len()
            )),
        );
        config
    }

    fn check(&self, snapshots: &[(usize, MinConfigSnapshot)], options: &RelocationOptions) -> Result<(), RlocError> {
        for (index, s) in snapshots {
            if s.device != self.device.name() {
                return Err(RlocError::DeviceMismatch {
                    index: *index,
                    expected: self.device.name().to_string(),
                    found: s.device.clone(),
                });
            }
            if s.origin != self.origin {
                return Err(RlocError::OriginMismatch {
                    index: *index,
                    expected: self.origin,
                    found: s.origin,
                });
            }
        }
        let known: BTreeSet<&str> = self
            .device
            .int_coords()
            .iter()
            .filter_map(|&c| self.device.clock_region(c))
            .collect();
        match options.regions.iter().find(|r| !known.contains(r.as_str())) {
            Some(r) => Err(RlocError::UnknownRegion(r.clone())),
            None => Ok(()),
        }
    }

    /// Builds the destination configurations.
    pub fn run(
        &self,
        snapshots: &[(usize, MinConfigSnapshot)],
        options: &RelocationOptions,
    ) -> Result<Vec<Config>, RlocError> {
        self.check(snapshots, options)?;
        if options.regions.is_empty() {
            let targets = self.targets(None);
            return Ok(snapshots
                .iter()
                .map(|(_, s)| self.relocate(s, &targets, None))
                .collect());
        }

        let jobs: Vec<(&MinConfigSnapshot, &str)> = snapshots
            .iter()
            .flat_map(|(_, s)| options.regions.iter().map(move |r| (s, r.as_str())))
            .collect();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(options.workers)
            .build()
            .map_err(|e| RlocError::Pool(e.to_string()))?;
        Ok(pool.install(|| {
            jobs.par_iter()
                .map(|&(s, region)| self.relocate(s, &self.targets(Some(region)), Some(region)))
                .collect()
        }))
    }

    /// Writes every configuration, its FASM text and `coverage.json`.
    pub fn write(&self, configs: &[Config], layout: &RelocLayout) -> Result<CoverageReport, RlocError> {
        layout.ensure_dirs()?;
        let mut coverage = Coverage::new();
        for config in configs {
            config.save(&layout.relocated_path(config.index(), config.region()))?;
            let fasm_path = layout.fasm_path(config.index(), config.region());
            let text = FasmOutput::from_config(self.device, config).render();
            std::fs::write(&fasm_path, text).map_err(|source| StoreError::Io {
                path: fasm_path.clone(),
                source,
            })?;
            coverage.add(config);
        }

        let report = coverage.report(self.device);
        write_json(&layout.coverage_path(), &report)?;
        self.sink.emit(
            Diagnostic::note(
                code::COVERAGE,
                format!(
                    "{} of {} PIPs covered ({:.1}%) at {} coordinates",
                    report.covered,
                    report.total,
                    report.ratio * 100.0,
                    report.coordinates
                ),
            )
            .at(self.origin.to_string()),
        );
        Ok(report)
    }
}
