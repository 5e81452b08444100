//! Relocation of real minimal configurations on the synthetic fabric.

use std::collections::{BTreeSet, HashSet};

use pipcov_arch::{synthetic, Device};
use pipcov_common::Coord;
use pipcov_diagnostics::{code, DiagnosticSink};
use pipcov_rloc::{Config, CoverageReport, DCut, RelocError, RelocationOptions, Relocator, RlocError};
use pipcov_route::{MinConfigSnapshot, QueueSeed, SearchBudget, TestCollection};
use pipcov_store::{read_json, RelocLayout};

const ORIGIN: Coord = Coord::new(1, 1);

fn minimal(dev: &Device) -> MinConfigSnapshot {
    let sink = DiagnosticSink::new();
    let budget = SearchBudget {
        max_capacity: 3,
        window_radius: 2,
        ..SearchBudget::default()
    };
    let mut tc = TestCollection::new(dev, ORIGIN, budget, QueueSeed::Home, &BTreeSet::new(), &sink);
    let filled = tc.fill().unwrap();
    assert!(!filled.snapshot.cuts.is_empty());
    filled.snapshot
}

#[test]
fn targets_share_the_origin_shape() {
    let dev = synthetic::build(8, 8);
    let sink = DiagnosticSink::new();
    let r = Relocator::new(&dev, ORIGIN, &sink);
    let targets = r.targets(None);
    assert!(targets.contains(&ORIGIN));
    assert!(targets.iter().all(|c| c.x % 3 != 2));
    assert!(targets.windows(2).all(|w| (w[0].y, w[0].x) < (w[1].y, w[1].x)));

    let region = r.targets(Some("X1Y1"));
    assert!(!region.is_empty());
    assert!(region.iter().all(|c| c.x >= 4 && c.y >= 4));
}

#[test]
fn cut_relocates_onto_itself() {
    let dev = synthetic::build(8, 8);
    let snap = minimal(&dev);
    let cut = &snap.cuts[0];
    let d = DCut::relocate(&dev, &snap, cut, ORIGIN).unwrap();
    assert_eq!(d.pip, cut.pip);
    assert_eq!(d.edges, cut.edges);
    assert_eq!(d.nodes.len(), cut.nodes().count());
}

#[test]
fn off_fabric_target_is_rejected() {
    let dev = synthetic::build(8, 8);
    let snap = minimal(&dev);
    let err = DCut::relocate(&dev, &snap, &snap.cuts[0], Coord::new(40, 40)).unwrap_err();
    assert!(matches!(err, RelocError::MissingTile(_)));
}

#[test]
fn accepted_cuts_never_share_a_node() {
    let dev = synthetic::build(8, 8);
    let snap = minimal(&dev);
    let sink = DiagnosticSink::new();
    let r = Relocator::new(&dev, ORIGIN, &sink);
    let config = r.relocate(&snap, &r.targets(None), None);
    assert!(config.len() > snap.cuts.len());

    let mut seen = HashSet::new();
    for d in config.dcuts() {
        for n in &d.nodes {
            assert!(seen.insert(n.clone()), "{n} placed twice");
            let (tile, port) = n.split_once('/').unwrap();
            assert!(config.is_used(tile, port));
        }
    }
    assert!(config.allocation().capacity_conserved());
    assert!(sink.diagnostics().iter().any(|d| d.code == code::RELOCATED));
}

#[test]
fn region_shards_run_in_parallel() {
    let dev = synthetic::build(8, 8);
    let snap = minimal(&dev);
    let sink = DiagnosticSink::new();
    let r = Relocator::new(&dev, ORIGIN, &sink);
    let options = RelocationOptions {
        regions: vec!["X0Y0".into(), "X1Y1".into()],
        workers: 2,
    };
    let configs = r.run(&[(0, snap)], &options).unwrap();
    assert_eq!(configs.len(), 2);
    assert_eq!(configs[0].region(), Some("X0Y0"));
    assert_eq!(configs[1].region(), Some("X1Y1"));
    for d in configs[1].dcuts() {
        assert_eq!(dev.clock_region(d.target), Some("X1Y1"));
    }
}

#[test]
fn bad_inputs_are_fatal() {
    let dev = synthetic::build(8, 8);
    let snap = minimal(&dev);
    let sink = DiagnosticSink::new();
    let r = Relocator::new(&dev, ORIGIN, &sink);

    let options = RelocationOptions {
        regions: vec!["X9Y9".into()],
        workers: 1,
    };
    assert!(matches!(
        r.run(&[(0, snap.clone())], &options),
        Err(RlocError::UnknownRegion(_))
    ));

    let mut other = snap.clone();
    other.device = "synthetic-4x4".into();
    assert!(matches!(
        r.run(&[(0, other)], &RelocationOptions::default()),
        Err(RlocError::DeviceMismatch { .. })
    ));

    let elsewhere = Relocator::new(&dev, Coord::new(4, 4), &sink);
    assert!(matches!(
        elsewhere.run(&[(0, snap)], &RelocationOptions::default()),
        Err(RlocError::OriginMismatch { .. })
    ));
}

#[test]
fn outputs_are_written() {
    let dev = synthetic::build(8, 8);
    let snap = minimal(&dev);
    let sink = DiagnosticSink::new();
    let r = Relocator::new(&dev, ORIGIN, &sink);
    let configs = r.run(&[(0, snap)], &RelocationOptions::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let layout = RelocLayout::new(dir.path());
    let report = r.write(&configs, &layout).unwrap();
    assert!(report.covered > 0);
    assert!(report.ratio > 0.0 && report.ratio <= 1.0);

    assert_eq!(Config::load(&layout.relocated_path(0, None)).unwrap(), configs[0]);
    let fasm = std::fs::read_to_string(layout.fasm_path(0, None)).unwrap();
    assert!(fasm.lines().any(|l| l.starts_with("INT_X")));
    assert!(fasm.contains("LUT.INIT[63:0] = 64'h"));
    let back: CoverageReport = read_json(&layout.coverage_path()).unwrap();
    assert_eq!(back, report);
}
