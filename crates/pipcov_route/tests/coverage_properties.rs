//! Configuration-level properties on the synthetic fabric: forest shape,
//! capacity conservation, exact rollback, port uniqueness and coverage
//! monotonicity.

use std::collections::{BTreeSet, HashSet};

use pipcov_arch::{synthetic, Device};
use pipcov_common::Coord;
use pipcov_diagnostics::DiagnosticSink;
use pipcov_route::{
    find_path, ports_unique, Attempt, AttemptOutcome, ArchGraph, CostParams, EdgeCosts, Ledger, MinConfig,
    PipLengths, QueueSeed, SearchBudget, SearchView, TestCollection, LUT_CAPACITY, SINK, SOURCE,
};

const ORIGIN: Coord = Coord::new(1, 1);

fn fabric() -> Device {
    synthetic::build(4, 4)
}

/// Commits up to `n` Cuts, returning the configuration.
fn packed<'g>(graph: &'g ArchGraph, costs: &mut EdgeCosts, n: usize) -> MinConfig<'g> {
    let lengths = PipLengths::compute(graph, &graph.pips_at(ORIGIN));
    let mut config = MinConfig::new(graph, 0, 6, CostParams::default());
    let mut queue = lengths.ordered();
    for _ in 0..n * 4 {
        if config.cuts().len() == n {
            break;
        }
        let covered: HashSet<_> = config.covered().iter().copied().collect();
        queue.retain(|e| !covered.contains(e));
        match config.try_cut(&queue, &lengths, costs).unwrap() {
            AttemptOutcome::Committed(_) => {}
            AttemptOutcome::Abandoned { pip: Some(p), .. } => queue.retain(|&e| e != p),
            AttemptOutcome::Abandoned { pip: None, .. } => break,
        }
    }
    config
}

#[test]
fn committed_cuts_form_a_forest() {
    let dev = fabric();
    let g = ArchGraph::build(&dev, ORIGIN, 2);
    let mut costs = EdgeCosts::new(&g, &CostParams::default());
    let mut config = packed(&g, &mut costs, 4);
    config.finalize();
    assert!(config.cuts().len() >= 2, "only {} cuts", config.cuts().len());

    let mut edges = HashSet::new();
    let mut driven = HashSet::new();
    for cut in config.cuts() {
        for e in &cut.edges {
            assert!(edges.insert((e.from.clone(), e.to.clone())), "edge {} -> {} shared", e.from, e.to);
            assert!(driven.insert(e.to.clone()), "{} has two drivers", e.to);
        }
    }
    let children: HashSet<_> = config.forest().map(|(c, _)| c).collect();
    assert_eq!(children.len(), config.forest().count());
}

#[test]
fn lut_capacity_is_conserved() {
    let dev = fabric();
    let g = ArchGraph::build(&dev, ORIGIN, 2);
    let mut costs = EdgeCosts::new(&g, &CostParams::default());
    let config = packed(&g, &mut costs, 4);
    let alloc = config.allocation();
    assert!(alloc.capacity_conserved());
    for (id, lut) in alloc.luts() {
        let used: u8 = alloc
            .subluts()
            .iter()
            .filter(|s| &s.lut == id)
            .map(|s| s.occupancy())
            .sum();
        assert_eq!(LUT_CAPACITY - used, lut.capacity, "{id}");
    }
}

#[test]
fn rollback_restores_configuration_exactly() {
    let dev = fabric();
    let g = ArchGraph::build(&dev, ORIGIN, 2);
    let mut costs = EdgeCosts::new(&g, &CostParams::default());
    let mut config = packed(&g, &mut costs, 1);
    assert_eq!(config.cuts().len(), 1);

    let ledger = config.ledger().clone();
    let clocks = config.clocks().clone();
    let alloc = config.allocation().clone();
    let lengths = PipLengths::compute(&g, &g.pips_at(ORIGIN));
    let covered: HashSet<_> = config.covered().iter().copied().collect();
    let queue: Vec<_> = lengths.ordered().into_iter().filter(|e| !covered.contains(e)).collect();

    match config.attempt(&queue, &lengths, &mut costs).unwrap() {
        Attempt::Built(pending) => {
            assert_ne!(config.ledger(), &ledger);
            config.rollback(pending).unwrap();
        }
        Attempt::Abandoned { reason, .. } => panic!("second cut failed: {reason}"),
    }
    assert_eq!(config.ledger(), &ledger);
    assert_eq!(config.clocks(), &clocks);
    assert_eq!(config.allocation(), &alloc);
    assert_eq!(config.cuts().len(), 1);
}

#[test]
fn conflict_free_paths_never_repeat_a_port() {
    let dev = fabric();
    let g = ArchGraph::build(&dev, ORIGIN, 2);
    let ledger = Ledger::new(&g);
    let costs = EdgeCosts::new(&g, &CostParams::default());
    let view = SearchView::new(&g, &ledger, &costs);
    let path = find_path(&view, SOURCE, SINK, true).unwrap();
    assert!(path.len() > 2);
    assert!(ports_unique(&view, &path));
}

#[test]
fn strictly_routed_legs_never_repeat_a_port() {
    let dev = fabric();
    let g = ArchGraph::build(&dev, ORIGIN, 2);
    let mut costs = EdgeCosts::new(&g, &CostParams::default());
    let config = packed(&g, &mut costs, 6);
    let view = SearchView::new(&g, config.ledger(), &costs);
    let ids = |names: &[String]| -> Vec<_> { names.iter().map(|n| g.node_id(n).unwrap()).collect() };

    let strict: Vec<_> = config.cuts().iter().filter(|c| !c.relaxed).collect();
    assert!(!strict.is_empty());
    for cut in strict {
        for leg in [&cut.path_in, &cut.path_out, &cut.not_path] {
            assert!(ports_unique(&view, &ids(leg)), "{} repeats a port in {leg:?}", cut.id);
        }
    }
}

#[test]
fn queue_shrinks_by_at_least_one_per_cut() {
    let dev = fabric();
    let sink = DiagnosticSink::new();
    let budget = SearchBudget {
        max_capacity: 3,
        window_radius: 2,
        ..SearchBudget::default()
    };
    let mut tc = TestCollection::new(&dev, ORIGIN, budget, QueueSeed::Home, &BTreeSet::new(), &sink);
    let mut len = tc.queue().len();
    for _ in 0..3 {
        let filled = tc.fill().unwrap();
        let now = tc.queue().len();
        assert!(now <= len);
        assert!(len - now >= filled.snapshot.cuts.len());
        len = now;
    }
}

#[test]
fn two_pip_queue_is_covered() {
    let dev = fabric();
    let sink = DiagnosticSink::new();
    let budget = SearchBudget {
        max_capacity: 5,
        window_radius: 2,
        ..SearchBudget::default()
    };
    let all = TestCollection::new(&dev, ORIGIN, budget.clone(), QueueSeed::Home, &BTreeSet::new(), &sink);
    let names = all.queue_names();
    let (pip_a, pip_b) = (names[0].clone(), names[1].clone());
    let exclude: BTreeSet<_> = names[2..].iter().cloned().collect();

    let mut tc = TestCollection::new(&dev, ORIGIN, budget, QueueSeed::Home, &exclude, &sink);
    assert_eq!(tc.queue_names(), vec![pip_a.clone(), pip_b.clone()]);
    let filled = tc.fill().unwrap();

    assert!(filled
        .snapshot
        .cuts
        .iter()
        .any(|c| c.covered_pips().contains(&pip_a) || c.covered_pips().contains(&pip_b)));
    let covered = filled.snapshot.covered();
    assert!(tc.queue_names().iter().all(|p| !covered.contains(p)));
}
