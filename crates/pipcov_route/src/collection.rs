//! Test Collection: the coverage driver for one origin.
//!
//! Owns the PIP work queue, the architecture graph and the edge costs that
//! persist across configurations. Each [`fill`](TestCollection::fill) builds
//! one [`MinConfig`] until a [`StopReason`] holds, then removes the PIPs it
//! covered from the queue.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

use pipcov_arch::Device;
use pipcov_common::Coord;
use pipcov_diagnostics::{code, Diagnostic, DiagnosticSink};
use pipcov_store::{write_json, RunLayout};
use serde::{Deserialize, Serialize};

use crate::costs::{CostParams, EdgeCosts};
use crate::error::FatalError;
use crate::graph::{ArchGraph, SINK, SOURCE};
use crate::ids::EdgeId;
use crate::lengths::PipLengths;
use crate::min_config::{AttemptFailure, AttemptOutcome, MinConfig};
use crate::router::{find_path, RouteFailure};
use crate::snapshot::MinConfigSnapshot;
use crate::view::SearchView;

/// Limits for one Test Collection run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchBudget {
    /// Cuts per configuration.
    pub max_capacity: usize,
    /// Base wall-time per configuration, scaled up with coverage.
    pub time_budget: Duration,
    /// Extra edges allowed over a PIP's minimum path length.
    pub length_slack: u32,
    /// Cut attempts per configuration.
    pub max_attempts: usize,
    /// Graph window radius around the origin.
    pub window_radius: i32,
    /// Configurations between stall checks.
    pub stall_window: usize,
    /// Minimum queue shrink per stall window, as a fraction of its size.
    pub stall_ratio: f64,
    /// Configurations per run.
    pub max_configs: usize,
    /// Edge cost parameters.
    pub costs: CostParams,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_capacity: 64,
            time_budget: Duration::from_secs(60),
            length_slack: 6,
            max_attempts: 400,
            window_radius: 4,
            stall_window: 4,
            stall_ratio: 0.3,
            max_configs: 256,
            costs: CostParams::default(),
        }
    }
}

/// Which interconnect tiles seed the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueSeed {
    /// PIPs of the origin's interconnect tile.
    #[default]
    Home,
    /// PIPs of the 2x2 block of interconnect tiles starting at the origin.
    Quad,
}

impl QueueSeed {
    fn coords(self, origin: Coord) -> Vec<Coord> {
        match self {
            QueueSeed::Home => vec![origin],
            QueueSeed::Quad => vec![origin, origin.offset(1, 0), origin.offset(0, 1), origin.offset(1, 1)],
        }
    }
}

/// Why a configuration stopped growing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    /// `max_capacity` Cuts were committed.
    Capacity,
    /// The configuration's time budget ran out.
    Time,
    /// Every queued PIP is covered or failed in this configuration.
    EmptyQueue,
    /// The source can no longer reach the sink.
    NoPath,
    /// The source still reaches the sink, but through no queued PIP.
    NoCandidate,
    /// `max_attempts` Cut attempts were made.
    AttemptLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::Capacity => "capacity",
            StopReason::Time => "time",
            StopReason::EmptyQueue => "empty-queue",
            StopReason::NoPath => "no-path",
            StopReason::NoCandidate => "no-candidate",
            StopReason::AttemptLimit => "attempt-limit",
        })
    }
}

/// One finished configuration.
#[derive(Debug)]
pub struct Filled {
    /// The configuration.
    pub snapshot: MinConfigSnapshot,
    /// Why it stopped.
    pub stop: StopReason,
    /// Queued PIPs it covered.
    pub covered: usize,
}

/// Totals written to `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Device name.
    pub device: String,
    /// Origin coordinate, `X<x>Y<y>`.
    pub origin: String,
    /// Iteration number.
    pub iteration: u32,
    /// Configurations written.
    pub configs: usize,
    /// Cuts across all configurations.
    pub cuts: usize,
    /// Queued PIPs covered.
    pub covered: usize,
    /// Queued PIPs left.
    pub remaining: usize,
    /// Home PIPs with no path from the source or to the sink.
    pub unreachable: Vec<(String, String)>,
    /// Stop reason of each configuration, in order.
    pub stop_reasons: Vec<StopReason>,
}

/// The coverage driver for one origin.
pub struct TestCollection<'a> {
    device: &'a Device,
    sink: &'a DiagnosticSink,
    budget: SearchBudget,
    graph: ArchGraph,
    costs: EdgeCosts,
    lengths: PipLengths,
    queue: Vec<EdgeId>,
    total: usize,
    built: usize,
    checkpoint: usize,
}

impl<'a> TestCollection<'a> {
    /// Builds the graph around `origin` and queues its PIPs, shortest first.
    ///
    /// PIPs named in `exclude` (covered by earlier runs) are not queued.
    pub fn new(
        device: &'a Device,
        origin: Coord,
        budget: SearchBudget,
        seed: QueueSeed,
        exclude: &BTreeSet<(String, String)>,
        sink: &'a DiagnosticSink,
    ) -> Self {
        let graph = ArchGraph::build(device, origin, budget.window_radius);
        let home: Vec<EdgeId> = seed
            .coords(origin)
            .into_iter()
            .flat_map(|c| graph.pips_at(c))
            .filter(|&e| !exclude.contains(&graph.edge_names(e)))
            .collect();
        Self::with_graph(device, graph, &home, budget, sink)
    }

    /// Queues the `home` PIPs of an already built graph, shortest first.
    pub fn with_graph(
        device: &'a Device,
        graph: ArchGraph,
        home: &[EdgeId],
        budget: SearchBudget,
        sink: &'a DiagnosticSink,
    ) -> Self {
        let origin = graph.origin();
        let lengths = PipLengths::compute(&graph, home);
        if !lengths.unreachable().is_empty() {
            sink.emit(
                Diagnostic::warning(
                    code::UNREACHABLE_PIPS,
                    format!("{} PIPs cannot be reached from the source or reach the sink", lengths.unreachable().len()),
                )
                .at(origin.to_string())
                .with_note("they are left out of the queue"),
            );
        }
        let queue = lengths.ordered();
        let costs = EdgeCosts::new(&graph, &budget.costs);
        Self {
            device,
            sink,
            total: queue.len(),
            checkpoint: queue.len(),
            budget,
            graph,
            costs,
            lengths,
            queue,
            built: 0,
        }
    }

    /// The architecture graph.
    pub fn graph(&self) -> &ArchGraph {
        &self.graph
    }

    /// The current edge costs.
    pub fn costs(&self) -> &EdgeCosts {
        &self.costs
    }

    /// Queued PIPs, shortest first.
    pub fn queue(&self) -> &[EdgeId] {
        &self.queue
    }

    /// Queued PIPs by name.
    pub fn queue_names(&self) -> Vec<(String, String)> {
        self.queue.iter().map(|&e| self.graph.edge_names(e)).collect()
    }

    /// PIPs queued initially.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Home PIPs left out of the queue because no path reaches them.
    pub fn unreachable(&self) -> &[EdgeId] {
        self.lengths.unreachable()
    }

    fn time_budget(&self) -> Duration {
        let covered = self.total - self.queue.len();
        self.budget
            .time_budget
            .mul_f64(1.0 + covered as f64 / self.total.max(1) as f64)
    }

    /// Builds one configuration and removes the PIPs it covered from the
    /// queue.
    pub fn fill(&mut self) -> Result<Filled, FatalError> {
        let index = self.built;
        let origin = self.graph.origin();
        let started = Instant::now();
        let time_budget = self.time_budget();
        let mut config = MinConfig::new(&self.graph, index, self.budget.length_slack, self.budget.costs);
        let mut failed: HashSet<EdgeId> = HashSet::new();
        let mut attempts = 0;

        let stop = loop {
            if config.cuts().len() >= self.budget.max_capacity {
                break StopReason::Capacity;
            }
            if started.elapsed() >= time_budget {
                break StopReason::Time;
            }
            let covered: HashSet<EdgeId> = config.covered().iter().copied().collect();
            let candidates: Vec<EdgeId> = self
                .queue
                .iter()
                .copied()
                .filter(|e| !failed.contains(e) && !covered.contains(e))
                .collect();
            if candidates.is_empty() {
                break StopReason::EmptyQueue;
            }
            if attempts >= self.budget.max_attempts {
                break StopReason::AttemptLimit;
            }
            let view = SearchView::new(&self.graph, config.ledger(), &self.costs);
            if find_path(&view, SOURCE, SINK, false).is_err() {
                break StopReason::NoPath;
            }
            attempts += 1;

            match config.try_cut(&candidates, &self.lengths, &mut self.costs)? {
                AttemptOutcome::Committed(id) => {
                    let (from, to) = &config.cuts()[id.index()].pip;
                    self.sink.emit(
                        Diagnostic::debug(code::CUT_COMMITTED, format!("covered {from} -> {to}"))
                            .at(format!("{origin} {id}")),
                    );
                }
                AttemptOutcome::Abandoned { pip: None, .. } => break StopReason::NoCandidate,
                AttemptOutcome::Abandoned { pip: Some(pip), reason } => {
                    failed.insert(pip);
                    let (from, to) = self.graph.edge_names(pip);
                    let over_length = matches!(reason, AttemptFailure::MainPath(RouteFailure::OverLength { .. }));
                    let kind = if over_length { code::OVER_LENGTH } else { code::CUT_ABANDONED };
                    self.sink.emit(
                        Diagnostic::debug(kind, format!("{from} -> {to}: {reason}"))
                            .at(format!("{origin} config {index}")),
                    );
                }
            }
        };

        config.finalize();
        let covered: HashSet<EdgeId> = config.covered().iter().copied().collect();
        let before = self.queue.len();
        self.queue.retain(|e| !covered.contains(e));
        let filled = Filled {
            snapshot: MinConfigSnapshot::capture(&config, self.device.name()),
            stop,
            covered: before - self.queue.len(),
        };

        self.sink.emit(
            Diagnostic::note(
                code::CONFIG_DONE,
                format!(
                    "config {index}: {} cuts, {} PIPs remaining, stopped: {stop}",
                    filled.snapshot.cuts.len(),
                    self.queue.len()
                ),
            )
            .at(origin.to_string()),
        );

        self.built += 1;
        self.check_stall();
        Ok(filled)
    }

    fn check_stall(&mut self) {
        if self.budget.stall_window == 0 || self.built % self.budget.stall_window != 0 {
            return;
        }
        let shrink = self.checkpoint - self.queue.len();
        if (shrink as f64) < self.budget.stall_ratio * self.checkpoint as f64 {
            self.costs.reset();
            self.sink.emit(
                Diagnostic::note(
                    code::COSTS_RESET,
                    format!(
                        "queue shrank by {shrink} of {} over {} configs, edge costs reset",
                        self.checkpoint, self.budget.stall_window
                    ),
                )
                .at(self.graph.origin().to_string()),
            );
        }
        self.checkpoint = self.queue.len();
    }

    /// Fills configurations until the queue is empty, a configuration gets
    /// no Cut, or `max_configs` is reached, writing each one and the run
    /// summary under `layout`.
    pub fn run(&mut self, layout: &RunLayout, iteration: u32) -> Result<RunSummary, FatalError> {
        layout.ensure_dirs()?;
        let mut summary = RunSummary {
            device: self.device.name().to_string(),
            origin: self.graph.origin().to_string(),
            iteration,
            configs: 0,
            cuts: 0,
            covered: 0,
            remaining: self.queue.len(),
            unreachable: self
                .lengths
                .unreachable()
                .iter()
                .map(|&e| self.graph.edge_names(e))
                .collect(),
            stop_reasons: Vec::new(),
        };

        while !self.queue.is_empty() && summary.configs < self.budget.max_configs {
            let filled = self.fill()?;
            summary.stop_reasons.push(filled.stop);
            if filled.snapshot.cuts.is_empty() {
                break;
            }
            filled.snapshot.save(&layout.min_config_path(summary.configs))?;
            summary.configs += 1;
            summary.cuts += filled.snapshot.cuts.len();
            summary.covered += filled.covered;
        }
        summary.remaining = self.queue.len();

        write_json(&layout.summary_path(), &summary)?;
        self.sink.emit(
            Diagnostic::note(
                code::RUN_DONE,
                format!(
                    "{} configs, {} cuts, {} of {} PIPs covered",
                    summary.configs, summary.cuts, summary.covered, self.total
                ),
            )
            .at(summary.origin.clone()),
        );
        Ok(summary)
    }
}
