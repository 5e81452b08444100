//! PIP-coverage search engine.
//!
//! Given a device and an origin coordinate, this crate builds minimal test
//! configurations: sets of Cuts, each a launch FF -> PIP -> capture FF path
//! plus an inverter path through the launch FF's own LUT, packed so that
//! no two Cuts share a routing resource.
//!
//! # Pipeline
//!
//! 1. **Graph** - [`ArchGraph`] windows the device around the origin
//! 2. **Lengths** - [`PipLengths`] orders the home PIPs by difficulty
//! 3. **Cuts** - [`MinConfig`] routes and allocates Cuts transactionally
//!    over a [`Ledger`], [`ClockCoordinator`] and [`Allocation`]
//! 4. **Coverage** - [`TestCollection`] drives configurations until the
//!    queue is exhausted and persists them as [`MinConfigSnapshot`]s
//!
//! # Usage
//!
//! ```ignore
//! use pipcov_route::{QueueSeed, SearchBudget, TestCollection};
//!
//! let mut tc = TestCollection::new(&device, origin, SearchBudget::default(), QueueSeed::Home, &covered, &sink);
//! let summary = tc.run(&layout, 0)?;
//! ```

#![warn(missing_docs)]

pub mod alloc;
pub mod clock;
pub mod collection;
pub mod costs;
pub mod cut;
pub mod error;
pub mod graph;
pub mod ids;
pub mod ledger;
pub mod lengths;
pub mod min_config;
pub mod router;
pub mod snapshot;
pub mod view;

pub use alloc::{
    AllocError, Allocation, Ff, FfId, Lut, LutFunction, LutHalf, LutId, SubLut, SubLutRequest, Usage,
    LUT_CAPACITY,
};
pub use clock::{ClockBinding, ClockCoordinator, Domain};
pub use collection::{Filled, QueueSeed, RunSummary, SearchBudget, StopReason, TestCollection};
pub use costs::{CostParams, EdgeCosts};
pub use cut::{Cut, CutEdge};
pub use error::FatalError;
pub use graph::{ArchGraph, ClockEdges, Edge, EdgeKind, GraphBuilder, GraphNode, SINK, SOURCE};
pub use ids::{CutId, EdgeId, NodeId, SubLutId};
pub use ledger::{Change, Journal, Ledger, NodeState};
pub use lengths::PipLengths;
pub use min_config::{Attempt, AttemptFailure, AttemptOutcome, MinConfig, PendingCut};
pub use router::{find_path, find_path_relaxing, ports_unique, RouteFailure};
pub use snapshot::{load_covered, load_min_configs, ClockAssignment, MinConfigSnapshot};
pub use view::{Network, Overlay, SearchView};
