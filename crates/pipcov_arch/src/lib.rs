//! Device Model and Node/Edge Classifier.
//!
//! This crate describes an FPGA fabric as the coverage engine sees it:
//! tiles at grid coordinates, PIP templates per tile type, fixed inter-tile
//! wires, the CLB-to-site map and clock regions. [`node`] decodes resource
//! names into roles, clock groups and BELs. [`synthetic`] builds a small
//! deterministic fabric used for tests and dry runs.

#![warn(missing_docs)]

pub mod device;
pub mod error;
pub mod node;
pub mod synthetic;

pub use device::{Device, DeviceData, PipTemplate, Tile, TileType, WireConn};
pub use error::ArchError;
pub use node::{
    node_name, relocate_node, relocate_tile, virtual_node, ClockGroup, FfIndex, Half, Label,
    NodeInfo, NodeParseError, Role, Side, SiteFlavor, TileKind, SINK_PORT, SOURCE_PORT,
    VIRTUAL_TILE,
};
