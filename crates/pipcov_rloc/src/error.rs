//! Error types for relocation.

use pipcov_arch::{ClockGroup, NodeParseError};
use pipcov_common::Coord;
use pipcov_route::{AllocError, Domain};
use pipcov_store::StoreError;

/// Why a Cut cannot be translated onto a target coordinate.
///
/// Expected and frequent; the coordinate is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelocError {
    /// A relocated tile does not exist.
    #[error("tile {0} does not exist")]
    MissingTile(String),
    /// A relocated tile exists with a different type.
    #[error("tile {tile} is a {found}, expected {expected}")]
    TileType {
        /// The tile.
        tile: String,
        /// Type at the origin.
        expected: String,
        /// Type at the target.
        found: String,
    },
    /// A relocated wire does not exist.
    #[error("no wire {from} -> {to}")]
    MissingWire {
        /// Driving node.
        from: String,
        /// Driven node.
        to: String,
    },
    /// A relocated PIP does not exist in its tile's type.
    #[error("no PIP {from} -> {to}")]
    MissingPip {
        /// Tail node.
        from: String,
        /// Head node.
        to: String,
    },
    /// A node name could not be parsed.
    #[error(transparent)]
    Node(#[from] NodeParseError),
}

/// Why a relocated Cut does not fit into a destination configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Conflict {
    /// A `(tile, port)` is already used.
    #[error("{tile}/{port} is already used")]
    NodeInUse {
        /// The tile.
        tile: String,
        /// The port.
        port: String,
    },
    /// A clock group is bound to the other domain, or its sibling to the
    /// same one.
    #[error("clock group {group} at {coord} cannot be {domain}")]
    Clock {
        /// Coordinate of the group.
        coord: Coord,
        /// The group.
        group: ClockGroup,
        /// The requested role.
        domain: Domain,
    },
    /// A LUT or FF is unavailable.
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

/// Fatal relocation errors.
#[derive(Debug, thiserror::Error)]
pub enum RlocError {
    /// A minimal configuration was built for another device.
    #[error("minimal configuration {index} was built for '{found}', not '{expected}'")]
    DeviceMismatch {
        /// Index of the configuration.
        index: usize,
        /// The loaded device.
        expected: String,
        /// Device recorded in the configuration.
        found: String,
    },
    /// A minimal configuration was built at another origin.
    #[error("minimal configuration {index} was built at {found}, not {expected}")]
    OriginMismatch {
        /// Index of the configuration.
        index: usize,
        /// The requested origin.
        expected: Coord,
        /// Origin recorded in the configuration.
        found: Coord,
    },
    /// A clock region filter names no region of the device.
    #[error("unknown clock region '{0}'")]
    UnknownRegion(String),
    /// The worker pool could not be built.
    #[error("cannot start relocation workers: {0}")]
    Pool(String),
    /// Reading or writing an artifact failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
