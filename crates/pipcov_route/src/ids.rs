//! Opaque ID newtypes for graph and allocation entities.
//!
//! Each ID is a thin `u32` wrapper that is `Copy`, `Hash`, and
//! `Serialize`/`Deserialize`, indexing into a per-graph or per-configuration
//! arena.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub const fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the index as `usize` for arena access.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

define_id!(
    /// A routing resource in an [`ArchGraph`](crate::graph::ArchGraph), or a
    /// transient helper node of a search overlay.
    NodeId,
    "n"
);

define_id!(
    /// A directed edge of an [`ArchGraph`](crate::graph::ArchGraph).
    EdgeId,
    "e"
);

define_id!(
    /// A Cut within one configuration, in commit order.
    CutId,
    "cut "
);

define_id!(
    /// A SubLUT in a configuration's allocation arena.
    SubLutId,
    "sublut "
);
