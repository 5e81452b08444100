//! Fabric coordinates in the `X<x>Y<y>` notation used by tile names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A position in the interconnect grid.
///
/// All tiles belonging to one interconnect column/row pair share the same
/// coordinate: `INT_X10Y20`, the logic tile west of it and the logic tile
/// east of it are all at `X10Y20`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Coord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Coord {
    /// Creates a coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns `self + (dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Returns the delta `(other - self)`.
    pub fn delta_to(self, other: Coord) -> (i32, i32) {
        (other.x - self.x, other.y - self.y)
    }

    /// Chebyshev distance, the metric used for routing windows.
    pub fn chebyshev(self, other: Coord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Splits a tile name such as `CLEL_R_X10Y20` into its prefix and
    /// coordinate. Returns `None` when the name carries no coordinate suffix.
    pub fn split_tile_name(tile: &str) -> Option<(&str, Coord)> {
        let idx = tile.rfind("_X")?;
        let coord = tile[idx + 1..].parse().ok()?;
        Some((&tile[..idx], coord))
    }

    /// Builds a tile name from a prefix and this coordinate.
    pub fn tile_name(self, prefix: &str) -> String {
        format!("{prefix}_{self}")
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X{}Y{}", self.x, self.y)
    }
}

/// Error returned when a string is not of the form `X<int>Y<int>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid coordinate {0:?}: expected X<int>Y<int>")]
pub struct ParseCoordError(pub String);

impl FromStr for Coord {
    type Err = ParseCoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCoordError(s.to_string());
        let rest = s.strip_prefix('X').ok_or_else(err)?;
        let (x, y) = rest.split_once('Y').ok_or_else(err)?;
        let x = x.parse().map_err(|_| err())?;
        let y = y.parse().map_err(|_| err())?;
        Ok(Coord::new(x, y))
    }
}
