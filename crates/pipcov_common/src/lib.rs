//! Shared foundational types used across the pipcov workspace.
//!
//! This crate provides fabric coordinates and clock-region names, content
//! hashing for artifact integrity, interned port names, and the internal
//! error type used to report bookkeeping bugs.

#![warn(missing_docs)]

pub mod coord;
pub mod hash;
pub mod ident;
pub mod result;

pub use coord::{Coord, ParseCoordError};
pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use result::{InternalError, PipcovResult};
