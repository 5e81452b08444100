//! Relocation Engine.
//!
//! A minimal configuration proves a set of Cuts at one origin. This crate
//! copies each Cut onto every coordinate with the same tile shape, checks
//! that the copy exists in the fabric ([`DCut::relocate`]) and packs the
//! copies into destination configurations without resource collisions
//! ([`Config::try_add`]). The result is written as artifacts, FASM text and
//! a coverage report.
//!
//! # Output
//!
//! - `relocated_<i>[_<region>].pcov` - the destination [`Config`]
//! - `relocated_<i>[_<region>].fasm` - its [`FasmOutput`]
//! - `coverage.json` - a [`CoverageReport`] across all configurations

#![warn(missing_docs)]

pub mod config;
pub mod coverage;
pub mod dcut;
pub mod engine;
pub mod error;
pub mod fasm;

pub use config::Config;
pub use coverage::{Coverage, CoverageReport, PipCount};
pub use dcut::DCut;
pub use engine::{RelocationOptions, Relocator};
pub use error::{Conflict, RelocError, RlocError};
pub use fasm::{FasmFeature, FasmOutput};
