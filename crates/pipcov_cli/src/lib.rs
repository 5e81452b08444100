//! Command-line front ends of the PIP-coverage engine.
//!
//! `path_finder` builds the minimal configurations of one origin;
//! `relocate_CUTs` replicates them across the device. Both binaries are thin:
//! they turn flags and `pipcov.toml` into explicit budgets, run the core and
//! render its diagnostics.

#![warn(missing_docs)]

pub mod common;
pub mod path_finder;
pub mod relocate;

pub use common::{GlobalArgs, GlobalFlags};

/// Runs a command and exits the process: its status on success, 1 with an
/// `error:` line on failure.
pub fn exit_with<F>(command: F) -> !
where
    F: FnOnce() -> Result<i32, Box<dyn std::error::Error>>,
{
    match command() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
