//! Flags, settings and diagnostic output shared by both binaries.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use pipcov_arch::Device;
use pipcov_common::Coord;
use pipcov_config::{load_optional_config, PipcovConfig};
use pipcov_diagnostics::{DiagnosticRenderer, DiagnosticSink, Severity, TerminalRenderer};
use pipcov_route::{CostParams, SearchBudget};

/// Flags accepted by every binary.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalFlags {
    /// Suppress all output except errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to a `pipcov.toml`; defaults to `./pipcov.toml` if present.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Output settings derived from the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Only errors are printed.
    pub quiet: bool,
    /// Debug diagnostics are printed.
    pub verbose: bool,
    /// ANSI colors.
    pub color: bool,
}

impl GlobalArgs {
    /// Derives output settings, detecting color from the environment.
    pub fn from_flags(flags: &GlobalFlags) -> Self {
        Self {
            quiet: flags.quiet,
            verbose: flags.verbose,
            color: std::env::var_os("TERM").is_some() && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    /// Lowest severity that is printed.
    pub fn threshold(&self) -> Severity {
        if self.quiet {
            Severity::Error
        } else if self.verbose {
            Severity::Debug
        } else {
            Severity::Note
        }
    }
}

/// Loads `pipcov.toml` from `--config` or the working directory.
pub fn load_settings(flags: &GlobalFlags) -> Result<PipcovConfig, Box<dyn std::error::Error>> {
    Ok(load_optional_config(flags.config.as_deref(), Path::new("."))?)
}

/// Parses an `X<x>Y<y>` origin and checks it has an interconnect tile.
pub fn parse_origin(device: &Device, origin: &str) -> Result<Coord, Box<dyn std::error::Error>> {
    let coord: Coord = origin
        .parse()
        .map_err(|_| format!("invalid origin '{origin}': expected X<x>Y<y>"))?;
    if device.int_tile(coord).is_none() {
        return Err(format!("{coord} has no interconnect tile on {}", device.name()).into());
    }
    Ok(coord)
}

/// The search budget described by `settings`.
pub fn search_budget(settings: &PipcovConfig, local: bool) -> SearchBudget {
    let s = &settings.search;
    let c = &settings.costs;
    SearchBudget {
        max_capacity: s.max_capacity,
        time_budget: Duration::try_from_secs_f64(s.time_budget_secs).unwrap_or(Duration::MAX),
        length_slack: s.length_slack,
        max_attempts: s.max_attempts,
        window_radius: if local { s.local_radius } else { s.window_radius },
        stall_window: s.stall_window,
        stall_ratio: s.stall_ratio,
        max_configs: s.max_configs,
        costs: CostParams {
            base: c.base,
            route_through_penalty: c.route_through_penalty,
            mux_penalty: c.mux_penalty,
            covered_pip_penalty: c.covered_pip_penalty,
            over_length_penalty: c.over_length_penalty,
        },
    }
}

/// Prints and drains the collected diagnostics. Returns `true` if any was
/// an error.
pub fn flush(sink: &DiagnosticSink, global: &GlobalArgs) -> bool {
    let renderer = TerminalRenderer::new(global.color);
    let threshold = global.threshold();
    let mut errors = false;
    for diag in sink.take_all() {
        errors |= diag.severity.is_error();
        if diag.severity >= threshold {
            eprintln!("{}", renderer.render(&diag));
        }
    }
    errors
}
