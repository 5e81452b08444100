//! `path_finder`: builds the minimal configurations of one origin.

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Parser;
use pipcov_arch::Device;
use pipcov_diagnostics::DiagnosticSink;
use pipcov_route::{load_covered, QueueSeed, TestCollection};
use pipcov_store::RunLayout;

use crate::common::{flush, load_settings, parse_origin, search_budget, GlobalArgs, GlobalFlags};

/// Build minimal PIP-coverage configurations around one origin.
#[derive(Parser, Debug)]
#[command(name = "path_finder", version)]
pub struct PathFinderArgs {
    /// Device name (`synthetic-<W>x<H>` or a blob under `data_dir`).
    pub device: String,

    /// Origin coordinate, `X<x>Y<y>`.
    pub origin: String,

    /// Iteration number; output goes to `<out_dir>/iteration_<n>`.
    pub iteration: u32,

    /// Output directory.
    pub out_dir: PathBuf,

    /// Shrink the routing window to `search.local_radius`.
    #[arg(long)]
    pub local: bool,

    /// Queue the PIPs of the 2x2 interconnect block starting at the origin.
    #[arg(long)]
    pub quad: bool,

    /// Skip PIPs covered by the minimal configurations in this directory.
    #[arg(long = "prev_config_dir")]
    pub prev_config_dir: Option<PathBuf>,

    #[command(flatten)]
    #[allow(missing_docs)]
    pub global: GlobalFlags,
}

/// Runs `path_finder`.
pub fn run(args: &PathFinderArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let global = GlobalArgs::from_flags(&args.global);
    let settings = load_settings(&args.global)?;
    let device = Device::load(&settings.device.data_dir, &args.device)?;
    let origin = parse_origin(&device, &args.origin)?;
    let exclude = match &args.prev_config_dir {
        Some(dir) => load_covered(dir)?,
        None => BTreeSet::new(),
    };
    let seed = if args.quad { QueueSeed::Quad } else { QueueSeed::Home };

    let sink = DiagnosticSink::new();
    let mut tc = TestCollection::new(
        &device,
        origin,
        search_budget(&settings, args.local),
        seed,
        &exclude,
        &sink,
    );
    if !global.quiet {
        eprintln!(
            "   Queued {} PIPs at {origin} ({} unreachable, {} already covered)",
            tc.total(),
            tc.unreachable().len(),
            exclude.len()
        );
    }
    let layout = RunLayout::new(&args.out_dir, args.iteration);
    let result = tc.run(&layout, args.iteration);
    let errors = flush(&sink, &global);
    let summary = result?;

    if !global.quiet {
        eprintln!(
            "   Wrote {} configurations ({} Cuts) to {}",
            summary.configs,
            summary.cuts,
            layout.iteration_dir().display()
        );
    }
    Ok(if errors { 1 } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_positionals() {
        let args = PathFinderArgs::parse_from(["path_finder", "synthetic-8x8", "X1Y1", "0", "out"]);
        assert_eq!(args.device, "synthetic-8x8");
        assert_eq!(args.origin, "X1Y1");
        assert_eq!(args.iteration, 0);
        assert_eq!(args.out_dir, PathBuf::from("out"));
        assert!(!args.local && !args.quad);
        assert!(args.prev_config_dir.is_none());
        assert_eq!(args.global, GlobalFlags::default());
    }

    #[test]
    fn parse_flags() {
        let args = PathFinderArgs::parse_from([
            "path_finder",
            "synthetic-8x8",
            "X1Y1",
            "2",
            "out",
            "--local",
            "--quad",
            "--prev_config_dir",
            "out/iteration_1",
            "-v",
            "--config",
            "my.toml",
        ]);
        assert!(args.local && args.quad);
        assert_eq!(args.iteration, 2);
        assert_eq!(args.prev_config_dir, Some(PathBuf::from("out/iteration_1")));
        assert!(args.global.verbose);
        assert_eq!(args.global.config, Some(PathBuf::from("my.toml")));
    }

    #[test]
    fn missing_iteration_is_rejected() {
        assert!(PathFinderArgs::try_parse_from(["path_finder", "synthetic-8x8", "X1Y1"]).is_err());
    }
}
