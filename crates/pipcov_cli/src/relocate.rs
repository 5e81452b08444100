//! `relocate_CUTs`: replicates minimal configurations across the device.

use std::path::PathBuf;

use clap::Parser;
use pipcov_arch::Device;
use pipcov_diagnostics::DiagnosticSink;
use pipcov_rloc::{RelocationOptions, Relocator};
use pipcov_route::load_min_configs;
use pipcov_store::RelocLayout;

use crate::common::{flush, load_settings, parse_origin, GlobalArgs, GlobalFlags};

/// Relocate the Cuts of minimal configurations onto every compatible
/// coordinate.
#[derive(Parser, Debug)]
#[command(name = "relocate_CUTs", version)]
pub struct RelocateArgs {
    /// Device name (`synthetic-<W>x<H>` or a blob under `data_dir`).
    pub device: String,

    /// Origin the minimal configurations were built at, `X<x>Y<y>`.
    pub origin: String,

    /// Directory holding `min_config_<i>.pcov` files.
    pub minimal_dir: PathBuf,

    /// Output directory.
    pub out_dir: PathBuf,

    /// Fill only these clock regions, one configuration per region.
    #[arg(long = "clock_region", num_args = 1..)]
    pub clock_region: Vec<String>,

    #[command(flatten)]
    #[allow(missing_docs)]
    pub global: GlobalFlags,
}

/// Runs `relocate_CUTs`.
pub fn run(args: &RelocateArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let global = GlobalArgs::from_flags(&args.global);
    let settings = load_settings(&args.global)?;
    let device = Device::load(&settings.device.data_dir, &args.device)?;
    let origin = parse_origin(&device, &args.origin)?;
    let snapshots = load_min_configs(&args.minimal_dir)?;
    if snapshots.is_empty() {
        return Err(format!("no minimal configurations in {}", args.minimal_dir.display()).into());
    }

    let sink = DiagnosticSink::new();
    let relocator = Relocator::new(&device, origin, &sink);
    let options = RelocationOptions {
        regions: args.clock_region.clone(),
        workers: settings.relocation.workers,
    };
    let result = relocator
        .run(&snapshots, &options)
        .and_then(|configs| relocator.write(&configs, &RelocLayout::new(&args.out_dir)));
    let errors = flush(&sink, &global);
    let report = result?;

    if !global.quiet {
        eprintln!(
            "   Covered {} of {} PIPs at {} coordinates",
            report.covered, report.total, report.coordinates
        );
    }
    Ok(if errors { 1 } else { 0 })
}
