use clap::Parser;
use pipcov_cli::path_finder::{run, PathFinderArgs};

fn main() {
    let args = PathFinderArgs::parse();
    pipcov_cli::exit_with(|| run(&args));
}
