#![allow(non_snake_case)]

use clap::Parser;
use pipcov_cli::relocate::{run, RelocateArgs};

fn main() {
    let args = RelocateArgs::parse();
    pipcov_cli::exit_with(|| run(&args));
}
