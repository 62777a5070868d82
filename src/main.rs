//! # lcms-qc
//!
//! Command-line front end for LC-MS quality control.
//!
//! ## Usage
//!
//! ```bash
//! # Theoretical masses of a structure
//! lcms-qc mass "CC(=O)Nc1ccc(O)cc1"
//!
//! # Analyze one run
//! lcms-qc analyze runs/A1.mzML --structure "CC(=O)Nc1ccc(O)cc1"
//!
//! # Analyze a plate and print its maps
//! lcms-qc batch samples.csv --out results/
//! lcms-qc plate results/report.json
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
