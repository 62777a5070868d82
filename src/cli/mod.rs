use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use lcms_qc::config::PurityChannel;
use lcms_qc::plate::PlateFormat;

mod analyze;
mod batch;
mod config;
mod mass;
mod plate;

pub use config::Overrides;

/// lcms-qc - Automated LC-MS quality control for compound screening
#[derive(Parser)]
#[command(name = "lcms-qc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Trace used for purity.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ChannelArg {
    /// PDA when present, otherwise TIC
    Auto,
    /// PDA/UV absorbance only
    Pda,
    /// MS total ion current
    Tic,
}

impl From<ChannelArg> for PurityChannel {
    fn from(arg: ChannelArg) -> Self {
        match arg {
            ChannelArg::Auto => PurityChannel::Auto,
            ChannelArg::Pda => PurityChannel::Pda,
            ChannelArg::Tic => PurityChannel::Tic,
        }
    }
}

/// Analysis settings shared by `analyze` and `batch`; each overrides the
/// config file.
#[derive(clap::Args, Debug, Default)]
pub struct AnalysisArgs {
    /// Mass tolerance in m/z
    #[arg(short = 't', long)]
    tolerance: Option<f64>,

    /// Minimum peak height
    #[arg(long)]
    min_height: Option<f64>,

    /// Number of peaks to report
    #[arg(long)]
    top_n: Option<usize>,

    /// Purity window start (minutes)
    #[arg(long)]
    window_start: Option<f64>,

    /// Purity window end (minutes)
    #[arg(long)]
    window_end: Option<f64>,

    /// Trace used for purity
    #[arg(long, value_enum)]
    purity_channel: Option<ChannelArg>,

    /// Subtract a percentile baseline before purity integration
    #[arg(long)]
    baseline_correction: bool,

    /// Blank run subtracted before purity integration
    #[arg(long, value_name = "RUN")]
    blank: Option<PathBuf>,

    /// msconvert executable
    #[arg(long, value_name = "PATH")]
    msconvert: Option<PathBuf>,
}

impl AnalysisArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            tolerance: self.tolerance,
            min_height: self.min_height,
            top_n: self.top_n,
            window_start: self.window_start,
            window_end: self.window_end,
            purity_channel: self.purity_channel.map(PurityChannel::from),
            baseline_correction: self.baseline_correction,
            blank: self.blank.clone(),
            msconvert: self.msconvert.clone(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print formula and adduct masses for a SMILES structure
    Mass {
        /// SMILES structure
        #[arg(value_name = "SMILES")]
        smiles: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Analyze a single run against a structure
    Analyze {
        /// Run to analyze (mzML or a vendor file)
        #[arg(value_name = "RUN")]
        run: PathBuf,

        /// Expected product as SMILES
        #[arg(short, long)]
        structure: String,

        /// Sample identifier (defaults to the run's file stem)
        #[arg(long)]
        id: Option<String>,

        /// Write the full analysis as JSON to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Analyze every sample of a sample sheet
    Batch {
        /// Sample sheet CSV (sample_id,structure,run[,well])
        #[arg(value_name = "SHEET")]
        sheet: PathBuf,

        /// Output directory for results.csv, failures.csv and report.json
        #[arg(short, long, value_name = "DIR")]
        out: PathBuf,

        /// Plate format (96, 384 or ROWSxCOLUMNS)
        #[arg(long)]
        plate_format: Option<PlateFormat>,

        /// Process samples one at a time
        #[arg(long)]
        sequential: bool,

        /// Directory for converted mzML files (temporary when omitted)
        #[arg(long, value_name = "DIR")]
        work_dir: Option<PathBuf>,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Print plate maps from a batch report
    Plate {
        /// report.json written by `batch`
        #[arg(value_name = "REPORT")]
        report: PathBuf,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    let config_path = cli.config;
    match cli.command {
        Commands::Mass { smiles, json } => mass::run(&smiles, json),
        Commands::Analyze {
            run,
            structure,
            id,
            output,
            analysis,
        } => {
            let config = config::load(config_path.as_deref(), &analysis.overrides())?;
            analyze::run(run, structure, id, output, &config)
        }
        Commands::Batch {
            sheet,
            out,
            plate_format,
            sequential,
            work_dir,
            analysis,
        } => {
            let overrides = Overrides {
                plate_format,
                sequential,
                work_dir,
                ..analysis.overrides()
            };
            let config = config::load(config_path.as_deref(), &overrides)?;
            batch::run(sheet, out, &config)
        }
        Commands::Plate { report } => plate::run(report),
    }
}
