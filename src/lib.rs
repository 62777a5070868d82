//! # lcms-qc - Automated LC-MS Quality Control
//!
//! `lcms-qc` screens LC-MS runs of synthesized compounds against their
//! expected structures. For each sample it predicts the adduct ion masses from
//! a SMILES string, finds the dominant chromatographic peaks, decides whether
//! the product was observed, and scores its purity on the UV/PDA or TIC trace.
//! Whole plates are processed in one batch and reported per well.
//!
//! ## Key Features
//!
//! - **Mass prediction**: SMILES parsing into an explicit molecular graph,
//!   Hill formula and monoisotopic mass from a fixed, versioned isotope table,
//!   `[M+H]+`, `[M+Na]+` and `[M-H]-` adducts.
//!
//! - **Peak detection**: local-maximum detection on the TIC with threshold
//!   boundaries, shoulder suppression, trapezoidal areas and the apex ion.
//!
//! - **Purity**: window integration with optional blank subtraction and the
//!   product peak's share of the window.
//!
//! - **Plate review**: per-well states and metric matrices for 96, 384 and
//!   custom plate layouts.
//!
//! - **Vendor data**: streaming mzML reader for MS and PDA data, and an
//!   `msconvert` runner with timeouts, cancellation and retries.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lcms_qc::prelude::*;
//!
//! let config = AnalysisConfig::default();
//! let sample = Sample::new("S001", "CC(=O)Nc1ccc(O)cc1", "runs/A1.mzML")?.with_well("A1");
//! let run = Run::from_mzml(sample.run())?;
//!
//! let analysis = analyze_run(&sample, &run, None, &config)?;
//! match analysis.detection {
//!     DetectionResult::Detected { adduct, retention_time, .. } => {
//!         println!("{adduct} at {retention_time:.2} min");
//!     }
//!     DetectionResult::NotDetected => println!("not detected"),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`chemistry`]: SMILES parsing, formulas and theoretical masses
//! - [`mzml`]: streaming mzML reader
//! - [`run`]: validated scans and runs
//! - [`chromatogram`]: TIC, XIC and absorbance extraction
//! - [`peaks`]: peak detection
//! - [`purity`]: blank subtraction and purity integration
//! - [`matching`]: adduct matching
//! - [`correlate`]: MS/PDA correlation
//! - [`plate`]: plate layouts and aggregation
//! - [`converter`]: vendor-to-mzML conversion
//! - [`analysis`]: the per-sample pipeline
//! - [`batch`]: sample sheets and batch processing
//! - [`report`]: CSV and JSON export
//! - [`config`]: analysis configuration
//!
//! All retention times are in minutes.

#![warn(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![allow(clippy::too_many_arguments)]

pub mod analysis;
pub mod batch;
pub mod chemistry;
pub mod chromatogram;
pub mod config;
pub mod converter;
pub mod correlate;
pub mod matching;
pub mod mzml;
pub mod peaks;
pub mod plate;
pub mod purity;
pub mod report;
pub mod run;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::analysis::{analyze_run, analyze_sample, AnalysisError, Sample, SampleAnalysis};
    pub use crate::batch::{read_sample_sheet, BatchError, BatchProcessor, BatchReport, ProgressEvent};
    pub use crate::chemistry::{Adduct, MassCalculator, MolecularFormula, TheoreticalMasses};
    pub use crate::chromatogram::{Chromatogram, ChromatogramError, TraceKind};
    pub use crate::config::{AnalysisConfig, ConfigError, PurityChannel};
    pub use crate::converter::{ConversionError, MsConvert, RunConverter};
    pub use crate::correlate::{ChannelCorrelation, ChannelCorrelator};
    pub use crate::matching::{DetectionResult, MassMatcher};
    pub use crate::peaks::{Peak, PeakDetector, PeakDetectorConfig};
    pub use crate::plate::{PlateAggregator, PlateFormat, PlateGrid, WellCoordinate, WellState};
    pub use crate::purity::{PurityIntegrator, PurityResult};
    pub use crate::report::{ReportDocument, SampleRecord};
    pub use crate::run::{ChannelTag, Polarity, Run, Scan};
}
