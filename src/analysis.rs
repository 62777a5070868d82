//! # Sample analysis
//!
//! The sequential per-sample pipeline:
//!
//! 1. theoretical masses from the sample's structure
//! 2. TIC of the MS1 scans and its top peaks
//! 3. adduct matching against the peaks' apex ions
//! 4. purity on the PDA trace (or TIC), optionally blank-subtracted and
//!    baseline-corrected
//! 5. MS/PDA correlation of the peaks
//!
//! Non-findings (no peaks, not detected, no PDA) are part of the result;
//! only invalid input is an error.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::chemistry::{Adduct, InvalidStructureError, MassCalculator, TheoreticalMasses};
use crate::chromatogram::{Chromatogram, ChromatogramError};
use crate::config::{AnalysisConfig, PurityChannel};
use crate::converter::{convert_with_retry, is_mzml, ConversionError, RunConverter};
use crate::correlate::{ChannelCorrelation, ChannelCorrelator};
use crate::matching::{DetectionResult, MassMatcher};
use crate::peaks::{Peak, PeakDetector};
use crate::purity::{PurityError, PurityIntegrator, PurityResult};
use crate::run::{Run, RunError};

/// Errors that make a sample's analysis fail.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Sample descriptor is malformed
    #[error("invalid sample: {0}")]
    InvalidSample(String),

    /// Structure could not be parsed
    #[error("sample {sample_id}: {source}")]
    Structure {
        /// Sample identifier
        sample_id: String,
        /// Parse error
        source: InvalidStructureError,
    },

    /// Vendor conversion failed
    #[error("sample {sample_id}: {source}")]
    Conversion {
        /// Sample identifier
        sample_id: String,
        /// Converter error
        source: ConversionError,
    },

    /// Run could not be loaded
    #[error("sample {sample_id}: failed to load {}: {source}", path.display())]
    Run {
        /// Sample identifier
        sample_id: String,
        /// Run path
        path: PathBuf,
        /// Loader error
        source: RunError,
    },

    /// Chromatogram could not be extracted
    #[error("sample {sample_id}: {source}")]
    Chromatogram {
        /// Sample identifier
        sample_id: String,
        /// Extraction error
        source: ChromatogramError,
    },

    /// Purity window does not fit the data
    #[error("sample {sample_id}: {source}")]
    Purity {
        /// Sample identifier
        sample_id: String,
        /// Integration error
        source: PurityError,
    },

    /// A blank was given but has no trace of the kind the purity uses
    #[error("sample {sample_id}: blank run has no {trace:?} trace to subtract")]
    Blank {
        /// Sample identifier
        sample_id: String,
        /// Trace the purity was computed on
        trace: PurityTrace,
    },
}

impl AnalysisError {
    /// Identifier of the failed sample, if known.
    pub fn sample_id(&self) -> Option<&str> {
        match self {
            AnalysisError::InvalidSample(_) => None,
            AnalysisError::Structure { sample_id, .. }
            | AnalysisError::Conversion { sample_id, .. }
            | AnalysisError::Run { sample_id, .. }
            | AnalysisError::Chromatogram { sample_id, .. }
            | AnalysisError::Purity { sample_id, .. }
            | AnalysisError::Blank { sample_id, .. } => Some(sample_id),
        }
    }
}

/// Errors loading the blank run.
#[derive(Debug, thiserror::Error)]
pub enum BlankError {
    /// Blank could not be converted
    #[error("blank {}: {source}", path.display())]
    Conversion {
        /// Blank path
        path: PathBuf,
        /// Converter error
        source: ConversionError,
    },

    /// Blank could not be loaded
    #[error("blank {}: {source}", path.display())]
    Run {
        /// mzML path
        path: PathBuf,
        /// Loader error
        source: RunError,
    },
}

/// One sample to analyze.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    id: String,
    structure: String,
    run: PathBuf,
    well: Option<String>,
}

impl Sample {
    /// Create a sample; the identifier and structure must be non-blank.
    pub fn new(
        id: impl Into<String>,
        structure: impl Into<String>,
        run: impl Into<PathBuf>,
    ) -> Result<Self, AnalysisError> {
        let id = id.into().trim().to_string();
        let structure = structure.into().trim().to_string();
        if id.is_empty() {
            return Err(AnalysisError::InvalidSample("sample id is empty".into()));
        }
        if structure.is_empty() {
            return Err(AnalysisError::InvalidSample(format!(
                "sample {id} has no structure"
            )));
        }
        Ok(Self {
            id,
            structure,
            run: run.into(),
            well: None,
        })
    }

    /// Assign a plate well label such as `A1`.
    pub fn with_well(mut self, well: impl Into<String>) -> Self {
        let well = well.into().trim().to_string();
        self.well = (!well.is_empty()).then_some(well);
        self
    }

    /// Sample identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// SMILES structure.
    pub fn structure(&self) -> &str {
        &self.structure
    }

    /// Path to the vendor run or mzML file.
    pub fn run(&self) -> &Path {
        &self.run
    }

    /// Well label, if the sample is on a plate.
    pub fn well(&self) -> Option<&str> {
        self.well.as_deref()
    }
}

/// Extracted-ion evidence for one adduct.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdductTrace {
    /// Adduct
    pub adduct: Adduct,
    /// Theoretical m/z
    pub mz: f64,
    /// Highest XIC intensity
    pub max_intensity: f64,
    /// Retention time of that intensity
    pub apex_rt: f64,
}

/// Which trace the purity was computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurityTrace {
    /// PDA/UV absorbance
    Pda,
    /// MS total ion current
    Tic,
}

/// Complete result of one sample's analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleAnalysis {
    /// Sample identifier
    pub sample_id: String,
    /// Well label
    pub well: Option<String>,
    /// Theoretical masses of the structure
    pub masses: TheoreticalMasses,
    /// Top peaks of the TIC, most intense first
    pub peaks: Vec<Peak>,
    /// Detection verdict
    pub detection: DetectionResult,
    /// XIC evidence per adduct
    pub adduct_traces: Vec<AdductTrace>,
    /// Purity on the selected trace; `None` when that trace is unavailable
    pub purity: Option<PurityResult>,
    /// Trace the purity was computed on
    pub purity_trace: Option<PurityTrace>,
    /// Peaks paired with the PDA trace; empty without PDA data
    pub correlations: Vec<ChannelCorrelation>,
}

impl SampleAnalysis {
    /// The matched product peak, if detected.
    pub fn product_peak(&self) -> Option<&Peak> {
        self.detection.peak_rank().and_then(|rank| self.peaks.get(rank))
    }
}

/// PDA trace of a run: total (or single-band) absorbance of its PDA scans,
/// or the first absorption chromatogram when the run has no PDA spectra.
pub fn pda_trace(run: &Run, config: &AnalysisConfig) -> Option<Chromatogram> {
    if !run.pda_scans().is_empty() {
        return Chromatogram::absorbance(
            run.pda_scans(),
            config.extraction.pda_wavelength,
            config.extraction.pda_bandwidth,
        )
        .ok();
    }
    run.absorption_traces().first().cloned()
}

fn purity_source(
    run: &Run,
    tic: &Chromatogram,
    config: &AnalysisConfig,
) -> Option<(PurityTrace, Chromatogram)> {
    let pda = || pda_trace(run, config).map(|trace| (PurityTrace::Pda, trace));
    match config.extraction.purity_channel {
        PurityChannel::Pda => pda(),
        PurityChannel::Tic => Some((PurityTrace::Tic, tic.clone())),
        PurityChannel::Auto => pda().or_else(|| Some((PurityTrace::Tic, tic.clone()))),
    }
}

fn blank_trace(blank: &Run, trace: PurityTrace, config: &AnalysisConfig) -> Option<Chromatogram> {
    match trace {
        PurityTrace::Pda => pda_trace(blank, config),
        PurityTrace::Tic => {
            let scans = blank.ms_scans_with_polarity(config.extraction.polarity);
            Chromatogram::total_ion(&scans).ok()
        }
    }
}

/// Analyze a sample whose run is already loaded.
pub fn analyze_run(
    sample: &Sample,
    run: &Run,
    blank: Option<&Run>,
    config: &AnalysisConfig,
) -> Result<SampleAnalysis, AnalysisError> {
    let sample_id = sample.id().to_string();

    let masses = MassCalculator
        .calculate(sample.structure())
        .map_err(|source| AnalysisError::Structure {
            sample_id: sample_id.clone(),
            source,
        })?;

    let scans = run.ms_scans_with_polarity(config.extraction.polarity);
    let tic = Chromatogram::total_ion(&scans).map_err(|source| AnalysisError::Chromatogram {
        sample_id: sample_id.clone(),
        source,
    })?;

    let peaks = PeakDetector::new(config.peaks).detect(&tic, &scans);
    let detection = MassMatcher::new(config.matching).match_peaks(&peaks, &masses);

    let mut adduct_traces = Vec::with_capacity(Adduct::ALL.len());
    for (adduct, mz) in masses.adducts() {
        let xic = Chromatogram::extracted_ion(&scans, mz, config.extraction.xic_tolerance)
            .map_err(|source| AnalysisError::Chromatogram {
                sample_id: sample_id.clone(),
                source,
            })?;
        let apex = xic
            .points()
            .fold(None, |best: Option<(f64, f64)>, (t, y)| match best {
                Some((_, best_y)) if best_y >= y => best,
                _ => Some((t, y)),
            });
        if let Some((apex_rt, max_intensity)) = apex {
            adduct_traces.push(AdductTrace {
                adduct,
                mz,
                max_intensity,
                apex_rt,
            });
        }
    }

    let product = detection.peak_rank().and_then(|rank| peaks.get(rank));
    let integrator = PurityIntegrator::new(config.purity).map_err(|source| AnalysisError::Purity {
        sample_id: sample_id.clone(),
        source,
    })?;
    let (purity, purity_trace) = match purity_source(run, &tic, config) {
        Some((kind, trace)) => {
            let blank_trace = match blank {
                Some(blank) => Some(blank_trace(blank, kind, config).ok_or_else(|| {
                    AnalysisError::Blank {
                        sample_id: sample_id.clone(),
                        trace: kind,
                    }
                })?),
                None => None,
            };
            let result = integrator
                .integrate(&trace, blank_trace.as_ref(), product)
                .map_err(|source| AnalysisError::Purity {
                    sample_id: sample_id.clone(),
                    source,
                })?;
            (Some(result), Some(kind))
        }
        None => {
            debug!("Sample {}: no trace for purity", sample_id);
            (None, None)
        }
    };

    let correlations = match pda_trace(run, config) {
        Some(pda) => ChannelCorrelator::new(config.correlation).correlate(&peaks, &tic, &pda),
        None => Vec::new(),
    };

    info!(
        "Sample {}: {} peaks, {}",
        sample_id,
        peaks.len(),
        match detection {
            DetectionResult::Detected {
                adduct,
                retention_time,
                ..
            } => format!("detected as {adduct} at {retention_time:.2} min"),
            DetectionResult::NotDetected => "not detected".to_string(),
        }
    );

    Ok(SampleAnalysis {
        sample_id,
        well: sample.well().map(str::to_string),
        masses,
        peaks,
        detection,
        adduct_traces,
        purity,
        purity_trace,
        correlations,
    })
}

/// Load a sample's run, converting vendor files into `work_dir` first.
pub fn load_run(
    sample: &Sample,
    converter: &dyn RunConverter,
    work_dir: &Path,
    config: &AnalysisConfig,
) -> Result<Run, AnalysisError> {
    let mzml = if is_mzml(sample.run()) {
        sample.run().to_path_buf()
    } else {
        convert_with_retry(
            converter,
            sample.run(),
            work_dir,
            config.converter.max_attempts,
            config.converter.backoff(),
        )
        .map_err(|source| AnalysisError::Conversion {
            sample_id: sample.id().to_string(),
            source,
        })?
    };
    Run::from_mzml(&mzml).map_err(|source| AnalysisError::Run {
        sample_id: sample.id().to_string(),
        path: mzml,
        source,
    })
}

/// Subdirectory of `work_dir` for the converted run of the sample at `index`.
/// No two samples of a batch share one.
pub fn sample_work_dir(work_dir: &Path, index: usize, sample_id: &str) -> PathBuf {
    let name: String = sample_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    work_dir.join(format!("{index:04}_{name}"))
}

/// Load the blank run, converting a vendor file into `work_dir/blank`.
pub fn load_blank(
    path: &Path,
    converter: &dyn RunConverter,
    work_dir: &Path,
    config: &AnalysisConfig,
) -> Result<Run, BlankError> {
    let mzml = if is_mzml(path) {
        path.to_path_buf()
    } else {
        convert_with_retry(
            converter,
            path,
            &work_dir.join("blank"),
            config.converter.max_attempts,
            config.converter.backoff(),
        )
        .map_err(|source| BlankError::Conversion {
            path: path.to_path_buf(),
            source,
        })?
    };
    info!("Loading blank {}", mzml.display());
    Run::from_mzml(&mzml).map_err(|source| BlankError::Run { path: mzml, source })
}

/// Load (converting if needed) and analyze one sample.
pub fn analyze_sample(
    sample: &Sample,
    converter: &dyn RunConverter,
    work_dir: &Path,
    blank: Option<&Run>,
    config: &AnalysisConfig,
) -> Result<SampleAnalysis, AnalysisError> {
    let run = load_run(sample, converter, work_dir, config)?;
    analyze_run(sample, &run, blank, config)
}
