//! # Batch processing
//!
//! Runs the per-sample pipeline over a whole sample sheet (typically one
//! plate). The layout is validated before any sample is touched; samples are
//! then analyzed independently (on a rayon pool with the `parallel` feature)
//! and a failure in one sample never affects another.
//!
//! ## Sample sheet
//!
//! ```text
//! sample_id,structure,run,well
//! S001,CCO,runs/A1.raw,A1
//! S002,c1ccccc1O,runs/A2.mzML,A2
//! ```
//!
//! `well` is optional. Relative run paths are resolved against the sheet's
//! directory.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use crossbeam_channel::Sender;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::{
    analyze_sample, load_blank, sample_work_dir, AnalysisError, BlankError, Sample, SampleAnalysis,
};
use crate::chemistry::ISOTOPE_TABLE_VERSION;
use crate::config::AnalysisConfig;
use crate::converter::RunConverter;
use crate::plate::{PlateAggregator, PlateError, WellCoordinate};
use crate::report::{build_plate, FailureRecord, ReportDocument, SampleRecord};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Errors that stop a batch before or outside per-sample analysis.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Sample sheet could not be opened
    #[error("failed to open sample sheet {}: {source}", path.display())]
    Io {
        /// Sheet path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Sample sheet is not valid CSV
    #[error("malformed sample sheet: {0}")]
    Csv(#[from] csv::Error),

    /// A sheet row is not a valid sample
    #[error("sample sheet row {row}: {source}")]
    InvalidRow {
        /// One-based data row
        row: usize,
        /// What was wrong with it
        source: AnalysisError,
    },

    /// Two samples share an identifier
    #[error("duplicate sample id '{0}'")]
    DuplicateSample(String),

    /// Well layout is invalid
    #[error("sample {sample_id}: {source}")]
    Layout {
        /// Sample whose well is invalid
        sample_id: String,
        /// Plate error
        source: PlateError,
    },

    /// Well layout is invalid
    #[error(transparent)]
    Plate(#[from] PlateError),

    /// Blank run could not be converted or loaded
    #[error(transparent)]
    Blank(#[from] BlankError),

    /// Scratch directory could not be created
    #[error("failed to create work directory: {0}")]
    WorkDir(std::io::Error),
}

#[derive(Debug, Deserialize)]
struct SheetRow {
    sample_id: String,
    structure: String,
    run: PathBuf,
    #[serde(default)]
    well: Option<String>,
}

/// Read a sample sheet file; relative run paths are resolved against its directory.
pub fn read_sample_sheet(path: &Path) -> Result<Vec<Sample>, BatchError> {
    let file = File::open(path).map_err(|source| BatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    parse_sample_sheet(file, base)
}

/// Parse a sample sheet from any reader.
pub fn parse_sample_sheet<R: Read>(reader: R, base: &Path) -> Result<Vec<Sample>, BatchError> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut samples = Vec::new();
    for (i, row) in csv.deserialize::<SheetRow>().enumerate() {
        let row = row?;
        let run = if row.run.is_relative() {
            base.join(&row.run)
        } else {
            row.run
        };
        let mut sample = Sample::new(row.sample_id, row.structure, run)
            .map_err(|source| BatchError::InvalidRow { row: i + 1, source })?;
        if let Some(well) = row.well {
            sample = sample.with_well(well);
        }
        samples.push(sample);
    }
    Ok(samples)
}

/// Progress reported by batch workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A worker picked up a sample
    Started {
        /// Sample identifier
        sample_id: String,
    },
    /// A sample was analyzed
    Finished {
        /// Sample identifier
        sample_id: String,
        /// Whether the product was detected
        detected: bool,
        /// Samples completed so far
        completed: usize,
        /// Samples in the batch
        total: usize,
    },
    /// A sample failed
    Failed {
        /// Sample identifier
        sample_id: String,
        /// Error message
        message: String,
        /// Samples completed so far
        completed: usize,
        /// Samples in the batch
        total: usize,
    },
}

/// Outcome of one sample.
#[derive(Debug)]
pub struct SampleOutcome {
    /// The sample
    pub sample: Sample,
    /// Its analysis or the error that stopped it
    pub result: Result<SampleAnalysis, AnalysisError>,
}

/// Results of a whole batch.
#[derive(Debug)]
pub struct BatchReport {
    /// Per-sample outcomes in sheet order
    pub outcomes: Vec<SampleOutcome>,
    /// Report with export records and the plate grid
    pub document: ReportDocument,
}

impl BatchReport {
    /// Successful analyses in sheet order.
    pub fn analyses(&self) -> impl Iterator<Item = &SampleAnalysis> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Number of failed samples.
    pub fn failure_count(&self) -> usize {
        self.document.failures.len()
    }
}

/// Runs the per-sample pipeline over many samples.
pub struct BatchProcessor<'a> {
    config: &'a AnalysisConfig,
    converter: &'a dyn RunConverter,
    progress: Option<Sender<ProgressEvent>>,
}

impl<'a> BatchProcessor<'a> {
    /// Processor using `config` and `converter` for vendor files.
    pub fn new(config: &'a AnalysisConfig, converter: &'a dyn RunConverter) -> Self {
        Self {
            config,
            converter,
            progress: None,
        }
    }

    /// Send progress events to `sender`.
    pub fn with_progress(mut self, sender: Sender<ProgressEvent>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// Check sample ids and well assignments before any analysis.
    pub fn validate_layout(&self, samples: &[Sample]) -> Result<(), BatchError> {
        let mut ids = HashSet::new();
        for sample in samples {
            if !ids.insert(sample.id()) {
                return Err(BatchError::DuplicateSample(sample.id().to_string()));
            }
        }

        let mut wells: Vec<WellCoordinate> = Vec::new();
        for sample in samples {
            if let Some(label) = sample.well() {
                let well = label.parse().map_err(|source| BatchError::Layout {
                    sample_id: sample.id().to_string(),
                    source,
                })?;
                wells.push(well);
            }
        }
        PlateAggregator::new(self.config.batch.plate_format).validate(&wells)?;
        Ok(())
    }

    /// Analyze every sample and assemble the report.
    pub fn run(&self, samples: Vec<Sample>) -> Result<BatchReport, BatchError> {
        self.validate_layout(&samples)?;

        let scratch;
        let work_dir: PathBuf = match &self.config.batch.work_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).map_err(BatchError::WorkDir)?;
                dir.clone()
            }
            None => {
                scratch = tempfile::tempdir().map_err(BatchError::WorkDir)?;
                scratch.path().to_path_buf()
            }
        };

        let blank = match &self.config.batch.blank {
            Some(path) => Some(load_blank(path, self.converter, &work_dir, self.config)?),
            None => None,
        };

        info!("Analyzing {} samples", samples.len());
        let total = samples.len();
        let completed = AtomicUsize::new(0);
        let process = |(index, sample): (usize, Sample)| {
            self.emit(ProgressEvent::Started {
                sample_id: sample.id().to_string(),
            });
            let sample_dir = sample_work_dir(&work_dir, index, sample.id());
            let result = analyze_sample(&sample, self.converter, &sample_dir, blank.as_ref(), self.config);
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            let event = match &result {
                Ok(analysis) => ProgressEvent::Finished {
                    sample_id: sample.id().to_string(),
                    detected: analysis.detection.is_detected(),
                    completed: done,
                    total,
                },
                Err(e) => {
                    warn!("{}", e);
                    ProgressEvent::Failed {
                        sample_id: sample.id().to_string(),
                        message: e.to_string(),
                        completed: done,
                        total,
                    }
                }
            };
            self.emit(event);
            SampleOutcome { sample, result }
        };

        let outcomes: Vec<SampleOutcome> = self.map_samples(samples, process);

        let mut records = Vec::new();
        let mut failures = Vec::new();
        for outcome in &outcomes {
            match &outcome.result {
                Ok(analysis) => records.push(SampleRecord::from_analysis(analysis)),
                Err(e) => failures.push(FailureRecord {
                    sample_id: outcome.sample.id().to_string(),
                    well: outcome.sample.well().map(str::to_string),
                    message: e.to_string(),
                }),
            }
        }

        let format = self.config.batch.plate_format;
        let plate = if outcomes.iter().any(|o| o.sample.well().is_some()) {
            Some(build_plate(format, &records, &failures)?)
        } else {
            None
        };

        info!(
            "Batch finished: {} analyzed, {} failed",
            records.len(),
            failures.len()
        );
        Ok(BatchReport {
            outcomes,
            document: ReportDocument {
                generated_at: Utc::now(),
                isotope_table: ISOTOPE_TABLE_VERSION.to_string(),
                plate_format: format,
                samples: records,
                failures,
                plate,
            },
        })
    }

    #[cfg(feature = "parallel")]
    fn map_samples<F>(&self, samples: Vec<Sample>, process: F) -> Vec<SampleOutcome>
    where
        F: Fn((usize, Sample)) -> SampleOutcome + Sync + Send,
    {
        if self.config.batch.parallel {
            samples.into_par_iter().enumerate().map(process).collect()
        } else {
            samples.into_iter().enumerate().map(process).collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn map_samples<F>(&self, samples: Vec<Sample>, process: F) -> Vec<SampleOutcome>
    where
        F: Fn((usize, Sample)) -> SampleOutcome,
    {
        samples.into_iter().enumerate().map(process).collect()
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(sender) = &self.progress {
            // the consumer may have gone away; progress is advisory
            let _ = sender.send(event);
        }
    }
}
