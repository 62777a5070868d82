//! # Result export
//!
//! The flat per-sample export record and its CSV / JSON writers.
//!
//! The serialized column names of [`SampleRecord`] are a stable contract:
//!
//! ```text
//! sample_id, well, formula, monoisotopic_mass, mh_mass, mna_mass,
//! mh_minus_mass, detected, matched_mass, retention_time, purity,
//! peak1_rt, peak1_mass, peak2_rt, peak2_mass, peak3_rt, peak3_mass
//! ```
//!
//! Unset values are empty CSV cells and JSON `null`s, never zero.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::SampleAnalysis;
use crate::plate::{
    PlateAggregator, PlateError, PlateFormat, PlateGrid, WellPeak, WellState, WellSummary,
};

/// File name of the per-sample CSV inside a report directory.
pub const RESULTS_CSV: &str = "results.csv";
/// File name of the failure CSV inside a report directory.
pub const FAILURES_CSV: &str = "failures.csv";
/// File name of the JSON report inside a report directory.
pub const REPORT_JSON: &str = "report.json";

/// Errors raised while writing or reading reports.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// File could not be created or read
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// CSV serialization failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Report wells do not fit the plate
    #[error(transparent)]
    Plate(#[from] PlateError),
}

/// Flat export record of one analyzed sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Sample identifier
    pub sample_id: String,
    /// Well label
    pub well: Option<String>,
    /// Hill-order formula
    pub formula: String,
    /// Neutral monoisotopic mass
    pub monoisotopic_mass: f64,
    /// `[M+H]+`
    pub mh_mass: f64,
    /// `[M+Na]+`
    pub mna_mass: f64,
    /// `[M-H]-`
    pub mh_minus_mass: f64,
    /// Product detected
    pub detected: bool,
    /// Matched m/z
    pub matched_mass: Option<f64>,
    /// Retention time of the matched peak
    pub retention_time: Option<f64>,
    /// Purity fraction
    pub purity: Option<f64>,
    /// Apex RT of the strongest peak
    pub peak1_rt: Option<f64>,
    /// Apex ion m/z of the strongest peak
    pub peak1_mass: Option<f64>,
    /// Apex RT of the second peak
    pub peak2_rt: Option<f64>,
    /// Apex ion m/z of the second peak
    pub peak2_mass: Option<f64>,
    /// Apex RT of the third peak
    pub peak3_rt: Option<f64>,
    /// Apex ion m/z of the third peak
    pub peak3_mass: Option<f64>,
}

impl SampleRecord {
    /// Flatten a sample analysis.
    pub fn from_analysis(analysis: &SampleAnalysis) -> Self {
        let peak = |i: usize| analysis.peaks.get(i);
        let rt = |i: usize| peak(i).map(|p| p.apex_rt);
        let mass = |i: usize| peak(i).and_then(|p| p.apex_ion).map(|ion| ion.mz);
        let masses = &analysis.masses;

        Self {
            sample_id: analysis.sample_id.clone(),
            well: analysis.well.clone(),
            formula: masses.formula.to_string(),
            monoisotopic_mass: masses.monoisotopic,
            mh_mass: masses.protonated,
            mna_mass: masses.sodiated,
            mh_minus_mass: masses.deprotonated,
            detected: analysis.detection.is_detected(),
            matched_mass: analysis.detection.mass(),
            retention_time: analysis.detection.retention_time(),
            purity: analysis.purity.and_then(|p| p.purity),
            peak1_rt: rt(0),
            peak1_mass: mass(0),
            peak2_rt: rt(1),
            peak2_mass: mass(1),
            peak3_rt: rt(2),
            peak3_mass: mass(2),
        }
    }

    fn well_summary(&self) -> WellSummary {
        let peaks = [
            (self.peak1_rt, self.peak1_mass),
            (self.peak2_rt, self.peak2_mass),
            (self.peak3_rt, self.peak3_mass),
        ]
        .into_iter()
        .filter_map(|(rt, mass)| {
            rt.map(|retention_time| WellPeak {
                retention_time,
                mass,
            })
        })
        .collect();

        WellSummary {
            sample_id: self.sample_id.clone(),
            formula: self.formula.clone(),
            monoisotopic_mass: self.monoisotopic_mass,
            mh_mass: self.mh_mass,
            mna_mass: self.mna_mass,
            mh_minus_mass: self.mh_minus_mass,
            detected: self.detected,
            purity: self.purity,
            retention_time: self.retention_time,
            matched_mass: self.matched_mass,
            peaks,
        }
    }
}

/// A sample whose analysis failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Sample identifier
    pub sample_id: String,
    /// Well label
    pub well: Option<String>,
    /// Error message
    pub message: String,
}

/// Complete JSON report of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    /// When the batch finished
    pub generated_at: DateTime<Utc>,
    /// Isotope table used for the masses
    pub isotope_table: String,
    /// Plate layout of the batch
    pub plate_format: PlateFormat,
    /// Analyzed samples
    pub samples: Vec<SampleRecord>,
    /// Failed samples
    pub failures: Vec<FailureRecord>,
    /// Plate grid, when samples were assigned to wells
    #[serde(default, skip_deserializing)]
    pub plate: Option<PlateGrid>,
}

impl ReportDocument {
    /// Rebuild the plate grid from the records and failures.
    pub fn plate_grid(&self) -> Result<PlateGrid, PlateError> {
        build_plate(self.plate_format, &self.samples, &self.failures)
    }

    /// Write the document as pretty-printed JSON.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), ReportError> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Read a JSON report.
    pub fn read_json<R: Read>(reader: R) -> Result<Self, ReportError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Read a JSON report from a file.
    pub fn open(path: &Path) -> Result<Self, ReportError> {
        let file = File::open(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::read_json(BufReader::new(file))
    }

    /// Write `results.csv`, `failures.csv` and `report.json` into `dir`.
    pub fn write_dir(&self, dir: &Path) -> Result<(), ReportError> {
        std::fs::create_dir_all(dir).map_err(|source| ReportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        write_records_csv(create(&dir.join(RESULTS_CSV))?, &self.samples)?;
        write_failures_csv(create(&dir.join(FAILURES_CSV))?, &self.failures)?;
        let mut json = create(&dir.join(REPORT_JSON))?;
        self.write_json(&mut json)?;
        json.flush().map_err(|source| ReportError::Io {
            path: dir.join(REPORT_JSON),
            source,
        })?;
        Ok(())
    }
}

fn create(path: &Path) -> Result<BufWriter<File>, ReportError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Place records and failures that carry a well onto a plate.
pub fn build_plate(
    format: PlateFormat,
    records: &[SampleRecord],
    failures: &[FailureRecord],
) -> Result<PlateGrid, PlateError> {
    let mut entries = Vec::with_capacity(records.len() + failures.len());
    for record in records {
        if let Some(well) = &record.well {
            entries.push((well.parse()?, WellState::Analyzed(record.well_summary())));
        }
    }
    for failure in failures {
        if let Some(well) = &failure.well {
            entries.push((
                well.parse()?,
                WellState::Failed {
                    sample_id: failure.sample_id.clone(),
                    reason: failure.message.clone(),
                },
            ));
        }
    }
    PlateAggregator::new(format).aggregate(entries)
}

/// Write sample records as CSV with a header row.
pub fn write_records_csv<W: Write>(writer: W, records: &[SampleRecord]) -> Result<(), ReportError> {
    write_csv(writer, records)
}

/// Write failure records as CSV with a header row.
pub fn write_failures_csv<W: Write>(writer: W, failures: &[FailureRecord]) -> Result<(), ReportError> {
    write_csv(writer, failures)
}

fn write_csv<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<(), ReportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Read sample records back from CSV.
pub fn read_records_csv<R: Read>(reader: R) -> Result<Vec<SampleRecord>, ReportError> {
    let mut csv = csv::Reader::from_reader(reader);
    let records = csv.deserialize().collect::<Result<Vec<SampleRecord>, _>>()?;
    Ok(records)
}
