//! Controlled vocabulary (CV) parameters.
//!
//! mzML annotates every element with PSI-MS terms. Only the handful needed to
//! rebuild MS and PDA scans are given names here.

use serde::{Deserialize, Serialize};

/// A controlled vocabulary parameter from mzML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CvParam {
    /// CV reference (e.g., "MS" for PSI-MS)
    pub cv_ref: String,

    /// Accession number (e.g., "MS:1000511")
    pub accession: String,

    /// Human-readable name
    pub name: String,

    /// Optional value
    pub value: Option<String>,

    /// Unit accession (e.g., "UO:0000031" for minutes)
    pub unit_accession: Option<String>,

    /// Unit name
    pub unit_name: Option<String>,
}

impl CvParam {
    /// Get the value as f64 if possible
    pub fn value_as_f64(&self) -> Option<f64> {
        self.value.as_ref()?.trim().parse().ok()
    }

    /// Get the value as i64 if possible
    pub fn value_as_i64(&self) -> Option<i64> {
        self.value.as_ref()?.trim().parse().ok()
    }
}

/// PSI-MS and UO accessions used by the reader
#[allow(non_snake_case)]
pub mod MS_CV_ACCESSIONS {
    // =========================================================================
    // Spectrum type
    // =========================================================================

    /// MS level
    pub const MS_LEVEL: &str = "MS:1000511";

    /// Centroid spectrum
    pub const CENTROID_SPECTRUM: &str = "MS:1000127";

    /// Positive scan
    pub const POSITIVE_SCAN: &str = "MS:1000130";

    /// Negative scan
    pub const NEGATIVE_SCAN: &str = "MS:1000129";

    /// Mass spectrum
    pub const MS1_SPECTRUM: &str = "MS:1000579";

    /// Electromagnetic radiation spectrum (PDA/UV detector)
    pub const EM_RADIATION_SPECTRUM: &str = "MS:1000804";

    /// Absorption spectrum
    pub const ABSORPTION_SPECTRUM: &str = "MS:1000806";

    // =========================================================================
    // Scan properties
    // =========================================================================

    /// Scan start time (retention time)
    pub const SCAN_START_TIME: &str = "MS:1000016";

    /// Total ion current
    pub const TOTAL_ION_CURRENT: &str = "MS:1000285";

    // =========================================================================
    // Binary arrays
    // =========================================================================

    /// 32-bit float
    pub const FLOAT_32_BIT: &str = "MS:1000521";

    /// 64-bit float
    pub const FLOAT_64_BIT: &str = "MS:1000523";

    /// zlib compression
    pub const ZLIB_COMPRESSION: &str = "MS:1000574";

    /// No compression
    pub const NO_COMPRESSION: &str = "MS:1000576";

    /// m/z array
    pub const MZ_ARRAY: &str = "MS:1000514";

    /// Intensity array
    pub const INTENSITY_ARRAY: &str = "MS:1000515";

    /// Wavelength array
    pub const WAVELENGTH_ARRAY: &str = "MS:1000617";

    /// Time array (chromatograms)
    pub const TIME_ARRAY: &str = "MS:1000595";

    // =========================================================================
    // Units
    // =========================================================================

    /// Second (UO)
    pub const UNIT_SECOND: &str = "UO:0000010";

    /// Minute (UO)
    pub const UNIT_MINUTE: &str = "UO:0000031";

    /// Millisecond (UO)
    pub const UNIT_MILLISECOND: &str = "UO:0000028";
}

/// True if any parameter carries `accession`.
pub fn has_cv_param(cv_params: &[CvParam], accession: &str) -> bool {
    cv_params.iter().any(|cv| cv.accession == accession)
}

/// Convert a time value to minutes based on its unit.
///
/// Values without a unit are taken to be seconds.
pub fn normalize_retention_time(value: f64, unit_accession: Option<&str>) -> f64 {
    match unit_accession {
        Some(MS_CV_ACCESSIONS::UNIT_MINUTE) => value,
        Some(MS_CV_ACCESSIONS::UNIT_MILLISECOND) => value / 60_000.0,
        _ => value / 60.0,
    }
}
