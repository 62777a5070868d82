//! Plain data decoded from mzML elements.

use serde::{Deserialize, Serialize};

use super::cv_params::CvParam;

/// Detector that produced a spectrum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpectrumKind {
    /// Mass spectrum (m/z axis)
    #[default]
    Mass,
    /// UV/PDA absorption spectrum (wavelength axis, nm)
    Absorption,
}

/// A spectrum from an mzML file
#[derive(Debug, Clone, Default)]
pub struct MzMLSpectrum {
    /// Spectrum index (0-based)
    pub index: i64,

    /// Native spectrum ID
    pub id: String,

    /// Default array length
    pub default_array_length: usize,

    /// MS level (1 for MS1, 2 for MS/MS); 0 for absorption spectra
    pub ms_level: i16,

    /// Polarity: 1 positive, -1 negative, 0 unknown
    pub polarity: i8,

    /// Retention time in minutes
    pub retention_time: Option<f64>,

    /// Detector kind
    pub kind: SpectrumKind,

    /// Centroided data
    pub centroided: bool,

    /// Total ion current reported by the instrument
    pub total_ion_current: Option<f64>,

    /// m/z values
    pub mz_array: Vec<f64>,

    /// Wavelengths (nm) for absorption spectra
    pub wavelength_array: Vec<f64>,

    /// Intensity (or absorbance) values
    pub intensity_array: Vec<f64>,

    /// All CV parameters
    pub cv_params: Vec<CvParam>,
}

impl MzMLSpectrum {
    /// Extract the scan number from a native ID like `... scan=12345`
    pub fn scan_number(&self) -> Option<i64> {
        self.id
            .split_whitespace()
            .find_map(|part| part.strip_prefix("scan="))
            .and_then(|n| n.parse().ok())
    }

    /// The x axis of this spectrum: wavelengths for absorption, m/z otherwise
    pub fn x_array(&self) -> &[f64] {
        match self.kind {
            SpectrumKind::Absorption if !self.wavelength_array.is_empty() => {
                &self.wavelength_array
            }
            _ => &self.mz_array,
        }
    }
}

/// A chromatogram from an mzML file
#[derive(Debug, Clone, Default)]
pub struct MzMLChromatogram {
    /// Chromatogram index (0-based)
    pub index: i64,

    /// Native chromatogram ID
    pub id: String,

    /// Default array length
    pub default_array_length: usize,

    /// Chromatogram type (TIC, absorption, ...)
    pub chromatogram_type: ChromatogramType,

    /// Time array in minutes
    pub time_array: Vec<f64>,

    /// Intensity array
    pub intensity_array: Vec<f64>,

    /// CV parameters
    pub cv_params: Vec<CvParam>,
}

/// Types of chromatograms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChromatogramType {
    /// Unknown or unspecified chromatogram type
    #[default]
    Unknown,
    /// Total Ion Current
    TIC,
    /// Base Peak Chromatogram
    BPC,
    /// Selected Reaction Monitoring
    SRM,
    /// Extracted Ion Chromatogram
    XIC,
    /// Absorption chromatogram (UV/PDA)
    Absorption,
    /// Emission chromatogram
    Emission,
}

impl ChromatogramType {
    /// Determine chromatogram type from CV accession
    pub fn from_cv_accession(accession: &str) -> Option<Self> {
        match accession {
            "MS:1000235" => Some(ChromatogramType::TIC),
            "MS:1000628" => Some(ChromatogramType::BPC),
            "MS:1001473" | "MS:1000908" => Some(ChromatogramType::SRM),
            "MS:1000627" => Some(ChromatogramType::XIC),
            "MS:1000812" => Some(ChromatogramType::Absorption),
            "MS:1000813" => Some(ChromatogramType::Emission),
            _ => None,
        }
    }
}

/// File-level information read before the first spectrum
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MzMLFileMetadata {
    /// mzML schema version
    pub version: Option<String>,
    /// `run/@id`
    pub run_id: Option<String>,
    /// `run/@startTimeStamp`
    pub run_start_time: Option<String>,
    /// Source file names from `fileDescription`
    pub source_files: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_number_extraction() {
        let spectrum = MzMLSpectrum {
            id: "controllerType=0 controllerNumber=1 scan=12345".to_string(),
            ..Default::default()
        };
        assert_eq!(spectrum.scan_number(), Some(12345));

        let spectrum = MzMLSpectrum {
            id: "function=3 process=0 scan=7".to_string(),
            ..Default::default()
        };
        assert_eq!(spectrum.scan_number(), Some(7));

        assert_eq!(MzMLSpectrum::default().scan_number(), None);
    }

    #[test]
    fn test_chromatogram_type_from_accession() {
        assert_eq!(
            ChromatogramType::from_cv_accession("MS:1000812"),
            Some(ChromatogramType::Absorption)
        );
        assert_eq!(
            ChromatogramType::from_cv_accession("MS:1000235"),
            Some(ChromatogramType::TIC)
        );
        assert_eq!(ChromatogramType::from_cv_accession("MS:1000576"), None);
    }

    #[test]
    fn test_x_array_follows_kind() {
        let pda = MzMLSpectrum {
            kind: SpectrumKind::Absorption,
            wavelength_array: vec![210.0, 254.0],
            ..Default::default()
        };
        assert_eq!(pda.x_array(), &[210.0, 254.0]);

        let ms = MzMLSpectrum {
            mz_array: vec![100.0],
            ..Default::default()
        };
        assert_eq!(ms.x_array(), &[100.0]);
    }
}
