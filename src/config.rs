//! # Analysis configuration
//!
//! Every tolerance and threshold of the pipeline lives in one explicit,
//! immutable [`AnalysisConfig`] that is passed to each entry point. It can be
//! loaded from TOML; missing sections and keys take their defaults.
//!
//! ```toml
//! # lcms-qc.toml
//! [matching]
//! tolerance = 0.3
//!
//! [extraction]
//! xic_tolerance = 0.5
//! polarity = "positive"
//! purity_channel = "auto"
//! pda_wavelength = 254.0
//!
//! [peaks]
//! min_height = 5000.0
//! top_n = 3
//!
//! [purity]
//! window_start = 0.2
//! window_end = 2.5
//! baseline_correction = false
//!
//! [correlation]
//! max_gap = 0.05
//!
//! [batch]
//! parallel = true
//! plate_format = "96"
//! blank = "runs/blank.mzML"
//!
//! [converter]
//! executable = "C:/Program Files/ProteoWizard/msconvert.exe"
//! timeout_secs = 600
//! max_attempts = 3
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::chromatogram::DEFAULT_XIC_TOLERANCE;
use crate::converter::ConverterConfig;
use crate::correlate::CorrelationConfig;
use crate::matching::MassMatchConfig;
use crate::peaks::PeakDetectorConfig;
use crate::plate::PlateFormat;
use crate::purity::PurityConfig;
use crate::run::Polarity;

/// Default PDA band half-width in nm.
pub const DEFAULT_PDA_BANDWIDTH: f64 = 4.0;

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        /// Config file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("failed to parse TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which trace purity is integrated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurityChannel {
    /// PDA/UV when the run has it, otherwise TIC
    #[default]
    Auto,
    /// Always PDA/UV; runs without it get no purity
    Pda,
    /// Always the MS total ion current
    Tic,
}

/// Chromatogram extraction settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// XIC half-width in m/z
    pub xic_tolerance: f64,
    /// Keep only MS scans of this polarity
    pub polarity: Option<Polarity>,
    /// Trace used for purity
    pub purity_channel: PurityChannel,
    /// Single PDA wavelength (nm); all wavelengths are summed when unset
    pub pda_wavelength: Option<f64>,
    /// Half-width of the PDA band in nm
    pub pda_bandwidth: f64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            xic_tolerance: DEFAULT_XIC_TOLERANCE,
            polarity: None,
            purity_channel: PurityChannel::Auto,
            pda_wavelength: None,
            pda_bandwidth: DEFAULT_PDA_BANDWIDTH,
        }
    }
}

/// Batch processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Analyze samples on a worker pool
    pub parallel: bool,
    /// Blank run subtracted from every sample
    pub blank: Option<PathBuf>,
    /// Plate layout for well assignments
    pub plate_format: PlateFormat,
    /// Where converted mzML files go; a temporary directory when unset
    pub work_dir: Option<PathBuf>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            blank: None,
            plate_format: PlateFormat::default(),
            work_dir: None,
        }
    }
}

/// Complete analysis configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Mass matching
    pub matching: MassMatchConfig,
    /// Chromatogram extraction
    pub extraction: ExtractionConfig,
    /// Peak detection
    pub peaks: PeakDetectorConfig,
    /// Purity window
    pub purity: PurityConfig,
    /// MS/PDA correlation
    pub correlation: CorrelationConfig,
    /// Batch processing
    pub batch: BatchConfig,
    /// Vendor conversion
    pub converter: ConverterConfig,
}

impl AnalysisConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject negative tolerances, a zero top-N and inverted windows.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("matching.tolerance", self.matching.tolerance)?;
        non_negative("extraction.xic_tolerance", self.extraction.xic_tolerance)?;
        non_negative("extraction.pda_bandwidth", self.extraction.pda_bandwidth)?;
        non_negative("peaks.min_height", self.peaks.min_height)?;
        if let Some(gap) = self.correlation.max_gap {
            non_negative("correlation.max_gap", gap)?;
        }
        if self.peaks.top_n == 0 {
            return Err(ConfigError::Invalid("peaks.top_n must be at least 1".into()));
        }
        let fraction = self.peaks.boundary_fraction;
        if !(0.0..1.0).contains(&fraction) {
            return Err(ConfigError::Invalid(format!(
                "peaks.boundary_fraction must be in [0, 1), got {fraction}"
            )));
        }
        self.purity
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("purity: {e}")))?;
        if self.converter.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "converter.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn non_negative(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be a non-negative number, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [matching]
            tolerance = 0.25

            [extraction]
            polarity = "negative"
            purity_channel = "tic"
            pda_wavelength = 254.0

            [peaks]
            min_height = 5000.0
            top_n = 5
            boundary_fraction = 0.1

            [purity]
            window_start = 0.5
            window_end = 3.0
            baseline_correction = true

            [correlation]
            max_gap = 0.05

            [batch]
            parallel = false
            plate_format = "384"
            blank = "blank.mzML"

            [converter]
            executable = "/opt/pwiz/msconvert"
            timeout_secs = 120
        "#;

        let config = AnalysisConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.matching.tolerance, 0.25);
        assert_eq!(config.extraction.polarity, Some(Polarity::Negative));
        assert_eq!(config.extraction.purity_channel, PurityChannel::Tic);
        assert_eq!(config.extraction.pda_wavelength, Some(254.0));
        assert_eq!(config.peaks.top_n, 5);
        assert_eq!(config.purity.window_end, 3.0);
        assert!(config.purity.baseline_correction);
        assert_eq!(config.correlation.max_gap, Some(0.05));
        assert!(!config.batch.parallel);
        assert_eq!(config.batch.plate_format, PlateFormat::WELLS_384);
        assert_eq!(config.batch.blank, Some(PathBuf::from("blank.mzML")));
        assert_eq!(config.converter.timeout_secs, 120);
        assert_eq!(config.converter.max_attempts, 3);
    }

    #[test]
    fn test_partial_config() {
        let config = AnalysisConfig::from_toml_str("[peaks]\ntop_n = 1\n").unwrap();
        assert_eq!(config.peaks.top_n, 1);
        assert_eq!(config.peaks.min_height, 10_000.0);
        assert_eq!(config.matching.tolerance, 0.5);
        assert_eq!(config.purity.window_start, 0.2);
        assert!(!config.purity.baseline_correction);
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(AnalysisConfig::from_toml_str("").unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn test_validation() {
        for bad in [
            "[matching]\ntolerance = -0.1\n",
            "[peaks]\ntop_n = 0\n",
            "[purity]\nwindow_start = 3.0\nwindow_end = 1.0\n",
            "[peaks]\nboundary_fraction = 1.5\n",
            "[correlation]\nmax_gap = -1.0\n",
            "[converter]\nmax_attempts = 0\n",
        ] {
            assert!(
                matches!(AnalysisConfig::from_toml_str(bad), Err(ConfigError::Invalid(_))),
                "{bad} should be rejected"
            );
        }
        assert!(matches!(
            AnalysisConfig::from_toml_str("[batch]\nplate_format = \"17\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = AnalysisConfig::from_file(Path::new("/nonexistent/lcms-qc.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/lcms-qc.toml"));
    }
}
