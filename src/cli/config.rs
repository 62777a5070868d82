//! TOML configuration file support.
//!
//! Settings come from the built-in defaults, then an optional config file,
//! then command-line flags:
//!
//! ```toml
//! # lcms-qc.toml
//! [matching]
//! tolerance = 0.3
//!
//! [peaks]
//! min_height = 5000.0
//! top_n = 3
//!
//! [batch]
//! plate_format = "384"
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use lcms_qc::config::{AnalysisConfig, PurityChannel};
use lcms_qc::plate::PlateFormat;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub tolerance: Option<f64>,
    pub min_height: Option<f64>,
    pub top_n: Option<usize>,
    pub window_start: Option<f64>,
    pub window_end: Option<f64>,
    pub purity_channel: Option<PurityChannel>,
    pub baseline_correction: bool,
    pub blank: Option<PathBuf>,
    pub msconvert: Option<PathBuf>,
    pub plate_format: Option<PlateFormat>,
    pub sequential: bool,
    pub work_dir: Option<PathBuf>,
}

impl Overrides {
    fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(tolerance) = self.tolerance {
            config.matching.tolerance = tolerance;
        }
        if let Some(min_height) = self.min_height {
            config.peaks.min_height = min_height;
        }
        if let Some(top_n) = self.top_n {
            config.peaks.top_n = top_n;
        }
        if let Some(start) = self.window_start {
            config.purity.window_start = start;
        }
        if let Some(end) = self.window_end {
            config.purity.window_end = end;
        }
        if self.baseline_correction {
            config.purity.baseline_correction = true;
        }
        if let Some(channel) = self.purity_channel {
            config.extraction.purity_channel = channel;
        }
        if let Some(blank) = &self.blank {
            config.batch.blank = Some(blank.clone());
        }
        if let Some(msconvert) = &self.msconvert {
            config.converter.executable = Some(msconvert.clone());
        }
        if let Some(format) = self.plate_format {
            config.batch.plate_format = format;
        }
        if self.sequential {
            config.batch.parallel = false;
        }
        if let Some(dir) = &self.work_dir {
            config.batch.work_dir = Some(dir.clone());
        }
    }
}

/// Load the config file (if any), apply overrides and validate the result.
pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<AnalysisConfig> {
    let mut config = match path {
        Some(path) => from_file(path)?,
        None => AnalysisConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Load configuration from a TOML file.
pub fn from_file(path: &Path) -> Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    from_str(&content)
}

/// Parse configuration from a TOML string.
pub fn from_str(content: &str) -> Result<AnalysisConfig> {
    AnalysisConfig::from_toml_str(content).context("Failed to parse TOML configuration")
}
