//! # Run model
//!
//! Validated scans and the run they belong to. A [`Run`] keeps MS1 scans and
//! PDA/UV scans apart so every downstream consumer works on a single channel.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::chromatogram::{Chromatogram, ChromatogramError, TraceKind};
use crate::mzml::{
    ChromatogramType, MzMLError, MzMLSpectrum, MzMLStreamer, SpectrumKind,
    DEFAULT_INPUT_BUFFER_SIZE,
};

/// Ion polarity of an MS scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Positive ion mode
    Positive,
    /// Negative ion mode
    Negative,
    /// Not annotated
    #[default]
    Unknown,
}

impl Polarity {
    fn from_sign(sign: i8) -> Self {
        match sign {
            1 => Polarity::Positive,
            -1 => Polarity::Negative,
            _ => Polarity::Unknown,
        }
    }
}

/// Which detector produced a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "lowercase")]
pub enum ChannelTag {
    /// Mass spectrometer; the x axis is m/z
    Ms {
        /// MS level
        level: u8,
        /// Ion polarity
        polarity: Polarity,
    },
    /// Photodiode array / UV detector; the x axis is wavelength in nm
    Pda,
}

/// Errors raised when a scan violates its invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    /// Retention time is NaN or infinite
    #[error("retention time {0} is not finite")]
    NonFiniteRetentionTime(f64),

    /// x and intensity arrays differ in length
    #[error("array length mismatch: {x} x values, {intensity} intensities")]
    LengthMismatch {
        /// Number of x values
        x: usize,
        /// Number of intensity values
        intensity: usize,
    },

    /// An x or intensity value is NaN or infinite
    #[error("non-finite value at position {0}")]
    NonFiniteValue(usize),

    /// x values are not strictly increasing
    #[error("x values must be strictly increasing (position {0})")]
    Unsorted(usize),
}

/// One spectrum at one retention time.
///
/// For MS scans the x axis is m/z; for PDA scans it is wavelength in nm.
/// x values are strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    retention_time: f64,
    x: Vec<f64>,
    intensity: Vec<f64>,
    channel: ChannelTag,
}

impl Scan {
    /// Create a scan from sorted arrays.
    pub fn new(
        retention_time: f64,
        x: Vec<f64>,
        intensity: Vec<f64>,
        channel: ChannelTag,
    ) -> Result<Self, ScanError> {
        Self::check_arrays(retention_time, &x, &intensity)?;
        if let Some(i) = x.windows(2).position(|w| w[1] <= w[0]) {
            return Err(ScanError::Unsorted(i + 1));
        }
        Ok(Self {
            retention_time,
            x,
            intensity,
            channel,
        })
    }

    /// Create a scan from arrays in any order; repeated x values are merged
    /// by summing their intensities.
    pub fn from_unsorted(
        retention_time: f64,
        x: Vec<f64>,
        intensity: Vec<f64>,
        channel: ChannelTag,
    ) -> Result<Self, ScanError> {
        Self::check_arrays(retention_time, &x, &intensity)?;
        let mut pairs: Vec<(f64, f64)> = x.into_iter().zip(intensity).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut merged_x: Vec<f64> = Vec::with_capacity(pairs.len());
        let mut merged_intensity: Vec<f64> = Vec::with_capacity(pairs.len());
        for (x, y) in pairs {
            match merged_x.last() {
                Some(&last) if last == x => {
                    if let Some(total) = merged_intensity.last_mut() {
                        *total += y;
                    }
                }
                _ => {
                    merged_x.push(x);
                    merged_intensity.push(y);
                }
            }
        }

        Ok(Self {
            retention_time,
            x: merged_x,
            intensity: merged_intensity,
            channel,
        })
    }

    fn check_arrays(retention_time: f64, x: &[f64], intensity: &[f64]) -> Result<(), ScanError> {
        if !retention_time.is_finite() {
            return Err(ScanError::NonFiniteRetentionTime(retention_time));
        }
        if x.len() != intensity.len() {
            return Err(ScanError::LengthMismatch {
                x: x.len(),
                intensity: intensity.len(),
            });
        }
        if let Some(i) = x
            .iter()
            .zip(intensity)
            .position(|(a, b)| !a.is_finite() || !b.is_finite())
        {
            return Err(ScanError::NonFiniteValue(i));
        }
        Ok(())
    }

    /// Retention time in minutes.
    pub fn retention_time(&self) -> f64 {
        self.retention_time
    }

    /// m/z values (MS) or wavelengths (PDA).
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Intensities (MS) or absorbances (PDA).
    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    /// Detector channel.
    pub fn channel(&self) -> ChannelTag {
        self.channel
    }

    /// Number of (x, intensity) pairs.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// True if the scan holds no data points.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Iterate `(x, intensity)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.intensity.iter().copied())
    }

    /// Sum of all intensities.
    pub fn total_intensity(&self) -> f64 {
        self.intensity.iter().sum()
    }

    /// Sum of intensities with `|x - target| <= tolerance`.
    pub fn intensity_within(&self, target: f64, tolerance: f64) -> f64 {
        let lower = self.x.partition_point(|&x| x < target - tolerance);
        self.points()
            .skip(lower)
            .take_while(|(x, _)| *x <= target + tolerance)
            .map(|(_, y)| y)
            .sum()
    }

    /// The most intense pair; ties go to the lower x.
    pub fn most_intense(&self) -> Option<(f64, f64)> {
        self.points()
            .fold(None, |best: Option<(f64, f64)>, (x, y)| match best {
                Some((_, best_y)) if best_y >= y => best,
                _ => Some((x, y)),
            })
    }
}

/// Errors raised while loading a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The mzML document could not be read
    #[error("failed to read mzML: {0}")]
    Mzml(#[from] MzMLError),

    /// File could not be opened
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A spectrum has no scan start time
    #[error("spectrum {0} has no retention time")]
    MissingRetentionTime(String),

    /// A spectrum's arrays are invalid
    #[error("spectrum {id}: {source}")]
    InvalidScan {
        /// Native spectrum ID
        id: String,
        /// What was wrong with it
        source: ScanError,
    },

    /// An absorption chromatogram's arrays are invalid
    #[error("chromatogram {id}: {source}")]
    InvalidChromatogram {
        /// Native chromatogram ID
        id: String,
        /// What was wrong with it
        source: ChromatogramError,
    },
}

/// All scans of one LC-MS injection, sorted by retention time per channel.
#[derive(Debug, Clone, Default)]
pub struct Run {
    name: String,
    ms_scans: Vec<Scan>,
    pda_scans: Vec<Scan>,
    absorption_traces: Vec<Chromatogram>,
}

impl Run {
    /// Build a run from scans of any channel. MSn scans (level > 1) are dropped.
    pub fn from_scans(name: impl Into<String>, scans: impl IntoIterator<Item = Scan>) -> Self {
        let mut run = Run {
            name: name.into(),
            ..Default::default()
        };
        for scan in scans {
            run.push_scan(scan);
        }
        run.sort();
        run
    }

    /// Attach a ready-made absorption chromatogram (e.g. a single-wavelength UV trace).
    pub fn with_absorption_trace(mut self, trace: Chromatogram) -> Self {
        self.absorption_traces.push(trace);
        self
    }

    fn push_scan(&mut self, scan: Scan) -> bool {
        match scan.channel() {
            ChannelTag::Ms { level: 1, .. } => self.ms_scans.push(scan),
            ChannelTag::Ms { .. } => return false,
            ChannelTag::Pda => self.pda_scans.push(scan),
        }
        true
    }

    fn sort(&mut self) {
        self.ms_scans
            .sort_by(|a, b| a.retention_time.total_cmp(&b.retention_time));
        self.pda_scans
            .sort_by(|a, b| a.retention_time.total_cmp(&b.retention_time));
    }

    /// Load a run from an mzML file; the run is named after the file stem.
    pub fn from_mzml<P: AsRef<Path>>(path: P) -> Result<Self, RunError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut run = Self::from_reader(BufReader::with_capacity(DEFAULT_INPUT_BUFFER_SIZE, file))?;
        if let Some(stem) = path.file_stem() {
            run.name = stem.to_string_lossy().into_owned();
        }
        info!(
            "Loaded {}: {} MS1 scans, {} PDA scans, {} absorption traces",
            path.display(),
            run.ms_scans.len(),
            run.pda_scans.len(),
            run.absorption_traces.len()
        );
        Ok(run)
    }

    /// Load a run from any mzML source.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, RunError> {
        let mut run = Run::default();
        let mut skipped = 0usize;

        let mut spectra = MzMLStreamer::new(reader)?.spectra();
        for spectrum in spectra.by_ref() {
            let scan = spectrum_to_scan(spectrum?)?;
            if !run.push_scan(scan) {
                skipped += 1;
            }
        }
        if skipped > 0 {
            debug!("Skipped {} MSn spectra", skipped);
        }

        let mut streamer = spectra.into_inner();
        if let Some(id) = &streamer.metadata().run_id {
            run.name = id.clone();
        }
        while let Some(chromatogram) = streamer.next_chromatogram()? {
            if chromatogram.chromatogram_type != ChromatogramType::Absorption {
                continue;
            }
            let trace = Chromatogram::new(
                chromatogram.time_array,
                chromatogram.intensity_array,
                TraceKind::Absorbance { wavelength: None },
            )
            .map_err(|source| RunError::InvalidChromatogram {
                id: chromatogram.id.clone(),
                source,
            })?;
            run.absorption_traces.push(trace);
        }

        run.sort();
        Ok(run)
    }

    /// Run name (file stem or mzML run id).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MS1 scans sorted by retention time.
    pub fn ms_scans(&self) -> &[Scan] {
        &self.ms_scans
    }

    /// MS1 scans of one polarity; `None` keeps every scan.
    pub fn ms_scans_with_polarity(&self, polarity: Option<Polarity>) -> Cow<'_, [Scan]> {
        match polarity {
            None => Cow::Borrowed(&self.ms_scans),
            Some(wanted) => Cow::Owned(
                self.ms_scans
                    .iter()
                    .filter(|s| matches!(s.channel, ChannelTag::Ms { polarity, .. } if polarity == wanted))
                    .cloned()
                    .collect(),
            ),
        }
    }

    /// PDA scans sorted by retention time.
    pub fn pda_scans(&self) -> &[Scan] {
        &self.pda_scans
    }

    /// Absorption chromatograms stored directly in the mzML.
    pub fn absorption_traces(&self) -> &[Chromatogram] {
        &self.absorption_traces
    }

    /// True if the run carries any UV/PDA data.
    pub fn has_pda(&self) -> bool {
        !self.pda_scans.is_empty() || !self.absorption_traces.is_empty()
    }
}

fn spectrum_to_scan(spectrum: MzMLSpectrum) -> Result<Scan, RunError> {
    let retention_time = spectrum
        .retention_time
        .ok_or_else(|| RunError::MissingRetentionTime(spectrum.id.clone()))?;
    let channel = match spectrum.kind {
        SpectrumKind::Absorption => ChannelTag::Pda,
        SpectrumKind::Mass => ChannelTag::Ms {
            level: u8::try_from(spectrum.ms_level.max(1)).unwrap_or(u8::MAX),
            polarity: Polarity::from_sign(spectrum.polarity),
        },
    };
    let x = match spectrum.kind {
        SpectrumKind::Absorption if !spectrum.wavelength_array.is_empty() => {
            spectrum.wavelength_array
        }
        _ => spectrum.mz_array,
    };
    Scan::from_unsorted(retention_time, x, spectrum.intensity_array, channel).map_err(|source| {
        RunError::InvalidScan {
            id: spectrum.id,
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS1: ChannelTag = ChannelTag::Ms {
        level: 1,
        polarity: Polarity::Positive,
    };

    #[test]
    fn test_scan_validation() {
        assert!(Scan::new(1.0, vec![100.0, 200.0], vec![1.0, 2.0], MS1).is_ok());
        assert_eq!(
            Scan::new(1.0, vec![200.0, 100.0], vec![1.0, 2.0], MS1).unwrap_err(),
            ScanError::Unsorted(1)
        );
        assert_eq!(
            Scan::new(1.0, vec![100.0, 100.0], vec![1.0, 2.0], MS1).unwrap_err(),
            ScanError::Unsorted(1)
        );
        assert_eq!(
            Scan::new(f64::NAN, vec![], vec![], MS1).unwrap_err().to_string(),
            "retention time NaN is not finite"
        );
        assert!(matches!(
            Scan::new(1.0, vec![1.0], vec![], MS1),
            Err(ScanError::LengthMismatch { x: 1, intensity: 0 })
        ));
        assert_eq!(
            Scan::new(1.0, vec![1.0, 2.0], vec![1.0, f64::INFINITY], MS1).unwrap_err(),
            ScanError::NonFiniteValue(1)
        );
    }

    #[test]
    fn test_from_unsorted_sorts_and_merges() {
        let scan = Scan::from_unsorted(
            0.5,
            vec![300.0, 100.0, 300.0, 200.0],
            vec![1.0, 2.0, 3.0, 4.0],
            MS1,
        )
        .unwrap();
        assert_eq!(scan.x(), &[100.0, 200.0, 300.0]);
        assert_eq!(scan.intensity(), &[2.0, 4.0, 4.0]);
    }

    #[test]
    fn test_intensity_within_is_inclusive() {
        let scan = Scan::new(1.0, vec![99.5, 100.0, 100.5, 101.0], vec![1.0, 2.0, 4.0, 8.0], MS1)
            .unwrap();
        assert_eq!(scan.intensity_within(100.0, 0.5), 7.0);
        assert_eq!(scan.intensity_within(50.0, 0.5), 0.0);
        assert_eq!(scan.total_intensity(), 15.0);
    }

    #[test]
    fn test_most_intense_prefers_lower_mz_on_ties() {
        let scan = Scan::new(1.0, vec![100.0, 200.0, 300.0], vec![5.0, 9.0, 9.0], MS1).unwrap();
        assert_eq!(scan.most_intense(), Some((200.0, 9.0)));
        let empty = Scan::new(1.0, vec![], vec![], MS1).unwrap();
        assert_eq!(empty.most_intense(), None);
    }

    #[test]
    fn test_run_sorts_and_splits_channels() {
        let ms2 = ChannelTag::Ms {
            level: 2,
            polarity: Polarity::Positive,
        };
        let run = Run::from_scans(
            "r",
            vec![
                Scan::new(2.0, vec![100.0], vec![1.0], MS1).unwrap(),
                Scan::new(1.0, vec![100.0], vec![1.0], MS1).unwrap(),
                Scan::new(1.5, vec![100.0], vec![1.0], ms2).unwrap(),
                Scan::new(1.2, vec![254.0], vec![0.1], ChannelTag::Pda).unwrap(),
            ],
        );
        let times: Vec<f64> = run.ms_scans().iter().map(Scan::retention_time).collect();
        assert_eq!(times, vec![1.0, 2.0]);
        assert_eq!(run.pda_scans().len(), 1);
        assert!(run.has_pda());
    }

    #[test]
    fn test_polarity_filter() {
        let negative = ChannelTag::Ms {
            level: 1,
            polarity: Polarity::Negative,
        };
        let run = Run::from_scans(
            "switching",
            vec![
                Scan::new(1.0, vec![100.0], vec![1.0], MS1).unwrap(),
                Scan::new(1.1, vec![100.0], vec![1.0], negative).unwrap(),
                Scan::new(1.2, vec![100.0], vec![1.0], MS1).unwrap(),
            ],
        );
        assert_eq!(run.ms_scans_with_polarity(None).len(), 3);
        assert_eq!(run.ms_scans_with_polarity(Some(Polarity::Positive)).len(), 2);
        assert_eq!(run.ms_scans_with_polarity(Some(Polarity::Negative)).len(), 1);
    }
}
