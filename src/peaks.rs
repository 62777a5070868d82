//! # Peak detection
//!
//! Finds the most intense chromatographic peaks in a trace.
//!
//! 1. Every interior point that is at least as high as both neighbours and
//!    at least `min_height` is an apex candidate.
//! 2. From each apex the boundaries are walked outwards until the signal
//!    drops below `boundary_fraction * apex`, turns upwards again, or the
//!    trace ends. Flat stretches are walked through.
//! 3. Candidates are visited from the highest apex down; a candidate whose
//!    apex lies strictly inside an already accepted peak is a shoulder of
//!    that peak and is dropped.
//! 4. The top `top_n` peaks are kept, and each is annotated with the most
//!    intense ion of the MS scan nearest its apex.

use serde::{Deserialize, Serialize};

use crate::chromatogram::{nearest_time_index, Chromatogram};
use crate::run::Scan;

/// Default minimum apex intensity.
pub const DEFAULT_MIN_HEIGHT: f64 = 10_000.0;
/// Default number of peaks kept.
pub const DEFAULT_TOP_N: usize = 3;
/// Default boundary threshold as a fraction of the apex.
pub const DEFAULT_BOUNDARY_FRACTION: f64 = 0.05;

/// Peak detection settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakDetectorConfig {
    /// Minimum apex intensity
    pub min_height: f64,
    /// Maximum number of peaks reported
    pub top_n: usize,
    /// Boundary threshold relative to the apex intensity
    pub boundary_fraction: f64,
}

impl Default for PeakDetectorConfig {
    fn default() -> Self {
        Self {
            min_height: DEFAULT_MIN_HEIGHT,
            top_n: DEFAULT_TOP_N,
            boundary_fraction: DEFAULT_BOUNDARY_FRACTION,
        }
    }
}

/// The most intense ion in the scan nearest a peak apex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApexIon {
    /// m/z of the ion
    pub mz: f64,
    /// Its intensity
    pub intensity: f64,
}

/// A detected chromatographic peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Apex retention time (minutes)
    pub apex_rt: f64,
    /// Left boundary (minutes)
    pub left_rt: f64,
    /// Right boundary (minutes)
    pub right_rt: f64,
    /// Intensity at the apex
    pub apex_intensity: f64,
    /// Trapezoidal area between the boundaries
    pub area: f64,
    /// Base ion at the apex, if an MS scan is available
    pub apex_ion: Option<ApexIon>,
}

impl Peak {
    /// True if `rt` lies strictly between the boundaries.
    pub fn contains_strictly(&self, rt: f64) -> bool {
        self.left_rt < rt && rt < self.right_rt
    }

    /// Peak width in minutes.
    pub fn width(&self) -> f64 {
        self.right_rt - self.left_rt
    }
}

/// Detects the top-N peaks of a chromatogram.
#[derive(Debug, Clone, Default)]
pub struct PeakDetector {
    config: PeakDetectorConfig,
}

impl PeakDetector {
    /// Create a detector with the given settings.
    pub fn new(config: PeakDetectorConfig) -> Self {
        Self { config }
    }

    /// Settings in use.
    pub fn config(&self) -> &PeakDetectorConfig {
        &self.config
    }

    /// Detect peaks in `chromatogram`, most intense first.
    ///
    /// `scans` are the MS scans the trace came from (sorted by retention
    /// time) and are only used to annotate the apex ion; pass an empty slice
    /// to skip it.
    pub fn detect(&self, chromatogram: &Chromatogram, scans: &[Scan]) -> Vec<Peak> {
        let times = chromatogram.times();
        let y = chromatogram.intensities();

        let mut candidates: Vec<Peak> = (1..y.len().saturating_sub(1))
            .filter(|&i| self.is_apex(y, i))
            .filter_map(|i| {
                let (left, right) = self.boundaries(y, i);
                let peak = Peak {
                    apex_rt: times[i],
                    left_rt: times[left],
                    right_rt: times[right],
                    apex_intensity: y[i],
                    area: trapezoid(&times[left..=right], &y[left..=right]),
                    apex_ion: None,
                };
                // repeated retention times can collapse a span
                (peak.left_rt < peak.apex_rt && peak.apex_rt < peak.right_rt).then_some(peak)
            })
            .collect();

        // stable: equal apexes keep retention-time order
        candidates.sort_by(|a, b| b.apex_intensity.total_cmp(&a.apex_intensity));

        let mut peaks: Vec<Peak> = Vec::with_capacity(self.config.top_n);
        for candidate in candidates {
            if peaks.len() == self.config.top_n {
                break;
            }
            if peaks.iter().any(|p| p.contains_strictly(candidate.apex_rt)) {
                continue;
            }
            peaks.push(candidate);
        }

        for peak in &mut peaks {
            peak.apex_ion = apex_ion(scans, peak.apex_rt);
        }

        log::debug!(
            "Detected {} peaks (min height {}, top {})",
            peaks.len(),
            self.config.min_height,
            self.config.top_n
        );
        peaks
    }

    fn is_apex(&self, y: &[f64], i: usize) -> bool {
        y[i] >= y[i - 1] && y[i] >= y[i + 1] && y[i] >= self.config.min_height && y[i] > 0.0
    }

    fn boundaries(&self, y: &[f64], apex: usize) -> (usize, usize) {
        let threshold = self.config.boundary_fraction * y[apex];
        let left = walk(y, apex, threshold, |j| j.checked_sub(1));
        let right = walk(y, apex, threshold, |j| (j + 1 < y.len()).then_some(j + 1));
        (left, right)
    }
}

/// Step away from `apex` until the signal falls below `threshold` (that point
/// is included), rises again, or the trace ends.
fn walk(y: &[f64], apex: usize, threshold: f64, step: impl Fn(usize) -> Option<usize>) -> usize {
    let mut j = apex;
    while let Some(next) = step(j) {
        if y[next] < threshold {
            return next;
        }
        if y[next] > y[j] {
            return j;
        }
        j = next;
    }
    j
}

fn trapezoid(times: &[f64], y: &[f64]) -> f64 {
    times
        .windows(2)
        .zip(y.windows(2))
        .map(|(t, y)| (t[1] - t[0]) * (y[0] + y[1]) / 2.0)
        .sum()
}

fn apex_ion(scans: &[Scan], rt: f64) -> Option<ApexIon> {
    let times: Vec<f64> = scans.iter().map(Scan::retention_time).collect();
    let scan = &scans[nearest_time_index(&times, rt)?];
    scan.most_intense()
        .map(|(mz, intensity)| ApexIon { mz, intensity })
}
