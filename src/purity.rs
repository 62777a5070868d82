//! # Purity integration
//!
//! Blank subtraction, optional baseline correction and window integration
//! of a chromatogram, and the product peak's share of the integrated window.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::chromatogram::Chromatogram;
use crate::peaks::Peak;

/// Default start of the integration window (minutes).
pub const DEFAULT_WINDOW_START: f64 = 0.2;
/// Default end of the integration window (minutes).
pub const DEFAULT_WINDOW_END: f64 = 2.5;

/// Number of segments whose low percentile anchors the baseline.
const BASELINE_SEGMENTS: usize = 20;
/// Percentile of each segment taken as baseline.
const BASELINE_PERCENTILE: f64 = 0.05;

/// Errors raised by purity integration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PurityError {
    /// The window is inverted, empty or non-finite
    #[error("invalid integration window [{start}, {end}]")]
    InvalidWindow {
        /// Window start
        start: f64,
        /// Window end
        end: f64,
    },

    /// The window does not overlap the chromatogram
    #[error("integration window [{start}, {end}] lies outside the data ({data_start}..{data_end})")]
    WindowOutOfRange {
        /// Window start
        start: f64,
        /// Window end
        end: f64,
        /// First retention time of the data
        data_start: f64,
        /// Last retention time of the data
        data_end: f64,
    },

    /// The chromatogram has no points
    #[error("chromatogram is empty")]
    EmptyChromatogram,
}

/// Integration window in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurityConfig {
    /// Window start
    pub window_start: f64,
    /// Window end
    pub window_end: f64,
    /// Remove a drifting baseline before integrating
    pub baseline_correction: bool,
}

impl Default for PurityConfig {
    fn default() -> Self {
        Self {
            window_start: DEFAULT_WINDOW_START,
            window_end: DEFAULT_WINDOW_END,
            baseline_correction: false,
        }
    }
}

impl PurityConfig {
    /// Check that the window is finite and `start < end`.
    pub fn validate(&self) -> Result<(), PurityError> {
        let (start, end) = (self.window_start, self.window_end);
        if !start.is_finite() || !end.is_finite() || start >= end {
            return Err(PurityError::InvalidWindow { start, end });
        }
        Ok(())
    }
}

/// Result of integrating one chromatogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PurityResult {
    /// Area of the blank-subtracted trace over the window
    pub window_area: f64,
    /// Area of the product peak inside the window
    pub product_area: Option<f64>,
    /// `product_area / window_area`, clamped to `[0, 1]`
    pub purity: Option<f64>,
}

/// Subtract a blank trace sample-point by sample-point.
///
/// The blank is linearly interpolated at each sample time and treated as
/// zero outside its own span. Negative differences are clamped to zero.
pub fn subtract_blank(sample: &Chromatogram, blank: &Chromatogram) -> Chromatogram {
    sample.map_intensities(|t, y| (y - blank.interpolate(t).unwrap_or(0.0)).max(0.0))
}

/// Subtract a slowly varying baseline.
///
/// The trace is cut into twenty segments; the 5th percentile of each
/// segment, placed at the segment's middle point, anchors a piecewise-linear
/// baseline (flat beyond the first and last anchor). The baseline is
/// subtracted and the result clamped to zero.
pub fn correct_baseline(chromatogram: &Chromatogram) -> Chromatogram {
    let times = chromatogram.times();
    let intensities = chromatogram.intensities();
    let width = (times.len() / BASELINE_SEGMENTS).max(1);

    let anchors: Vec<(f64, f64)> = times
        .chunks(width)
        .zip(intensities.chunks(width))
        .map(|(t, y)| (t[t.len() / 2], percentile(y, BASELINE_PERCENTILE)))
        .collect();

    chromatogram.map_intensities(|t, y| (y - baseline_at(&anchors, t)).max(0.0))
}

/// Linear-interpolated percentile, `q` in `[0, 1]`, of a non-empty slice.
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q * (sorted.len() - 1) as f64;
    let (lo, hi) = (pos.floor() as usize, pos.ceil() as usize);
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn baseline_at(anchors: &[(f64, f64)], t: f64) -> f64 {
    let upper = anchors.partition_point(|&(at, _)| at < t);
    match (upper.checked_sub(1).map(|i| anchors[i]), anchors.get(upper)) {
        (Some((t0, y0)), Some(&(t1, y1))) if t1 > t0 => y0 + (y1 - y0) * (t - t0) / (t1 - t0),
        (Some(_), Some(&(_, y))) => y,
        (Some((_, y)), None) | (None, Some(&(_, y))) => y,
        (None, None) => 0.0,
    }
}

/// Integrates chromatograms over a fixed retention-time window.
#[derive(Debug, Clone, Default)]
pub struct PurityIntegrator {
    config: PurityConfig,
}

impl PurityIntegrator {
    /// Create an integrator, rejecting an invalid window.
    pub fn new(config: PurityConfig) -> Result<Self, PurityError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Window in use.
    pub fn config(&self) -> &PurityConfig {
        &self.config
    }

    /// Integrate `chromatogram` (after subtracting `blank`, then the
    /// baseline when enabled) over the window.
    ///
    /// With a `product` peak, its area is the integral over the peak span
    /// intersected with the window, and the purity is its share of the
    /// window area. Purity is `None` when the window area is zero.
    pub fn integrate(
        &self,
        chromatogram: &Chromatogram,
        blank: Option<&Chromatogram>,
        product: Option<&Peak>,
    ) -> Result<PurityResult, PurityError> {
        let (start, end) = (self.config.window_start, self.config.window_end);
        let (data_start, data_end) = chromatogram
            .span()
            .ok_or(PurityError::EmptyChromatogram)?;
        if start.max(data_start) >= end.min(data_end) {
            return Err(PurityError::WindowOutOfRange {
                start,
                end,
                data_start,
                data_end,
            });
        }

        let mut trace = Cow::Borrowed(chromatogram);
        if let Some(blank) = blank {
            trace = Cow::Owned(subtract_blank(&trace, blank));
        }
        if self.config.baseline_correction {
            trace = Cow::Owned(correct_baseline(&trace));
        }

        let window_area = trace.integrate(start, end);
        let product_area = product.map(|peak| {
            trace.integrate(peak.left_rt.max(start), peak.right_rt.min(end))
        });
        let purity = product_area
            .filter(|_| window_area > 0.0)
            .map(|area| (area / window_area).clamp(0.0, 1.0));

        Ok(PurityResult {
            window_area,
            product_area,
            purity,
        })
    }
}
