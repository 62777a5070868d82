//! # Chromatogram extraction
//!
//! Collapses a sequence of scans into an intensity-versus-time trace:
//!
//! - **TIC**: the sum of all intensities in each MS scan
//! - **XIC**: the summed intensity within `target ± tolerance` in each MS scan
//! - **Absorbance**: the summed (or single-band) absorbance of each PDA scan
//!
//! A [`Chromatogram`] also carries the numeric helpers the rest of the
//! pipeline needs: linear interpolation, nearest-point lookup and
//! trapezoidal integration over a time window.

use serde::{Deserialize, Serialize};

use crate::run::Scan;

/// Default half-width of the XIC m/z window.
pub const DEFAULT_XIC_TOLERANCE: f64 = 0.5;

/// Errors raised while extracting or building a chromatogram.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChromatogramError {
    /// No scans to extract from
    #[error("run contains no scans")]
    EmptyRun,

    /// Negative or non-finite tolerance
    #[error("invalid m/z tolerance {0}")]
    InvalidTolerance(f64),

    /// Time and intensity arrays differ in length
    #[error("array length mismatch: {times} times, {intensities} intensities")]
    LengthMismatch {
        /// Number of time values
        times: usize,
        /// Number of intensity values
        intensities: usize,
    },

    /// A time or intensity is NaN or infinite
    #[error("non-finite value at position {0}")]
    NonFiniteValue(usize),

    /// Times go backwards
    #[error("times must be non-decreasing (position {0})")]
    Unsorted(usize),
}

/// What a chromatogram was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceKind {
    /// Total ion current
    Tic,
    /// Extracted ion chromatogram
    Xic {
        /// Target m/z
        target: f64,
        /// Half-width of the window
        tolerance: f64,
    },
    /// UV/PDA absorbance; `None` means all wavelengths were summed
    Absorbance {
        /// Selected wavelength in nm
        wavelength: Option<f64>,
    },
}

/// An intensity-versus-time trace with non-decreasing times (minutes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chromatogram {
    kind: TraceKind,
    times: Vec<f64>,
    intensities: Vec<f64>,
}

impl Chromatogram {
    /// Build a chromatogram from parallel arrays.
    pub fn new(
        times: Vec<f64>,
        intensities: Vec<f64>,
        kind: TraceKind,
    ) -> Result<Self, ChromatogramError> {
        if times.len() != intensities.len() {
            return Err(ChromatogramError::LengthMismatch {
                times: times.len(),
                intensities: intensities.len(),
            });
        }
        if let Some(i) = times
            .iter()
            .zip(&intensities)
            .position(|(t, y)| !t.is_finite() || !y.is_finite())
        {
            return Err(ChromatogramError::NonFiniteValue(i));
        }
        if let Some(i) = times.windows(2).position(|w| w[1] < w[0]) {
            return Err(ChromatogramError::Unsorted(i + 1));
        }
        Ok(Self {
            kind,
            times,
            intensities,
        })
    }

    /// Total ion chromatogram of MS scans sorted by retention time.
    pub fn total_ion(scans: &[Scan]) -> Result<Self, ChromatogramError> {
        Self::from_scans(scans, TraceKind::Tic, Scan::total_intensity)
    }

    /// Extracted ion chromatogram; the window `[target - tolerance, target + tolerance]`
    /// is inclusive on both ends.
    pub fn extracted_ion(
        scans: &[Scan],
        target: f64,
        tolerance: f64,
    ) -> Result<Self, ChromatogramError> {
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ChromatogramError::InvalidTolerance(tolerance));
        }
        Self::from_scans(scans, TraceKind::Xic { target, tolerance }, |scan| {
            scan.intensity_within(target, tolerance)
        })
    }

    /// Absorbance chromatogram of PDA scans.
    ///
    /// With a wavelength, each scan contributes its absorbance at the nearest
    /// recorded wavelength within `bandwidth` nm (zero if none is that close);
    /// without one, the scan's absorbances are summed.
    pub fn absorbance(
        scans: &[Scan],
        wavelength: Option<f64>,
        bandwidth: f64,
    ) -> Result<Self, ChromatogramError> {
        if !bandwidth.is_finite() || bandwidth < 0.0 {
            return Err(ChromatogramError::InvalidTolerance(bandwidth));
        }
        Self::from_scans(scans, TraceKind::Absorbance { wavelength }, |scan| {
            match wavelength {
                Some(nm) => nearest_band(scan, nm, bandwidth),
                None => scan.total_intensity(),
            }
        })
    }

    fn from_scans(
        scans: &[Scan],
        kind: TraceKind,
        value: impl Fn(&Scan) -> f64,
    ) -> Result<Self, ChromatogramError> {
        if scans.is_empty() {
            return Err(ChromatogramError::EmptyRun);
        }
        let times = scans.iter().map(Scan::retention_time).collect();
        let intensities = scans.iter().map(value).collect();
        Self::new(times, intensities, kind)
    }

    /// What this trace was extracted from.
    pub fn kind(&self) -> TraceKind {
        self.kind
    }

    /// Retention times in minutes.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Intensities, one per time.
    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True if the trace has no points.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Iterate `(time, intensity)` points.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.intensities.iter().copied())
    }

    /// First and last retention time.
    pub fn span(&self) -> Option<(f64, f64)> {
        Some((*self.times.first()?, *self.times.last()?))
    }

    /// Largest intensity in the trace.
    pub fn max_intensity(&self) -> Option<f64> {
        self.intensities.iter().copied().reduce(f64::max)
    }

    /// Linearly interpolated intensity at `time`; `None` outside the span.
    pub fn interpolate(&self, time: f64) -> Option<f64> {
        let (first, last) = self.span()?;
        if !(first..=last).contains(&time) {
            return None;
        }
        let upper = self.times.partition_point(|&t| t < time);
        if self.times[upper] == time || upper == 0 {
            return Some(self.intensities[upper]);
        }
        let (t0, t1) = (self.times[upper - 1], self.times[upper]);
        let (y0, y1) = (self.intensities[upper - 1], self.intensities[upper]);
        Some(lerp(t0, y0, t1, y1, time))
    }

    /// Index of the point closest in time; ties go to the earlier point.
    pub fn nearest_index(&self, time: f64) -> Option<usize> {
        nearest_time_index(&self.times, time)
    }

    /// Mean spacing between consecutive points.
    pub fn mean_interval(&self) -> Option<f64> {
        let (first, last) = self.span()?;
        (self.len() > 1).then(|| (last - first) / (self.len() - 1) as f64)
    }

    /// Trapezoidal area between `start` and `end`.
    ///
    /// The window is clipped to the trace's span and its edges are
    /// linearly interpolated. An empty overlap integrates to zero.
    pub fn integrate(&self, start: f64, end: f64) -> f64 {
        let Some((first, last)) = self.span() else {
            return 0.0;
        };
        let (a, b) = (start.max(first), end.min(last));
        if a >= b {
            return 0.0;
        }

        let mut area = 0.0;
        for i in 1..self.len() {
            let (t0, t1) = (self.times[i - 1], self.times[i]);
            if t1 <= a || t0 >= b || t1 == t0 {
                continue;
            }
            let (y0, y1) = (self.intensities[i - 1], self.intensities[i]);
            let lo = t0.max(a);
            let hi = t1.min(b);
            let y_lo = lerp(t0, y0, t1, y1, lo);
            let y_hi = lerp(t0, y0, t1, y1, hi);
            area += (hi - lo) * (y_lo + y_hi) / 2.0;
        }
        area
    }

    /// Pointwise map of the intensities.
    pub(crate) fn map_intensities(&self, f: impl Fn(f64, f64) -> f64) -> Self {
        Self {
            kind: self.kind,
            times: self.times.clone(),
            intensities: self.points().map(|(t, y)| f(t, y)).collect(),
        }
    }
}

/// Index of the time closest to `time` in a sorted slice; ties go to the earlier index.
pub(crate) fn nearest_time_index(times: &[f64], time: f64) -> Option<usize> {
    if times.is_empty() {
        return None;
    }
    let upper = times.partition_point(|&t| t < time);
    if upper == 0 {
        return Some(0);
    }
    if upper == times.len() {
        return Some(times.len() - 1);
    }
    let before = time - times[upper - 1];
    let after = times[upper] - time;
    Some(if after < before { upper } else { upper - 1 })
}

fn lerp(t0: f64, y0: f64, t1: f64, y1: f64, t: f64) -> f64 {
    if t1 == t0 {
        return y1;
    }
    y0 + (y1 - y0) * (t - t0) / (t1 - t0)
}

fn nearest_band(scan: &Scan, wavelength: f64, bandwidth: f64) -> f64 {
    nearest_time_index(scan.x(), wavelength)
        .filter(|&i| (scan.x()[i] - wavelength).abs() <= bandwidth)
        .map_or(0.0, |i| scan.intensity()[i])
}
