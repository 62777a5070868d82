//! # Channel correlation
//!
//! Pairs MS peaks with the PDA/UV trace recorded alongside them.

use serde::{Deserialize, Serialize};

use crate::chromatogram::Chromatogram;
use crate::peaks::Peak;

/// Correlation settings.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Largest allowed gap (minutes) between a peak apex and the PDA point;
    /// `None` uses the mean MS sampling interval
    pub max_gap: Option<f64>,
}

/// A peak paired with the nearest PDA point, if one is close enough.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelCorrelation {
    /// Apex retention time of the MS peak
    pub peak_rt: f64,
    /// MS intensity at the apex
    pub ms_intensity: f64,
    /// Retention time of the paired PDA point
    pub pda_rt: Option<f64>,
    /// Absorbance at the paired PDA point
    pub pda_value: Option<f64>,
}

impl ChannelCorrelation {
    /// True if a PDA point was paired.
    pub fn is_paired(&self) -> bool {
        self.pda_rt.is_some()
    }
}

/// Pairs peaks with the nearest point of a second channel.
#[derive(Debug, Clone, Default)]
pub struct ChannelCorrelator {
    config: CorrelationConfig,
}

impl ChannelCorrelator {
    /// Create a correlator.
    pub fn new(config: CorrelationConfig) -> Self {
        Self { config }
    }

    /// Pair each peak with the PDA point nearest its apex.
    ///
    /// `ms` is the trace the peaks were found in; it sets the default gap.
    /// A trace with a single point has no interval, so only exact matches
    /// pair in that case.
    pub fn correlate(
        &self,
        peaks: &[Peak],
        ms: &Chromatogram,
        pda: &Chromatogram,
    ) -> Vec<ChannelCorrelation> {
        let max_gap = self
            .config
            .max_gap
            .or_else(|| ms.mean_interval())
            .unwrap_or(0.0);

        peaks
            .iter()
            .map(|peak| {
                let paired = pda
                    .nearest_index(peak.apex_rt)
                    .filter(|&i| (pda.times()[i] - peak.apex_rt).abs() <= max_gap);
                ChannelCorrelation {
                    peak_rt: peak.apex_rt,
                    ms_intensity: peak.apex_intensity,
                    pda_rt: paired.map(|i| pda.times()[i]),
                    pda_value: paired.map(|i| pda.intensities()[i]),
                }
            })
            .collect()
    }
}
