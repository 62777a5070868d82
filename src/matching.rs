//! # Mass matching
//!
//! Decides whether a compound was detected by comparing the apex ion of each
//! detected peak against the compound's adduct masses.

use serde::{Deserialize, Serialize};

use crate::chemistry::{Adduct, TheoreticalMasses};
use crate::peaks::Peak;

/// Default absolute m/z tolerance.
pub const DEFAULT_MASS_TOLERANCE: f64 = 0.5;

/// Mass matching settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MassMatchConfig {
    /// Absolute m/z tolerance; a difference equal to it still matches
    pub tolerance: f64,
}

impl Default for MassMatchConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_MASS_TOLERANCE,
        }
    }
}

/// Outcome of matching a compound against detected peaks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetectionResult {
    /// A peak's apex ion matched one of the adduct masses
    Detected {
        /// Observed m/z of the apex ion
        mass: f64,
        /// Apex retention time of the matching peak
        retention_time: f64,
        /// Adduct that matched
        adduct: Adduct,
        /// Zero-based rank of the matching peak
        peak_rank: usize,
    },
    /// No peak matched
    NotDetected,
}

impl DetectionResult {
    /// True for [`DetectionResult::Detected`].
    pub fn is_detected(&self) -> bool {
        matches!(self, DetectionResult::Detected { .. })
    }

    /// Matched m/z.
    pub fn mass(&self) -> Option<f64> {
        match self {
            DetectionResult::Detected { mass, .. } => Some(*mass),
            DetectionResult::NotDetected => None,
        }
    }

    /// Retention time of the matching peak.
    pub fn retention_time(&self) -> Option<f64> {
        match self {
            DetectionResult::Detected { retention_time, .. } => Some(*retention_time),
            DetectionResult::NotDetected => None,
        }
    }

    /// Rank of the matching peak.
    pub fn peak_rank(&self) -> Option<usize> {
        match self {
            DetectionResult::Detected { peak_rank, .. } => Some(*peak_rank),
            DetectionResult::NotDetected => None,
        }
    }
}

/// Matches peaks against theoretical adduct masses.
#[derive(Debug, Clone, Default)]
pub struct MassMatcher {
    config: MassMatchConfig,
}

impl MassMatcher {
    /// Create a matcher.
    pub fn new(config: MassMatchConfig) -> Self {
        Self { config }
    }

    /// Tolerance in use.
    pub fn tolerance(&self) -> f64 {
        self.config.tolerance
    }

    /// Walk the peaks in rank order; the first whose apex ion lies within
    /// tolerance of any adduct decides the result. If several adducts match
    /// that ion, the closest is reported.
    pub fn match_peaks(&self, peaks: &[Peak], masses: &TheoreticalMasses) -> DetectionResult {
        for (rank, peak) in peaks.iter().enumerate() {
            let Some(ion) = peak.apex_ion else {
                continue;
            };
            let best = masses
                .adducts()
                .map(|(adduct, mz)| (adduct, (ion.mz - mz).abs()))
                .filter(|&(_, delta)| delta <= self.config.tolerance)
                .fold(None, |best: Option<(Adduct, f64)>, candidate| match best {
                    Some((_, delta)) if delta <= candidate.1 => best,
                    _ => Some(candidate),
                });
            if let Some((adduct, delta)) = best {
                log::debug!(
                    "Peak {} at {:.3} min matched {} (delta {:.4})",
                    rank,
                    peak.apex_rt,
                    adduct,
                    delta
                );
                return DetectionResult::Detected {
                    mass: ion.mz,
                    retention_time: peak.apex_rt,
                    adduct,
                    peak_rank: rank,
                };
            }
        }
        DetectionResult::NotDetected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chemistry::{MassCalculator, MolecularFormula};
    use crate::peaks::ApexIon;

    fn peak(rt: f64, mz: Option<f64>) -> Peak {
        Peak {
            apex_rt: rt,
            left_rt: rt - 0.1,
            right_rt: rt + 0.1,
            apex_intensity: 1.0,
            area: 1.0,
            apex_ion: mz.map(|mz| ApexIon { mz, intensity: 1.0 }),
        }
    }

    fn masses(mono: f64) -> TheoreticalMasses {
        TheoreticalMasses::new(MolecularFormula::default(), mono)
    }

    #[test]
    fn test_first_ranked_peak_wins() {
        let m = masses(100.0);
        let peaks = vec![
            peak(1.0, Some(250.0)),
            peak(2.0, Some(101.0078)),
            peak(3.0, Some(101.0)),
        ];
        let result = MassMatcher::default().match_peaks(&peaks, &m);
        assert_eq!(
            result,
            DetectionResult::Detected {
                mass: 101.0078,
                retention_time: 2.0,
                adduct: Adduct::Protonated,
                peak_rank: 1,
            }
        );
        assert!(result.is_detected());
        assert_eq!(result.retention_time(), Some(2.0));
        assert_eq!(result.peak_rank(), Some(1));
    }

    #[test]
    fn test_tolerance_is_inclusive() {
        let m = masses(100.0);
        let peaks = vec![peak(1.0, Some(m.adduct_mass(Adduct::Protonated) + 0.5))];
        let exact = MassMatcher::new(MassMatchConfig { tolerance: 0.5 });
        assert!(exact.match_peaks(&peaks, &m).is_detected());
        let tight = MassMatcher::new(MassMatchConfig { tolerance: 0.4999 });
        assert_eq!(tight.match_peaks(&peaks, &m), DetectionResult::NotDetected);
    }

    #[test]
    fn test_sodium_and_deprotonated() {
        let m = masses(100.0);
        let na = MassMatcher::default().match_peaks(&[peak(1.0, Some(122.99))], &m);
        assert!(matches!(na, DetectionResult::Detected { adduct: Adduct::Sodiated, .. }));
        let neg = MassMatcher::default().match_peaks(&[peak(1.0, Some(98.99))], &m);
        assert!(matches!(neg, DetectionResult::Detected { adduct: Adduct::Deprotonated, .. }));
    }

    #[test]
    fn test_peaks_without_ion_are_skipped() {
        let m = masses(100.0);
        let result = MassMatcher::default().match_peaks(&[peak(1.0, None)], &m);
        assert_eq!(result, DetectionResult::NotDetected);
        assert_eq!(result.mass(), None);
        assert_eq!(
            MassMatcher::default().match_peaks(&[], &m),
            DetectionResult::NotDetected
        );
    }

    #[test]
    fn test_real_compound() {
        let m = MassCalculator.calculate("CCO").unwrap();
        let result = MassMatcher::default().match_peaks(&[peak(0.8, Some(47.05))], &m);
        assert!(matches!(result, DetectionResult::Detected { adduct: Adduct::Protonated, .. }));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(DetectionResult::NotDetected).unwrap();
        assert_eq!(json["status"], "not_detected");
    }
}
