use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{PlateError, PlateFormat, WellCoordinate};

/// One of a well's strongest TIC peaks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WellPeak {
    /// Apex retention time
    pub retention_time: f64,
    /// Apex ion m/z
    pub mass: Option<f64>,
}

/// Per-well metrics shown on the plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellSummary {
    /// Sample identifier
    pub sample_id: String,
    /// Hill-order formula of the expected product
    pub formula: String,
    /// Neutral monoisotopic mass
    pub monoisotopic_mass: f64,
    /// `[M+H]+`
    pub mh_mass: f64,
    /// `[M+Na]+`
    pub mna_mass: f64,
    /// `[M-H]-`
    pub mh_minus_mass: f64,
    /// Whether the product was detected
    pub detected: bool,
    /// Purity fraction
    pub purity: Option<f64>,
    /// Retention time of the matched peak
    pub retention_time: Option<f64>,
    /// Matched m/z
    pub matched_mass: Option<f64>,
    /// Up to three peaks, most intense first
    pub peaks: Vec<WellPeak>,
}

/// State of one well.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WellState {
    /// No sample was placed here
    #[default]
    Empty,
    /// The sample was analyzed
    Analyzed(WellSummary),
    /// The sample's analysis failed
    Failed {
        /// Sample identifier
        sample_id: String,
        /// Error message
        reason: String,
    },
}

impl WellState {
    /// Metrics of an analyzed well.
    pub fn summary(&self) -> Option<&WellSummary> {
        match self {
            WellState::Analyzed(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Well counts by state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlateSummary {
    /// Analyzed wells
    pub analyzed: usize,
    /// Analyzed wells with a detected product
    pub detected: usize,
    /// Wells whose analysis failed
    pub failed: usize,
    /// Wells without a sample
    pub empty: usize,
}

/// A fully populated plate in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlateGrid {
    format: PlateFormat,
    wells: Vec<WellState>,
}

impl PlateGrid {
    /// Plate layout.
    pub fn format(&self) -> PlateFormat {
        self.format
    }

    /// State of one well; `None` if it is off the plate.
    pub fn get(&self, well: WellCoordinate) -> Option<&WellState> {
        self.format
            .contains(well)
            .then(|| &self.wells[self.format.index_of(well)])
    }

    /// Iterate wells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (WellCoordinate, &WellState)> {
        self.format.wells().zip(self.wells.iter())
    }

    /// Count wells by state.
    pub fn summary(&self) -> PlateSummary {
        let mut summary = PlateSummary::default();
        for state in &self.wells {
            match state {
                WellState::Empty => summary.empty += 1,
                WellState::Failed { .. } => summary.failed += 1,
                WellState::Analyzed(s) => {
                    summary.analyzed += 1;
                    if s.detected {
                        summary.detected += 1;
                    }
                }
            }
        }
        summary
    }

    /// A rows × columns matrix of one metric; `None` where the well is not
    /// analyzed or the metric is missing.
    pub fn metric_matrix<T>(&self, metric: impl Fn(&WellSummary) -> Option<T>) -> Vec<Vec<Option<T>>> {
        self.wells
            .chunks(self.format.columns())
            .map(|row| {
                row.iter()
                    .map(|state| state.summary().and_then(&metric))
                    .collect()
            })
            .collect()
    }

    /// Purity heatmap.
    pub fn purity_matrix(&self) -> Vec<Vec<Option<f64>>> {
        self.metric_matrix(|s| s.purity)
    }

    /// Detection heatmap.
    pub fn detection_matrix(&self) -> Vec<Vec<Option<bool>>> {
        self.metric_matrix(|s| Some(s.detected))
    }

    /// Retention-time heatmap.
    pub fn retention_time_matrix(&self) -> Vec<Vec<Option<f64>>> {
        self.metric_matrix(|s| s.retention_time)
    }

    /// Matched m/z heatmap.
    pub fn matched_mass_matrix(&self) -> Vec<Vec<Option<f64>>> {
        self.metric_matrix(|s| s.matched_mass)
    }
}

/// Builds a [`PlateGrid`] from per-sample well states.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlateAggregator {
    format: PlateFormat,
}

impl PlateAggregator {
    /// Aggregator for one plate layout.
    pub fn new(format: PlateFormat) -> Self {
        Self { format }
    }

    /// Check a well assignment without building a grid.
    pub fn validate<'a>(
        &self,
        wells: impl IntoIterator<Item = &'a WellCoordinate>,
    ) -> Result<(), PlateError> {
        let mut seen = HashSet::new();
        for &well in wells {
            if !self.format.contains(well) {
                return Err(PlateError::WellOutOfRange {
                    well,
                    format: self.format,
                });
            }
            if !seen.insert(well) {
                return Err(PlateError::DuplicateWell(well));
            }
        }
        Ok(())
    }

    /// Place every entry on the plate. Fails on the first out-of-range or
    /// duplicated well, before any grid is built.
    pub fn aggregate(
        &self,
        entries: impl IntoIterator<Item = (WellCoordinate, WellState)>,
    ) -> Result<PlateGrid, PlateError> {
        let entries: Vec<(WellCoordinate, WellState)> = entries.into_iter().collect();
        self.validate(entries.iter().map(|(well, _)| well))?;

        let mut wells = vec![WellState::Empty; self.format.well_count()];
        for (well, state) in entries {
            wells[self.format.index_of(well)] = state;
        }
        Ok(PlateGrid {
            format: self.format,
            wells,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzed(id: &str, detected: bool, purity: Option<f64>) -> WellState {
        let peaks = if detected {
            vec![
                WellPeak {
                    retention_time: 1.2,
                    mass: Some(345.1557),
                },
                WellPeak {
                    retention_time: 1.6,
                    mass: None,
                },
            ]
        } else {
            Vec::new()
        };
        WellState::Analyzed(WellSummary {
            sample_id: id.to_string(),
            formula: "C17H20N4O4".to_string(),
            monoisotopic_mass: 344.1484,
            mh_mass: 345.1557,
            mna_mass: 367.1377,
            mh_minus_mass: 343.1412,
            detected,
            purity,
            retention_time: detected.then_some(1.2),
            matched_mass: detected.then_some(345.1557),
            peaks,
        })
    }

    fn well(label: &str) -> WellCoordinate {
        label.parse().unwrap()
    }

    #[test]
    fn test_aggregate_96() {
        let grid = PlateAggregator::new(PlateFormat::WELLS_96)
            .aggregate(vec![
                (well("A1"), analyzed("s1", true, Some(0.9))),
                (well("H12"), analyzed("s2", false, None)),
                (
                    well("B2"),
                    WellState::Failed {
                        sample_id: "s3".into(),
                        reason: "conversion timed out".into(),
                    },
                ),
            ])
            .unwrap();

        assert_eq!(
            grid.summary(),
            PlateSummary {
                analyzed: 2,
                detected: 1,
                failed: 1,
                empty: 93
            }
        );
        let purity = grid.purity_matrix();
        assert_eq!(purity.len(), 8);
        assert_eq!(purity[0].len(), 12);
        assert_eq!(purity[0][0], Some(0.9));
        assert_eq!(purity[7][11], None);
        assert_eq!(grid.detection_matrix()[7][11], Some(false));
        assert_eq!(grid.detection_matrix()[1][1], None);
        assert_eq!(grid.retention_time_matrix()[0][0], Some(1.2));
        assert_eq!(grid.matched_mass_matrix()[0][0], Some(345.1557));
        assert_eq!(grid.matched_mass_matrix()[7][11], None);

        let a1 = grid.get(well("A1")).and_then(WellState::summary).unwrap();
        assert_eq!(a1.formula, "C17H20N4O4");
        assert_eq!(a1.mna_mass, 367.1377);
        assert_eq!(a1.peaks.len(), 2);
        assert_eq!(a1.peaks[1].retention_time, 1.6);
        assert_eq!(a1.peaks[1].mass, None);
        let h12 = grid.get(well("H12")).and_then(WellState::summary).unwrap();
        assert!(h12.peaks.is_empty());
        assert!(matches!(grid.get(well("B2")), Some(WellState::Failed { .. })));
        assert_eq!(grid.get(well("I1")), None);
    }

    #[test]
    fn test_duplicate_well_rejected() {
        let err = PlateAggregator::new(PlateFormat::WELLS_96)
            .aggregate(vec![
                (well("C3"), analyzed("a", true, None)),
                (well("c03"), analyzed("b", true, None)),
            ])
            .unwrap_err();
        assert_eq!(err, PlateError::DuplicateWell(well("C3")));
    }

    #[test]
    fn test_out_of_range() {
        let err = PlateAggregator::new(PlateFormat::WELLS_96)
            .aggregate(vec![(well("P24"), WellState::Empty)])
            .unwrap_err();
        assert!(matches!(err, PlateError::WellOutOfRange { .. }));
        assert_eq!(err.to_string(), "well P24 is outside a 96 plate");

        let big = PlateAggregator::new(PlateFormat::WELLS_384)
            .aggregate(vec![(well("P24"), analyzed("x", true, None))])
            .unwrap();
        assert_eq!(big.summary().empty, 383);
    }

    #[test]
    fn test_iteration_order() {
        let format = PlateFormat::custom(2, 3).unwrap();
        let grid = PlateAggregator::new(format)
            .aggregate(vec![(well("B1"), analyzed("x", true, None))])
            .unwrap();
        let labels: Vec<String> = grid
            .iter()
            .filter(|(_, s)| s.summary().is_some())
            .map(|(w, _)| w.to_string())
            .collect();
        assert_eq!(labels, vec!["B1"]);
    }
}
