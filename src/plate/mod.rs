//! # Plate aggregation
//!
//! Maps per-sample results onto a microtiter plate grid (96, 384 or a custom
//! layout) for heatmap-style review. Wells without a sample are empty;
//! samples whose analysis failed are kept apart from analyzed ones.
//!
//! ```
//! use lcms_qc::plate::{PlateAggregator, PlateFormat, WellPeak, WellState, WellSummary};
//!
//! let grid = PlateAggregator::new(PlateFormat::WELLS_96)
//!     .aggregate(vec![(
//!         "B3".parse().unwrap(),
//!         WellState::Analyzed(WellSummary {
//!             sample_id: "S1".into(),
//!             formula: "C2H6O".into(),
//!             monoisotopic_mass: 46.0419,
//!             mh_mass: 47.0491,
//!             mna_mass: 69.0311,
//!             mh_minus_mass: 45.0346,
//!             detected: true,
//!             purity: Some(0.92),
//!             retention_time: Some(1.2),
//!             matched_mass: Some(47.0491),
//!             peaks: vec![WellPeak { retention_time: 1.2, mass: Some(47.0491) }],
//!         }),
//!     )])
//!     .unwrap();
//!
//! assert_eq!(grid.purity_matrix()[1][2], Some(0.92));
//! assert_eq!(grid.summary().empty, 95);
//! ```

mod grid;
mod well;

pub use grid::{PlateAggregator, PlateGrid, PlateSummary, WellPeak, WellState, WellSummary};
pub use well::{PlateFormat, WellCoordinate};

/// Errors raised while parsing wells or building a plate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlateError {
    /// Not a well label such as `A1`
    #[error("invalid well '{0}'")]
    InvalidWell(String),

    /// Not `96`, `384` or `ROWSxCOLUMNS`
    #[error("invalid plate format '{0}'")]
    InvalidFormat(String),

    /// Well lies outside the plate
    #[error("well {well} is outside a {format} plate")]
    WellOutOfRange {
        /// Offending well
        well: WellCoordinate,
        /// Plate format
        format: PlateFormat,
    },

    /// Two samples claim the same well
    #[error("well {0} is assigned more than once")]
    DuplicateWell(WellCoordinate),
}
