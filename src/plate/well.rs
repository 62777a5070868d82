use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PlateError;

/// Zero-based well position; displayed as `A1`, `H12`, `P24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WellCoordinate {
    /// Row index (`A` = 0)
    pub row: u8,
    /// Column index (`1` = 0)
    pub column: u8,
}

impl WellCoordinate {
    /// Create a coordinate from zero-based indices.
    pub fn new(row: u8, column: u8) -> Self {
        Self { row, column }
    }

    /// Row letter.
    pub fn row_label(&self) -> char {
        char::from(b'A' + self.row)
    }
}

impl FromStr for WellCoordinate {
    type Err = PlateError;

    /// Accepts a row letter (either case) followed by a 1-based column,
    /// with optional leading zeros: `A1`, `h12`, `B03`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PlateError::InvalidWell(s.to_string());
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let letter = chars.next().filter(char::is_ascii_alphabetic).ok_or_else(invalid)?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let column: u32 = digits.parse().map_err(|_| invalid())?;
        if column == 0 || column > u32::from(u8::MAX) {
            return Err(invalid());
        }
        Ok(Self {
            row: letter.to_ascii_uppercase() as u8 - b'A',
            column: (column - 1) as u8,
        })
    }
}

impl TryFrom<String> for WellCoordinate {
    type Error = PlateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WellCoordinate> for String {
    fn from(well: WellCoordinate) -> Self {
        well.to_string()
    }
}

impl fmt::Display for WellCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_label(), u16::from(self.column) + 1)
    }
}

/// Plate dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlateFormat {
    rows: u8,
    columns: u8,
}

impl PlateFormat {
    /// 8 × 12
    pub const WELLS_96: PlateFormat = PlateFormat { rows: 8, columns: 12 };
    /// 16 × 24
    pub const WELLS_384: PlateFormat = PlateFormat { rows: 16, columns: 24 };

    /// A custom layout; rows are lettered so at most 26 are allowed.
    pub fn custom(rows: u8, columns: u8) -> Result<Self, PlateError> {
        if rows == 0 || columns == 0 || rows > 26 {
            return Err(PlateError::InvalidFormat(format!("{rows}x{columns}")));
        }
        Ok(Self { rows, columns })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        usize::from(self.rows)
    }

    /// Number of columns.
    pub fn columns(&self) -> usize {
        usize::from(self.columns)
    }

    /// Total number of wells.
    pub fn well_count(&self) -> usize {
        self.rows() * self.columns()
    }

    /// True if `well` fits on this plate.
    pub fn contains(&self, well: WellCoordinate) -> bool {
        well.row < self.rows && well.column < self.columns
    }

    /// Row-major index of `well`.
    pub(crate) fn index_of(&self, well: WellCoordinate) -> usize {
        usize::from(well.row) * self.columns() + usize::from(well.column)
    }

    /// Every well in row-major order.
    pub fn wells(&self) -> impl Iterator<Item = WellCoordinate> {
        let (rows, columns) = (self.rows, self.columns);
        (0..rows).flat_map(move |r| (0..columns).map(move |c| WellCoordinate::new(r, c)))
    }
}

impl Default for PlateFormat {
    fn default() -> Self {
        Self::WELLS_96
    }
}

impl FromStr for PlateFormat {
    type Err = PlateError;

    /// `96`, `384`, or a custom `ROWSxCOLUMNS` such as `4x6`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "96" => Ok(Self::WELLS_96),
            "384" => Ok(Self::WELLS_384),
            other => {
                let invalid = || PlateError::InvalidFormat(other.to_string());
                let (rows, columns) = other
                    .split_once(['x', 'X'])
                    .ok_or_else(invalid)?;
                let rows = rows.trim().parse().map_err(|_| invalid())?;
                let columns = columns.trim().parse().map_err(|_| invalid())?;
                Self::custom(rows, columns)
            }
        }
    }
}

impl TryFrom<String> for PlateFormat {
    type Error = PlateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PlateFormat> for String {
    fn from(format: PlateFormat) -> Self {
        format.to_string()
    }
}

impl fmt::Display for PlateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::WELLS_96 => f.write_str("96"),
            Self::WELLS_384 => f.write_str("384"),
            _ => write!(f, "{}x{}", self.rows, self.columns),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wells() {
        assert_eq!("A1".parse::<WellCoordinate>().unwrap(), WellCoordinate::new(0, 0));
        assert_eq!("h12".parse::<WellCoordinate>().unwrap(), WellCoordinate::new(7, 11));
        assert_eq!("B03".parse::<WellCoordinate>().unwrap(), WellCoordinate::new(1, 2));
        assert_eq!(" P24 ".parse::<WellCoordinate>().unwrap(), WellCoordinate::new(15, 23));

        for bad in ["", "A", "1A", "A0", "A-1", "AA1", "A1.5", "Ä1"] {
            assert!(bad.parse::<WellCoordinate>().is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn test_display_round_trip() {
        let well: WellCoordinate = "c07".parse().unwrap();
        assert_eq!(well.to_string(), "C7");
        assert_eq!(well.to_string().parse::<WellCoordinate>().unwrap(), well);
    }

    #[test]
    fn test_plate_formats() {
        assert_eq!("96".parse::<PlateFormat>().unwrap().well_count(), 96);
        assert_eq!("384".parse::<PlateFormat>().unwrap().rows(), 16);
        let custom: PlateFormat = "4x6".parse().unwrap();
        assert_eq!((custom.rows(), custom.columns()), (4, 6));
        assert_eq!(custom.to_string(), "4x6");
        assert!("0x6".parse::<PlateFormat>().is_err());
        assert!("27x2".parse::<PlateFormat>().is_err());
        assert!("big".parse::<PlateFormat>().is_err());
    }

    #[test]
    fn test_contains_and_order() {
        let plate = PlateFormat::WELLS_96;
        assert!(plate.contains("H12".parse().unwrap()));
        assert!(!plate.contains("I1".parse().unwrap()));
        assert!(!plate.contains("A13".parse().unwrap()));
        let wells: Vec<String> = plate.wells().take(13).map(|w| w.to_string()).collect();
        assert_eq!(wells[0], "A1");
        assert_eq!(wells[11], "A12");
        assert_eq!(wells[12], "B1");
    }

    #[test]
    fn test_serde_as_strings() {
        let json = serde_json::to_string(&WellCoordinate::new(1, 2)).unwrap();
        assert_eq!(json, "\"B3\"");
        let format: PlateFormat = serde_json::from_str("\"384\"").unwrap();
        assert_eq!(format, PlateFormat::WELLS_384);
    }
}
