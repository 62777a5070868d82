use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Elemental composition with a net formal charge.
///
/// Displays in Hill order: carbon first, hydrogen second, everything else
/// alphabetically. Without carbon every element, hydrogen included, is
/// alphabetical. A non-zero charge is appended as `+`, `2-` and so on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MolecularFormula {
    counts: BTreeMap<String, u32>,
    charge: i32,
}

impl MolecularFormula {
    pub(crate) fn add(&mut self, symbol: &str, count: u32) {
        *self.counts.entry(symbol.to_string()).or_insert(0) += count;
    }

    pub(crate) fn set_charge(&mut self, charge: i32) {
        self.charge = charge;
    }

    /// Atom count for an element symbol (0 if absent).
    pub fn count(&self, symbol: &str) -> u32 {
        self.counts.get(symbol).copied().unwrap_or(0)
    }

    /// Net formal charge.
    pub fn charge(&self) -> i32 {
        self.charge
    }

    /// Iterate `(symbol, count)` in alphabetical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(s, c)| (s.as_str(), *c))
    }

    /// True when the formula has no atoms.
    pub fn is_empty(&self) -> bool {
        self.counts.values().all(|&c| c == 0)
    }

    fn hill_order(&self) -> Vec<(&str, u32)> {
        let has_carbon = self.count("C") > 0;
        let mut ordered = Vec::with_capacity(self.counts.len());
        if has_carbon {
            ordered.push(("C", self.count("C")));
            if self.count("H") > 0 {
                ordered.push(("H", self.count("H")));
            }
        }
        for (symbol, count) in self.iter() {
            if count == 0 || (has_carbon && (symbol == "C" || symbol == "H")) {
                continue;
            }
            ordered.push((symbol, count));
        }
        ordered
    }
}

impl fmt::Display for MolecularFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (symbol, count) in self.hill_order() {
            if count == 1 {
                write!(f, "{symbol}")?;
            } else {
                write!(f, "{symbol}{count}")?;
            }
        }
        match self.charge {
            0 => Ok(()),
            1 => write!(f, "+"),
            -1 => write!(f, "-"),
            c if c > 0 => write!(f, "{c}+"),
            c => write!(f, "{}-", -c),
        }
    }
}
