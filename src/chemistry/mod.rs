//! # Mass Calculator
//!
//! Structure descriptor (SMILES) → molecular graph → formula → monoisotopic
//! mass → adduct ion masses.
//!
//! ```
//! use lcms_qc::chemistry::{Adduct, MassCalculator};
//!
//! let masses = MassCalculator::default().calculate("CCO")?;
//! assert_eq!(masses.formula.to_string(), "C2H6O");
//! assert!((masses.adduct_mass(Adduct::Protonated) - 47.0497).abs() < 1e-4);
//! # Ok::<(), lcms_qc::chemistry::InvalidStructureError>(())
//! ```

mod elements;
mod error;
mod formula;
mod graph;
mod smiles;

use serde::{Deserialize, Serialize};

pub use elements::{lookup as lookup_element, Element, HYDROGEN_MASS, ISOTOPE_TABLE_VERSION};
pub use error::{InvalidStructureError, StructureErrorKind};
pub use formula::MolecularFormula;
pub use graph::{Atom, Bond, BondOrder, MolecularGraph};
pub use smiles::parse_smiles;

/// Adduct ions reported for every structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Adduct {
    /// `[M+H]+`
    #[serde(rename = "[M+H]+")]
    Protonated,
    /// `[M+Na]+`
    #[serde(rename = "[M+Na]+")]
    Sodiated,
    /// `[M-H]-`
    #[serde(rename = "[M-H]-")]
    Deprotonated,
}

impl Adduct {
    /// All adducts in reporting order.
    pub const ALL: [Adduct; 3] = [Adduct::Protonated, Adduct::Sodiated, Adduct::Deprotonated];

    /// Mass shift applied to the neutral monoisotopic mass.
    pub fn delta(&self) -> f64 {
        match self {
            Adduct::Protonated => 1.0078,
            Adduct::Sodiated => 22.9897,
            Adduct::Deprotonated => -1.0073,
        }
    }

    /// Conventional label, e.g. `[M+Na]+`.
    pub fn label(&self) -> &'static str {
        match self {
            Adduct::Protonated => "[M+H]+",
            Adduct::Sodiated => "[M+Na]+",
            Adduct::Deprotonated => "[M-H]-",
        }
    }
}

impl std::fmt::Display for Adduct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Formula, neutral monoisotopic mass and adduct masses of one structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TheoreticalMasses {
    /// Elemental composition
    pub formula: MolecularFormula,
    /// Neutral monoisotopic mass (Da)
    pub monoisotopic: f64,
    /// `[M+H]+`
    pub protonated: f64,
    /// `[M+Na]+`
    pub sodiated: f64,
    /// `[M-H]-`
    pub deprotonated: f64,
}

impl TheoreticalMasses {
    /// Derive adduct masses from a formula and its monoisotopic mass.
    pub fn new(formula: MolecularFormula, monoisotopic: f64) -> Self {
        Self {
            formula,
            monoisotopic,
            protonated: monoisotopic + Adduct::Protonated.delta(),
            sodiated: monoisotopic + Adduct::Sodiated.delta(),
            deprotonated: monoisotopic + Adduct::Deprotonated.delta(),
        }
    }

    /// Mass of one adduct ion.
    pub fn adduct_mass(&self, adduct: Adduct) -> f64 {
        match adduct {
            Adduct::Protonated => self.protonated,
            Adduct::Sodiated => self.sodiated,
            Adduct::Deprotonated => self.deprotonated,
        }
    }

    /// `(adduct, mass)` pairs in reporting order.
    pub fn adducts(&self) -> impl Iterator<Item = (Adduct, f64)> + '_ {
        Adduct::ALL.into_iter().map(move |a| (a, self.adduct_mass(a)))
    }
}

/// Computes theoretical masses from SMILES using the built-in isotope table.
#[derive(Debug, Clone, Copy, Default)]
pub struct MassCalculator;

impl MassCalculator {
    /// Parse `smiles` and compute formula, monoisotopic and adduct masses.
    pub fn calculate(&self, smiles: &str) -> Result<TheoreticalMasses, InvalidStructureError> {
        let graph = parse_smiles(smiles)?;
        let masses = TheoreticalMasses::new(graph.formula(), graph.monoisotopic_mass());
        log::debug!(
            "{} -> {} (mono {:.6})",
            smiles.trim(),
            masses.formula,
            masses.monoisotopic
        );
        Ok(masses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_water_and_ethanol() {
        let water = MassCalculator.calculate("O").unwrap();
        assert_eq!(water.formula.to_string(), "H2O");
        assert!((water.monoisotopic - 18.010565).abs() < 1e-5);

        let ethanol = MassCalculator.calculate("CCO").unwrap();
        assert!((ethanol.monoisotopic - 46.041865).abs() < 1e-5);
    }

    #[test]
    fn test_adduct_deltas() {
        let masses = MassCalculator.calculate("c1ccccc1").unwrap();
        assert!((masses.protonated - masses.monoisotopic - 1.0078).abs() < 1e-4);
        assert!((masses.sodiated - masses.monoisotopic - 22.9897).abs() < 1e-4);
        assert!((masses.deprotonated - masses.monoisotopic + 1.0073).abs() < 1e-4);

        let listed: Vec<_> = masses.adducts().map(|(a, _)| a).collect();
        assert_eq!(listed, Adduct::ALL.to_vec());
    }

    #[test]
    fn test_glutarimide_conjugate() {
        let smiles = "NCCC(NCc(cc1)cc(CN2C(CCC(N3)=O)C3=O)c1C2=O)=O";
        let masses = MassCalculator.calculate(smiles).unwrap();
        assert_eq!(masses.formula.to_string(), "C17H20N4O4");
        assert!((masses.monoisotopic - 344.148455).abs() < 1e-5);
        assert!((masses.protonated - 345.156255).abs() < 1e-5);
    }

    #[test]
    fn test_charge_does_not_change_mass() {
        let neutral = MassCalculator.calculate("[NH3]").unwrap();
        let charged = MassCalculator.calculate("[NH3+]").unwrap();
        assert_eq!(neutral.monoisotopic, charged.monoisotopic);
        assert_eq!(charged.formula.charge(), 1);
    }

    #[test]
    fn test_deterministic() {
        let a = MassCalculator.calculate("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        let b = MassCalculator.calculate("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.formula.to_string(), "C9H8O4");
    }

    #[test]
    fn test_invalid_structure() {
        let err = MassCalculator.calculate("C1CC(").unwrap_err();
        assert_eq!(err.smiles, "C1CC(");
        assert!(err.to_string().contains("invalid structure"));
    }

    #[test]
    fn test_adduct_labels() {
        assert_eq!(Adduct::Sodiated.to_string(), "[M+Na]+");
        assert_eq!(
            serde_json::to_string(&Adduct::Deprotonated).unwrap(),
            "\"[M-H]-\""
        );
    }
}
