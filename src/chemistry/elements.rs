//! Fixed isotope table used by the mass calculator.
//!
//! Masses are monoisotopic values in unified atomic mass units. Each element
//! lists its isotopes with the most abundant one first; that isotope is used
//! whenever a structure does not carry an explicit isotope label.

/// Version tag of the isotope table, recorded in exported reports.
pub const ISOTOPE_TABLE_VERSION: &str = "ame2016-v1";

/// Monoisotopic mass of ¹H.
pub const HYDROGEN_MASS: f64 = 1.007_825_032_07;

/// A chemical element with its default valences and known isotopes.
#[derive(Debug, PartialEq)]
pub struct Element {
    /// Element symbol with canonical capitalisation (e.g. `Cl`)
    pub symbol: &'static str,
    /// Default valences used for implicit hydrogens (organic subset only)
    pub valences: &'static [u8],
    /// `(mass number, exact mass)` pairs, most abundant first
    pub isotopes: &'static [(u16, f64)],
}

impl Element {
    /// Exact mass of the most abundant isotope.
    pub fn monoisotopic_mass(&self) -> f64 {
        self.isotopes[0].1
    }

    /// Exact mass of a specific isotope, `None` if the table does not carry it.
    pub fn isotope_mass(&self, mass_number: u16) -> Option<f64> {
        self.isotopes
            .iter()
            .find(|(a, _)| *a == mass_number)
            .map(|(_, mass)| *mass)
    }

    /// True for the elements that may be written without brackets in SMILES.
    pub fn is_organic_subset(&self) -> bool {
        !self.valences.is_empty()
    }
}

macro_rules! element {
    ($symbol:literal, [$($valence:literal),*], [$(($a:literal, $mass:literal)),+ $(,)?]) => {
        Element {
            symbol: $symbol,
            valences: &[$($valence),*],
            isotopes: &[$(($a, $mass)),+],
        }
    };
}

static ELEMENTS: &[Element] = &[
    element!("H", [], [(1, 1.007_825_032_07), (2, 2.014_101_778_12), (3, 3.016_049_281_32)]),
    element!("Li", [], [(7, 7.016_003_436_6), (6, 6.015_122_887)]),
    element!("B", [3], [(11, 11.009_305_4), (10, 10.012_937_0)]),
    element!("C", [4], [(12, 12.0), (13, 13.003_354_835_07), (14, 14.003_241_988_4)]),
    element!("N", [3, 5], [(14, 14.003_074_004_8), (15, 15.000_108_898_88)]),
    element!("O", [2], [(16, 15.994_914_619_56), (17, 16.999_131_756_50), (18, 17.999_159_612_86)]),
    element!("F", [1], [(19, 18.998_403_162_73)]),
    element!("Na", [], [(23, 22.989_769_282_0)]),
    element!("Mg", [], [(24, 23.985_041_697)]),
    element!("Al", [], [(27, 26.981_538_53)]),
    element!("Si", [], [(28, 27.976_926_534_65)]),
    element!("P", [3, 5], [(31, 30.973_761_998_42)]),
    element!("S", [2, 4, 6], [(32, 31.972_071_174_4), (34, 33.967_867_004)]),
    element!("Cl", [1], [(35, 34.968_852_682), (37, 36.965_902_602)]),
    element!("K", [], [(39, 38.963_706_486_4)]),
    element!("Ca", [], [(40, 39.962_590_863)]),
    element!("Ti", [], [(48, 47.947_941_98)]),
    element!("Cr", [], [(52, 51.940_506_23)]),
    element!("Mn", [], [(55, 54.938_043_91)]),
    element!("Fe", [], [(56, 55.934_936_33)]),
    element!("Co", [], [(59, 58.933_194_29)]),
    element!("Ni", [], [(58, 57.935_342_41)]),
    element!("Cu", [], [(63, 62.929_597_72)]),
    element!("Zn", [], [(64, 63.929_142_01)]),
    element!("Ge", [], [(74, 73.921_177_761)]),
    element!("As", [], [(75, 74.921_594_57)]),
    element!("Se", [], [(80, 79.916_521_8)]),
    element!("Br", [1], [(79, 78.918_337_6), (81, 80.916_289_7)]),
    element!("Pd", [], [(106, 105.903_480_4)]),
    element!("Ag", [], [(107, 106.905_091_6)]),
    element!("Sn", [], [(120, 119.902_201_63)]),
    element!("I", [1], [(127, 126.904_471_9)]),
    element!("Pt", [], [(195, 194.964_791_7)]),
    element!("Hg", [], [(202, 201.970_643_40)]),
];

/// Look up an element by its canonical symbol.
pub fn lookup(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

/// Look up an aromatic (lowercase) SMILES symbol such as `c` or `se`.
pub fn lookup_aromatic(symbol: &str) -> Option<&'static Element> {
    let canonical = match symbol {
        "b" => "B",
        "c" => "C",
        "n" => "N",
        "o" => "O",
        "p" => "P",
        "s" => "S",
        "se" => "Se",
        "as" => "As",
        _ => return None,
    };
    lookup(canonical)
}
