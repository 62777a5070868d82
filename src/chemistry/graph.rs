//! Explicit atom/bond graph built from a structure descriptor.

use super::elements::{Element, HYDROGEN_MASS};
use super::formula::MolecularFormula;

/// Order of a bond between two heavy atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    /// `-`, `/`, `\` or implicit between aliphatic atoms
    Single,
    /// `=`
    Double,
    /// `#`
    Triple,
    /// `$`
    Quadruple,
    /// `:` or implicit between aromatic atoms
    Aromatic,
}

impl BondOrder {
    /// Contribution to the bond-order sum of each endpoint.
    ///
    /// Aromatic bonds count as 1; the extra π electron is accounted for
    /// separately when hydrogens are assigned.
    pub fn valence(&self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }
}

/// A heavy atom (or explicit bracket hydrogen) in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Element entry from the isotope table
    pub element: &'static Element,
    /// Mass number for isotope-labelled atoms
    pub isotope: Option<u16>,
    /// Exact mass of this atom without attached hydrogens
    pub mass: f64,
    /// Written in lowercase aromatic form
    pub aromatic: bool,
    /// Formal charge
    pub charge: i8,
    /// Hydrogen count written inside brackets; `None` for organic-subset atoms
    pub bracket_hydrogens: Option<u8>,
    /// Attached hydrogens (explicit or implicit), filled in on graph construction
    pub hydrogens: u8,
}

/// A bond between two atoms, by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    /// First atom index
    pub from: usize,
    /// Second atom index
    pub to: usize,
    /// Bond order
    pub order: BondOrder,
}

/// Molecular graph with hydrogens assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct MolecularGraph {
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
}

impl MolecularGraph {
    pub(crate) fn new(mut atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        let mut bond_sums = vec![0u32; atoms.len()];
        for bond in &bonds {
            bond_sums[bond.from] += u32::from(bond.order.valence());
            bond_sums[bond.to] += u32::from(bond.order.valence());
        }

        for (atom, bond_sum) in atoms.iter_mut().zip(bond_sums) {
            atom.hydrogens = match atom.bracket_hydrogens {
                Some(h) => h,
                None => implicit_hydrogens(atom.element.valences, atom.aromatic, bond_sum),
            };
        }

        Self { atoms, bonds }
    }

    /// Atoms in input order.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Bonds in the order they were closed.
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Total attached hydrogens across all atoms.
    pub fn hydrogen_count(&self) -> u32 {
        self.atoms.iter().map(|a| u32::from(a.hydrogens)).sum()
    }

    /// Net formal charge.
    pub fn net_charge(&self) -> i32 {
        self.atoms.iter().map(|a| i32::from(a.charge)).sum()
    }

    /// Number of disconnected components (`.`-separated fragments).
    pub fn component_count(&self) -> usize {
        let mut parent: Vec<usize> = (0..self.atoms.len()).collect();
        fn find(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }
        for bond in &self.bonds {
            let a = find(&mut parent, bond.from);
            let b = find(&mut parent, bond.to);
            if a != b {
                parent[a] = b;
            }
        }
        (0..self.atoms.len())
            .filter(|&i| find(&mut parent, i) == i)
            .count()
    }

    /// Elemental composition; labelled isotopes count under their element.
    pub fn formula(&self) -> MolecularFormula {
        let mut formula = MolecularFormula::default();
        for atom in &self.atoms {
            formula.add(atom.element.symbol, 1);
            if atom.hydrogens > 0 {
                formula.add("H", u32::from(atom.hydrogens));
            }
        }
        formula.set_charge(self.net_charge());
        formula
    }

    /// Monoisotopic mass of the neutral graph (charge does not shift the mass).
    pub fn monoisotopic_mass(&self) -> f64 {
        self.atoms
            .iter()
            .map(|a| a.mass + f64::from(a.hydrogens) * HYDROGEN_MASS)
            .sum()
    }
}

fn implicit_hydrogens(valences: &[u8], aromatic: bool, bond_sum: u32) -> u8 {
    let Some(&lowest) = valences.first() else {
        return 0;
    };
    if aromatic {
        // One valence unit belongs to the π system when it fits the lowest valence
        let needed = bond_sum + 1;
        return u32::from(lowest)
            .checked_sub(needed)
            .map_or(0, |h| h as u8);
    }
    valences
        .iter()
        .map(|&v| u32::from(v))
        .find(|&v| v >= bond_sum)
        .map_or(0, |v| (v - bond_sum) as u8)
}
