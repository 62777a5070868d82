/// Why a structure descriptor was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureErrorKind {
    /// The descriptor is empty or only whitespace
    #[error("empty structure")]
    Empty,

    /// A character that cannot start any SMILES token
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),

    /// A bracket atom that does not follow `[isotope? symbol chiral? H? charge? class?]`
    #[error("malformed bracket atom")]
    MalformedBracketAtom,

    /// An element symbol missing from the isotope table
    #[error("unknown element '{0}'")]
    UnknownElement(String),

    /// An isotope label the table does not carry
    #[error("unsupported isotope {mass_number}{symbol}")]
    UnknownIsotope {
        /// Element symbol
        symbol: String,
        /// Requested mass number
        mass_number: u16,
    },

    /// Notation outside the supported subset (e.g. the `*` wildcard)
    #[error("unsupported notation: {0}")]
    Unsupported(&'static str),

    /// A bond symbol not followed by an atom or ring closure
    #[error("bond is not followed by an atom")]
    DanglingBond,

    /// A branch or ring closure with no preceding atom
    #[error("{0} without a preceding atom")]
    MissingAtom(&'static str),

    /// `(` and `)` do not balance
    #[error("unbalanced branch")]
    UnbalancedBranch,

    /// A ring-closure digit that is never closed
    #[error("unclosed ring {0}")]
    UnclosedRing(u16),

    /// A ring closure that would bond an atom to itself or duplicate a bond
    #[error("invalid ring closure {0}")]
    InvalidRingClosure(u16),

    /// Both ends of a ring closure specify different bond orders
    #[error("conflicting bond orders on ring closure {0}")]
    ConflictingRingBond(u16),
}

/// A structure descriptor could not be turned into a molecular graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid structure '{smiles}' at position {position}: {kind}")]
pub struct InvalidStructureError {
    /// The descriptor as given
    pub smiles: String,
    /// Byte offset of the offending token
    pub position: usize,
    /// What went wrong
    pub kind: StructureErrorKind,
}

impl InvalidStructureError {
    pub(crate) fn new(smiles: &str, position: usize, kind: StructureErrorKind) -> Self {
        Self {
            smiles: smiles.to_string(),
            position,
            kind,
        }
    }
}
