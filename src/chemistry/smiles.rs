//! SMILES tokenizer and graph builder.
//!
//! Tokens are recognised with `nom`; the graph builder then walks the token
//! stream keeping track of the previous atom, open branches and pending ring
//! closures.

use std::collections::BTreeMap;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, one_of, satisfy, u16 as decimal_u16},
    combinator::{map, map_res, opt, recognize, value},
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use super::elements::{self, Element};
use super::error::{InvalidStructureError, StructureErrorKind};
use super::graph::{Atom, Bond, BondOrder, MolecularGraph};

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Organic { symbol: &'a str, aromatic: bool },
    Bracket(BracketAtom<'a>),
    Bond(BondOrder),
    Ring(u16),
    BranchOpen,
    BranchClose,
    Dot,
    Wildcard,
}

#[derive(Debug, Clone, PartialEq)]
struct BracketAtom<'a> {
    isotope: Option<u16>,
    symbol: &'a str,
    hydrogens: u8,
    charge: i8,
}

/// Organic = "Cl" | "Br" | "B" | "C" | "N" | "O" | "P" | "S" | "F" | "I"
///         | "b" | "c" | "n" | "o" | "p" | "s" ;
fn organic(i: &str) -> IResult<&str, Token> {
    let aliphatic = map(
        alt((
            tag("Cl"),
            tag("Br"),
            tag("B"),
            tag("C"),
            tag("N"),
            tag("O"),
            tag("P"),
            tag("S"),
            tag("F"),
            tag("I"),
        )),
        |symbol| Token::Organic {
            symbol,
            aromatic: false,
        },
    );
    let aromatic = map(recognize(one_of("bcnops")), |symbol| Token::Organic {
        symbol,
        aromatic: true,
    });
    alt((aliphatic, aromatic))(i)
}

/// Bracket Symbol = "*" | "se" | "as" | "b" | "c" | "n" | "o" | "p" | "s"
///                | uppercase , [ lowercase ] ;
fn bracket_symbol(i: &str) -> IResult<&str, &str> {
    alt((
        tag("*"),
        tag("se"),
        tag("as"),
        recognize(one_of("bcnops")),
        recognize(pair(
            satisfy(|c| c.is_ascii_uppercase()),
            opt(satisfy(|c| c.is_ascii_lowercase())),
        )),
    ))(i)
}

/// Chiral = "@" , [ "@" | ( "TH" | "AL" | "SP" | "TB" | "OH" ) , digits ] ;
fn chirality(i: &str) -> IResult<&str, &str> {
    let class = recognize(pair(
        alt((tag("TH"), tag("AL"), tag("SP"), tag("TB"), tag("OH"))),
        digit1,
    ));
    recognize(pair(char('@'), opt(alt((tag("@"), class)))))(i)
}

/// H Count = "H" , [ digit ] ;
fn hydrogen_count(i: &str) -> IResult<&str, u8> {
    preceded(
        char('H'),
        map(opt(satisfy(|c| c.is_ascii_digit())), |d| {
            d.map_or(1, |c| c as u8 - b'0')
        }),
    )(i)
}

/// Charge = "++" | "--" | ( "+" | "-" ) , [ digits ] ;
fn charge(i: &str) -> IResult<&str, i8> {
    let signed = map(
        pair(one_of("+-"), opt(map_res(digit1, str::parse::<i8>))),
        |(sign, n)| {
            let n = n.unwrap_or(1);
            if sign == '-' {
                -n
            } else {
                n
            }
        },
    );
    alt((value(2, tag("++")), value(-2, tag("--")), signed))(i)
}

/// Bracket Atom = "[" , [ isotope ] , symbol , [ chiral ] , [ H count ] , [ charge ] ,
///                [ ":" , digits ] , "]" ;
fn bracket_atom(i: &str) -> IResult<&str, Token> {
    let body = tuple((
        opt(decimal_u16),
        bracket_symbol,
        opt(chirality),
        opt(hydrogen_count),
        opt(charge),
        opt(preceded(char(':'), digit1)),
    ));
    map(
        delimited(char('['), body, char(']')),
        |(isotope, symbol, _, hydrogens, charge, _)| {
            Token::Bracket(BracketAtom {
                isotope,
                symbol,
                hydrogens: hydrogens.unwrap_or(0),
                charge: charge.unwrap_or(0),
            })
        },
    )(i)
}

/// Bond = "-" | "=" | "#" | "$" | ":" | "/" | "\" ;
fn bond(i: &str) -> IResult<&str, Token> {
    map(
        alt((
            value(BondOrder::Single, char('-')),
            value(BondOrder::Double, char('=')),
            value(BondOrder::Triple, char('#')),
            value(BondOrder::Quadruple, char('$')),
            value(BondOrder::Aromatic, char(':')),
            value(BondOrder::Single, char('/')),
            value(BondOrder::Single, char('\\')),
        )),
        Token::Bond,
    )(i)
}

/// Ring Closure = digit | "%" , digit , digit ;
fn ring_closure(i: &str) -> IResult<&str, Token> {
    let single = map(satisfy(|c| c.is_ascii_digit()), |c| u16::from(c as u8 - b'0'));
    let double = map_res(
        preceded(
            char('%'),
            recognize(pair(
                satisfy(|c| c.is_ascii_digit()),
                satisfy(|c| c.is_ascii_digit()),
            )),
        ),
        str::parse::<u16>,
    );
    map(alt((single, double)), Token::Ring)(i)
}

fn token(i: &str) -> IResult<&str, Token> {
    alt((
        bracket_atom,
        organic,
        bond,
        ring_closure,
        value(Token::BranchOpen, char('(')),
        value(Token::BranchClose, char(')')),
        value(Token::Dot, char('.')),
        value(Token::Wildcard, char('*')),
    ))(i)
}

struct PendingRing {
    atom: usize,
    order: Option<BondOrder>,
    position: usize,
}

struct GraphBuilder<'s> {
    smiles: &'s str,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    previous: Option<usize>,
    pending_bond: Option<BondOrder>,
    branches: Vec<(usize, usize)>,
    rings: BTreeMap<u16, PendingRing>,
}

impl<'s> GraphBuilder<'s> {
    fn new(smiles: &'s str) -> Self {
        Self {
            smiles,
            atoms: Vec::new(),
            bonds: Vec::new(),
            previous: None,
            pending_bond: None,
            branches: Vec::new(),
            rings: BTreeMap::new(),
        }
    }

    fn error(&self, position: usize, kind: StructureErrorKind) -> InvalidStructureError {
        InvalidStructureError::new(self.smiles, position, kind)
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.atoms[a].aromatic && self.atoms[b].aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn has_bond(&self, a: usize, b: usize) -> bool {
        self.bonds
            .iter()
            .any(|bond| (bond.from == a && bond.to == b) || (bond.from == b && bond.to == a))
    }

    fn push_atom(&mut self, atom: Atom) {
        let index = self.atoms.len();
        self.atoms.push(atom);
        if let Some(previous) = self.previous {
            let order = self
                .pending_bond
                .take()
                .unwrap_or_else(|| self.default_order(previous, index));
            self.bonds.push(Bond {
                from: previous,
                to: index,
                order,
            });
        }
        self.previous = Some(index);
    }

    fn apply(&mut self, token: Token<'_>, position: usize) -> Result<(), InvalidStructureError> {
        match token {
            Token::Organic { symbol, aromatic } => {
                let element = if aromatic {
                    elements::lookup_aromatic(symbol)
                } else {
                    elements::lookup(symbol)
                }
                .ok_or_else(|| {
                    self.error(position, StructureErrorKind::UnknownElement(symbol.to_string()))
                })?;
                self.push_atom(Atom {
                    element,
                    isotope: None,
                    mass: element.monoisotopic_mass(),
                    aromatic,
                    charge: 0,
                    bracket_hydrogens: None,
                    hydrogens: 0,
                });
            }
            Token::Bracket(bracket) => {
                let atom = self.bracket_to_atom(&bracket, position)?;
                self.push_atom(atom);
            }
            Token::Bond(order) => {
                if self.previous.is_none() {
                    return Err(self.error(position, StructureErrorKind::MissingAtom("bond")));
                }
                if self.pending_bond.is_some() {
                    return Err(self.error(position, StructureErrorKind::DanglingBond));
                }
                self.pending_bond = Some(order);
            }
            Token::Ring(number) => self.close_or_open_ring(number, position)?,
            Token::BranchOpen => {
                let Some(previous) = self.previous else {
                    return Err(self.error(position, StructureErrorKind::MissingAtom("branch")));
                };
                if self.pending_bond.is_some() {
                    return Err(self.error(position, StructureErrorKind::DanglingBond));
                }
                self.branches.push((previous, self.atoms.len()));
            }
            Token::BranchClose => {
                if self.pending_bond.is_some() {
                    return Err(self.error(position, StructureErrorKind::DanglingBond));
                }
                let (anchor, atoms_at_open) = self
                    .branches
                    .pop()
                    .ok_or_else(|| self.error(position, StructureErrorKind::UnbalancedBranch))?;
                if self.atoms.len() == atoms_at_open {
                    return Err(self.error(position, StructureErrorKind::Unsupported("empty branch")));
                }
                self.previous = Some(anchor);
            }
            Token::Dot => {
                if self.pending_bond.is_some() {
                    return Err(self.error(position, StructureErrorKind::DanglingBond));
                }
                self.previous = None;
            }
            Token::Wildcard => {
                return Err(self.error(position, StructureErrorKind::Unsupported("wildcard atom '*'")));
            }
        }
        Ok(())
    }

    fn bracket_to_atom(
        &self,
        bracket: &BracketAtom<'_>,
        position: usize,
    ) -> Result<Atom, InvalidStructureError> {
        if bracket.symbol == "*" {
            return Err(self.error(position, StructureErrorKind::Unsupported("wildcard atom '*'")));
        }
        let aromatic = bracket.symbol.starts_with(|c: char| c.is_ascii_lowercase());
        let element: &'static Element = if aromatic {
            elements::lookup_aromatic(bracket.symbol)
        } else {
            elements::lookup(bracket.symbol)
        }
        .ok_or_else(|| {
            self.error(
                position,
                StructureErrorKind::UnknownElement(bracket.symbol.to_string()),
            )
        })?;
        let mass = match bracket.isotope {
            Some(mass_number) => element.isotope_mass(mass_number).ok_or_else(|| {
                self.error(
                    position,
                    StructureErrorKind::UnknownIsotope {
                        symbol: element.symbol.to_string(),
                        mass_number,
                    },
                )
            })?,
            None => element.monoisotopic_mass(),
        };
        Ok(Atom {
            element,
            isotope: bracket.isotope,
            mass,
            aromatic,
            charge: bracket.charge,
            bracket_hydrogens: Some(bracket.hydrogens),
            hydrogens: 0,
        })
    }

    fn close_or_open_ring(&mut self, number: u16, position: usize) -> Result<(), InvalidStructureError> {
        let Some(current) = self.previous else {
            return Err(self.error(position, StructureErrorKind::MissingAtom("ring closure")));
        };
        let bond_here = self.pending_bond.take();

        let Some(open) = self.rings.remove(&number) else {
            self.rings.insert(
                number,
                PendingRing {
                    atom: current,
                    order: bond_here,
                    position,
                },
            );
            return Ok(());
        };

        if open.atom == current || self.has_bond(open.atom, current) {
            return Err(self.error(position, StructureErrorKind::InvalidRingClosure(number)));
        }
        let order = match (open.order, bond_here) {
            (Some(a), Some(b)) if a != b => {
                return Err(self.error(position, StructureErrorKind::ConflictingRingBond(number)));
            }
            (Some(order), _) | (None, Some(order)) => order,
            (None, None) => self.default_order(open.atom, current),
        };
        self.bonds.push(Bond {
            from: open.atom,
            to: current,
            order,
        });
        Ok(())
    }

    fn finish(self, end: usize) -> Result<MolecularGraph, InvalidStructureError> {
        if self.pending_bond.is_some() {
            return Err(self.error(end, StructureErrorKind::DanglingBond));
        }
        if !self.branches.is_empty() {
            return Err(self.error(end, StructureErrorKind::UnbalancedBranch));
        }
        if let Some((number, ring)) = self.rings.iter().next() {
            return Err(self.error(ring.position, StructureErrorKind::UnclosedRing(*number)));
        }
        if self.atoms.is_empty() {
            return Err(self.error(0, StructureErrorKind::Empty));
        }
        Ok(MolecularGraph::new(self.atoms, self.bonds))
    }
}

/// Parse a SMILES string into a molecular graph with hydrogens assigned.
///
/// Surrounding whitespace is ignored; anything else outside the supported
/// notation is reported with the byte offset where parsing stopped.
pub fn parse_smiles(smiles: &str) -> Result<MolecularGraph, InvalidStructureError> {
    let leading = smiles.len() - smiles.trim_start().len();
    let body = smiles.trim();
    if body.is_empty() {
        return Err(InvalidStructureError::new(smiles, 0, StructureErrorKind::Empty));
    }

    let mut builder = GraphBuilder::new(smiles);
    let mut rest = body;
    while !rest.is_empty() {
        let position = leading + body.len() - rest.len();
        match token(rest) {
            Ok((remaining, token)) => {
                builder.apply(token, position)?;
                rest = remaining;
            }
            Err(_) => {
                let kind = match rest.chars().next() {
                    Some('[') => StructureErrorKind::MalformedBracketAtom,
                    Some(c) => StructureErrorKind::UnexpectedCharacter(c),
                    None => StructureErrorKind::Empty,
                };
                return Err(InvalidStructureError::new(smiles, position, kind));
            }
        }
    }
    builder.finish(leading + body.len())
}
