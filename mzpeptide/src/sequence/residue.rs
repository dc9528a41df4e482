//! The residue catalog: every residue that can be part of a sequence.

use std::sync::LazyLock;

use crate::{
    chemistry::MolecularFormula,
    molecular_formula,
    sequence::SiteMask,
    system::{Mass, OrderedMass},
};

/// A single residue (amino acid) as it occurs in a sequence, meaning the amino acid minus one
/// water. Residues are only ever created in the static catalog and shared by reference, see
/// [`Residue::from_code`].
#[derive(Debug, Eq, Hash, PartialEq)]
pub struct Residue {
    code: char,
    name: &'static str,
    heavy: bool,
    formula: MolecularFormula,
    mass: OrderedMass,
    site: SiteMask,
}

const DEFINITIONS: &[(char, &str, fn() -> MolecularFormula)] = &[
    ('A', "Alanine", || molecular_formula!(C 3 H 5 N 1 O 1)),
    ('C', "Cysteine", || molecular_formula!(C 3 H 5 N 1 O 1 S 1)),
    ('D', "AsparticAcid", || molecular_formula!(C 4 H 5 N 1 O 3)),
    ('E', "GlutamicAcid", || molecular_formula!(C 5 H 7 N 1 O 3)),
    ('F', "Phenylalanine", || molecular_formula!(C 9 H 9 N 1 O 1)),
    ('G', "Glycine", || molecular_formula!(C 2 H 3 N 1 O 1)),
    ('H', "Histidine", || molecular_formula!(C 6 H 7 N 3 O 1)),
    ('I', "Isoleucine", || molecular_formula!(C 6 H 11 N 1 O 1)),
    ('K', "Lysine", || molecular_formula!(C 6 H 12 N 2 O 1)),
    ('L', "Leucine", || molecular_formula!(C 6 H 11 N 1 O 1)),
    ('M', "Methionine", || molecular_formula!(C 5 H 9 N 1 O 1 S 1)),
    ('N', "Asparagine", || molecular_formula!(C 4 H 6 N 2 O 2)),
    ('O', "Pyrrolysine", || molecular_formula!(C 12 H 19 N 3 O 2)),
    ('P', "Proline", || molecular_formula!(C 5 H 7 N 1 O 1)),
    ('Q', "Glutamine", || molecular_formula!(C 5 H 8 N 2 O 2)),
    ('R', "Arginine", || molecular_formula!(C 6 H 12 N 4 O 1)),
    ('S', "Serine", || molecular_formula!(C 3 H 5 N 1 O 2)),
    ('T', "Threonine", || molecular_formula!(C 4 H 7 N 1 O 2)),
    ('U', "Selenocysteine", || molecular_formula!(C 3 H 5 N 1 O 1 Se 1)),
    ('V', "Valine", || molecular_formula!(C 5 H 9 N 1 O 1)),
    ('W', "Tryptophan", || molecular_formula!(C 11 H 10 N 2 O 1)),
    ('Y', "Tyrosine", || molecular_formula!(C 9 H 9 N 1 O 2)),
];

/// The catalog, the natural residues in the order of [`DEFINITIONS`] followed by their heavy
/// counterparts in the same order.
static CATALOG: LazyLock<Vec<Residue>> = LazyLock::new(|| {
    let natural = DEFINITIONS.iter().map(|(code, name, formula)| {
        Residue::new(*code, *name, false, formula())
    });
    let heavy = DEFINITIONS
        .iter()
        .map(|(code, name, formula)| Residue::new(*code, *name, true, formula().heavy()));
    natural.chain(heavy).collect()
});

impl Residue {
    fn new(code: char, name: &'static str, heavy: bool, formula: MolecularFormula) -> Self {
        Self {
            code,
            name,
            heavy,
            mass: formula.monoisotopic_mass().into(),
            site: SiteMask::residue(code).unwrap_or_default(),
            formula,
        }
    }

    /// Get the residue for the given one letter code. Lowercase letters are not accepted.
    pub fn from_code(code: char) -> Option<&'static Self> {
        DEFINITIONS
            .iter()
            .position(|(c, _, _)| *c == code)
            .map(|index| &CATALOG[index])
    }

    /// All natural residues in the catalog
    pub fn all() -> &'static [Self] {
        &CATALOG[..DEFINITIONS.len()]
    }

    /// Get the isotopically heavy version of this residue (all carbon 13C, all nitrogen 15N).
    /// Heavy residues return themselves.
    pub fn heavy(&self) -> &'static Self {
        let index = DEFINITIONS
            .iter()
            .position(|(c, _, _)| *c == self.code)
            .unwrap_or_default();
        &CATALOG[DEFINITIONS.len() + index]
    }

    /// The one letter code
    pub const fn code(&self) -> char {
        self.code
    }

    /// The full name
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Is this the isotopically heavy version
    pub const fn is_heavy(&self) -> bool {
        self.heavy
    }

    /// The molecular formula
    pub const fn formula(&self) -> &MolecularFormula {
        &self.formula
    }

    /// The monoisotopic mass
    pub fn monoisotopic_mass(&self) -> Mass {
        self.mass.value()
    }

    /// The site this residue is, to be matched against the placement rules of modifications
    pub const fn site(&self) -> SiteMask {
        self.site
    }
}

impl std::fmt::Display for Residue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}
