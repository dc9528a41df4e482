use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::error::SequenceError;

/// The kinds of sites a modification can be placed on. Each residue letter has its own bit, the
/// termini are split into the peptide termini (any N or C terminus) and the protein termini (only
/// the termini that are also the ends of the original protein).
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct SiteMask(u32);

impl SiteMask {
    /// Nothing allowed
    pub const NONE: Self = Self(0);
    /// Any N terminus
    pub const PEPTIDE_N_TERM: Self = Self(1 << 26);
    /// The N terminus of a protein
    pub const PROTEIN_N_TERM: Self = Self(1 << 27);
    /// Any C terminus
    pub const PEPTIDE_C_TERM: Self = Self(1 << 28);
    /// The C terminus of a protein
    pub const PROTEIN_C_TERM: Self = Self(1 << 29);
    /// All residues
    pub const ANY_RESIDUE: Self = Self((1 << 26) - 1);
    /// Every residue and every terminus
    pub const ALL: Self = Self((1 << 30) - 1);

    /// The bit for a single residue letter, `None` if this is not an ASCII letter
    pub const fn residue(code: char) -> Option<Self> {
        if code.is_ascii_alphabetic() {
            Some(Self(1 << (code.to_ascii_uppercase() as u32 - 'A' as u32)))
        } else {
            None
        }
    }

    /// Build a mask from a list of residue letters
    /// # Errors
    /// If any character is not an ASCII letter.
    pub fn residues(codes: &str) -> Result<Self, SequenceError> {
        codes
            .char_indices()
            .filter(|(_, c)| !c.is_whitespace())
            .try_fold(Self::NONE, |acc, (position, character)| {
                Self::residue(character)
                    .map(|bit| acc | bit)
                    .ok_or(SequenceError::InvalidResidue {
                        character,
                        position,
                    })
            })
    }

    /// Parse a single site description: a residue letter, `N-term`, `Protein N-term`, `C-term`,
    /// or `Protein C-term` (case insensitive).
    pub fn parse_site(text: &str) -> Option<Self> {
        let text = text.trim();
        match text.to_ascii_lowercase().as_str() {
            "n-term" => Some(Self::PEPTIDE_N_TERM),
            "protein n-term" => Some(Self::PROTEIN_N_TERM),
            "c-term" => Some(Self::PEPTIDE_C_TERM),
            "protein c-term" => Some(Self::PROTEIN_C_TERM),
            _ => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::residue(c),
                    _ => None,
                }
            }
        }
    }

    /// Check if all bits of `other` are set in this mask
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check if any bit of `other` is set in this mask
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Check if no bits are set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Check if a modification with this mask can be placed on an N terminus
    pub const fn allows_n_term(self, protein_terminal: bool) -> bool {
        self.intersects(Self::PEPTIDE_N_TERM)
            || protein_terminal && self.intersects(Self::PROTEIN_N_TERM)
    }

    /// Check if a modification with this mask can be placed on a C terminus
    pub const fn allows_c_term(self, protein_terminal: bool) -> bool {
        self.intersects(Self::PEPTIDE_C_TERM)
            || protein_terminal && self.intersects(Self::PROTEIN_C_TERM)
    }
}

impl BitOr for SiteMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SiteMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for SiteMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}
