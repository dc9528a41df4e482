use serde::{Deserialize, Serialize};

/// A position on a sequence
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize,
)]
pub enum SequencePosition {
    /// N-terminal
    NTerm,
    /// A residue at the given index (0 based)
    Index(usize),
    /// C-terminal
    CTerm,
}

impl std::fmt::Display for SequencePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NTerm => write!(f, "N-terminal"),
            Self::Index(index) => write!(f, "{index}"),
            Self::CTerm => write!(f, "C-terminal"),
        }
    }
}

impl SequencePosition {
    /// Convert a modification slot index to a sequence position.
    /// The slot index is defined as follows:
    /// * `0` is N term
    /// * `1..=peptide_length` is in the sequence
    /// * `peptide_length + 1` is C term
    ///
    /// Returns `None` for anything outside of this range.
    pub const fn from_slot(slot: usize, peptide_length: usize) -> Option<Self> {
        if slot == 0 {
            Some(Self::NTerm)
        } else if slot == peptide_length + 1 {
            Some(Self::CTerm)
        } else if slot <= peptide_length {
            Some(Self::Index(slot - 1))
        } else {
            None
        }
    }

    /// The modification slot index of this position, the inverse of [`Self::from_slot`]. The
    /// onus of making sure the index is valid for the peptide is on the caller.
    pub const fn slot(self, peptide_length: usize) -> usize {
        match self {
            Self::NTerm => 0,
            Self::Index(i) => i + 1,
            Self::CTerm => peptide_length + 1,
        }
    }
}
