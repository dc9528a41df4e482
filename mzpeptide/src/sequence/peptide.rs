use std::{
    ops::{Deref, DerefMut, Range},
    sync::Arc,
};

use crate::{error::SequenceError, sequence::Polymer};

/// A contiguous stretch of a parent polymer, for example a peptide resulting from a digestion.
/// It owns its own copy of the residues and modifications so it can be modified independently of
/// its parent, all [`Polymer`] methods are available through deref.
///
/// ```rust
/// use mzpeptide::prelude::*;
/// let protein = Polymer::parse("MKWVTFISLLK").unwrap();
/// let peptide = protein.peptide(2, 4, true).unwrap();
/// assert_eq!(peptide.sequence(), "WVTF");
/// assert_eq!(peptide.range(), 2..6);
/// assert_eq!(peptide.parent_index(0), 2);
/// ```
#[derive(Clone, Debug)]
pub struct Peptide<'parent> {
    polymer: Polymer,
    start: usize,
    parent: Option<&'parent Polymer>,
}

impl Polymer {
    /// Create a peptide covering `length` residues from `first_residue` (0 based), the length is
    /// clamped to the end of this polymer. See [`Polymer::sub_polymer`] for the handling of the
    /// modifications.
    /// # Errors
    /// If the first residue is beyond the end of this polymer.
    pub fn peptide(
        &self,
        first_residue: usize,
        length: usize,
        include_modifications: bool,
    ) -> Result<Peptide<'_>, SequenceError> {
        Ok(Peptide {
            polymer: self.sub_polymer(first_residue, length, include_modifications)?,
            start: first_residue,
            parent: Some(self),
        })
    }
}

impl Peptide<'_> {
    /// The index of the first residue in the parent
    pub const fn start(&self) -> usize {
        self.start
    }

    /// The index of the last residue in the parent (inclusive), for an empty peptide this is the
    /// start.
    pub const fn end(&self) -> usize {
        self.start + self.polymer.len().saturating_sub(1)
    }

    /// The range in the parent covered by this peptide (half open)
    pub const fn range(&self) -> Range<usize> {
        self.start..self.start + self.polymer.len()
    }

    /// Map an index in this peptide to the index of the same residue in the parent
    pub const fn parent_index(&self, index: usize) -> usize {
        self.start + index
    }

    /// Map an index in the parent to the index of the same residue in this peptide, `None` if the
    /// parent residue is not covered by this peptide.
    pub const fn local_index(&self, parent_index: usize) -> Option<usize> {
        if parent_index >= self.start && parent_index < self.start + self.polymer.len() {
            Some(parent_index - self.start)
        } else {
            None
        }
    }

    /// The polymer this peptide was taken from, `None` if it was detached
    pub const fn parent(&self) -> Option<&Polymer> {
        self.parent
    }

    /// The sequence of this peptide
    pub const fn polymer(&self) -> &Polymer {
        &self.polymer
    }

    /// Drop the link to the parent, the coordinates are retained
    pub fn detach(self) -> Peptide<'static> {
        Peptide {
            polymer: self.polymer,
            start: self.start,
            parent: None,
        }
    }

    /// Get the sequence of this peptide
    pub fn into_polymer(self) -> Polymer {
        self.polymer
    }
}

impl Deref for Peptide<'_> {
    type Target = Polymer;
    fn deref(&self) -> &Self::Target {
        &self.polymer
    }
}

impl DerefMut for Peptide<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.polymer
    }
}

impl PartialEq for Peptide<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.polymer == other.polymer
    }
}

impl Eq for Peptide<'_> {}

impl std::fmt::Display for Peptide<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.polymer)
    }
}

/// Anything that holds a sequence
pub trait HasPolymer {
    /// Get a reference to the sequence
    fn polymer(&self) -> &Polymer;
}

impl HasPolymer for Polymer {
    fn polymer(&self) -> &Polymer {
        self
    }
}

impl HasPolymer for Peptide<'_> {
    fn polymer(&self) -> &Polymer {
        &self.polymer
    }
}

impl<T: HasPolymer + ?Sized> HasPolymer for &T {
    fn polymer(&self) -> &Polymer {
        (*self).polymer()
    }
}

impl<T: HasPolymer + ?Sized> HasPolymer for Box<T> {
    fn polymer(&self) -> &Polymer {
        self.as_ref().polymer()
    }
}

impl<T: HasPolymer + ?Sized> HasPolymer for Arc<T> {
    fn polymer(&self) -> &Polymer {
        self.as_ref().polymer()
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn coordinates() {
        let protein = Polymer::parse("[Acetyl]MKWVTFISLLK-[Amidated]").unwrap();
        let peptide = protein.peptide(1, 3, true).unwrap();
        assert_eq!(peptide.sequence(), "KWV");
        assert_eq!(peptide.start(), 1);
        assert_eq!(peptide.end(), 3);
        assert_eq!(peptide.local_index(3), Some(2));
        assert_eq!(peptide.local_index(4), None);
        assert_eq!(peptide.local_index(0), None);
        for index in 0..peptide.len() {
            assert_eq!(
                peptide.residue(index),
                protein.residue(peptide.parent_index(index))
            );
            assert_eq!(peptide.local_index(peptide.parent_index(index)), Some(index));
        }
        assert!(std::ptr::eq(peptide.parent().unwrap(), &protein));
        assert!(peptide.n_terminal_modification().is_none());

        let tail = protein.peptide(8, 5, true).unwrap();
        assert_eq!(tail.range(), 8..11);
        assert_eq!(tail.annotated_sequence(), "LLK-[Amidated]");
    }

    #[test]
    fn independent_of_parent() {
        let protein = Polymer::parse("PEPTIDE").unwrap();
        let mut peptide = protein.peptide(0, 3, true).unwrap().detach();
        assert!(peptide.parent().is_none());
        peptide
            .set_modification(
                1,
                Some(crate::sequence::ModificationDefinition::from_dalton(1.0)),
            )
            .unwrap();
        assert_eq!(peptide.annotated_sequence(), "P[+1]EP");
        assert_eq!(protein.annotated_sequence(), "PEPTIDE");
        assert_eq!(peptide.polymer().len(), 3);
    }

    #[test]
    fn has_polymer() {
        fn length(value: &impl HasPolymer) -> usize {
            value.polymer().len()
        }
        let protein = Polymer::parse("PEPTIDE").unwrap();
        let peptide = protein.peptide(2, 2, false).unwrap();
        assert_eq!(length(&protein), 7);
        assert_eq!(length(&peptide), 2);
        assert_eq!(length(&Arc::new(protein.clone())), 7);
        assert_eq!(length(&&peptide), 2);
    }
}
