#![doc = include_str!("../README.md")]

mod helper_functions;

/// Contains all things related to the underlying chemistry.
pub mod chemistry;
/// The errors that can occur while building or processing sequences.
pub mod error;
/// Contains all things related to sequences: residues, modifications, polymers, peptides,
/// digestion, and isoforms.
pub mod sequence;
pub mod system;

/// A subset of the types and traits that are envisioned to be used the most, importing this is a good starting point for working with the crate
pub mod prelude {
    pub use crate::chemistry::{Element, MolecularFormula};
    pub use crate::error::SequenceError;
    pub use crate::molecular_formula;
    pub use crate::sequence::{
        CleavageSide, DigestionParameters, HasPolymer, IsoformIterator, Modification,
        ModificationDatabase, ModificationDefinition, Peptide, Polymer, Protease, Residue,
        SequencePosition, SiteMask, digest_str, generate_isoforms, generate_isoforms_of,
    };
    #[cfg(feature = "rayon")]
    pub use crate::sequence::par_generate_isoforms;
    pub use crate::system::{Mass, da, dalton};
}
