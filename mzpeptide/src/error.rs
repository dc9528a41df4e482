use thiserror::Error;

/// Everything that can go wrong when building, mutating, or processing sequences. All positions
/// in parse errors are byte offsets into the parsed text.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum SequenceError {
    /// A character that is not a known residue
    #[error("Invalid residue '{character}' at position {position}")]
    InvalidResidue {
        /// The offending character
        character: char,
        /// The offset of the character in the text
        position: usize,
    },
    /// A modification that misses its closing bracket
    #[error("Unterminated modification, the bracket opened at position {position} is never closed")]
    UnterminatedModification {
        /// The offset of the opening bracket
        position: usize,
    },
    /// A modification that could not be interpreted as a heavy marker, name, formula, or mass
    #[error("Could not resolve modification '{text}' at position {position}")]
    UnresolvedModification {
        /// The content of the brackets
        text: String,
        /// The offset of the opening bracket
        position: usize,
    },
    /// A second modification on a site that already carries one
    #[error("Multiple modifications defined for the site at position {position}")]
    MultipleModifications {
        /// The offset of the opening bracket of the second modification
        position: usize,
    },
    /// A position outside of the sequence
    #[error("Position {position} is out of range for a sequence of length {length}")]
    PositionOutOfRange {
        /// The requested position
        position: usize,
        /// The length of the sequence
        length: usize,
    },
    /// Any other violation of the contract of a function
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A molecular formula that could not be parsed
    #[error("Invalid molecular formula '{text}': {reason}")]
    InvalidFormula {
        /// The formula text
        text: String,
        /// The explanation
        reason: String,
    },
    /// A modification database or parameter file that could not be read
    #[error("Invalid database: {0}")]
    InvalidDatabase(String),
}
