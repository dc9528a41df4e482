mod isoforms;
mod modification;
mod peptide;
mod polymer;
mod protease;
mod residue;
mod sequence_position;
mod site_mask;

#[cfg(test)]
mod tests;

pub use isoforms::*;
pub use modification::*;
pub use peptide::*;
pub use polymer::*;
pub use protease::*;
pub use residue::*;
pub use sequence_position::*;
pub use site_mask::*;
