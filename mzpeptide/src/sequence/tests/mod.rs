#![allow(clippy::missing_panics_doc)]

use crate::sequence::{Modification, ModificationDatabase, Polymer};

/// Get a modification from the built in database
fn built_in(name: &str) -> Modification {
    ModificationDatabase::built_in()
        .get(name)
        .unwrap_or_else(|| panic!("'{name}' is not a built in modification"))
        .clone()
}

/// The slots that carry a modification, to compare isoforms independent of their order
fn occupied(polymer: &Polymer) -> Vec<usize> {
    polymer
        .modifications()
        .iter()
        .enumerate()
        .filter_map(|(slot, m)| m.as_ref().map(|_| slot))
        .collect()
}
