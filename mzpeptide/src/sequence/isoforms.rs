//! Enumerate all distinct placements of a set of modifications on a sequence.
//!
//! A single kind of modification is placed with a closed form method: the isoforms are the
//! `k`-combinations of the `m` available sites, and each isoform is generated directly from its
//! index in the combinatorial number system, so no placement is ever materialised twice and the
//! enumeration can be split over any number of workers. Multiple kinds competing for the same
//! sites are placed with a backtracking search over partial assignments, deduplicated on a
//! canonical key.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use crate::{
    error::SequenceError,
    sequence::{HasPolymer, Modification, Polymer, SequencePosition},
};

/// The binomial coefficient `C(n, k)`, `None` if it does not fit in a `u64`.
/// ```rust
/// use mzpeptide::sequence::binomial;
/// assert_eq!(binomial(5, 2), Some(10));
/// assert_eq!(binomial(3, 4), Some(0));
/// assert_eq!(binomial(100, 50), None);
/// ```
pub fn binomial(n: usize, k: usize) -> Option<u64> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        // C(n, i) * (n - i) is always divisible by (i + 1)
        result = result.checked_mul((n - i) as u128)? / (i as u128 + 1);
    }
    u64::try_from(result).ok()
}

/// Get the `index`th `k`-combination of `0..m` in colexicographic order, as strictly increasing
/// indices. The index has to be smaller than `C(m, k)`.
/// ```rust
/// use mzpeptide::sequence::unrank_combination;
/// assert_eq!(unrank_combination(0, 3, 2), vec![0, 1]);
/// assert_eq!(unrank_combination(1, 3, 2), vec![0, 2]);
/// assert_eq!(unrank_combination(2, 3, 2), vec![1, 2]);
/// ```
pub fn unrank_combination(mut index: u64, m: usize, k: usize) -> Vec<usize> {
    debug_assert!(binomial(m, k).is_none_or(|total| index < total));
    let mut result = Vec::with_capacity(k);
    let mut upper = m;
    for b in (1..=k).rev() {
        // The largest a below the previous pick with C(a, b) <= index, C(b - 1, b) is zero so
        // this always stops at or above b - 1
        let mut a = upper.saturating_sub(1);
        while a > 0 && binomial(a, b).is_none_or(|c| c > index) {
            a -= 1;
        }
        index -= binomial(a, b).unwrap_or_default();
        result.push(a);
        upper = a;
    }
    result.reverse();
    result
}

/// Lazily generates all isoforms of a single kind of modification placed `k` times. Every
/// isoform is built independently from its index, see [`IsoformIterator::isoform`].
#[derive(Clone, Debug)]
pub struct IsoformIterator {
    base: Polymer,
    modification: Modification,
    slots: Vec<usize>,
    multiplicity: usize,
    next: u64,
    total: u64,
}

impl IsoformIterator {
    fn new(
        base: Polymer,
        modification: Modification,
        multiplicity: usize,
    ) -> Result<Self, SequenceError> {
        let slots = base.available_slots(modification.sites());
        let total = binomial(slots.len(), multiplicity).ok_or_else(|| {
            SequenceError::InvalidArgument(format!(
                "Placing {multiplicity} times '{modification}' on {} sites gives too many isoforms",
                slots.len()
            ))
        })?;
        log::debug!(
            "{total} isoforms for {multiplicity}x '{modification}' on {} sites",
            slots.len()
        );
        Ok(Self {
            base,
            modification,
            slots,
            multiplicity,
            next: 0,
            total,
        })
    }

    /// The total number of isoforms, `C(m, k)`
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// The sites where the modification can be placed
    pub fn sites(&self) -> Vec<SequencePosition> {
        self.slots
            .iter()
            .filter_map(|slot| SequencePosition::from_slot(*slot, self.base.len()))
            .collect()
    }

    /// Build the isoform with the given index, `None` if the index is not below [`Self::total`].
    pub fn isoform(&self, index: u64) -> Option<Polymer> {
        if index >= self.total {
            return None;
        }
        let mut isoform = self.base.clone();
        for site in unrank_combination(index, self.slots.len(), self.multiplicity) {
            place(&mut isoform, self.slots[site], self.modification.clone());
        }
        Some(isoform)
    }
}

impl Iterator for IsoformIterator {
    type Item = Polymer;

    fn next(&mut self) -> Option<Self::Item> {
        let isoform = self.isoform(self.next)?;
        self.next += 1;
        Some(isoform)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = usize::try_from(self.total - self.next).ok();
        (left.unwrap_or(usize::MAX), left)
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.next = self
            .next
            .saturating_add(u64::try_from(n).unwrap_or(u64::MAX))
            .min(self.total);
        self.next()
    }
}

/// Place a modification through the regular setters
fn place(polymer: &mut Polymer, slot: usize, modification: Modification) {
    if slot == 0 {
        polymer.set_n_terminal_modification(Some(modification));
    } else if slot == polymer.len() + 1 {
        polymer.set_c_terminal_modification(Some(modification));
    } else {
        polymer.set_slot(slot, Some(modification));
    }
}

/// Generate all isoforms of placing the given modification `multiplicity` times on the sequence.
/// Sites that are already modified on the sequence are never used. If there are no available
/// sites while the multiplicity is at least one no isoforms are generated.
///
/// ```rust
/// use mzpeptide::prelude::*;
/// let polymer = Polymer::parse("SAMTSY").unwrap();
/// let phospho = ModificationDatabase::built_in().get("Phospho").unwrap();
/// let isoforms: Vec<_> = generate_isoforms_of(&polymer, phospho, 2).unwrap().collect();
/// assert_eq!(isoforms.len(), 6);
/// assert!(isoforms.iter().any(|i| i.annotated_sequence() == "S[Phospho]AMT[Phospho]SY"));
/// ```
/// # Errors
/// If the number of isoforms does not fit in a `u64`.
pub fn generate_isoforms_of(
    polymer: &impl HasPolymer,
    modification: &Modification,
    multiplicity: usize,
) -> Result<IsoformIterator, SequenceError> {
    IsoformIterator::new(
        polymer.polymer().clone(),
        modification.clone(),
        multiplicity,
    )
}

/// One kind of modification with the number of times it has to be placed and where it can go
#[derive(Debug)]
struct Kind {
    modification: Modification,
    count: usize,
    slots: Vec<usize>,
}

/// A node in the search: the instances placed so far, as slot to kind index
#[derive(Clone, Debug)]
struct Frame {
    depth: usize,
    assignment: BTreeMap<usize, usize>,
    /// The first usable index in the slots of the current kind, so that copies of the same kind
    /// are only placed in ascending order
    cursor: usize,
}

/// The plan for a set of modifications
enum Plan {
    Unmodified,
    Empty,
    Single(Modification, usize),
    Search(Vec<Kind>),
}

fn plan(polymer: &Polymer, modifications: &[Modification]) -> Plan {
    if modifications.is_empty() {
        return Plan::Unmodified;
    }
    let mut kinds: Vec<Kind> = Vec::new();
    for modification in modifications {
        if let Some(kind) = kinds.iter_mut().find(|k| k.modification == *modification) {
            kind.count += 1;
        } else {
            kinds.push(Kind {
                slots: polymer.available_slots(modification.sites()),
                modification: modification.clone(),
                count: 1,
            });
        }
    }
    if kinds.len() == 1 {
        let kind = kinds.remove(0);
        return Plan::Single(kind.modification, kind.count);
    }
    kinds.retain(|kind| {
        if kind.slots.is_empty() {
            log::debug!("'{}' has no available sites, it is skipped", kind.modification);
        }
        !kind.slots.is_empty()
    });
    match kinds.len() {
        0 => Plan::Unmodified,
        1 => {
            let kind = kinds.remove(0);
            if kind.slots.len() < kind.count {
                Plan::Empty
            } else {
                Plan::Single(kind.modification, kind.count)
            }
        }
        _ => Plan::Search(kinds),
    }
}

/// The kind index of every instance that has to be placed, copies of a kind are consecutive
fn instances(kinds: &[Kind]) -> Vec<usize> {
    kinds
        .iter()
        .enumerate()
        .flat_map(|(index, kind)| std::iter::repeat_n(index, kind.count))
        .collect()
}

/// All child frames of the given frame
fn expand(kinds: &[Kind], instances: &[usize], frame: &Frame) -> Vec<Frame> {
    let kind = instances[frame.depth];
    let first = if frame.depth > 0 && instances[frame.depth - 1] == kind {
        frame.cursor
    } else {
        0
    };
    kinds[kind]
        .slots
        .iter()
        .enumerate()
        .skip(first)
        .filter(|(_, slot)| !frame.assignment.contains_key(slot))
        .map(|(cursor, slot)| {
            let mut assignment = frame.assignment.clone();
            assignment.insert(*slot, kind);
            Frame {
                depth: frame.depth + 1,
                assignment,
                cursor: cursor + 1,
            }
        })
        .collect()
}

/// Run the backtracking search from the given frames, returning the canonical keys (slot, kind)
/// sorted by slot of all complete assignments
fn search(
    kinds: &[Kind],
    instances: &[usize],
    mut stack: Vec<Frame>,
) -> BTreeSet<Vec<(usize, usize)>> {
    let mut found = BTreeSet::new();
    while let Some(frame) = stack.pop() {
        if frame.depth == instances.len() {
            found.insert(frame.assignment.into_iter().collect_vec());
        } else {
            stack.extend(expand(kinds, instances, &frame));
        }
    }
    log::trace!("search over {} instances found {} placements", instances.len(), found.len());
    found
}

fn root() -> Frame {
    Frame {
        depth: 0,
        assignment: BTreeMap::new(),
        cursor: 0,
    }
}

fn materialise(
    base: &Polymer,
    kinds: &[Kind],
    keys: BTreeSet<Vec<(usize, usize)>>,
) -> Vec<Polymer> {
    keys.into_iter()
        .map(|key| {
            let mut isoform = base.clone();
            for (slot, kind) in key {
                place(&mut isoform, slot, kinds[kind].modification.clone());
            }
            isoform
        })
        .collect()
}

/// Generate all distinct isoforms of placing the given modifications on the sequence. Listing
/// the same modification multiple times places it that many times. Sites that are already
/// modified on the sequence are never used, and no site gets more than one modification.
///
/// * No modifications: only the unmodified sequence.
/// * A single kind of modification: see [`generate_isoforms_of`].
/// * Multiple kinds: every distinct assignment of all instances to available sites. A kind that
///   has no available sites at all is skipped, the other kinds are still placed.
///
/// ```rust
/// use mzpeptide::prelude::*;
/// let polymer = Polymer::parse("MKMK").unwrap();
/// let database = ModificationDatabase::built_in();
/// let oxidation = database.get("Oxidation").unwrap().clone();
/// let methyl = database.get("Methyl").unwrap().clone();
/// let isoforms = generate_isoforms(&polymer, &[oxidation, methyl]).unwrap();
/// assert_eq!(isoforms.len(), 4);
/// ```
/// # Errors
/// If the number of isoforms for a single kind does not fit in a `u64`.
pub fn generate_isoforms(
    polymer: &impl HasPolymer,
    modifications: &[Modification],
) -> Result<Vec<Polymer>, SequenceError> {
    let base = polymer.polymer();
    match plan(base, modifications) {
        Plan::Unmodified => Ok(vec![base.clone()]),
        Plan::Empty => Ok(Vec::new()),
        Plan::Single(modification, count) => {
            Ok(IsoformIterator::new(base.clone(), modification, count)?.collect())
        }
        Plan::Search(kinds) => {
            let instances = instances(&kinds);
            log::debug!(
                "backtracking {} instances of {} kinds",
                instances.len(),
                kinds.len()
            );
            let keys = search(&kinds, &instances, vec![root()]);
            Ok(materialise(base, &kinds, keys))
        }
    }
}

/// The same as [`generate_isoforms`] but using multiple threads. A single kind splits the index
/// range of the isoforms, multiple kinds split the search on the placement of the first
/// instance. The order of the isoforms is not specified.
/// # Errors
/// If the number of isoforms for a single kind does not fit in a `u64`.
#[cfg(feature = "rayon")]
pub fn par_generate_isoforms(
    polymer: &impl HasPolymer,
    modifications: &[Modification],
) -> Result<Vec<Polymer>, SequenceError> {
    use rayon::prelude::*;

    let base = polymer.polymer();
    match plan(base, modifications) {
        Plan::Unmodified => Ok(vec![base.clone()]),
        Plan::Empty => Ok(Vec::new()),
        Plan::Single(modification, count) => {
            let iterator = IsoformIterator::new(base.clone(), modification, count)?;
            Ok((0..iterator.total())
                .into_par_iter()
                .filter_map(|index| iterator.isoform(index))
                .collect())
        }
        Plan::Search(kinds) => {
            let instances = instances(&kinds);
            let keys = expand(&kinds, &instances, &root())
                .into_par_iter()
                .map(|frame| search(&kinds, &instances, vec![frame]))
                .reduce(BTreeSet::new, |mut a, b| {
                    a.extend(b);
                    a
                });
            Ok(materialise(base, &kinds, keys))
        }
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn binomials() {
        assert_eq!(binomial(0, 0), Some(1));
        assert_eq!(binomial(5, 0), Some(1));
        assert_eq!(binomial(5, 5), Some(1));
        assert_eq!(binomial(10, 3), Some(120));
        assert_eq!(binomial(2, 3), Some(0));
        assert_eq!(binomial(62, 31), Some(465_428_353_255_261_088));
        assert_eq!(binomial(66, 33), Some(7_219_428_434_016_265_740));
        assert_eq!(binomial(68, 34), None);
        assert_eq!(binomial(70, 35), None);
    }

    #[test]
    fn unranking() {
        for (m, k) in [(5, 2), (6, 3), (4, 4), (7, 1), (3, 0)] {
            let total = binomial(m, k).unwrap();
            let combinations = (0..total)
                .map(|index| unrank_combination(index, m, k))
                .collect_vec();
            assert!(combinations.iter().all_unique());
            for combination in &combinations {
                assert_eq!(combination.len(), k);
                assert!(combination.iter().tuple_windows().all(|(a, b)| a < b));
                assert!(combination.iter().all(|i| *i < m));
            }
        }
    }

    #[test]
    fn iterator_is_random_access() {
        let polymer = Polymer::parse("STSTST").unwrap();
        let phospho = crate::sequence::ModificationDatabase::built_in()
            .get("Phospho")
            .unwrap();
        let iterator = generate_isoforms_of(&polymer, phospho, 3).unwrap();
        assert_eq!(iterator.total(), 20);
        assert_eq!(iterator.size_hint(), (20, Some(20)));
        let all = iterator.clone().collect_vec();
        assert_eq!(all.len(), 20);
        assert_eq!(iterator.isoform(13), Some(all[13].clone()));
        assert_eq!(iterator.clone().nth(19), Some(all[19].clone()));
        assert_eq!(iterator.clone().nth(20), None);
        assert_eq!(iterator.isoform(20), None);
    }
}
