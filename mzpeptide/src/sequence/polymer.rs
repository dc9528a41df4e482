use std::{
    str::FromStr,
    sync::{LazyLock, OnceLock},
};

use regex::Regex;

use crate::{
    chemistry::MolecularFormula,
    error::SequenceError,
    helper_functions::end_of_enclosure,
    molecular_formula,
    sequence::{
        Modification, ModificationDatabase, ModificationDefinition, Residue, SequencePosition,
        SiteMask,
    },
    system::{Mass, da, dalton},
};

static DEFAULT_N_TERMINAL_GROUP: LazyLock<MolecularFormula> =
    LazyLock::new(|| molecular_formula!(H 1));
static DEFAULT_C_TERMINAL_GROUP: LazyLock<MolecularFormula> =
    LazyLock::new(|| molecular_formula!(O 1 H 1));

/// The text used to mark a residue as isotopically heavy, written as `K[*]`
pub const HEAVY_MARKER: &str = "*";

/// A linear sequence of residues with at most one modification per residue and per terminus.
///
/// The modification slots are indexed with slot 0 as the N terminus, slots `1..=len` as the
/// residues, and slot `len + 1` as the C terminus. The mass, formula, and textual forms are
/// calculated on first use and cached until the next mutation.
///
/// ```rust
/// use mzpeptide::prelude::*;
/// let mut polymer = Polymer::parse("[Acetyl]PEPM[Oxidation]TIDEK[*]").unwrap();
/// assert_eq!(polymer.len(), 9);
/// assert_eq!(polymer.sequence(), "PEPMTIDEK");
/// assert_eq!(polymer.annotated_sequence(), "[Acetyl]PEPM[Oxidation]TIDEK[*]");
///
/// polymer.set_modification(4, None).unwrap();
/// assert_eq!(polymer.annotated_sequence(), "[Acetyl]PEPMTIDEK[*]");
/// ```
#[derive(Clone, Debug)]
pub struct Polymer {
    residues: Vec<&'static Residue>,
    /// Always exactly two longer than the residues
    modifications: Vec<Option<Modification>>,
    n_terminal_group: MolecularFormula,
    c_terminal_group: MolecularFormula,
    protein_n_terminal: bool,
    protein_c_terminal: bool,
    summary: OnceLock<Summary>,
}

/// All derived properties, calculated in one pass over the sequence
#[derive(Clone, Debug)]
struct Summary {
    mass: Mass,
    formula: Option<MolecularFormula>,
    sequence: String,
    annotated: String,
}

impl Default for Polymer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Polymer {
    /// Create an unmodified polymer from the given residues, it is its own protein so both termini
    /// are protein termini.
    pub fn new(residues: Vec<&'static Residue>) -> Self {
        Self {
            modifications: vec![None; residues.len() + 2],
            residues,
            n_terminal_group: Self::default_n_terminal_group().clone(),
            c_terminal_group: Self::default_c_terminal_group().clone(),
            protein_n_terminal: true,
            protein_c_terminal: true,
            summary: OnceLock::new(),
        }
    }

    /// The N terminal group used when none is set (H)
    pub fn default_n_terminal_group() -> &'static MolecularFormula {
        &DEFAULT_N_TERMINAL_GROUP
    }

    /// The C terminal group used when none is set (OH)
    pub fn default_c_terminal_group() -> &'static MolecularFormula {
        &DEFAULT_C_TERMINAL_GROUP
    }

    /// Parse a sequence using the built in modification database, see [`Self::parse_with`].
    /// # Errors
    /// If the text is not a valid sequence.
    pub fn parse(text: &str) -> Result<Self, SequenceError> {
        Self::parse_with(text, ModificationDatabase::built_in())
    }

    /// Parse a sequence. The sequence is a list of one letter residue codes, each followed by
    /// optional bracketed modifications. A modification before the first residue is placed on the
    /// N terminus (optionally followed by a dash), a modification after a dash after the last
    /// residue is placed on the C terminus. Without residues a dash followed by a single final
    /// modification marks the C terminus, as in `[Acetyl]-[Amidated]`. Spaces are ignored.
    ///
    /// The text within brackets is tried in order as: the heavy marker `*` (which makes the
    /// preceding residue isotopically heavy), a modification name from the database, a molecular
    /// formula, and a mass in dalton.
    /// # Errors
    /// * [`SequenceError::InvalidResidue`] for characters that are not a known residue.
    /// * [`SequenceError::UnterminatedModification`] for unclosed brackets.
    /// * [`SequenceError::UnresolvedModification`] if no interpretation for a modification works.
    /// * [`SequenceError::MultipleModifications`] if a site is modified twice.
    pub fn parse_with(text: &str, database: &ModificationDatabase) -> Result<Self, SequenceError> {
        let mut residues: Vec<&'static Residue> = Vec::new();
        let mut modifications: Vec<Option<Modification>> = vec![None];
        let mut c_term: Option<Modification> = None;
        // Offset of the dash that starts the C terminal modification
        let mut dash = None;
        let mut n_term_separator_allowed = true;
        let mut index = 0;

        while let Some(character) = text[index..].chars().next() {
            match character {
                ' ' => index += 1,
                '[' => {
                    let end = end_of_enclosure(text, index + 1, b'[', b']')
                        .ok_or(SequenceError::UnterminatedModification { position: index })?;
                    let content = text[index + 1..end].trim();
                    let unresolved = || SequenceError::UnresolvedModification {
                        text: content.to_string(),
                        position: index,
                    };
                    let token = resolve_token(content, database).ok_or_else(unresolved)?;
                    let slot = if dash.is_some() {
                        &mut c_term
                    } else if residues.is_empty() {
                        &mut modifications[0]
                    } else {
                        modifications
                            .last_mut()
                            .ok_or(SequenceError::UnterminatedModification { position: index })?
                    };
                    match token {
                        Token::Heavy => {
                            if dash.is_some() || residues.is_empty() {
                                return Err(unresolved());
                            }
                            if let Some(last) = residues.last_mut() {
                                *last = last.heavy();
                            }
                        }
                        Token::Modification(modification) => {
                            if slot.is_some() {
                                return Err(SequenceError::MultipleModifications {
                                    position: index,
                                });
                            }
                            *slot = Some(modification);
                        }
                    }
                    index = end + 1;
                }
                '-' if residues.is_empty()
                    && n_term_separator_allowed
                    && modifications[0].is_some()
                    && dash.is_none()
                    && !is_terminal_tail(text, index + 1) =>
                {
                    n_term_separator_allowed = false;
                    index += 1;
                }
                '-' if dash.is_none() => {
                    dash = Some(index);
                    index += 1;
                }
                _ => {
                    let residue = Residue::from_code(character)
                        .filter(|_| dash.is_none())
                        .ok_or(SequenceError::InvalidResidue {
                            character,
                            position: index,
                        })?;
                    residues.push(residue);
                    modifications.push(None);
                    n_term_separator_allowed = false;
                    index += character.len_utf8();
                }
            }
        }
        if let Some(position) = dash
            && c_term.is_none()
        {
            return Err(SequenceError::InvalidResidue {
                character: '-',
                position,
            });
        }
        modifications.push(c_term);
        log::trace!(
            "parsed {} residues with {} modifications from '{text}'",
            residues.len(),
            modifications.iter().flatten().count()
        );

        let mut polymer = Self::new(residues);
        polymer.modifications = modifications;
        Ok(polymer)
    }

    /// The number of residues
    pub const fn len(&self) -> usize {
        self.residues.len()
    }

    /// Check if there are no residues
    pub const fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// Get the residue at the given index (0 based)
    pub fn residue(&self, index: usize) -> Option<&'static Residue> {
        self.residues.get(index).copied()
    }

    /// All residues
    pub fn residues(&self) -> &[&'static Residue] {
        &self.residues
    }

    /// All modification slots, N terminus first and C terminus last
    pub fn modifications(&self) -> &[Option<Modification>] {
        &self.modifications
    }

    /// Get the modification at the given position, `None` if the position is outside the
    /// sequence or if it is not modified.
    pub fn modification(&self, position: SequencePosition) -> Option<&Modification> {
        if matches!(position, SequencePosition::Index(index) if index >= self.len()) {
            return None;
        }
        self.modifications
            .get(position.slot(self.len()))
            .and_then(Option::as_ref)
    }

    /// The N terminal modification
    pub fn n_terminal_modification(&self) -> Option<&Modification> {
        self.modification(SequencePosition::NTerm)
    }

    /// The C terminal modification
    pub fn c_terminal_modification(&self) -> Option<&Modification> {
        self.modification(SequencePosition::CTerm)
    }

    /// The N terminal group
    pub const fn n_terminal_group(&self) -> &MolecularFormula {
        &self.n_terminal_group
    }

    /// The C terminal group
    pub const fn c_terminal_group(&self) -> &MolecularFormula {
        &self.c_terminal_group
    }

    /// Check if the N terminus of this polymer is also the N terminus of the protein
    pub const fn is_protein_n_terminal(&self) -> bool {
        self.protein_n_terminal
    }

    /// Check if the C terminus of this polymer is also the C terminus of the protein
    pub const fn is_protein_c_terminal(&self) -> bool {
        self.protein_c_terminal
    }

    fn summary(&self) -> &Summary {
        self.summary.get_or_init(|| self.summarise())
    }

    /// Check if the derived properties are currently cached
    #[cfg(test)]
    pub(crate) fn is_summarised(&self) -> bool {
        self.summary.get().is_some()
    }

    /// The monoisotopic mass of the full polymer, including terminal groups and modifications
    pub fn monoisotopic_mass(&self) -> Mass {
        self.summary().mass
    }

    /// The molecular formula of the full polymer, `None` if any of the modifications is only
    /// defined by its mass.
    pub fn formula(&self) -> Option<&MolecularFormula> {
        self.summary().formula.as_ref()
    }

    /// The bare sequence, only the residue codes
    pub fn sequence(&self) -> &str {
        &self.summary().sequence
    }

    /// The sequence with all modifications, this can be parsed back into the same polymer
    pub fn annotated_sequence(&self) -> &str {
        &self.summary().annotated
    }

    /// Walk N terminus, residues, and C terminus once to calculate all derived properties
    fn summarise(&self) -> Summary {
        let mut mass = self.n_terminal_group.monoisotopic_dalton()
            + self.c_terminal_group.monoisotopic_dalton();
        let mut formula = Some(&self.n_terminal_group + &self.c_terminal_group);
        let mut sequence = String::with_capacity(self.len());
        let mut annotated = String::with_capacity(self.len());

        let mut apply = |modification: &Modification, annotated: &mut String| {
            mass += modification.monoisotopic_dalton();
            formula = formula
                .take()
                .and_then(|f| modification.formula().map(|m| &f + m));
            annotated.push('[');
            annotated.push_str(modification.name());
            annotated.push(']');
        };

        if let Some(modification) = &self.modifications[0] {
            apply(modification, &mut annotated);
        }
        for (residue, modification) in self.residues.iter().zip(&self.modifications[1..]) {
            sequence.push(residue.code());
            annotated.push(residue.code());
            if residue.is_heavy() {
                annotated.push('[');
                annotated.push_str(HEAVY_MARKER);
                annotated.push(']');
            }
            if let Some(modification) = modification {
                apply(modification, &mut annotated);
            }
        }
        if let Some(modification) = &self.modifications[self.len() + 1] {
            annotated.push('-');
            apply(modification, &mut annotated);
        }
        for residue in &self.residues {
            mass += residue.monoisotopic_mass().get::<dalton>();
        }
        let formula = formula.map(|mut f| {
            for residue in &self.residues {
                f += residue.formula();
            }
            f
        });

        Summary {
            mass: da(mass),
            formula,
            sequence,
            annotated,
        }
    }

    /// Write a slot, only resetting the derived properties if the value actually changed
    pub(crate) fn set_slot(&mut self, slot: usize, modification: Option<Modification>) {
        if self.modifications[slot] != modification {
            self.modifications[slot] = modification;
            self.summary.take();
        }
    }

    fn check_position(&self, position: usize) -> Result<(), SequenceError> {
        if (1..=self.len()).contains(&position) {
            Ok(())
        } else {
            Err(SequenceError::PositionOutOfRange {
                position,
                length: self.len(),
            })
        }
    }

    /// Set or clear (with `None`) the N terminal modification
    pub fn set_n_terminal_modification(&mut self, modification: Option<Modification>) {
        self.set_slot(0, modification);
    }

    /// Set or clear (with `None`) the C terminal modification
    pub fn set_c_terminal_modification(&mut self, modification: Option<Modification>) {
        self.set_slot(self.len() + 1, modification);
    }

    /// Set or clear (with `None`) the modification on the residue at the given 1 based position
    /// # Errors
    /// If the position is not within `1..=len`.
    pub fn set_modification(
        &mut self,
        position: usize,
        modification: Option<Modification>,
    ) -> Result<(), SequenceError> {
        self.check_position(position)?;
        self.set_slot(position, modification);
        Ok(())
    }

    /// Set or clear the modification on all given 1 based positions. All positions are checked
    /// before anything is changed.
    /// # Errors
    /// If any position is not within `1..=len`.
    pub fn set_modification_at_positions(
        &mut self,
        positions: &[usize],
        modification: Option<Modification>,
    ) -> Result<(), SequenceError> {
        for position in positions {
            self.check_position(*position)?;
        }
        for position in positions {
            self.set_slot(*position, modification.clone());
        }
        Ok(())
    }

    /// Set or clear the modification on all residues with the given one letter code (both the
    /// natural and heavy versions). Returns the number of matching residues.
    pub fn set_modification_for_code(
        &mut self,
        code: char,
        modification: Option<Modification>,
    ) -> usize {
        self.set_modification_where(|residue| residue.code() == code, modification)
    }

    /// Set or clear the modification on all residues that are the given residue. Returns the
    /// number of matching residues.
    pub fn set_modification_for_residue(
        &mut self,
        residue: &Residue,
        modification: Option<Modification>,
    ) -> usize {
        self.set_modification_where(|r| r == residue, modification)
    }

    fn set_modification_where(
        &mut self,
        filter: impl Fn(&Residue) -> bool,
        modification: Option<Modification>,
    ) -> usize {
        let slots: Vec<usize> = self
            .residues
            .iter()
            .enumerate()
            .filter(|(_, r)| filter(r))
            .map(|(i, _)| i + 1)
            .collect();
        for slot in &slots {
            self.set_slot(*slot, modification.clone());
        }
        slots.len()
    }

    /// Set the N terminal group, the default is H
    pub fn set_n_terminal_group(&mut self, group: MolecularFormula) {
        if self.n_terminal_group != group {
            self.n_terminal_group = group;
            self.summary.take();
        }
    }

    /// Set the C terminal group, the default is OH
    pub fn set_c_terminal_group(&mut self, group: MolecularFormula) {
        if self.c_terminal_group != group {
            self.c_terminal_group = group;
            self.summary.take();
        }
    }

    /// All positions where a modification with the given allowed sites could be placed, in
    /// sequence order. Already modified sites are never available.
    pub fn available_sites(&self, modification: &ModificationDefinition) -> Vec<SequencePosition> {
        self.available_slots(modification.sites())
            .into_iter()
            .filter_map(|slot| SequencePosition::from_slot(slot, self.len()))
            .collect()
    }

    pub(crate) fn available_slots(&self, sites: SiteMask) -> Vec<usize> {
        let mut slots = Vec::new();
        if sites.allows_n_term(self.protein_n_terminal) && self.modifications[0].is_none() {
            slots.push(0);
        }
        for (index, residue) in self.residues.iter().enumerate() {
            if sites.intersects(residue.site()) && self.modifications[index + 1].is_none() {
                slots.push(index + 1);
            }
        }
        if sites.allows_c_term(self.protein_c_terminal)
            && self.modifications[self.len() + 1].is_none()
        {
            slots.push(self.len() + 1);
        }
        slots
    }

    /// Get a contiguous stretch of this polymer as a new polymer. The length is clamped to the end
    /// of this polymer. If modifications are included the terminal modifications and groups are
    /// only inherited if the stretch touches that terminus, otherwise they are reset to the
    /// defaults. The protein termini are inherited in the same way.
    /// # Errors
    /// If the first residue is beyond the end of this polymer.
    pub fn sub_polymer(
        &self,
        first_residue: usize,
        length: usize,
        include_modifications: bool,
    ) -> Result<Self, SequenceError> {
        if first_residue > self.len() {
            return Err(SequenceError::PositionOutOfRange {
                position: first_residue,
                length: self.len(),
            });
        }
        let length = length.min(self.len() - first_residue);
        let touches_n = first_residue == 0;
        let touches_c = first_residue + length == self.len();

        let mut result = Self::new(self.residues[first_residue..first_residue + length].to_vec());
        result.protein_n_terminal = touches_n && self.protein_n_terminal;
        result.protein_c_terminal = touches_c && self.protein_c_terminal;
        if include_modifications {
            result.modifications[1..=length].clone_from_slice(
                &self.modifications[first_residue + 1..=first_residue + length],
            );
            if touches_n {
                result.modifications[0].clone_from(&self.modifications[0]);
                result.n_terminal_group.clone_from(&self.n_terminal_group);
            }
            if touches_c {
                result.modifications[length + 1].clone_from(&self.modifications[self.len() + 1]);
                result.c_terminal_group.clone_from(&self.c_terminal_group);
            }
        }
        Ok(result)
    }
}

/// An interpreted bracketed token
enum Token {
    Heavy,
    Modification(Modification),
}

type Resolver = fn(&str, &ModificationDatabase) -> Option<Token>;

/// The interpretations of a bracketed token, in order of precedence
const RESOLVERS: [Resolver; 4] = [
    |text, _| (text == HEAVY_MARKER).then_some(Token::Heavy),
    |text, database| database.get(text).cloned().map(Token::Modification),
    |text, _| {
        MolecularFormula::pro_forma(text)
            .ok()
            .filter(|f| !f.is_empty())
            .map(|f| Token::Modification(ModificationDefinition::from_formula(f)))
    },
    |text, _| {
        NUMBER_REGEX
            .is_match(text)
            .then(|| text.parse::<f64>().ok())
            .flatten()
            .map(|mass| Token::Modification(ModificationDefinition::from_dalton(mass)))
    },
];

static NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+(\.\d+)?$").unwrap());

/// Check if the text from `start` on is a single bracketed token, in which case a dash before
/// it marks a C terminal modification
fn is_terminal_tail(text: &str, start: usize) -> bool {
    let rest = text[start..].trim_start_matches(' ');
    let open = text.len() - rest.len();
    rest.starts_with('[')
        && end_of_enclosure(text, open + 1, b'[', b']')
            .is_some_and(|end| text[end + 1..].trim_matches(' ').is_empty())
}

fn resolve_token(text: &str, database: &ModificationDatabase) -> Option<Token> {
    RESOLVERS.iter().find_map(|resolve| resolve(text, database))
}

impl PartialEq for Polymer {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
            || self.residues == other.residues
                && self.modifications == other.modifications
                && self.n_terminal_group == other.n_terminal_group
                && self.c_terminal_group == other.c_terminal_group
    }
}

impl Eq for Polymer {}

impl FromStr for Polymer {
    type Err = SequenceError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Polymer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.annotated_sequence())
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    fn oxidation() -> Modification {
        ModificationDatabase::built_in()
            .get("Oxidation")
            .unwrap()
            .clone()
    }

    #[test]
    fn parse_plain() {
        let polymer = Polymer::parse("PEPTIDE").unwrap();
        assert_eq!(polymer.len(), 7);
        assert_eq!(polymer.modifications().len(), 9);
        assert!(polymer.modifications().iter().all(Option::is_none));
        assert_eq!(polymer.to_string(), "PEPTIDE");
        assert_eq!(Polymer::parse("PEP TIDE").unwrap(), polymer);
        assert!(Polymer::parse("").unwrap().is_empty());
    }

    #[test]
    fn parse_modifications() {
        let polymer = Polymer::parse("[Acetyl]-KM[Oxidation]S[HO3P]K[+42.01]-[Amidated]").unwrap();
        assert_eq!(polymer.n_terminal_modification().unwrap().name(), "Acetyl");
        assert_eq!(polymer.modification(SequencePosition::Index(1)), Some(&oxidation()));
        assert_eq!(
            polymer.modification(SequencePosition::Index(2)).unwrap().name(),
            "HO3P"
        );
        let mass = polymer.modification(SequencePosition::Index(3)).unwrap();
        assert_eq!(mass.name(), "+42.01");
        assert!(mass.formula().is_none());
        assert_eq!(polymer.c_terminal_modification().unwrap().name(), "Amidated");
        assert!(polymer.formula().is_none());
        assert_eq!(
            polymer.annotated_sequence(),
            "[Acetyl]KM[Oxidation]S[HO3P]K[+42.01]-[Amidated]"
        );
    }

    #[test]
    fn parse_heavy() {
        let polymer = Polymer::parse("AK[*][GlyGly]R[*]").unwrap();
        assert!(!polymer.residue(0).unwrap().is_heavy());
        assert!(polymer.residue(1).unwrap().is_heavy());
        assert!(polymer.residue(2).unwrap().is_heavy());
        assert_eq!(polymer.annotated_sequence(), "AK[*][GlyGly]R[*]");
        assert_ne!(polymer, Polymer::parse("AK[GlyGly]R").unwrap());
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            Polymer::parse("PEPtIDE"),
            Err(SequenceError::InvalidResidue {
                character: 't',
                position: 3
            })
        );
        assert_eq!(
            Polymer::parse("PEPB"),
            Err(SequenceError::InvalidResidue {
                character: 'B',
                position: 3
            })
        );
        assert_eq!(
            Polymer::parse("PEM[Oxidation"),
            Err(SequenceError::UnterminatedModification { position: 3 })
        );
        assert_eq!(
            Polymer::parse("PEM[Nonsense]"),
            Err(SequenceError::UnresolvedModification {
                text: "Nonsense".to_string(),
                position: 3
            })
        );
        assert_eq!(
            Polymer::parse("[*]PEM"),
            Err(SequenceError::UnresolvedModification {
                text: "*".to_string(),
                position: 0
            })
        );
        assert_eq!(
            Polymer::parse("M[Oxidation][+1]"),
            Err(SequenceError::MultipleModifications { position: 12 })
        );
        assert_eq!(
            Polymer::parse("PEP-TIDE"),
            Err(SequenceError::InvalidResidue {
                character: 'T',
                position: 4
            })
        );
        assert_eq!(
            Polymer::parse("PEPTIDE-"),
            Err(SequenceError::InvalidResidue {
                character: '-',
                position: 7
            })
        );
    }

    #[test]
    fn modification_outside_sequence() {
        let polymer = Polymer::parse("PEPTIDE-[Amidated]").unwrap();
        assert!(polymer.modification(SequencePosition::Index(7)).is_none());
        assert!(polymer.modification(SequencePosition::Index(100)).is_none());
        assert!(polymer.modification(SequencePosition::CTerm).is_some());
        let empty = Polymer::parse("[Acetyl]").unwrap();
        assert!(empty.modification(SequencePosition::Index(0)).is_none());
        assert!(empty.modification(SequencePosition::NTerm).is_some());
    }

    #[test]
    fn round_trip() {
        for text in [
            "PEPTIDE",
            "[Acetyl]PEPTIDEK[*]",
            "[+1.5]AC[Carbamidomethyl]DE-[C2H2O]",
            "S[Phospho]T[Phospho]Y[-18.010565]",
            "GGK[*][GlyGly]-[Amidated]",
            "K[[13C6]H12]",
            "[Acetyl]-[Amidated]",
            "-[+0.001]",
        ] {
            let polymer = Polymer::parse(text).unwrap();
            let reparsed = Polymer::parse(polymer.annotated_sequence()).unwrap();
            assert_eq!(polymer, reparsed, "{text}");
        }
    }

    #[test]
    fn mass_additivity() {
        let polymer = Polymer::parse("[Acetyl]M[Oxidation]K[*]S[+79.966331]-[Amidated]").unwrap();
        let mut expected = Polymer::default_n_terminal_group()
            .monoisotopic_mass()
            .get::<dalton>()
            + Polymer::default_c_terminal_group()
                .monoisotopic_mass()
                .get::<dalton>();
        for residue in polymer.residues() {
            expected += residue.monoisotopic_mass().get::<dalton>();
        }
        for modification in polymer.modifications().iter().flatten() {
            expected += modification.monoisotopic_mass().get::<dalton>();
        }
        assert!((polymer.monoisotopic_mass().get::<dalton>() - expected).abs() < 1e-6);
    }

    #[test]
    fn formula_matches_mass() {
        let polymer = Polymer::parse("[Acetyl]PEPTIDEM[Oxidation]").unwrap();
        let formula = polymer.formula().unwrap();
        assert!(
            (formula.monoisotopic_mass().get::<dalton>()
                - polymer.monoisotopic_mass().get::<dalton>())
            .abs()
                < 1e-6
        );
        // PEPTIDE: 799.359964 + Acetyl 42.010565 + M 131.040485 + Oxidation 15.994915
        assert!((polymer.monoisotopic_mass().get::<dalton>() - 988.405_929).abs() < 1e-4);
    }

    #[test]
    fn idempotent_summary() {
        let polymer = Polymer::parse("AC[Carbamidomethyl]DEK").unwrap();
        let first = polymer.monoisotopic_mass().get::<dalton>();
        let text = polymer.annotated_sequence().to_string();
        assert_eq!(
            first.to_bits(),
            polymer.monoisotopic_mass().get::<dalton>().to_bits()
        );
        assert_eq!(text, polymer.annotated_sequence());
        let fresh = polymer.clone();
        assert_eq!(
            fresh.summarise().mass.get::<dalton>().to_bits(),
            polymer.summarise().mass.get::<dalton>().to_bits()
        );
    }

    #[test]
    fn setting_same_modification_twice() {
        let mut polymer = Polymer::parse("PEMTIDE").unwrap();
        polymer.set_modification(3, Some(oxidation())).unwrap();
        let mass = polymer.monoisotopic_mass();
        assert!(polymer.is_summarised());
        polymer.set_modification(3, Some(oxidation())).unwrap();
        assert!(polymer.is_summarised());
        assert_eq!(polymer.monoisotopic_mass(), mass);
        polymer.set_modification(3, None).unwrap();
        assert!(!polymer.is_summarised());
        assert!(polymer.monoisotopic_mass() < mass);
    }

    #[test]
    fn mutators() {
        let mut polymer = Polymer::parse("MAMKM").unwrap();
        assert_eq!(polymer.set_modification_for_code('M', Some(oxidation())), 3);
        assert_eq!(polymer.annotated_sequence(), "M[Oxidation]AM[Oxidation]KM[Oxidation]");
        assert_eq!(
            polymer.set_modification(0, None),
            Err(SequenceError::PositionOutOfRange {
                position: 0,
                length: 5
            })
        );
        assert_eq!(
            polymer.set_modification(6, None),
            Err(SequenceError::PositionOutOfRange {
                position: 6,
                length: 5
            })
        );
        assert!(
            polymer
                .set_modification_at_positions(&[1, 9], None)
                .is_err()
        );
        assert_eq!(polymer.annotated_sequence(), "M[Oxidation]AM[Oxidation]KM[Oxidation]");
        polymer.set_modification_at_positions(&[1, 5], None).unwrap();
        assert_eq!(polymer.annotated_sequence(), "MAM[Oxidation]KM");

        let heavy_lysine = Residue::from_code('K').unwrap().heavy();
        let mut polymer = Polymer::parse("KK[*]").unwrap();
        let methyl = ModificationDatabase::built_in().get("Methyl").unwrap().clone();
        assert_eq!(polymer.set_modification_for_residue(heavy_lysine, Some(methyl)), 1);
        assert_eq!(polymer.annotated_sequence(), "KK[*][Methyl]");

        polymer.set_n_terminal_modification(Some(oxidation()));
        polymer.set_c_terminal_modification(Some(oxidation()));
        assert_eq!(polymer.annotated_sequence(), "[Oxidation]KK[*][Methyl]-[Oxidation]");
    }

    #[test]
    fn terminal_groups() {
        let mut polymer = Polymer::parse("G").unwrap();
        let before = polymer.monoisotopic_mass();
        polymer.set_c_terminal_group(molecular_formula!(N 1 H 2));
        let shift = before.get::<dalton>() - polymer.monoisotopic_mass().get::<dalton>();
        assert!((shift - 0.984_016).abs() < 1e-5);
        assert_ne!(polymer, Polymer::parse("G").unwrap());
    }

    #[test]
    fn sub_polymer() {
        let polymer = Polymer::parse("[Acetyl]AM[Oxidation]KS-[Amidated]").unwrap();
        let start = polymer.sub_polymer(0, 2, true).unwrap();
        assert_eq!(start.annotated_sequence(), "[Acetyl]AM[Oxidation]");
        assert!(start.is_protein_n_terminal());
        assert!(!start.is_protein_c_terminal());
        let end = polymer.sub_polymer(2, 10, true).unwrap();
        assert_eq!(end.annotated_sequence(), "KS-[Amidated]");
        assert!(!end.is_protein_n_terminal());
        assert!(end.is_protein_c_terminal());
        let bare = polymer.sub_polymer(0, 4, false).unwrap();
        assert_eq!(bare.annotated_sequence(), "AMKS");
        assert!(polymer.sub_polymer(4, 1, true).unwrap().is_empty());
        assert_eq!(
            polymer.sub_polymer(5, 1, true),
            Err(SequenceError::PositionOutOfRange {
                position: 5,
                length: 4
            })
        );
    }

    #[test]
    fn available_sites() {
        let polymer = Polymer::parse("KAKM[Oxidation]").unwrap();
        let acetyl = ModificationDatabase::built_in().get("Acetyl").unwrap();
        assert_eq!(
            polymer.available_sites(acetyl),
            vec![
                SequencePosition::NTerm,
                SequencePosition::Index(0),
                SequencePosition::Index(2)
            ]
        );
        assert!(polymer.available_sites(&oxidation()).is_empty());
        let inner = polymer.sub_polymer(1, 2, true).unwrap();
        let protein_only = ModificationDefinition::named(
            "Protein acetyl",
            molecular_formula!(C 2 H 2 O 1),
            SiteMask::PROTEIN_N_TERM,
        );
        assert!(inner.available_sites(&protein_only).is_empty());
        assert_eq!(
            polymer.available_sites(&protein_only),
            vec![SequencePosition::NTerm]
        );
    }
}
