use std::{collections::BTreeSet, sync::LazyLock};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    error::SequenceError,
    sequence::{Peptide, Polymer, Residue},
};

/// The side of the trigger residue a protease cuts on
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum CleavageSide {
    /// Cut before the trigger residue
    NTerminal,
    /// Cut after the trigger residue
    #[default]
    CTerminal,
}

/// A protease defined by the residues it cuts next to. A cut is made on the given side of any
/// residue in `cut`, unless the residue on the other side of the cut is in `no_cut`.
///
/// A standard set of proteases can be found here [`known_proteases`].
///
/// # Examples
///
/// ## Basic digestion with Trypsin
/// ```rust
/// # use mzpeptide::prelude::*;
/// # use mzpeptide::sequence::known_proteases;
/// let sequence = Polymer::parse("SIADIRGGKSLAIEGCRTKM").unwrap();
/// let parameters = DigestionParameters {
///     min_length: 4,
///     max_length: 40,
///     ..Default::default()
/// };
/// let digest = sequence
///     .digest(&[known_proteases::TRYPSIN.clone()], &parameters)
///     .unwrap();
///
/// assert_eq!(digest.len(), 2);
/// assert_eq!(digest[0].to_string(), "SIADIR");
/// ```
///
/// ## Finding cut sites in a sequence
/// ```rust
/// # use mzpeptide::prelude::*;
/// # use mzpeptide::sequence::known_proteases;
/// let sequence = Polymer::parse("SIADIRGRKM").unwrap();
/// // Every site is given as the index of the first residue after the cut
/// let cut_sites = known_proteases::TRYPSIN.cleavage_sites(sequence.residues());
///
/// assert_eq!(cut_sites, vec![6, 8, 9]);
/// ```
///
/// ## Creating a custom protease
/// ```rust
/// # use mzpeptide::prelude::*;
/// // Define a custom protease that cuts after Histidine (H)
/// let his_protease = Protease::c_terminal_of("His", "H", "");
///
/// let sequence = Polymer::parse("AAHFGHKLM").unwrap();
/// let digest = sequence.digest(&[his_protease], &DigestionParameters::default()).unwrap();
///
/// assert_eq!(digest.len(), 3);
/// assert_eq!(digest[0].to_string(), "AAH");
/// assert_eq!(digest[1].to_string(), "FGH");
/// assert_eq!(digest[2].to_string(), "KLM");
/// ```
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Protease {
    /// The name, only used for reporting
    pub name: String,
    /// The side of the trigger residue the cut is made on
    pub side: CleavageSide,
    /// The trigger residues
    pub cut: Vec<char>,
    /// The residues that block a cut when found on the other side of the cut
    #[serde(default)]
    pub no_cut: Vec<char>,
}

impl Protease {
    /// Define a protease that cuts on the C terminal side of the residues in `cut`, unless
    /// followed by a residue in `no_cut`.
    pub fn c_terminal_of(name: impl Into<String>, cut: &str, no_cut: &str) -> Self {
        Self {
            name: name.into(),
            side: CleavageSide::CTerminal,
            cut: cut.chars().collect(),
            no_cut: no_cut.chars().collect(),
        }
    }

    /// Define a protease that cuts on the N terminal side of the residues in `cut`, unless
    /// preceded by a residue in `no_cut`.
    pub fn n_terminal_of(name: impl Into<String>, cut: &str, no_cut: &str) -> Self {
        Self {
            name: name.into(),
            side: CleavageSide::NTerminal,
            cut: cut.chars().collect(),
            no_cut: no_cut.chars().collect(),
        }
    }

    /// All locations in the given sequence where this protease could cut, given as the index of
    /// the first residue after the cut. Only cut sites inside the sequence are reported, so all
    /// sites are in `1..len`.
    pub fn cleavage_sites(&self, sequence: &[&Residue]) -> Vec<usize> {
        let sites = sequence
            .iter()
            .tuple_windows()
            .enumerate()
            .filter(|(_, (before, after))| match self.side {
                CleavageSide::CTerminal => {
                    self.cut.contains(&before.code()) && !self.no_cut.contains(&after.code())
                }
                CleavageSide::NTerminal => {
                    self.cut.contains(&after.code()) && !self.no_cut.contains(&before.code())
                }
            })
            .map(|(index, _)| index + 1)
            .collect_vec();
        log::trace!(
            "{} cuts a sequence of {} residues at {sites:?}",
            self.name,
            sequence.len()
        );
        sites
    }
}

/// The settings for a digestion
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(default)]
pub struct DigestionParameters {
    /// The maximal number of cleavage sites that may be skipped within one peptide
    pub max_missed_cleavages: usize,
    /// The minimal length of a peptide (inclusive)
    pub min_length: usize,
    /// The maximal length of a peptide (inclusive)
    pub max_length: usize,
    /// Also emit the peptide without its first residue for peptides starting with the methionine
    /// at the start of the protein
    pub clip_n_terminal_methionine: bool,
}

impl Default for DigestionParameters {
    fn default() -> Self {
        Self {
            max_missed_cleavages: 0,
            min_length: 1,
            max_length: usize::MAX,
            clip_n_terminal_methionine: false,
        }
    }
}

impl DigestionParameters {
    /// Read the parameters from JSON, any missing field gets its default value.
    /// ```rust
    /// use mzpeptide::sequence::DigestionParameters;
    /// let parameters =
    ///     DigestionParameters::from_json(r#"{"max_missed_cleavages": 2, "min_length": 7}"#)
    ///         .unwrap();
    /// assert_eq!(parameters.max_missed_cleavages, 2);
    /// assert_eq!(parameters.max_length, usize::MAX);
    /// ```
    /// # Errors
    /// If the JSON is invalid (including negative numbers) or if the parameters are inconsistent.
    pub fn from_json(text: &str) -> Result<Self, SequenceError> {
        let parameters: Self = serde_json::from_str(text)
            .map_err(|err| SequenceError::InvalidArgument(err.to_string()))?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Check that the parameters are consistent
    /// # Errors
    /// If the minimal length is larger than the maximal length.
    pub fn validate(&self) -> Result<(), SequenceError> {
        if self.min_length > self.max_length {
            Err(SequenceError::InvalidArgument(format!(
                "The minimal length ({}) is larger than the maximal length ({})",
                self.min_length, self.max_length
            )))
        } else {
            Ok(())
        }
    }

    const fn accepts(&self, length: usize) -> bool {
        length >= self.min_length && length <= self.max_length
    }
}

impl Polymer {
    /// Digest this sequence with the given proteases. The cut sites of all proteases are
    /// combined. All peptides with up to the maximal number of missed cleavages with a length
    /// in the allowed range are returned, ordered by number of missed cleavages and then by start
    /// position. The modifications are retained on the peptides.
    /// # Errors
    /// If the parameters are not valid, see [`DigestionParameters::validate`].
    pub fn digest(
        &self,
        proteases: &[Protease],
        parameters: &DigestionParameters,
    ) -> Result<Vec<Peptide<'_>>, SequenceError> {
        parameters.validate()?;
        let mut boundaries = BTreeSet::from([0, self.len()]);
        for protease in proteases {
            boundaries.extend(protease.cleavage_sites(self.residues()));
        }
        let boundaries = boundaries.into_iter().collect_vec();

        let mut result = Vec::new();
        for missed in 0..=parameters.max_missed_cleavages {
            if missed + 2 > boundaries.len() {
                break;
            }
            for window in boundaries.windows(missed + 2) {
                let (start, end) = (window[0], window[missed + 1]);
                if parameters.accepts(end - start) {
                    result.push(self.peptide(start, end - start, true)?);
                }
                if parameters.clip_n_terminal_methionine
                    && start == 0
                    && self.is_protein_n_terminal()
                    && self.residue(0).is_some_and(|r| r.code() == 'M')
                    && parameters.accepts(end - 1)
                {
                    result.push(self.peptide(1, end - 1, true)?);
                }
            }
        }
        log::debug!(
            "digested {} residues at {} sites into {} peptides",
            self.len(),
            boundaries.len().saturating_sub(2),
            result.len()
        );
        Ok(result)
    }
}

/// Parse the text and digest it, see [`Polymer::digest`]. The peptides are detached from the
/// temporary parent but keep their coordinates.
/// # Errors
/// If the text is not a valid sequence or if the parameters are not valid.
pub fn digest_str(
    text: &str,
    proteases: &[Protease],
    parameters: &DigestionParameters,
) -> Result<Vec<Peptide<'static>>, SequenceError> {
    let polymer = Polymer::parse(text)?;
    let peptides = polymer
        .digest(proteases, parameters)?
        .into_iter()
        .map(Peptide::detach)
        .collect();
    Ok(peptides)
}

/// Some well known and widely used proteases
pub mod known_proteases {
    use super::*;

    /// `Trypsin` cuts after Lysine (K) or Arginine (R), unless followed by Proline (P)
    pub static TRYPSIN: LazyLock<Protease> =
        LazyLock::new(|| Protease::c_terminal_of("Trypsin", "KR", "P"));

    /// `Chymotrypsin` cuts after Phenylalanine (F), Tryptophan (W), Tyrosine (Y), unless followed by Proline (P)
    pub static CHYMOTRYPSIN: LazyLock<Protease> =
        LazyLock::new(|| Protease::c_terminal_of("Chymotrypsin", "FWY", "P"));

    /// `Pepsin` (pH > 2) cuts after Phenylalanine (F), Tryptophan (W), Tyrosine (Y), Leucine (L)
    pub static PEPSIN: LazyLock<Protease> =
        LazyLock::new(|| Protease::c_terminal_of("Pepsin", "FWYL", ""));

    /// `AspN` cuts before Aspartic acid (D)
    pub static ASPN: LazyLock<Protease> =
        LazyLock::new(|| Protease::n_terminal_of("AspN", "D", ""));

    /// `GluC` cuts after Glutamic acid (E)
    pub static GLUC: LazyLock<Protease> =
        LazyLock::new(|| Protease::c_terminal_of("GluC", "E", ""));

    /// `LysC` cuts after Lysine (K)
    pub static LYSC: LazyLock<Protease> =
        LazyLock::new(|| Protease::c_terminal_of("LysC", "K", ""));

    /// `ArgC` cuts after Arginine (R)
    pub static ARGC: LazyLock<Protease> =
        LazyLock::new(|| Protease::c_terminal_of("ArgC", "R", ""));
}
