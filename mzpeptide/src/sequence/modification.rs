use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use crate::{
    chemistry::MolecularFormula,
    error::SequenceError,
    molecular_formula,
    sequence::SiteMask,
    system::{Mass, OrderedMass, dalton},
};

/// A modification, wrapped in an [`Arc`] so that modifications from databases are shared instead
/// of cloned.
pub type Modification = Arc<ModificationDefinition>;

/// A chemical change that can be placed on a residue or terminus. Two modifications are the same
/// if they have the same name and the same mass and formula, the allowed sites are not compared.
#[derive(Clone, Debug, Serialize)]
pub struct ModificationDefinition {
    name: Box<str>,
    mass: OrderedMass,
    formula: Option<MolecularFormula>,
    sites: SiteMask,
}

impl PartialEq for ModificationDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.mass == other.mass && self.formula == other.formula
    }
}

impl Eq for ModificationDefinition {}

impl std::hash::Hash for ModificationDefinition {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.mass.hash(state);
        self.formula.hash(state);
    }
}

impl ModificationDefinition {
    /// A named modification with a known formula
    pub fn named(
        name: impl Into<Box<str>>,
        formula: MolecularFormula,
        sites: SiteMask,
    ) -> Modification {
        Arc::new(Self {
            name: name.into(),
            mass: formula.monoisotopic_mass().into(),
            formula: Some(formula),
            sites,
        })
    }

    /// A named modification of which only the mass is known
    pub fn named_mass(name: impl Into<Box<str>>, mass: Mass, sites: SiteMask) -> Modification {
        Arc::new(Self {
            name: name.into(),
            mass: mass.into(),
            formula: None,
            sites,
        })
    }

    /// A modification defined by its formula only, named by the Hill notation of the formula and
    /// allowed on any site.
    pub fn from_formula(formula: MolecularFormula) -> Modification {
        Self::named(formula.hill_notation(), formula, SiteMask::ALL)
    }

    /// A modification defined by its mass only, named by the signed mass and allowed on any site.
    /// The conversion from [`Mass`] can shift the last digit of the dalton value, use
    /// [`Self::from_dalton`] for masses read from text.
    pub fn from_mass(mass: Mass) -> Modification {
        Self::from_dalton(mass.get::<dalton>())
    }

    /// A modification defined by a mass in dalton, named by the shortest text that reads back as
    /// exactly this number.
    pub fn from_dalton(mass: f64) -> Modification {
        let mass = OrderedMass::from(mass);
        Arc::new(Self {
            name: mass.to_string().into(),
            mass,
            formula: None,
            sites: SiteMask::ALL,
        })
    }

    /// The name, this is also how this modification is written in a sequence
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The monoisotopic mass delta
    pub fn monoisotopic_mass(&self) -> Mass {
        self.mass.value()
    }

    /// The monoisotopic mass delta in dalton
    pub const fn monoisotopic_dalton(&self) -> f64 {
        self.mass.dalton()
    }

    /// The formula delta, if known
    pub const fn formula(&self) -> Option<&MolecularFormula> {
        self.formula.as_ref()
    }

    /// The sites this modification can be placed on
    pub const fn sites(&self) -> SiteMask {
        self.sites
    }
}

impl std::fmt::Display for ModificationDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A collection of named modifications, names are matched case insensitively.
#[derive(Clone, Debug, Default)]
pub struct ModificationDatabase {
    modifications: Vec<Modification>,
}

/// One entry in a JSON modification database
#[derive(Debug, Deserialize)]
struct DatabaseEntry {
    name: String,
    #[serde(default)]
    formula: Option<String>,
    #[serde(default)]
    mass: Option<f64>,
    #[serde(default)]
    sites: Vec<String>,
}

static BUILT_IN: LazyLock<ModificationDatabase> = LazyLock::new(|| {
    let residues = |codes: &str| SiteMask::residues(codes).unwrap_or_default();
    ModificationDatabase::new(vec![
        ModificationDefinition::named(
            "Acetyl",
            molecular_formula!(C 2 H 2 O 1),
            residues("K") | SiteMask::PEPTIDE_N_TERM | SiteMask::PROTEIN_N_TERM,
        ),
        ModificationDefinition::named(
            "Amidated",
            molecular_formula!(H 1 N 1 O -1),
            SiteMask::PEPTIDE_C_TERM | SiteMask::PROTEIN_C_TERM,
        ),
        ModificationDefinition::named(
            "Carbamidomethyl",
            molecular_formula!(C 2 H 3 N 1 O 1),
            residues("C"),
        ),
        ModificationDefinition::named(
            "Deamidated",
            molecular_formula!(H -1 N -1 O 1),
            residues("NQ"),
        ),
        ModificationDefinition::named(
            "Dimethyl",
            molecular_formula!(C 2 H 4),
            residues("K") | SiteMask::PEPTIDE_N_TERM,
        ),
        ModificationDefinition::named(
            "Formyl",
            molecular_formula!(C 1 O 1),
            residues("K") | SiteMask::PEPTIDE_N_TERM,
        ),
        ModificationDefinition::named(
            "GlyGly",
            molecular_formula!(C 4 H 6 N 2 O 2),
            residues("K"),
        ),
        ModificationDefinition::named("Methyl", molecular_formula!(C 1 H 2), residues("KR")),
        ModificationDefinition::named("Oxidation", molecular_formula!(O 1), residues("MW")),
        ModificationDefinition::named(
            "Phospho",
            molecular_formula!(H 1 O 3 P 1),
            residues("STY"),
        ),
    ])
});

impl ModificationDatabase {
    /// Create a database from the given modifications
    pub const fn new(modifications: Vec<Modification>) -> Self {
        Self { modifications }
    }

    /// The built in database with common modifications
    pub fn built_in() -> &'static Self {
        &BUILT_IN
    }

    /// Find a modification by name (case insensitive)
    pub fn get(&self, name: &str) -> Option<&Modification> {
        self.modifications
            .iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
    }

    /// All modifications in this database
    pub fn modifications(&self) -> &[Modification] {
        &self.modifications
    }

    /// Add a modification, replacing any existing modification with the same name
    pub fn insert(&mut self, modification: Modification) {
        self.modifications
            .retain(|m| !m.name().eq_ignore_ascii_case(modification.name()));
        self.modifications.push(modification);
    }

    /// Add all modifications from the other database, replacing modifications with the same name
    #[must_use]
    pub fn merge(mut self, other: &Self) -> Self {
        for modification in &other.modifications {
            self.insert(modification.clone());
        }
        self
    }

    /// Read a database from JSON. The JSON is a list of objects with a `name`, a `formula` and/or a
    /// `mass` (the formula takes precedence), and a list of `sites`. A site is a residue letter,
    /// `N-term`, `Protein N-term`, `C-term`, or `Protein C-term`. Leaving out the sites allows
    /// the modification everywhere.
    /// ```rust
    /// use mzpeptide::sequence::ModificationDatabase;
    /// let database = ModificationDatabase::from_json(
    ///     r#"[{"name": "Heavy acetyl", "formula": "[2H3]C2H-1O", "sites": ["K", "N-term"]}]"#,
    /// )
    /// .unwrap();
    /// assert!(database.get("heavy ACETYL").is_some());
    /// ```
    /// # Errors
    /// If the JSON is invalid, if a formula or site is invalid, or if an entry has neither a
    /// formula nor a mass.
    pub fn from_json(text: &str) -> Result<Self, SequenceError> {
        let entries: Vec<DatabaseEntry> = serde_json::from_str(text)
            .map_err(|err| SequenceError::InvalidDatabase(err.to_string()))?;
        let mut database = Self::default();
        for entry in entries {
            let sites = if entry.sites.is_empty() {
                SiteMask::ALL
            } else {
                entry.sites.iter().try_fold(SiteMask::NONE, |acc, site| {
                    SiteMask::parse_site(site).map(|s| acc | s).ok_or_else(|| {
                        SequenceError::InvalidDatabase(format!(
                            "Invalid site '{site}' for modification '{}'",
                            entry.name
                        ))
                    })
                })?
            };
            let modification = match (entry.formula, entry.mass) {
                (Some(formula), _) => ModificationDefinition::named(
                    entry.name,
                    MolecularFormula::pro_forma(&formula)?,
                    sites,
                ),
                (None, Some(mass)) => {
                    ModificationDefinition::named_mass(entry.name, crate::system::da(mass), sites)
                }
                (None, None) => {
                    return Err(SequenceError::InvalidDatabase(format!(
                        "Modification '{}' has neither a formula nor a mass",
                        entry.name
                    )));
                }
            };
            database.insert(modification);
        }
        Ok(database)
    }
}
