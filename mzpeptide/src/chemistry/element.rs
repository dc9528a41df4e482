use std::num::NonZeroU16;

use serde::{Deserialize, Serialize};

use crate::system::{Mass, da};

/// The elements that can occur in peptides and their common modifications.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub enum Element {
    /// Hydrogen
    H,
    /// Carbon
    C,
    /// Nitrogen
    N,
    /// Oxygen
    O,
    /// Sodium
    Na,
    /// Phosphorus
    P,
    /// Sulfur
    S,
    /// Selenium
    Se,
}

/// All elements sorted so that the longest symbols are tried first when parsing.
pub const ELEMENT_PARSE_LIST: &[(&str, Element)] = &[
    ("Na", Element::Na),
    ("Se", Element::Se),
    ("H", Element::H),
    ("C", Element::C),
    ("N", Element::N),
    ("O", Element::O),
    ("P", Element::P),
    ("S", Element::S),
];

/// Per element: the most abundant isotope, and all supported isotopes with their monoisotopic mass
const ISOTOPES: &[(Element, u16, &[(u16, f64)])] = &[
    (Element::H, 1, &[(1, 1.007_825_032_07), (2, 2.014_101_777_8)]),
    (Element::C, 12, &[(12, 12.0), (13, 13.003_354_837_8)]),
    (Element::N, 14, &[(14, 14.003_074_004_8), (15, 15.000_108_898_2)]),
    (Element::O, 16, &[(16, 15.994_914_619_56), (18, 17.999_161_0)]),
    (Element::Na, 23, &[(23, 22.989_769_280_9)]),
    (Element::P, 31, &[(31, 30.973_761_63)]),
    (Element::S, 32, &[(32, 31.972_071_00), (34, 33.967_866_90)]),
    (Element::Se, 80, &[(80, 79.916_521_3)]),
];

impl Element {
    /// The element symbol
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::H => "H",
            Self::C => "C",
            Self::N => "N",
            Self::O => "O",
            Self::Na => "Na",
            Self::P => "P",
            Self::S => "S",
            Self::Se => "Se",
        }
    }

    fn isotope_table(self) -> (u16, &'static [(u16, f64)]) {
        ISOTOPES
            .iter()
            .find(|(e, _, _)| *e == self)
            .map(|(_, main, isotopes)| (*main, *isotopes))
            .unwrap_or((0, &[]))
    }

    /// Check that this isotope is supported, `None` is the natural (most abundant) isotope
    pub fn is_valid(self, isotope: Option<NonZeroU16>) -> bool {
        self.mass(isotope).is_some()
    }

    /// The monoisotopic mass of this element, or of the given isotope if that isotope is known
    pub fn mass(self, isotope: Option<NonZeroU16>) -> Option<Mass> {
        let (main, isotopes) = self.isotope_table();
        let wanted = isotope.map_or(main, NonZeroU16::get);
        isotopes
            .iter()
            .find(|(n, _)| *n == wanted)
            .map(|(_, mass)| da(*mass))
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
