use std::{
    fmt::Write,
    num::NonZeroU16,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    chemistry::{ELEMENT_PARSE_LIST, Element},
    error::SequenceError,
    helper_functions::explain_number_error,
    system::{Mass, da, dalton},
};

/// A molecular formula, a selection of elements of specified isotopes together forming a
/// structure. Counts can be negative, which is used for modifications that remove atoms.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct MolecularFormula {
    /// Save all constituent parts as the element in question, the isotope (or None for natural
    /// distribution), and the number of this part. Kept sorted and without zero counts.
    elements: Vec<(Element, Option<NonZeroU16>, i32)>,
}

/// Create a [`MolecularFormula`](crate::chemistry::MolecularFormula) from the natural isotopes of
/// the given elements.
/// ```rust
/// use mzpeptide::{chemistry::MolecularFormula, molecular_formula};
/// let water = molecular_formula!(H 2 O 1);
/// assert_eq!(water.hill_notation(), "H2O");
/// ```
#[macro_export]
macro_rules! molecular_formula {
    ($($element:ident $count:literal)*) => {
        $crate::chemistry::MolecularFormula::from_elements(&[
            $(($crate::chemistry::Element::$element, None, $count)),*
        ])
    };
}

impl MolecularFormula {
    /// Create a formula from natural or isotope specific elements, the isotopes are not validated
    /// use [`Self::new`] if that is necessary.
    pub fn from_elements(elements: &[(Element, Option<NonZeroU16>, i32)]) -> Self {
        let mut result = Self::default();
        for part in elements {
            result.add_unchecked(*part);
        }
        result
    }

    /// Create a formula, returns None if any of the given isotopes is not a known isotope.
    pub fn new(elements: &[(Element, Option<NonZeroU16>, i32)]) -> Option<Self> {
        let mut result = Self::default();
        for part in elements {
            if !result.try_add(*part) {
                return None;
            }
        }
        Some(result)
    }

    /// Add the given element to this formula, returns false if the isotope does not exist.
    pub fn try_add(&mut self, part: (Element, Option<NonZeroU16>, i32)) -> bool {
        if part.0.is_valid(part.1) {
            self.add_unchecked(part);
            true
        } else {
            false
        }
    }

    fn add_unchecked(&mut self, (element, isotope, count): (Element, Option<NonZeroU16>, i32)) {
        if count == 0 {
            return;
        }
        match self
            .elements
            .binary_search_by(|(e, i, _)| (*e, *i).cmp(&(element, isotope)))
        {
            Ok(index) => {
                self.elements[index].2 += count;
                if self.elements[index].2 == 0 {
                    self.elements.remove(index);
                }
            }
            Err(index) => self.elements.insert(index, (element, isotope, count)),
        }
    }

    /// The constituent parts of this formula
    pub fn elements(&self) -> &[(Element, Option<NonZeroU16>, i32)] {
        &self.elements
    }

    /// Check if this formula contains no atoms at all
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The monoisotopic mass of this formula
    pub fn monoisotopic_mass(&self) -> Mass {
        da(self.monoisotopic_dalton())
    }

    /// Sum the mass as plain daltons, all isotopes are validated on insertion
    pub(crate) fn monoisotopic_dalton(&self) -> f64 {
        self.elements
            .iter()
            .map(|(e, i, n)| {
                e.mass(*i).map_or(0.0, |m| m.get::<dalton>()) * f64::from(*n)
            })
            .sum()
    }

    /// The same formula but with every carbon replaced by carbon 13 and every nitrogen by
    /// nitrogen 15, used for fully labelled residues.
    #[must_use]
    pub fn heavy(&self) -> Self {
        let c13 = NonZeroU16::new(13);
        let n15 = NonZeroU16::new(15);
        Self::from_elements(
            &self
                .elements
                .iter()
                .map(|(e, i, n)| match (e, i) {
                    (Element::C, None) => (Element::C, c13, *n),
                    (Element::N, None) => (Element::N, n15, *n),
                    _ => (*e, *i, *n),
                })
                .collect_vec(),
        )
    }

    /// Create a [Hill notation](https://en.wikipedia.org/wiki/Chemical_formula#Hill_system) from
    /// this formula. Specific isotopes are written in square brackets, as `[13C6]`, the count is
    /// left out for natural elements that occur exactly once.
    pub fn hill_notation(&self) -> String {
        let has_carbon = self.elements.iter().any(|(e, _, _)| *e == Element::C);
        let mut buffer = String::new();
        for (element, isotope, count) in self.elements.iter().sorted_by_key(|(e, i, _)| {
            let rank = match e {
                Element::C if has_carbon => 0,
                Element::H if has_carbon => 1,
                _ => 2,
            };
            (rank, e.symbol(), *i)
        }) {
            if let Some(isotope) = isotope {
                write!(buffer, "[{isotope}{element}{count}]").unwrap();
            } else if *count == 1 {
                write!(buffer, "{element}").unwrap();
            } else {
                write!(buffer, "{element}{count}").unwrap();
            }
        }
        buffer
    }

    /// Parse a molecular formula. Pairs of element and count can be separated by whitespace, a
    /// missing count means one, counts can be negative. Isotopes are written by prefixing the
    /// element with its isotope number in square brackets.
    /// ```rust
    /// use mzpeptide::chemistry::MolecularFormula;
    /// assert!(MolecularFormula::pro_forma("C12H20O2").is_ok());
    /// assert!(MolecularFormula::pro_forma("C12 H20 O2").is_ok());
    /// assert!(MolecularFormula::pro_forma("HN-1O2").is_ok());
    /// assert!(MolecularFormula::pro_forma("[13C2]C-2H2N").is_ok());
    /// assert!(MolecularFormula::pro_forma("Xe").is_err());
    /// assert!(MolecularFormula::pro_forma("").is_err());
    /// ```
    /// # Errors
    /// If the text is empty, contains an unknown element or isotope, or an invalid number.
    pub fn pro_forma(value: &str) -> Result<Self, SequenceError> {
        let fail = |reason: String| SequenceError::InvalidFormula {
            text: value.to_string(),
            reason,
        };
        if value.trim().is_empty() {
            return Err(fail("The formula is empty".to_string()));
        }
        let bytes = value.as_bytes();
        let mut index = 0;
        let mut result = Self::default();
        while index < bytes.len() {
            if bytes[index] == b' ' {
                index += 1;
            } else if bytes[index] == b'[' {
                let close = bytes[index..]
                    .iter()
                    .position(|c| *c == b']')
                    .map(|p| p + index)
                    .ok_or_else(|| fail("No closing square bracket found".to_string()))?;
                let inner = value[index + 1..close].trim();
                let digits = inner.bytes().take_while(u8::is_ascii_digit).count();
                let isotope = inner[..digits]
                    .parse::<NonZeroU16>()
                    .map_err(|err| fail(format!("The isotope number {}", explain_number_error(&err))))?;
                let (element, rest) = parse_element(inner[digits..].trim_start())
                    .ok_or_else(|| fail("Invalid element".to_string()))?;
                let count = parse_count(rest.trim())
                    .map_err(|err| fail(format!("The element number {err}")))?;
                if !result.try_add((element, Some(isotope), count)) {
                    return Err(fail(format!("Isotope {isotope}{element} does not exist")));
                }
                index = close + 1;
            } else {
                let (element, _) = parse_element(&value[index..])
                    .ok_or_else(|| fail("Invalid element".to_string()))?;
                index += element.symbol().len();
                let length = bytes[index..]
                    .iter()
                    .enumerate()
                    .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && **c == b'-'))
                    .count();
                let count = parse_count(&value[index..index + length])
                    .map_err(|err| fail(format!("The element number {err}")))?;
                result.add_unchecked((element, None, count));
                index += length;
            }
        }
        Ok(result)
    }
}

fn parse_element(text: &str) -> Option<(Element, &str)> {
    ELEMENT_PARSE_LIST
        .iter()
        .find(|(symbol, _)| text.starts_with(symbol))
        .map(|(symbol, element)| (*element, &text[symbol.len()..]))
}

/// Parse an element count, empty means one
fn parse_count(text: &str) -> Result<i32, &'static str> {
    if text.is_empty() {
        Ok(1)
    } else {
        text.parse::<i32>()
            .map_err(|err| explain_number_error(&err))
    }
}

impl std::fmt::Display for MolecularFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hill_notation())
    }
}

impl AddAssign<&Self> for MolecularFormula {
    fn add_assign(&mut self, rhs: &Self) {
        for part in &rhs.elements {
            self.add_unchecked(*part);
        }
    }
}

impl SubAssign<&Self> for MolecularFormula {
    fn sub_assign(&mut self, rhs: &Self) {
        for (e, i, n) in &rhs.elements {
            self.add_unchecked((*e, *i, -n));
        }
    }
}

impl Add<&MolecularFormula> for &MolecularFormula {
    type Output = MolecularFormula;
    fn add(self, rhs: &MolecularFormula) -> Self::Output {
        let mut result = self.clone();
        result += rhs;
        result
    }
}

impl Sub<&MolecularFormula> for &MolecularFormula {
    type Output = MolecularFormula;
    fn sub(self, rhs: &MolecularFormula) -> Self::Output {
        let mut result = self.clone();
        result -= rhs;
        result
    }
}

impl Mul<i32> for &MolecularFormula {
    type Output = MolecularFormula;
    fn mul(self, rhs: i32) -> Self::Output {
        MolecularFormula {
            elements: if rhs == 0 {
                Vec::new()
            } else {
                self.elements.iter().map(|(e, i, n)| (*e, *i, n * rhs)).collect()
            },
        }
    }
}

impl Neg for &MolecularFormula {
    type Output = MolecularFormula;
    fn neg(self) -> Self::Output {
        self * -1
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn hill_notation() {
        assert_eq!(molecular_formula!(C 2 H 3 N 1 O 1).hill_notation(), "C2H3NO");
        assert_eq!(molecular_formula!(O 3 H 1 P 1).hill_notation(), "HO3P");
        assert_eq!(molecular_formula!(H -1 N -1 O 1).hill_notation(), "H-1N-1O");
        assert_eq!(
            molecular_formula!(C 6 H 12 N 2 O 1).heavy().hill_notation(),
            "[13C6]H12[15N2]O"
        );
    }

    #[test]
    fn parse() {
        assert_eq!(
            MolecularFormula::pro_forma("C2H3NO").unwrap(),
            molecular_formula!(C 2 H 3 N 1 O 1)
        );
        assert_eq!(
            MolecularFormula::pro_forma("H-1 N-1 O").unwrap(),
            molecular_formula!(H -1 N -1 O 1)
        );
        assert_eq!(
            MolecularFormula::pro_forma("[13C6]H12[15N2]O").unwrap(),
            molecular_formula!(C 6 H 12 N 2 O 1).heavy()
        );
        assert_eq!(
            MolecularFormula::pro_forma("SeC3").unwrap(),
            molecular_formula!(C 3 Se 1)
        );
        assert!(MolecularFormula::pro_forma("[14C2]").is_err());
        assert!(MolecularFormula::pro_forma("[13C2").is_err());
        assert!(MolecularFormula::pro_forma("42").is_err());
        assert!(MolecularFormula::pro_forma("Oxidation").is_err());
    }

    #[test]
    fn checked_isotopes() {
        let carbon_13 = NonZeroU16::new(13);
        let formula = MolecularFormula::new(&[(Element::C, carbon_13, 2), (Element::H, None, 4)]);
        assert_eq!(formula.unwrap().hill_notation(), "[13C2]H4");
        assert!(MolecularFormula::new(&[(Element::C, NonZeroU16::new(14), 1)]).is_none());
        let mut formula = molecular_formula!(H 2 O 1);
        assert!(formula.try_add((Element::C, carbon_13, 1)));
        assert!(!formula.try_add((Element::O, NonZeroU16::new(99), 1)));
        assert_eq!(formula.hill_notation(), "[13C1]H2O");
    }

    #[test]
    fn arithmetic() {
        let water = molecular_formula!(H 2 O 1);
        let hydroxyl = molecular_formula!(O 1 H 1);
        let hydrogen = &water - &hydroxyl;
        assert_eq!(hydrogen, molecular_formula!(H 1));
        assert!((&hydrogen - &hydrogen).is_empty());
        assert_eq!(&water * 2, molecular_formula!(H 4 O 2));
        assert_eq!(-&water, molecular_formula!(H -2 O -1));
        let mass = water.monoisotopic_mass().get::<dalton>();
        assert!((mass - 18.010_564_683_7).abs() < 1e-6);
    }
}
