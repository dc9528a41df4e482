//! Unit-safe masses. All masses in this crate are monoisotopic and expressed as [`Mass`]
//! quantities, only at the boundaries (serialisation, hashing) are they stored as plain daltons.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

pub use uom::si::f64::Mass;
pub use uom::si::mass::dalton;

/// Create a mass from a value in dalton
pub fn da(value: f64) -> Mass {
    Mass::new::<dalton>(value)
}

/// A mass in dalton that can be compared, ordered, and hashed. Used as the key for modifications
/// which are defined by their mass.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct OrderedMass(OrderedFloat<f64>);

impl OrderedMass {
    /// Get the mass
    pub fn value(self) -> Mass {
        da(self.0.into_inner())
    }

    /// Get the mass in dalton
    pub const fn dalton(self) -> f64 {
        self.0.0
    }
}

impl From<Mass> for OrderedMass {
    fn from(value: Mass) -> Self {
        Self(OrderedFloat(value.get::<dalton>()))
    }
}

impl From<f64> for OrderedMass {
    /// Interpret the given number as a mass in dalton
    fn from(value: f64) -> Self {
        Self(OrderedFloat(value))
    }
}

impl std::fmt::Display for OrderedMass {
    /// Display the mass in dalton with an explicit sign, using the shortest representation that
    /// parses back into the exact same number.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:+}", self.0.0)
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn signed_display() {
        assert_eq!(OrderedMass::from(15.994915).to_string(), "+15.994915");
        assert_eq!(OrderedMass::from(-0.984016).to_string(), "-0.984016");
        assert_eq!(OrderedMass::from(42.0).to_string(), "+42");
    }

    #[test]
    fn round_trip_dalton() {
        let mass = da(128.094963);
        assert!((OrderedMass::from(mass).dalton() - 128.094963).abs() < 1e-9);
    }
}
