use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Fixed-point currency amount stored in subunits (1/100 of the major unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Money(i64);

impl Money {
    pub const SUBUNITS_PER_UNIT: i64 = 100;

    pub const fn from_major(units: i64) -> Self {
        Money(units * Self::SUBUNITS_PER_UNIT)
    }

    pub const fn from_subunits(subunits: i64) -> Self {
        Money(subunits)
    }

    /// Rounds to the nearest subunit. Negative or non-finite input yields `None`.
    pub fn from_major_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        Some(Money((value * Self::SUBUNITS_PER_UNIT as f64).round() as i64))
    }

    pub const fn subunits(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `percent`% of this amount, rounded half-up to the subunit.
    pub fn percent(self, percent: i64) -> Self {
        Money((self.0 * percent + 50) / 100)
    }

    pub fn times(self, n: i64) -> Self {
        Money(self.0 * n)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::SUBUNITS_PER_UNIT;
        let frac = (self.0 % Self::SUBUNITS_PER_UNIT).abs();
        write!(f, "{whole}.{frac:02}")
    }
}

impl std::ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::default(), |acc, m| acc + m)
    }
}

// JSON carries major units: whole amounts as integers, the rest as decimals.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % Self::SUBUNITS_PER_UNIT == 0 {
            serializer.serialize_i64(self.0 / Self::SUBUNITS_PER_UNIT)
        } else {
            serializer.serialize_f64(self.0 as f64 / Self::SUBUNITS_PER_UNIT as f64)
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::from_major_f64(value)
            .ok_or_else(|| serde::de::Error::custom("amount must be a non-negative number"))
    }
}
