use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::BookingError;

/// An amount in euro cents. The system only handles euros.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates an amount from cents. Negative amounts are rejected.
    pub fn from_cents(cents: i64) -> Result<Self, BookingError> {
        if cents < 0 {
            return Err(BookingError::InvalidAmount(format!("{} cents", cents)));
        }

        Ok(Money(cents))
    }

    /// Converts a decimal euro amount, rounding to the nearest cent.
    ///
    /// ```
    /// use bookings::money::Money;
    /// assert_eq!(Money::from_euros(80.0).unwrap().cents(), 8000);
    /// assert_eq!(Money::from_euros(19.999).unwrap().cents(), 2000);
    /// assert!(Money::from_euros(-1.0).is_err());
    /// ```
    pub fn from_euros(euros: f64) -> Result<Self, BookingError> {
        let cents = (euros * 100.0).round();

        if !cents.is_finite() || cents < 0.0 || cents > i64::MAX as f64 {
            return Err(BookingError::InvalidAmount(euros.to_string()));
        }

        Ok(Money(cents as i64))
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn as_euros(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Multiplies by a count, failing instead of wrapping.
    pub fn checked_mul(self, count: i64) -> Option<Money> {
        self.0.checked_mul(count).filter(|c| *c >= 0).map(Money)
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "€{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_euros())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let euros = f64::deserialize(deserializer)?;

        Money::from_euros(euros).map_err(D::Error::custom)
    }
}
