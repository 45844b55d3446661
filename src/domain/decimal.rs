//! Monetary decimal type backed by rust_decimal.
//!
//! All balances, flows, and fees go through this wrapper so currency
//! arithmetic never touches binary floats. Canonical string formatting
//! (no exponent notation) is used for storage and wire output.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lossless decimal for financial calculations.
///
/// Serializes to a JSON number by default.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Decimal {
    /// Create a Decimal from a RustDecimal.
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Decimal)
    }

    /// Format as a canonical string: trailing zeros trimmed, no exponent.
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    /// Get the underlying RustDecimal.
    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    /// Returns true if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    /// The larger of the two values.
    pub fn max(self, other: Decimal) -> Decimal {
        if self >= other {
            self
        } else {
            other
        }
    }

    /// Lossy conversion for ratio statistics (never used for money).
    pub fn to_f64_lossy(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }

    /// Construct from an integer number of currency units.
    pub fn from_int(value: i64) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<Decimal> for RustDecimal {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

impl std::ops::Div for Decimal {
    type Output = Decimal;

    fn div(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 / rhs.0)
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for s in ["123.456", "0.0001", "1000000", "-123.456", "0"] {
            let d = Decimal::from_str_canonical(s).expect("parse failed");
            let reparsed = Decimal::from_str_canonical(&d.to_canonical_string()).unwrap();
            assert_eq!(d, reparsed, "roundtrip failed for {}", s);
        }
    }

    #[test]
    fn test_canonical_has_no_exponent() {
        let d = Decimal::from_str_canonical("1230").unwrap();
        let s = d.to_canonical_string();
        assert!(!s.contains('e'));
        assert_eq!(s, "1230");
    }

    #[test]
    fn test_trailing_zeros_trimmed() {
        let d = Decimal::from_str_canonical("100.500").unwrap();
        assert_eq!(d.to_canonical_string(), "100.5");
    }

    #[test]
    fn test_arithmetic() {
        let a = Decimal::from_str_canonical("10.5").unwrap();
        let b = Decimal::from_str_canonical("2.5").unwrap();
        assert_eq!((a + b).to_canonical_string(), "13");
        assert_eq!((a - b).to_canonical_string(), "8");
        assert_eq!((a * b).to_canonical_string(), "26.25");
        assert_eq!((a / b).to_canonical_string(), "4.2");
    }

    #[test]
    fn test_sign_helpers() {
        assert!(Decimal::from_int(5).is_positive());
        assert!(Decimal::from_int(-5).is_negative());
        assert!(Decimal::zero().is_zero());
        assert!(!Decimal::zero().is_positive());
        assert!(!Decimal::zero().is_negative());
        assert_eq!(Decimal::from_int(-7).abs(), Decimal::from_int(7));
    }

    #[test]
    fn test_max() {
        let a = Decimal::from_int(3);
        let b = Decimal::from_int(9);
        assert_eq!(a.max(b), b);
        assert_eq!(b.max(a), b);
    }

    #[test]
    fn test_json_serializes_as_number() {
        let d = Decimal::from_str_canonical("123.45").unwrap();
        let json = serde_json::to_value(d).unwrap();
        assert!(json.is_number());
    }

    #[test]
    fn test_no_float_accumulation_drift() {
        // 0.1 added 1000 times must be exactly 100.
        let step = Decimal::from_str_canonical("0.1").unwrap();
        let mut sum = Decimal::zero();
        for _ in 0..1000 {
            sum = sum + step;
        }
        assert_eq!(sum, Decimal::from_int(100));
    }
}
