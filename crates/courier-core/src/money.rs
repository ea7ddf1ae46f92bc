//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The backend sends rupee amounts as JSON numbers:                       │
//! │    { "subtotal": 199.9, "deliveryFee": 30.1, "amount": 230 }            │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    199.9 + 30.1 = 229.99999999999997  ❌ invariant check fails!         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise                                            │
//! │    "199.9" → 19990 paise, "30.1" → 3010 paise                           │
//! │    19990 + 3010 = 23000 paise == "230" ✓                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use courier_core::money::Money;
//!
//! // Parse a wire amount exactly (never through f64!)
//! let fee = Money::parse_rupees("30.5").unwrap();
//! assert_eq!(fee.paise(), 3050);
//!
//! let total = fee + Money::from_paise(20000);
//! assert_eq!(total.to_string(), "₹230.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 of a rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: adjustments can be negative even if orders never are
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serializes as paise**: the UI formats for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    ///
    /// ```rust
    /// use courier_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupees(230).paise(), 23000);
    /// ```
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Parses a decimal rupee amount exactly.
    ///
    /// ## Rules
    /// - Optional leading `-`
    /// - At most two fractional digits (paise precision)
    /// - No exponents, no thousands separators
    ///
    /// ## Example
    /// ```rust
    /// use courier_core::money::Money;
    ///
    /// assert_eq!(Money::parse_rupees("230").unwrap().paise(), 23000);
    /// assert_eq!(Money::parse_rupees("49.5").unwrap().paise(), 4950);
    /// assert!(Money::parse_rupees("1e3").is_err());
    /// assert!(Money::parse_rupees("0.001").is_err());
    /// ```
    pub fn parse_rupees(input: &str) -> Result<Money, ValidationError> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a decimal rupee amount"));
        }
        if !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a decimal rupee amount"));
        }
        if fraction.len() > 2 {
            return Err(invalid("more than two decimal places"));
        }

        let rupees: i64 = whole
            .parse()
            .map_err(|_| invalid("amount is too large"))?;
        let paise_part: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().unwrap_or(0) * 10,
            _ => fraction.parse::<i64>().unwrap_or(0),
        };

        let paise = rupees
            .checked_mul(100)
            .and_then(|p| p.checked_add(paise_part))
            .ok_or_else(|| invalid("amount is too large"))?;

        Ok(Money(if negative { -paise } else { paise }))
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion (truncated toward zero).
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Adds two values, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Divides this amount across `count` entries using Bankers Rounding.
    ///
    /// ## Bankers Rounding Explained
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  Round half to even: 0.5 → 0, 1.5 → 2, 2.5 → 2, 3.5 → 4           │
    /// │                                                                     │
    /// │  Average earnings are shown for every period. Always rounding      │
    /// │  halves up would bias the figure upward over many deliveries.       │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// Returns zero when `count` is zero.
    ///
    /// ## Example
    /// ```rust
    /// use courier_core::money::Money;
    ///
    /// assert_eq!(Money::from_paise(9000).average(3).paise(), 3000);
    /// assert_eq!(Money::from_paise(5).average(2).paise(), 2);  // 2.5 → 2
    /// assert_eq!(Money::from_paise(7).average(2).paise(), 4);  // 3.5 → 4
    /// assert_eq!(Money::from_paise(100).average(0).paise(), 0);
    /// ```
    pub fn average(&self, count: u64) -> Money {
        if count == 0 {
            return Money::zero();
        }

        let total = self.0 as i128;
        let divisor = count as i128;
        let magnitude = total.abs();

        let mut quotient = magnitude / divisor;
        let twice_remainder = (magnitude % divisor) * 2;
        if twice_remainder > divisor || (twice_remainder == divisor && quotient % 2 == 1) {
            quotient += 1;
        }

        let signed = if total < 0 { -quotient } else { quotient };
        Money(signed as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Human-readable rupee format, for logs and debugging.
///
/// The UI does its own locale-aware formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Multiplication by a quantity (line totals).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paise() {
        let money = Money::from_paise(23050);
        assert_eq!(money.paise(), 23050);
        assert_eq!(money.rupees(), 230);
        assert_eq!(money.paise_part(), 50);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_paise(23000).to_string(), "₹230.00");
        assert_eq!(Money::from_paise(4950).to_string(), "₹49.50");
        assert_eq!(Money::from_paise(-550).to_string(), "-₹5.50");
        assert_eq!(Money::zero().to_string(), "₹0.00");
    }

    #[test]
    fn test_parse_rupees_accepts_wire_forms() {
        assert_eq!(Money::parse_rupees("0").unwrap(), Money::zero());
        assert_eq!(Money::parse_rupees("230").unwrap().paise(), 23000);
        assert_eq!(Money::parse_rupees("230.0").unwrap().paise(), 23000);
        assert_eq!(Money::parse_rupees("199.9").unwrap().paise(), 19990);
        assert_eq!(Money::parse_rupees("30.05").unwrap().paise(), 3005);
        assert_eq!(Money::parse_rupees("-5.5").unwrap().paise(), -550);
    }

    #[test]
    fn test_parse_rupees_rejects_malformed() {
        assert!(Money::parse_rupees("").is_err());
        assert!(Money::parse_rupees("abc").is_err());
        assert!(Money::parse_rupees(".5").is_err());
        assert!(Money::parse_rupees("1e3").is_err());
        assert!(Money::parse_rupees("1,000").is_err());
        assert!(Money::parse_rupees("12.345").is_err());
        assert!(Money::parse_rupees("99999999999999999999").is_err());
    }

    #[test]
    fn test_exact_decimal_sum_matches_total() {
        let subtotal = Money::parse_rupees("199.9").unwrap();
        let fee = Money::parse_rupees("30.1").unwrap();
        assert_eq!(subtotal + fee, Money::from_rupees(230));
    }

    #[test]
    fn test_average_bankers_rounding() {
        assert_eq!(Money::from_paise(10).average(4).paise(), 2); // 2.5 → 2
        assert_eq!(Money::from_paise(14).average(4).paise(), 4); // 3.5 → 4
        assert_eq!(Money::from_paise(10).average(3).paise(), 3); // 3.33 → 3
        assert_eq!(Money::from_paise(20).average(3).paise(), 7); // 6.67 → 7
        assert_eq!(Money::from_paise(-10).average(4).paise(), -2);
    }

    #[test]
    fn test_average_of_nothing_is_zero() {
        assert_eq!(Money::from_paise(12345).average(0), Money::zero());
    }

    #[test]
    fn test_sum() {
        let fees = [Money::from_rupees(30), Money::from_rupees(45), Money::from_paise(50)];
        let total: Money = fees.iter().sum();
        assert_eq!(total.paise(), 7550);
    }

    #[test]
    fn test_checked_add_overflow() {
        assert!(Money::from_paise(i64::MAX).checked_add(Money::from_paise(1)).is_none());
        assert_eq!(
            Money::from_paise(1).checked_add(Money::from_paise(2)),
            Some(Money::from_paise(3))
        );
    }
}
