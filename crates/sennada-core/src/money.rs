//! # Money Module
//!
//! Provides the `Money` type for product prices.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Price typed in the form:   "19,99"                                     │
//! │  As f64:                    19.989999999999998                          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Centimes                                         │
//! │    "19,99" ──parse──► 1999 centimes ──format──► "19,99 D.A"            │
//! │    The stored value is exactly what the operator typed                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sennada_core::money::Money;
//!
//! let price = Money::from_cents(1999);
//! assert_eq!(price.format_dzd(), "19,99 D.A");
//!
//! let typed: Money = "12.5".parse().unwrap();
//! assert_eq!(typed.cents(), 1250);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::CURRENCY_SUFFIX;

/// Group separator used by French number formatting (narrow no-break space).
const GROUP_SEPARATOR: char = '\u{202f}';

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centimes (1/100 of a dinar).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Form input ──Money::parse──► NewProduct.detail_price                   │
/// │                                      │                                  │
/// │                                      ▼                                  │
/// │                    products.detail_price (INTEGER centimes)             │
/// │                                      │                                  │
/// │                                      ▼                                  │
/// │                     Product list ──format_dzd──► "1 250,00 D.A"         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centimes.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from dinars and centimes.
    ///
    /// ## Example
    /// ```rust
    /// use sennada_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(12, 50).cents(), 1250);
    /// assert_eq!(Money::from_major_minor(-5, 50).cents(), -550);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in centimes.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole dinar portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centime portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parses a price typed by the operator.
    ///
    /// ## Accepted Input
    /// ```text
    /// ""          → 0,00
    /// "12"        → 12,00
    /// "12.5"      → 12,50
    /// "12,50"     → 12,50
    /// "1 234,56"  → 1 234,56   (spaces are thousands separators)
    /// ",5"        → 0,50
    /// ```
    ///
    /// Anything with more than two decimals, more than one decimal
    /// separator, or non-digit characters is rejected.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidMoney(input.to_string());

        let compact: String = input
            .trim()
            .chars()
            .filter(|c| !matches!(*c, ' ' | '\u{a0}' | GROUP_SEPARATOR))
            .collect();

        if compact.is_empty() {
            return Ok(Money::zero());
        }

        let (negative, unsigned) = match compact.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, compact.as_str()),
        };

        let normalized = unsigned.replace(',', ".");
        let mut parts = normalized.split('.');
        let whole = parts.next().unwrap_or_default();
        let fraction = parts.next().unwrap_or_default();
        if parts.next().is_some() || (whole.is_empty() && fraction.is_empty()) {
            return Err(invalid());
        }

        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if !all_digits(whole) || !all_digits(fraction) || fraction.len() > 2 {
            return Err(invalid());
        }

        let major: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        // "5" after the separator means 50 centimes
        let minor: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(invalid)?;

        Ok(Money(if negative { -cents } else { cents }))
    }

    /// Formats the value the way the product list shows prices.
    ///
    /// French grouping, comma decimal separator, always two decimals,
    /// followed by the dinar suffix.
    ///
    /// ## Example
    /// ```rust
    /// use sennada_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(0).format_dzd(), "0,00 D.A");
    /// assert_eq!(Money::from_cents(123_456_789).format_dzd(), "1\u{202f}234\u{202f}567,89 D.A");
    /// ```
    pub fn format_dzd(&self) -> String {
        let digits = self.major().unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(GROUP_SEPARATOR);
            }
            grouped.push(c);
        }

        let sign = if self.is_negative() { "-" } else { "" };
        format!(
            "{}{},{:02} {}",
            sign,
            grouped,
            self.minor_part(),
            CURRENCY_SUFFIX
        )
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_dzd())
    }
}

impl FromStr for Money {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_parse_accepts_both_decimal_separators() {
        assert_eq!(Money::parse("12.5").unwrap().cents(), 1250);
        assert_eq!(Money::parse("12,50").unwrap().cents(), 1250);
        assert_eq!(Money::parse("12").unwrap().cents(), 1200);
        assert_eq!(Money::parse(",5").unwrap().cents(), 50);
    }

    #[test]
    fn test_parse_empty_is_zero() {
        assert!(Money::parse("").unwrap().is_zero());
        assert!(Money::parse("   ").unwrap().is_zero());
    }

    #[test]
    fn test_parse_thousands_spaces() {
        assert_eq!(Money::parse("1 234,56").unwrap().cents(), 123_456);
        assert_eq!(Money::parse("1\u{202f}234,56").unwrap().cents(), 123_456);
        assert_eq!(Money::parse("1\u{a0}000").unwrap().cents(), 100_000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("1.2.3").is_err());
        assert!(Money::parse("1,234").is_err());
        assert!(Money::parse(".").is_err());
        assert!(Money::parse("12e3").is_err());
        assert!(Money::parse("99999999999999999999").is_err());
    }

    #[test]
    fn test_parse_negative() {
        let refund = Money::parse("-5,5").unwrap();
        assert_eq!(refund.cents(), -550);
        assert!(refund.is_negative());
    }

    #[test]
    fn test_format_dzd() {
        assert_eq!(Money::from_cents(1999).format_dzd(), "19,99 D.A");
        assert_eq!(Money::from_cents(500).format_dzd(), "5,00 D.A");
        assert_eq!(Money::from_cents(100_000).format_dzd(), "1\u{202f}000,00 D.A");
        assert_eq!(Money::from_cents(-550).format_dzd(), "-5,50 D.A");
    }

    #[test]
    fn test_display_matches_format() {
        let money = Money::from_cents(123_450);
        assert_eq!(money.to_string(), money.format_dzd());
    }

    #[test]
    fn test_from_str() {
        let money: Money = "3,25".parse().unwrap();
        assert_eq!(money, Money::from_cents(325));
    }
}
