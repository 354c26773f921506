//! Fixed-scale token amounts
//!
//! Every monetary value on the ledger is an arbitrary-precision integer of
//! atomic units, where one whole token is `10^DECIMALS` units. Human input is a
//! decimal string; records store the raw unscaled integer string.
//!
//! ## Parsing Policy
//!
//! Fractional digits beyond [`DECIMALS`] are **truncated**, never rounded.
//! `parse_amount("1.1234567890123456789")` drops the trailing `9`. The inverse
//! holds for every representable value: `parse_amount(&format_amount(x)) == x`.

use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Number of fractional decimal digits carried by every amount.
pub const DECIMALS: u32 = 18;

const FRACTION_WIDTH: usize = DECIMALS as usize;

/// Error produced when a string is not a well-formed amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// More than one decimal point
    #[error("invalid amount format: {input}")]
    MultipleDecimalPoints {
        /// Offending input
        input: String,
    },

    /// Something other than an optional sign and decimal digits
    #[error("failed to parse amount: {input}")]
    InvalidDigits {
        /// Offending input
        input: String,
    },
}

/// A signed quantity of atomic units.
///
/// There is deliberately no conversion from floating point. Construct from
/// integer units with [`Amount::from_units`] or from text with
/// [`parse_amount`] / [`Amount::parse_units`].
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(BigInt);

impl Amount {
    /// The zero amount
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    /// Build from a count of atomic units.
    pub fn from_units(units: impl Into<BigInt>) -> Self {
        Self(units.into())
    }

    /// Build from a whole number of tokens (`tokens * 10^18` units).
    pub fn from_tokens(tokens: impl Into<BigInt>) -> Self {
        Self(tokens.into() * BigInt::from(10u8).pow(DECIMALS))
    }

    /// Parse a raw unscaled integer string such as `"15000000000000000000"`.
    pub fn parse_units(raw: &str) -> Result<Self, AmountError> {
        let trimmed = raw.trim();
        let (negative, digits) = split_sign(trimmed);
        if digits.is_empty() || !is_digits(digits) {
            return Err(AmountError::InvalidDigits {
                input: raw.to_string(),
            });
        }
        parse_signed_digits(negative, digits, raw)
    }

    /// Interpret a stored amount.
    ///
    /// Current records hold raw units. Records written by older clients may
    /// hold a decimal-formatted value; anything containing a decimal point is
    /// read through the decimal codec instead.
    pub fn from_stored(raw: &str) -> Result<Self, AmountError> {
        if raw.contains('.') {
            parse_amount(raw)
        } else if raw.trim().is_empty() {
            Ok(Self::zero())
        } else {
            Self::parse_units(raw)
        }
    }

    /// Underlying atomic units
    pub fn units(&self) -> &BigInt {
        &self.0
    }

    /// True when strictly greater than zero
    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    /// True when strictly less than zero
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// True when zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Raw unscaled integer string, the on-ledger representation.
    pub fn to_units_string(&self) -> String {
        self.0.to_str_radix(10)
    }

    /// Human decimal string, see [`format_amount`].
    pub fn to_decimal_string(&self) -> String {
        format_amount(self)
    }
}

/// Parse a human decimal string into atomic units.
///
/// `""` and `"0"` are zero. Surrounding whitespace is ignored. The fractional
/// part is padded with trailing zeros, or truncated, to exactly 18 digits.
pub fn parse_amount(input: &str) -> Result<Amount, AmountError> {
    if input.is_empty() || input == "0" {
        return Ok(Amount::zero());
    }

    let trimmed = input.trim();
    let mut parts = trimmed.split('.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();
    if parts.next().is_some() {
        return Err(AmountError::MultipleDecimalPoints {
            input: input.to_string(),
        });
    }

    let (negative, whole) = split_sign(whole);
    let fraction = fraction.unwrap_or_default();
    if !is_digits(whole) || !is_digits(fraction) {
        return Err(AmountError::InvalidDigits {
            input: input.to_string(),
        });
    }

    let fraction = match fraction.get(..FRACTION_WIDTH) {
        Some(truncated) => truncated.to_string(),
        None => format!("{fraction:0<width$}", width = FRACTION_WIDTH),
    };

    parse_signed_digits(negative, &format!("{whole}{fraction}"), input)
}

/// Render atomic units as a human decimal string.
///
/// Zero is `"0"`. Trailing fractional zeros are stripped and the point is
/// omitted when nothing remains after it.
pub fn format_amount(amount: &Amount) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let digits = amount.0.magnitude().to_str_radix(10);
    let padded = format!("{digits:0>width$}", width = FRACTION_WIDTH + 1);
    let (whole, fraction) = padded.split_at(padded.len() - FRACTION_WIDTH);
    let fraction = fraction.trim_end_matches('0');
    let sign = if amount.is_negative() { "-" } else { "" };

    if fraction.is_empty() {
        format!("{sign}{whole}")
    } else {
        format!("{sign}{whole}.{fraction}")
    }
}

fn split_sign(s: &str) -> (bool, &str) {
    match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    }
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_signed_digits(negative: bool, digits: &str, input: &str) -> Result<Amount, AmountError> {
    let magnitude =
        BigInt::parse_bytes(digits.as_bytes(), 10).ok_or_else(|| AmountError::InvalidDigits {
            input: input.to_string(),
        })?;
    Ok(Amount(if negative { -magnitude } else { magnitude }))
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_amount(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_amount(self))
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Amount> for &'a Amount {
    type Output = Amount;

    fn add(self, rhs: &'a Amount) -> Amount {
        Amount(&self.0 + &rhs.0)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl<'a> Sub<&'a Amount> for &'a Amount {
    type Output = Amount;

    fn sub(self, rhs: &'a Amount) -> Amount {
        Amount(&self.0 - &rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |acc, next| &acc + next)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_units_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Amount::from_stored(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn units(s: &str) -> Amount {
        Amount::parse_units(s).unwrap()
    }

    #[test]
    fn test_empty_and_zero_are_zero() {
        assert_eq!(parse_amount("").unwrap(), Amount::zero());
        assert_eq!(parse_amount("0").unwrap(), Amount::zero());
        assert_eq!(parse_amount("0.000").unwrap(), Amount::zero());
        assert_eq!(parse_amount("  ").unwrap(), Amount::zero());
    }

    #[test]
    fn test_whole_tokens_scale_by_decimals() {
        assert_eq!(parse_amount("10").unwrap(), units("10000000000000000000"));
        assert_eq!(parse_amount("10").unwrap(), Amount::from_tokens(10));
        assert_eq!(parse_amount(" 7 ").unwrap(), Amount::from_tokens(7));
    }

    #[test]
    fn test_fraction_is_padded() {
        assert_eq!(parse_amount("12.5").unwrap(), units("12500000000000000000"));
        assert_eq!(parse_amount(".5").unwrap(), units("500000000000000000"));
        assert_eq!(parse_amount("3.").unwrap(), Amount::from_tokens(3));
    }

    #[test]
    fn test_excess_fraction_is_truncated_not_rounded() {
        let parsed = parse_amount("1.123456789012345678901").unwrap();
        assert_eq!(parsed, units("1123456789012345678"));

        let nines = parse_amount("0.9999999999999999999").unwrap();
        assert_eq!(nines, units("999999999999999999"));
    }

    #[test]
    fn test_multiple_points_rejected() {
        assert_matches!(
            parse_amount("1.2.3"),
            Err(AmountError::MultipleDecimalPoints { .. })
        );
    }

    #[test]
    fn test_non_digits_rejected() {
        assert_matches!(parse_amount("abc"), Err(AmountError::InvalidDigits { .. }));
        assert_matches!(parse_amount("1e5"), Err(AmountError::InvalidDigits { .. }));
        assert_matches!(parse_amount("1_000"), Err(AmountError::InvalidDigits { .. }));
        assert_matches!(parse_amount("1.-5"), Err(AmountError::InvalidDigits { .. }));
        assert_matches!(parse_amount("--5"), Err(AmountError::InvalidDigits { .. }));
    }

    #[test]
    fn test_signs() {
        assert_eq!(parse_amount("+2").unwrap(), Amount::from_tokens(2));
        let negative = parse_amount("-2.5").unwrap();
        assert!(negative.is_negative());
        assert_eq!(negative.to_units_string(), "-2500000000000000000");
        assert_eq!(format_amount(&negative), "-2.5");
    }

    #[test]
    fn test_format() {
        assert_eq!(format_amount(&Amount::zero()), "0");
        assert_eq!(format_amount(&units("1")), "0.000000000000000001");
        assert_eq!(format_amount(&units("12500000000000000000")), "12.5");
        assert_eq!(format_amount(&Amount::from_tokens(1_000_000)), "1000000");
        assert_eq!(format_amount(&units("100000000000000000")), "0.1");
    }

    #[test]
    fn test_values_beyond_u128() {
        let huge = "340282366920938463463374607431768211456123";
        let parsed = parse_amount(huge).unwrap();
        assert_eq!(format_amount(&parsed), huge);
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(units("42").units(), &BigInt::from(42));
        assert_matches!(
            Amount::parse_units("4.2"),
            Err(AmountError::InvalidDigits { .. })
        );
        assert_matches!(Amount::parse_units(""), Err(AmountError::InvalidDigits { .. }));
    }

    #[test]
    fn test_from_stored_accepts_legacy_decimal() {
        assert_eq!(Amount::from_stored("15").unwrap(), units("15"));
        assert_eq!(Amount::from_stored("1.5").unwrap(), units("1500000000000000000"));
        assert_eq!(Amount::from_stored("").unwrap(), Amount::zero());
    }

    #[test]
    fn test_arithmetic() {
        let a = Amount::from_tokens(10);
        let b = Amount::from_tokens(4);
        assert_eq!(&a - &b, Amount::from_tokens(6));
        assert_eq!(&a + &b, Amount::from_tokens(14));
        assert!((&b - &a).is_negative());
        let total: Amount = [a, b].iter().sum();
        assert_eq!(total, Amount::from_tokens(14));
    }

    #[test]
    fn test_serde_uses_raw_units() {
        let amount = parse_amount("1.5").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"1500000000000000000\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
        assert!(serde_json::from_str::<Amount>("\"x1\"").is_err());
    }
}
