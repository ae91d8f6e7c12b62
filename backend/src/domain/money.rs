//! Monetary amounts in minor units.
//!
//! Amounts are held as whole cents so totals can be summed exactly. On the
//! wire they appear as decimal numbers (`12.5`) or decimal strings
//! (`"12.50"`); inbound values are rounded half away from zero to the nearest
//! cent.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Largest amount accepted from clients (one trillion currency units).
const MAX_CENTS: i64 = 100_000_000_000_000;

/// Errors raised while constructing a [`Money`] value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("amount must not be negative")]
    Negative,
    #[error("amount must be a finite decimal number")]
    NotANumber,
    #[error("amount is too large")]
    Overflow,
}

/// Non-negative amount of money in cents.
///
/// # Examples
/// ```
/// use backoffice::domain::Money;
///
/// let price = Money::from_cents(1250).unwrap();
/// let line = price.checked_mul(3).unwrap();
/// assert_eq!(line.to_string(), "37.50");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Build from whole cents.
    pub fn from_cents(cents: i64) -> Result<Self, MoneyError> {
        if cents < 0 {
            return Err(MoneyError::Negative);
        }
        if cents > MAX_CENTS {
            return Err(MoneyError::Overflow);
        }
        Ok(Self(cents))
    }

    /// Build from a decimal amount, rounding to the nearest cent.
    pub fn from_decimal(amount: f64) -> Result<Self, MoneyError> {
        if !amount.is_finite() {
            return Err(MoneyError::NotANumber);
        }
        if amount < 0.0 {
            return Err(MoneyError::Negative);
        }
        let rounded = (amount * 100.0).round();
        #[expect(
            clippy::cast_precision_loss,
            reason = "MAX_CENTS is far below 2^53 so the conversion is exact"
        )]
        let ceiling = MAX_CENTS as f64;
        if rounded > ceiling {
            return Err(MoneyError::Overflow);
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "value is a rounded, range-checked integer"
        )]
        let cents = rounded as i64;
        Self::from_cents(cents)
    }

    /// Parse a decimal string such as `"12"`, `"12.5"` or `"12.505"`.
    pub fn parse(raw: &str) -> Result<Self, MoneyError> {
        let raw = raw.trim();
        if raw.starts_with('-') {
            return Err(MoneyError::Negative);
        }
        let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
        let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !digits_only(whole) || !digits_only(fraction)
        {
            return Err(MoneyError::NotANumber);
        }
        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| MoneyError::Overflow)?
        };
        let mut fraction_digits = fraction.bytes().map(|b| i64::from(b - b'0'));
        let tenths = fraction_digits.next().unwrap_or(0);
        let hundredths = fraction_digits.next().unwrap_or(0);
        let round_up = fraction_digits.next().is_some_and(|d| d >= 5);
        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .ok_or(MoneyError::Overflow)?;
        Self::from_cents(cents)
    }

    /// Amount in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Amount as a decimal number, for serialisation only.
    #[must_use]
    pub fn as_decimal(self) -> f64 {
        #[expect(clippy::cast_precision_loss, reason = "amounts stay below 2^53 cents")]
        let cents = self.0 as f64;
        cents / 100.0
    }

    /// Multiply by a line quantity.
    pub fn checked_mul(self, quantity: u32) -> Result<Self, MoneyError> {
        self.0
            .checked_mul(i64::from(quantity))
            .ok_or(MoneyError::Overflow)
            .and_then(Self::from_cents)
    }

    /// Add two amounts.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.0
            .checked_add(other.0)
            .ok_or(MoneyError::Overflow)
            .and_then(Self::from_cents)
    }

    /// Absolute difference in cents.
    #[must_use]
    pub const fn abs_diff_cents(self, other: Self) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        let parsed = match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Money::from_decimal(value),
            Raw::Text(value) => Money::parse(&value),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("12", 1200)]
    #[case("12.5", 1250)]
    #[case("12.50", 1250)]
    #[case("0.07", 7)]
    #[case(".5", 50)]
    #[case("1.005", 101)]
    #[case("1.004", 100)]
    fn parse_rounds_to_cents(#[case] raw: &str, #[case] cents: i64) {
        assert_eq!(Money::parse(raw).map(Money::cents), Ok(cents));
    }

    #[rstest]
    #[case("-1", MoneyError::Negative)]
    #[case("abc", MoneyError::NotANumber)]
    #[case("1.2.3", MoneyError::NotANumber)]
    #[case("", MoneyError::NotANumber)]
    fn parse_rejects_invalid_input(#[case] raw: &str, #[case] expected: MoneyError) {
        assert_eq!(Money::parse(raw), Err(expected));
    }

    #[rstest]
    fn decimal_input_rounds_binary_noise() {
        // 0.1 + 0.2 is 0.30000000000000004 in binary floating point.
        assert_eq!(Money::from_decimal(0.1 + 0.2).map(Money::cents), Ok(30));
    }

    #[rstest]
    fn deserialises_numbers_and_strings() {
        let from_number: Money = serde_json::from_value(json!(19.99)).expect("number");
        let from_text: Money = serde_json::from_value(json!("19.99")).expect("string");
        assert_eq!(from_number, from_text);
        assert_eq!(from_number.cents(), 1999);
    }

    #[rstest]
    fn serialises_as_decimal_number() {
        let money = Money::from_cents(1250).expect("valid amount");
        assert_eq!(serde_json::to_value(money).expect("serialise"), json!(12.5));
    }

    #[rstest]
    fn multiplication_detects_overflow() {
        let money = Money::from_cents(MAX_CENTS).expect("valid amount");
        assert_eq!(money.checked_mul(2), Err(MoneyError::Overflow));
    }

    #[rstest]
    fn display_pads_cents() {
        assert_eq!(Money::from_cents(705).expect("valid").to_string(), "7.05");
    }
}
