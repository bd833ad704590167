//! Token amounts in the asset's smallest unit
//!
//! Amounts are non-negative 256-bit integers. Human input such as `"12.5"` is
//! scaled by the asset's decimals with [`Amount::parse_units`], and
//! [`Amount::format_units`] goes the other way for display.

use primitive_types::U256;
use std::fmt;
use std::str::FromStr;

/// Why a decimal string could not be turned into an amount
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// Not a decimal number
    Invalid(String),
    /// Below zero
    Negative(String),
    /// More fractional digits than the asset has decimals
    TooPrecise { value: String, decimals: u8 },
    /// Does not fit in 256 bits
    Overflow(String),
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Invalid(v) => write!(f, "invalid amount '{}'", v),
            AmountError::Negative(v) => write!(f, "negative amount '{}'", v),
            AmountError::TooPrecise { value, decimals } => {
                write!(f, "amount '{}' exceeds {} decimals", value, decimals)
            }
            AmountError::Overflow(v) => write!(f, "amount '{}' overflows", v),
        }
    }
}

impl std::error::Error for AmountError {}

/// Non-negative integer amount in base units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Amount = Amount(U256::zero());

    pub fn new(value: U256) -> Self {
        Amount(value)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Parse a decimal string, scaling it by `decimals`
    ///
    /// `parse_units("1.5", 18)` is `1_500_000_000_000_000_000`. Only ASCII
    /// digits and one `.` are accepted; the result is exact at any length.
    pub fn parse_units(text: &str, decimals: u8) -> Result<Self, AmountError> {
        let trimmed = text.trim();
        if trimmed.starts_with('-') {
            return Err(AmountError::Negative(trimmed.to_string()));
        }

        let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction)
        {
            return Err(AmountError::Invalid(trimmed.to_string()));
        }

        let fraction = fraction.trim_end_matches('0');
        let places = usize::from(decimals);
        if fraction.len() > places {
            return Err(AmountError::TooPrecise {
                value: trimmed.to_string(),
                decimals,
            });
        }

        let scaled = format!("{}{}{}", whole, fraction, "0".repeat(places - fraction.len()));
        let digits = scaled.trim_start_matches('0');
        if digits.is_empty() {
            return Ok(Amount::ZERO);
        }

        // digits are validated, so the only failure left is width
        U256::from_dec_str(digits)
            .map(Amount)
            .map_err(|_| AmountError::Overflow(trimmed.to_string()))
    }

    /// Render as a decimal string with `decimals` fractional digits removed
    ///
    /// Always keeps at least one fractional digit: `"1.0"`, `"0.25"`, and
    /// `"42.0"` with zero decimals.
    pub fn format_units(&self, decimals: u8) -> String {
        let digits = self.0.to_string();
        let decimals = usize::from(decimals);
        if decimals == 0 {
            return format!("{}.0", digits);
        }

        let padded = if digits.len() <= decimals {
            format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
        } else {
            digits
        };

        let (whole, fraction) = padded.split_at(padded.len() - decimals);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            format!("{}.0", whole)
        } else {
            format!("{}.{}", whole, fraction)
        }
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(U256::from(value))
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Amount(U256::from(value))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses a base-unit integer (no scaling)
impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        U256::from_dec_str(s.trim())
            .map(Amount)
            .map_err(|_| AmountError::Invalid(s.to_string()))
    }
}
