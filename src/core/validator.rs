//! Record validation
//!
//! Pure classification of a [`RawRecord`] into a [`Candidate`] or the first
//! [`SkipReason`] that applies. Checks run in a fixed order:
//!
//! 1. column count for the mode (`MalformedRecord`)
//! 2. identifier format (`InvalidIdentifier`)
//! 3. amount parse, transfer mode only (`MalformedRecord`)
//! 4. amount floor, transfer mode only (`BelowMinimumAmount`)
//!
//! Quota and submission checks come later in the pipeline.

use crate::types::{Address, Amount, Candidate, RawRecord, SkipReason};

/// What a well-formed row looks like
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationMode {
    /// `identifier,amount`
    Transfer {
        /// Decimals of the asset being sent
        decimals: u8,
        /// Smallest amount worth sending, in base units
        minimum: Amount,
    },
    /// `identifier`
    AddressOnly,
}

impl ValidationMode {
    /// Columns a row must have
    pub fn expected_columns(&self) -> usize {
        match self {
            ValidationMode::Transfer { .. } => 2,
            ValidationMode::AddressOnly => 1,
        }
    }
}

/// Validate one row
///
/// In address-only mode the candidate's amount is zero.
pub fn validate(record: &RawRecord, mode: &ValidationMode) -> Result<Candidate, SkipReason> {
    if record.fields.len() != mode.expected_columns() {
        return Err(SkipReason::MalformedRecord);
    }

    let target = Address::parse(&record.fields[0]).map_err(|_| SkipReason::InvalidIdentifier)?;

    let amount = match mode {
        ValidationMode::Transfer { decimals, minimum } => {
            let amount = Amount::parse_units(&record.fields[1], *decimals)
                .map_err(|_| SkipReason::MalformedRecord)?;
            if amount < *minimum {
                return Err(SkipReason::BelowMinimumAmount);
            }
            amount
        }
        ValidationMode::AddressOnly => Amount::ZERO,
    };

    Ok(Candidate { target, amount })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ADDR: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    fn record(fields: &[&str]) -> RawRecord {
        RawRecord::new(1, fields.iter().map(|f| f.to_string()).collect())
    }

    fn transfer_mode() -> ValidationMode {
        ValidationMode::Transfer {
            decimals: 2,
            minimum: Amount::from(100u64),
        }
    }

    #[test]
    fn test_valid_transfer_row() {
        let candidate = validate(&record(&[ADDR, "12.5"]), &transfer_mode()).unwrap();
        assert_eq!(candidate.target.as_str(), ADDR);
        assert_eq!(candidate.amount, Amount::from(1250u64));
    }

    #[test]
    fn test_minimum_is_inclusive() {
        let candidate = validate(&record(&[ADDR, "1"]), &transfer_mode()).unwrap();
        assert_eq!(candidate.amount, Amount::from(100u64));
    }

    #[rstest]
    #[case::one_column(&[ADDR], SkipReason::MalformedRecord)]
    #[case::three_columns(&[ADDR, "1", "x"], SkipReason::MalformedRecord)]
    #[case::bad_address(&["not-an-address", "5"], SkipReason::InvalidIdentifier)]
    #[case::bad_checksum_address(
        &["0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD", "5"],
        SkipReason::InvalidIdentifier
    )]
    #[case::unparsable_amount(&[ADDR, "five"], SkipReason::MalformedRecord)]
    #[case::too_precise_amount(&[ADDR, "1.001"], SkipReason::MalformedRecord)]
    #[case::negative_amount(&[ADDR, "-3"], SkipReason::MalformedRecord)]
    #[case::below_minimum(&[ADDR, "0.99"], SkipReason::BelowMinimumAmount)]
    fn test_transfer_skip_reasons(#[case] fields: &[&str], #[case] expected: SkipReason) {
        assert_eq!(validate(&record(fields), &transfer_mode()), Err(expected));
    }

    #[test]
    fn test_identifier_checked_before_amount() {
        // both columns are bad, identifier wins
        assert_eq!(
            validate(&record(&["nope", "garbage"]), &transfer_mode()),
            Err(SkipReason::InvalidIdentifier)
        );
    }

    #[test]
    fn test_column_count_checked_first() {
        assert_eq!(
            validate(&record(&["nope"]), &transfer_mode()),
            Err(SkipReason::MalformedRecord)
        );
    }

    #[rstest]
    #[case::valid(&[ADDR], Ok(()))]
    #[case::two_columns(&[ADDR, "1"], Err(SkipReason::MalformedRecord))]
    #[case::invalid(&["0x123"], Err(SkipReason::InvalidIdentifier))]
    fn test_address_only_mode(#[case] fields: &[&str], #[case] expected: Result<(), SkipReason>) {
        let result = validate(&record(fields), &ValidationMode::AddressOnly);
        if let Ok(candidate) = &result {
            assert!(candidate.amount.is_zero());
        }
        assert_eq!(result.map(|_| ()), expected);
    }
}
