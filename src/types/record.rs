//! Record-level types flowing through the pipeline
//!
//! A [`RawRecord`] is what the source yields, a [`Candidate`] is what the
//! validator makes of it, and every record ends up as exactly one
//! [`Classification`]: accepted, or skipped with a [`SkipReason`].

use super::{Address, Amount};
use std::fmt;

/// One input row, split into trimmed fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based line in the input file
    pub line: u64,
    pub fields: Vec<String>,
}

impl RawRecord {
    pub fn new(line: u64, fields: Vec<String>) -> Self {
        Self { line, fields }
    }

    /// First column, or an empty string for an empty row
    pub fn identifier(&self) -> &str {
        self.fields.first().map(String::as_str).unwrap_or_default()
    }
}

/// Typed projection of a well-formed record
///
/// Address-only modes carry [`Amount::ZERO`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub target: Address,
    pub amount: Amount,
}

/// Why a record went to the skipped sink
///
/// Reasons are checked in declaration order; the first that applies wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    /// Wrong column count, or an amount that does not parse
    MalformedRecord,
    /// First column is not a ledger address
    InvalidIdentifier,
    /// Amount below the configured per-transfer minimum
    BelowMinimumAmount,
    /// Sending would reach the per-run ceiling
    QuotaWouldBeExceeded,
    /// The ledger rejected, reverted or never confirmed the transfer
    SubmissionFailed,
    /// At least one asset balance could not be read
    BalanceLookupFailed,
}

impl SkipReason {
    /// Tag written to the optional reason column
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MalformedRecord => "malformed_record",
            SkipReason::InvalidIdentifier => "invalid_identifier",
            SkipReason::BelowMinimumAmount => "below_minimum_amount",
            SkipReason::QuotaWouldBeExceeded => "quota_would_be_exceeded",
            SkipReason::SubmissionFailed => "submission_failed",
            SkipReason::BalanceLookupFailed => "balance_lookup_failed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that reached the accepted sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accepted {
    /// Transfer mode: the amount was sent and confirmed
    Transfer(Candidate),
    /// Balance mode: one formatted balance per configured asset
    Balances {
        target: Address,
        balances: Vec<String>,
    },
    /// Validation mode
    Valid(Address),
}

impl Accepted {
    /// Output row for the accepted sink
    pub fn fields(&self) -> Vec<String> {
        match self {
            Accepted::Transfer(candidate) => {
                vec![candidate.target.to_string(), candidate.amount.to_string()]
            }
            Accepted::Balances { target, balances } => {
                let mut fields = Vec::with_capacity(balances.len() + 1);
                fields.push(target.to_string());
                fields.extend(balances.iter().cloned());
                fields
            }
            Accepted::Valid(address) => vec![address.to_string()],
        }
    }

    pub fn target(&self) -> &Address {
        match self {
            Accepted::Transfer(candidate) => &candidate.target,
            Accepted::Balances { target, .. } => target,
            Accepted::Valid(address) => address,
        }
    }
}

/// What is known about a skipped record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipSubject {
    /// The record validated before it was skipped
    Candidate(Candidate),
    /// The record never validated
    Raw(RawRecord),
}

/// A record that reached the skipped sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub subject: SkipSubject,
    pub reason: SkipReason,
}

impl SkippedRecord {
    pub fn candidate(candidate: Candidate, reason: SkipReason) -> Self {
        Self {
            subject: SkipSubject::Candidate(candidate),
            reason,
        }
    }

    pub fn raw(record: RawRecord, reason: SkipReason) -> Self {
        Self {
            subject: SkipSubject::Raw(record),
            reason,
        }
    }

    /// Identifier as written in the input
    pub fn identifier(&self) -> String {
        match &self.subject {
            SkipSubject::Candidate(candidate) => candidate.target.to_string(),
            SkipSubject::Raw(record) => record.identifier().to_string(),
        }
    }

    /// Output row for the skipped sink
    ///
    /// With `with_amount` the second column is the base-unit amount when the
    /// record validated, or the raw second field (possibly empty) when it did not.
    pub fn fields(&self, with_amount: bool) -> Vec<String> {
        let mut fields = vec![self.identifier()];
        if with_amount {
            let amount = match &self.subject {
                SkipSubject::Candidate(candidate) => candidate.amount.to_string(),
                SkipSubject::Raw(record) => record.fields.get(1).cloned().unwrap_or_default(),
            };
            fields.push(amount);
        }
        fields
    }
}

/// Result of classifying one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Accepted(Accepted),
    Skipped(SkippedRecord),
}

/// Where the per-run ceiling would first have been crossed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaltMarker {
    /// Identifier of the first record rejected for quota
    pub before: Address,
    /// Total that sending it would have produced, `None` if it overflows
    pub would_be_total: Option<Amount>,
}

impl fmt::Display for HaltMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stopped before sending to {}, because the next transfer would exceed the run allowance.",
            self.before
        )?;
        match self.would_be_total {
            Some(total) => write!(f, " Total would be: {}", total),
            None => write!(f, " Total would overflow."),
        }
    }
}
