//! Address validation
//!
//! Pure format and checksum check, no ledger involved.

use crate::core::validator::{validate, ValidationMode};
use crate::io::OutputLayout;
use crate::strategy::RecordStrategy;
use crate::types::{Accepted, Classification, RawRecord, SkippedRecord};
use async_trait::async_trait;

#[derive(Debug, Default)]
pub struct ValidateStrategy;

impl ValidateStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Classify without an async context
    pub fn classify_now(&self, record: RawRecord) -> Classification {
        match validate(&record, &ValidationMode::AddressOnly) {
            Ok(candidate) => Classification::Accepted(Accepted::Valid(candidate.target)),
            Err(reason) => Classification::Skipped(SkippedRecord::raw(record, reason)),
        }
    }
}

#[async_trait]
impl RecordStrategy for ValidateStrategy {
    fn layout(&self) -> OutputLayout {
        OutputLayout::Validation
    }

    async fn classify(&mut self, record: RawRecord) -> Classification {
        self.classify_now(record)
    }
}
