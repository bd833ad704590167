//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `address`: Ledger account identifiers with checksum validation
//! - `amount`: Base-unit token amounts and decimal scaling
//! - `record`: Raw records, candidates, skip reasons and classifications
//! - `summary`: The end-of-run summary
//! - `error`: Error types for the pipeline and the ledger

pub mod address;
pub mod amount;
pub mod error;
pub mod record;
pub mod summary;

pub use address::{Address, AddressError};
pub use amount::{Amount, AmountError};
pub use error::{AirdropError, LedgerError};
pub use record::{
    Accepted, Candidate, Classification, HaltMarker, RawRecord, SkipReason, SkipSubject,
    SkippedRecord,
};
pub use summary::RunSummary;
