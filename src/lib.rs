//! Token Airdrop Library
//! # Overview
//!
//! This library streams a CSV list of recipients through a per-record pipeline
//! and splits it into two output files: records that were acted on and records
//! that were skipped, each skipped record carrying exactly one reason.
//!
//! Three run modes share the pipeline:
//!
//! - **send**: transfer a token amount to each recipient, never letting the
//!   run's cumulative total reach the configured ceiling
//! - **balances**: read each address's balance in every configured asset
//! - **validate**: check address format and checksum only
//!
//! # Architecture
//!
//! - [`types`] - Addresses, amounts, records, skip reasons, summary, errors
//! - [`cli`] - CLI arguments parsing
//! - [`config`] - Per-network TOML configuration and environment credentials
//! - [`core`] - Pipeline components:
//!   - [`core::validator`] - Pure record validation
//!   - [`core::quota`] - The per-run ceiling
//!   - [`core::submitter`] - Transfer submission and confirmation
//!   - [`core::router`] - Routing to the accepted and skipped sinks
//!   - [`core::driver`] - Run state machine
//! - [`strategy`] - Per-mode wiring of the core components
//! - [`ledger`] - JSON-RPC and in-memory ledgers, local transaction signing
//! - [`io`] - Streaming CSV input and output files
//!
//! # Skip Reasons
//!
//! Checked in this order; the first that applies wins:
//!
//! - **MalformedRecord**: wrong column count or unparsable amount
//! - **InvalidIdentifier**: not a ledger address
//! - **BelowMinimumAmount**: amount under the per-transfer minimum
//! - **QuotaWouldBeExceeded**: the run ceiling would be reached
//! - **SubmissionFailed**: the ledger did not confirm the transfer
//! - **BalanceLookupFailed**: a balance could not be read (balances mode)

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod ledger;
pub mod strategy;
pub mod types;

pub use core::{
    run_file, Ledger, OutcomeRouter, PipelineDriver, QuotaGuard, RunOptions, RunReport, RunState,
    TransferSubmitter,
};
pub use ledger::{InMemoryLedger, JsonRpcLedger, LocalSigner, TransactionSettings};
pub use strategy::{create_strategy, RecordStrategy};
pub use types::{
    Accepted, Address, AirdropError, Amount, Candidate, Classification, HaltMarker, LedgerError,
    RawRecord, RunSummary, SkipReason, SkippedRecord,
};
