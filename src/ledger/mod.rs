//! Ledger implementations
//!
//! - `rpc` - JSON-RPC client for an Ethereum-compatible node
//! - `signer` - Local key and legacy transaction signing for the RPC client
//! - `memory` - In-memory ledger for dry runs and tests

pub mod memory;
pub mod rpc;
pub mod signer;

pub use memory::{InMemoryLedger, SettledTransfer};
pub use rpc::{JsonRpcLedger, TransactionSettings};
pub use signer::{LegacyTransaction, LocalSigner};
