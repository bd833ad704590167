//! Core traits for the remote ledger
//!
//! The pipeline only ever talks to a ledger through [`Ledger`], so the JSON-RPC
//! client and the in-memory ledger used for dry runs and tests are interchangeable.

use crate::types::{Address, Amount, LedgerError};
use async_trait::async_trait;

/// Acknowledgement that a transfer was included successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Transaction hash, `0x` prefixed
    pub tx_hash: String,
    /// Block the transaction was included in, when the ledger reports one
    pub block_number: Option<u64>,
}

/// Capability interface of the remote ledger
///
/// `transfer` resolves only once the ledger has either included the transfer
/// (`Ok`) or definitively rejected it (`Err`). Callers bound the wait themselves.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Balance of `holder` in `asset`, in base units
    async fn balance_of(&self, asset: &Address, holder: &Address) -> Result<Amount, LedgerError>;

    /// Move `amount` of `asset` from `sender` to `target` and wait for inclusion
    async fn transfer(
        &self,
        asset: &Address,
        sender: &Address,
        target: &Address,
        amount: Amount,
    ) -> Result<Confirmation, LedgerError>;
}

#[async_trait]
impl<L: Ledger + ?Sized> Ledger for std::sync::Arc<L> {
    async fn balance_of(&self, asset: &Address, holder: &Address) -> Result<Amount, LedgerError> {
        (**self).balance_of(asset, holder).await
    }

    async fn transfer(
        &self,
        asset: &Address,
        sender: &Address,
        target: &Address,
        amount: Amount,
    ) -> Result<Confirmation, LedgerError> {
        (**self).transfer(asset, sender, target, amount).await
    }
}
