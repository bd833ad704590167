//! In-memory ledger
//!
//! Holds balances in a map and settles transfers instantly. Backs `--dry-run`
//! and stands in for a node in tests, where failures can be injected per
//! address.

use crate::core::traits::{Confirmation, Ledger};
use crate::types::{Address, Amount, LedgerError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// A transfer the ledger settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledTransfer {
    pub asset: Address,
    pub sender: Address,
    pub target: Address,
    pub amount: Amount,
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<(Address, Address), Amount>,
    failing_targets: HashSet<Address>,
    failing_holders: HashSet<Address>,
    settled: Vec<SettledTransfer>,
    attempts: usize,
}

#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set_balance`](Self::set_balance)
    pub fn with_balance(self, asset: &Address, holder: &Address, amount: Amount) -> Self {
        self.set_balance(asset, holder, amount);
        self
    }

    pub fn set_balance(&self, asset: &Address, holder: &Address, amount: Amount) {
        self.lock()
            .balances
            .insert((asset.clone(), holder.clone()), amount);
    }

    /// Current balance, zero for unknown holders
    pub fn balance(&self, asset: &Address, holder: &Address) -> Amount {
        self.lock()
            .balances
            .get(&(asset.clone(), holder.clone()))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    /// Make every transfer to `target` fail before settlement
    pub fn fail_transfers_to(&self, target: &Address) {
        self.lock().failing_targets.insert(target.clone());
    }

    /// Make every balance query for `holder` fail
    pub fn fail_balance_of(&self, holder: &Address) {
        self.lock().failing_holders.insert(holder.clone());
    }

    /// Transfers settled so far, in order
    pub fn settled(&self) -> Vec<SettledTransfer> {
        self.lock().settled.clone()
    }

    /// Transfer calls received, settled or not
    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        // state stays consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn balance_of(&self, asset: &Address, holder: &Address) -> Result<Amount, LedgerError> {
        if self.lock().failing_holders.contains(holder) {
            return Err(LedgerError::Transport(format!(
                "balance query for {} failed",
                holder
            )));
        }
        Ok(self.balance(asset, holder))
    }

    async fn transfer(
        &self,
        asset: &Address,
        sender: &Address,
        target: &Address,
        amount: Amount,
    ) -> Result<Confirmation, LedgerError> {
        let mut state = self.lock();
        state.attempts += 1;
        let tx_hash = format!("0x{:064x}", state.attempts);

        if state.failing_targets.contains(target) {
            return Err(LedgerError::Rejected(format!("transfer to {} refused", target)));
        }

        let sender_key = (asset.clone(), sender.clone());
        let available = state.balances.get(&sender_key).copied().unwrap_or(Amount::ZERO);
        let Some(remaining) = available.checked_sub(amount) else {
            return Err(LedgerError::Reverted { tx_hash });
        };
        state.balances.insert(sender_key, remaining);

        let target_key = (asset.clone(), target.clone());
        let current = state.balances.get(&target_key).copied().unwrap_or(Amount::ZERO);
        let Some(credited) = current.checked_add(amount) else {
            return Err(LedgerError::Reverted { tx_hash });
        };
        state.balances.insert(target_key, credited);

        state.settled.push(SettledTransfer {
            asset: asset.clone(),
            sender: sender.clone(),
            target: target.clone(),
            amount,
        });

        Ok(Confirmation {
            tx_hash,
            block_number: Some(state.attempts as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(digit: char) -> Address {
        Address::parse(&format!("0x{}", digit.to_string().repeat(40))).unwrap()
    }

    #[tokio::test]
    async fn test_transfer_moves_balance() {
        let (token, sender, target) = (address('a'), address('1'), address('2'));
        let ledger = InMemoryLedger::new().with_balance(&token, &sender, Amount::from(100u64));

        let confirmation = ledger
            .transfer(&token, &sender, &target, Amount::from(30u64))
            .await
            .unwrap();

        assert_eq!(confirmation.block_number, Some(1));
        assert_eq!(ledger.balance(&token, &sender), Amount::from(70u64));
        assert_eq!(
            ledger.balance_of(&token, &target).await.unwrap(),
            Amount::from(30u64)
        );
        assert_eq!(ledger.settled().len(), 1);
    }

    #[tokio::test]
    async fn test_insufficient_balance_reverts() {
        let (token, sender, target) = (address('a'), address('1'), address('2'));
        let ledger = InMemoryLedger::new().with_balance(&token, &sender, Amount::from(5u64));

        let result = ledger
            .transfer(&token, &sender, &target, Amount::from(6u64))
            .await;

        assert!(matches!(result, Err(LedgerError::Reverted { .. })));
        assert_eq!(ledger.balance(&token, &sender), Amount::from(5u64));
        assert_eq!(ledger.attempts(), 1);
        assert!(ledger.settled().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let (token, sender, target) = (address('a'), address('1'), address('2'));
        let ledger = InMemoryLedger::new().with_balance(&token, &sender, Amount::from(100u64));
        ledger.fail_transfers_to(&target);
        ledger.fail_balance_of(&target);

        assert!(matches!(
            ledger.transfer(&token, &sender, &target, Amount::from(1u64)).await,
            Err(LedgerError::Rejected(_))
        ));
        assert!(ledger.balance_of(&token, &target).await.is_err());
        assert!(ledger.balance_of(&token, &sender).await.is_ok());
    }
}
