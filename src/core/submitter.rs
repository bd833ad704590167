//! Transfer submission
//!
//! The [`TransferSubmitter`] moves tokens from the single configured sender and
//! waits for the ledger's verdict. Every ledger failure, including a missed
//! confirmation deadline, comes back as [`Submission::Failed`]; nothing is
//! retried and nothing propagates to the driver.

use crate::core::traits::{Confirmation, Ledger};
use crate::types::{Address, Amount, LedgerError};
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of one transfer attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Sent(Confirmation),
    Failed(LedgerError),
}

pub struct TransferSubmitter<L: Ledger> {
    ledger: L,
    asset: Address,
    sender: Address,
    timeout: Duration,
}

impl<L: Ledger> TransferSubmitter<L> {
    /// # Arguments
    ///
    /// * `ledger` - Ledger capability to submit through
    /// * `asset` - Token contract being distributed
    /// * `sender` - Account the tokens leave from
    /// * `timeout` - Upper bound on the wait for confirmation
    pub fn new(ledger: L, asset: Address, sender: Address, timeout: Duration) -> Self {
        Self {
            ledger,
            asset,
            sender,
            timeout,
        }
    }

    /// Transfer `amount` to `target` and wait for confirmation
    pub async fn submit(&self, target: &Address, amount: Amount) -> Submission {
        let transfer = self
            .ledger
            .transfer(&self.asset, &self.sender, target, amount);

        match tokio::time::timeout(self.timeout, transfer).await {
            Ok(Ok(confirmation)) => Submission::Sent(confirmation),
            Ok(Err(error)) => Submission::Failed(error),
            Err(_) => Submission::Failed(LedgerError::Timeout {
                secs: self.timeout.as_secs(),
            }),
        }
    }

    /// Read and log `target`'s balance after a transfer
    ///
    /// Best effort: a failed read is logged and reported as `None`.
    pub async fn observe_balance(&self, target: &Address) -> Option<Amount> {
        let query = self.ledger.balance_of(&self.asset, target);
        match tokio::time::timeout(self.timeout, query).await {
            Ok(Ok(balance)) => {
                info!(recipient = %target, %balance, "post-transfer balance");
                Some(balance)
            }
            Ok(Err(error)) => {
                warn!(recipient = %target, %error, "failed to read post-transfer balance");
                None
            }
            Err(_) => {
                warn!(recipient = %target, "timed out reading post-transfer balance");
                None
            }
        }
    }

    /// Balance of the sender account
    pub async fn sender_balance(&self) -> Result<Amount, LedgerError> {
        self.ledger.balance_of(&self.asset, &self.sender).await
    }

    pub fn asset(&self) -> &Address {
        &self.asset
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use async_trait::async_trait;
    use std::sync::Arc;

    fn address(digit: char) -> Address {
        Address::parse(&format!("0x{}", digit.to_string().repeat(40))).unwrap()
    }

    fn submitter(ledger: Arc<InMemoryLedger>) -> TransferSubmitter<Arc<InMemoryLedger>> {
        TransferSubmitter::new(ledger, address('a'), address('1'), Duration::from_secs(5))
    }

    /// Never confirms
    struct StalledLedger;

    #[async_trait]
    impl Ledger for StalledLedger {
        async fn balance_of(&self, _: &Address, _: &Address) -> Result<Amount, LedgerError> {
            std::future::pending().await
        }

        async fn transfer(
            &self,
            _: &Address,
            _: &Address,
            _: &Address,
            _: Amount,
        ) -> Result<Confirmation, LedgerError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_successful_submission() {
        let ledger = Arc::new(InMemoryLedger::new().with_balance(
            &address('a'),
            &address('1'),
            Amount::from(100u64),
        ));
        let submitter = submitter(Arc::clone(&ledger));

        let result = submitter.submit(&address('2'), Amount::from(40u64)).await;

        assert!(matches!(result, Submission::Sent(_)));
        assert_eq!(
            submitter.observe_balance(&address('2')).await,
            Some(Amount::from(40u64))
        );
        assert_eq!(submitter.sender_balance().await.unwrap(), Amount::from(60u64));
    }

    #[tokio::test]
    async fn test_ledger_error_becomes_failed() {
        let ledger = Arc::new(InMemoryLedger::new());
        let submitter = submitter(Arc::clone(&ledger));

        // sender has no balance, the transfer reverts
        let result = submitter.submit(&address('2'), Amount::from(1u64)).await;

        assert!(matches!(
            result,
            Submission::Failed(LedgerError::Reverted { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_balance_read_is_none() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.fail_balance_of(&address('2'));

        assert_eq!(submitter(ledger).observe_balance(&address('2')).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmation_timeout_becomes_failed() {
        let submitter = TransferSubmitter::new(
            StalledLedger,
            address('a'),
            address('1'),
            Duration::from_secs(120),
        );

        let result = submitter.submit(&address('2'), Amount::from(1u64)).await;

        assert_eq!(
            result,
            Submission::Failed(LedgerError::Timeout { secs: 120 })
        );
        assert_eq!(submitter.observe_balance(&address('2')).await, None);
    }

    #[test]
    fn test_outcomes_and_errors_are_eq() {
        fn is_eq<T: Eq>() {}
        is_eq::<Submission>();
        is_eq::<LedgerError>();
        is_eq::<crate::types::AirdropError>();
    }
}
