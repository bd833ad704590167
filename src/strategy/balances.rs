//! Read-only balance lookup
//!
//! Every valid address gets one row with its balance in each configured asset,
//! formatted with that asset's decimals. If any lookup fails the address is
//! skipped with `BalanceLookupFailed` instead of getting a partial row.

use crate::config::Asset;
use crate::core::traits::Ledger;
use crate::core::validator::{validate, ValidationMode};
use crate::io::OutputLayout;
use crate::strategy::RecordStrategy;
use crate::types::{
    Accepted, AirdropError, Classification, RawRecord, SkipReason, SkippedRecord,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

pub struct BalanceStrategy<L: Ledger> {
    ledger: L,
    assets: Vec<Asset>,
    timeout: Duration,
}

impl<L: Ledger> BalanceStrategy<L> {
    /// # Arguments
    ///
    /// * `ledger` - Ledger balances are read from
    /// * `assets` - Assets to query, in output column order
    /// * `timeout` - Upper bound on each balance query
    pub fn new(ledger: L, assets: Vec<Asset>, timeout: Duration) -> Self {
        Self {
            ledger,
            assets,
            timeout,
        }
    }
}

#[async_trait]
impl<L: Ledger> RecordStrategy for BalanceStrategy<L> {
    fn layout(&self) -> OutputLayout {
        OutputLayout::Balances
    }

    async fn prepare(&mut self) -> Result<(), AirdropError> {
        let symbols: Vec<&str> = self.assets.iter().map(|a| a.symbol.as_str()).collect();
        info!(assets = %symbols.join(","), "starting balance lookup");
        Ok(())
    }

    async fn classify(&mut self, record: RawRecord) -> Classification {
        let candidate = match validate(&record, &ValidationMode::AddressOnly) {
            Ok(candidate) => candidate,
            Err(reason) => return Classification::Skipped(SkippedRecord::raw(record, reason)),
        };

        let mut balances = Vec::with_capacity(self.assets.len());
        for asset in &self.assets {
            let query = self.ledger.balance_of(&asset.address, &candidate.target);
            match tokio::time::timeout(self.timeout, query).await {
                Ok(Ok(balance)) => balances.push(balance.format_units(asset.decimals)),
                Ok(Err(error)) => {
                    warn!(recipient = %candidate.target, asset = %asset.symbol, %error, "balance lookup failed");
                    return Classification::Skipped(SkippedRecord::candidate(
                        candidate,
                        SkipReason::BalanceLookupFailed,
                    ));
                }
                Err(_) => {
                    warn!(recipient = %candidate.target, asset = %asset.symbol, "balance lookup timed out");
                    return Classification::Skipped(SkippedRecord::candidate(
                        candidate,
                        SkipReason::BalanceLookupFailed,
                    ));
                }
            }
        }

        Classification::Accepted(Accepted::Balances {
            target: candidate.target,
            balances,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use crate::types::{Address, Amount};
    use std::sync::Arc;

    fn address(digit: char) -> Address {
        Address::parse(&format!("0x{}", digit.to_string().repeat(40))).unwrap()
    }

    fn assets() -> Vec<Asset> {
        vec![
            Asset {
                symbol: "TKN".to_string(),
                address: address('a'),
                decimals: 18,
            },
            Asset {
                symbol: "USD".to_string(),
                address: address('b'),
                decimals: 6,
            },
        ]
    }

    fn row(fields: &[&str]) -> RawRecord {
        RawRecord::new(1, fields.iter().map(|f| f.to_string()).collect())
    }

    #[tokio::test]
    async fn test_one_column_per_asset() {
        let ledger = InMemoryLedger::new()
            .with_balance(
                &address('a'),
                &address('1'),
                Amount::from(1_500_000_000_000_000_000u128),
            )
            .with_balance(&address('b'), &address('1'), Amount::from(250_000u64));
        let mut strategy = BalanceStrategy::new(ledger, assets(), Duration::from_secs(5));

        let classification = strategy.classify(row(&[&address('1').to_string()])).await;

        assert_eq!(
            classification,
            Classification::Accepted(Accepted::Balances {
                target: address('1'),
                balances: vec!["1.5".to_string(), "0.25".to_string()],
            })
        );
    }

    #[tokio::test]
    async fn test_unknown_holder_has_zero_balances() {
        let mut strategy =
            BalanceStrategy::new(InMemoryLedger::new(), assets(), Duration::from_secs(5));

        let classification = strategy.classify(row(&[&address('2').to_string()])).await;

        match classification {
            Classification::Accepted(accepted) => {
                assert_eq!(accepted.fields(), vec![address('2').to_string(), "0.0".to_string(), "0.0".to_string()]);
            }
            other => panic!("expected accepted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_lookup_skips_the_address() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.fail_balance_of(&address('3'));
        let mut strategy = BalanceStrategy::new(ledger, assets(), Duration::from_secs(5));

        let classification = strategy.classify(row(&[&address('3').to_string()])).await;

        match classification {
            Classification::Skipped(skipped) => {
                assert_eq!(skipped.reason, SkipReason::BalanceLookupFailed);
                assert_eq!(skipped.identifier(), address('3').to_string());
            }
            other => panic!("expected skipped, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_rows_are_skipped() {
        let mut strategy =
            BalanceStrategy::new(InMemoryLedger::new(), assets(), Duration::from_secs(5));

        let bad = strategy.classify(row(&["0x123"])).await;
        let extra = strategy
            .classify(row(&[&address('1').to_string(), "5"]))
            .await;

        assert!(matches!(
            bad,
            Classification::Skipped(SkippedRecord { reason: SkipReason::InvalidIdentifier, .. })
        ));
        assert!(matches!(
            extra,
            Classification::Skipped(SkippedRecord { reason: SkipReason::MalformedRecord, .. })
        ));
    }
}
