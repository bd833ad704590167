//! Rate-limited token distribution
//!
//! # Design
//!
//! Each record goes through four gates, and the first one that fails decides
//! its skip reason:
//!
//! ```text
//! validate ──▶ QuotaGuard::admit ──▶ TransferSubmitter::submit ──▶ commit
//!    │                │                        │
//!    ▼                ▼                        ▼
//! Malformed /    QuotaWouldBe-            SubmissionFailed
//! InvalidId /    Exceeded (latches)
//! BelowMinimum
//! ```
//!
//! The running total only moves on a confirmed transfer. Once the guard has
//! latched, later records are still validated so the skipped file shows the
//! most specific reason, but nothing else is sent.

use crate::config::AirdropSettings;
use crate::core::quota::{Admission, QuotaGuard};
use crate::core::submitter::{Submission, TransferSubmitter};
use crate::core::traits::Ledger;
use crate::core::validator::{validate, ValidationMode};
use crate::io::OutputLayout;
use crate::strategy::RecordStrategy;
use crate::types::{
    Accepted, Address, AirdropError, Classification, HaltMarker, RawRecord, SkipReason,
    SkippedRecord,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct AirdropStrategy<L: Ledger> {
    mode: ValidationMode,
    quota: QuotaGuard,
    submitter: TransferSubmitter<L>,
    decimals: u8,
    halt: Option<HaltMarker>,
}

impl<L: Ledger> AirdropStrategy<L> {
    /// # Arguments
    ///
    /// * `ledger` - Ledger transfers are submitted to
    /// * `settings` - Token, thresholds and decimals of the run
    /// * `sender` - Account the tokens leave from
    /// * `timeout` - Upper bound on each confirmation wait
    pub fn new(ledger: L, settings: &AirdropSettings, sender: Address, timeout: Duration) -> Self {
        Self {
            mode: ValidationMode::Transfer {
                decimals: settings.decimals,
                minimum: settings.minimum,
            },
            quota: QuotaGuard::new(settings.ceiling),
            submitter: TransferSubmitter::new(ledger, settings.token.clone(), sender, timeout),
            decimals: settings.decimals,
            halt: None,
        }
    }

    pub fn quota(&self) -> &QuotaGuard {
        &self.quota
    }
}

#[async_trait]
impl<L: Ledger> RecordStrategy for AirdropStrategy<L> {
    fn layout(&self) -> OutputLayout {
        OutputLayout::Transfer
    }

    async fn prepare(&mut self) -> Result<(), AirdropError> {
        let balance = self.submitter.sender_balance().await?;
        info!(
            token = %self.submitter.asset(),
            sender = %self.submitter.sender(),
            balance = %balance.format_units(self.decimals),
            ceiling = %self.quota.ceiling().format_units(self.decimals),
            "starting airdrop"
        );
        if balance < self.quota.ceiling() {
            warn!("sender balance is below the run ceiling, late transfers may revert");
        }
        Ok(())
    }

    async fn classify(&mut self, record: RawRecord) -> Classification {
        let candidate = match validate(&record, &self.mode) {
            Ok(candidate) => candidate,
            Err(reason) => return Classification::Skipped(SkippedRecord::raw(record, reason)),
        };

        if let Admission::Rejected { would_be, first } = self.quota.admit(candidate.amount) {
            if first {
                let marker = HaltMarker {
                    before: candidate.target.clone(),
                    would_be_total: would_be,
                };
                warn!("{}", marker);
                self.halt = Some(marker);
            }
            return Classification::Skipped(SkippedRecord::candidate(
                candidate,
                SkipReason::QuotaWouldBeExceeded,
            ));
        }

        match self
            .submitter
            .submit(&candidate.target, candidate.amount)
            .await
        {
            Submission::Sent(confirmation) => {
                self.quota.commit(candidate.amount);
                debug!(
                    recipient = %candidate.target,
                    tx_hash = %confirmation.tx_hash,
                    block = ?confirmation.block_number,
                    cumulative = %self.quota.cumulative(),
                    "transfer confirmed"
                );
                self.submitter.observe_balance(&candidate.target).await;
                Classification::Accepted(Accepted::Transfer(candidate))
            }
            Submission::Failed(error) => {
                warn!(recipient = %candidate.target, %error, "transfer failed");
                Classification::Skipped(SkippedRecord::candidate(
                    candidate,
                    SkipReason::SubmissionFailed,
                ))
            }
        }
    }

    fn halt_marker(&self) -> Option<&HaltMarker> {
        self.halt.as_ref()
    }
}
