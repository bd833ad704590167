//! Per-run distribution ceiling
//!
//! The [`QuotaGuard`] tracks how much has been sent this run and decides, before
//! any side effect, whether the next amount may go out.
//!
//! Admission and accounting are separate steps:
//!
//! ```text
//! admit(amount) ──Admitted──▶ submit ──Sent──▶ commit(amount)
//!       │                        └──Failed──▶ (nothing to undo)
//!       └──Rejected──▶ latch: every later admit is Rejected
//! ```
//!
//! `admit` never mutates the running total, so a failed submission needs no
//! rollback. The first rejection latches the guard for the rest of the run.

use crate::types::Amount;

/// Result of asking to send an amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// May be submitted; `next_total` is what `commit` will record
    Admitted { next_total: Amount },
    /// Would reach the ceiling
    Rejected {
        /// Total sending would have produced, `None` once latched or on overflow
        would_be: Option<Amount>,
        /// Whether this rejection tripped the latch
        first: bool,
    },
}

/// Running total against a ceiling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaGuard {
    cumulative: Amount,
    ceiling: Amount,
    latched: bool,
}

impl QuotaGuard {
    pub fn new(ceiling: Amount) -> Self {
        Self {
            cumulative: Amount::ZERO,
            ceiling,
            latched: false,
        }
    }

    /// Check whether `amount` may be sent
    ///
    /// Rejected when `cumulative + amount >= ceiling`. Never changes the total.
    pub fn admit(&mut self, amount: Amount) -> Admission {
        if self.latched {
            return Admission::Rejected {
                would_be: None,
                first: false,
            };
        }

        match self.cumulative.checked_add(amount) {
            Some(next_total) if next_total < self.ceiling => Admission::Admitted { next_total },
            would_be => {
                self.latched = true;
                Admission::Rejected {
                    would_be,
                    first: true,
                }
            }
        }
    }

    /// Record a confirmed transfer of `amount`
    ///
    /// Call only after the submission admitted for `amount` came back `Sent`.
    pub fn commit(&mut self, amount: Amount) {
        debug_assert!(!self.latched, "commit after the quota latched");
        // admit guarantees this stays below the ceiling
        self.cumulative = self
            .cumulative
            .checked_add(amount)
            .unwrap_or(self.ceiling);
    }

    /// Total confirmed so far
    pub fn cumulative(&self) -> Amount {
        self.cumulative
    }

    pub fn ceiling(&self) -> Amount {
        self.ceiling
    }

    /// Whether the ceiling has been hit this run
    pub fn is_latched(&self) -> bool {
        self.latched
    }
}
