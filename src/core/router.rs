//! Outcome routing
//!
//! The [`OutcomeRouter`] writes each classified record to exactly one of the two
//! sinks and appends it to the matching list of the [`RunSummary`].

use crate::io::sink::{OutputLayout, SinkPair};
use crate::types::{AirdropError, Classification, RunSummary};
use std::io::Write;

pub struct OutcomeRouter<W: Write> {
    sinks: SinkPair<W>,
    layout: OutputLayout,
    with_reasons: bool,
}

impl<W: Write> OutcomeRouter<W> {
    /// # Arguments
    ///
    /// * `sinks` - Accepted and skipped writers
    /// * `layout` - Row layout of the active mode
    /// * `with_reasons` - Append the skip reason as a final column
    pub fn new(sinks: SinkPair<W>, layout: OutputLayout, with_reasons: bool) -> Self {
        Self {
            sinks,
            layout,
            with_reasons,
        }
    }

    /// Route one record
    ///
    /// The summary is updated only once the row has been written.
    pub fn route(
        &mut self,
        classification: Classification,
        summary: &mut RunSummary,
    ) -> Result<(), AirdropError> {
        match classification {
            Classification::Accepted(accepted) => {
                self.sinks.write_accepted(&accepted.fields())?;
                summary.sent.push(accepted);
            }
            Classification::Skipped(skipped) => {
                let mut fields = skipped.fields(self.layout.skipped_has_amount());
                if self.with_reasons {
                    fields.push(skipped.reason.to_string());
                }
                self.sinks.write_skipped(&fields)?;
                summary.skipped.push(skipped);
            }
        }
        Ok(())
    }

    /// Flush both sinks
    pub fn flush(&mut self) -> Result<(), AirdropError> {
        self.sinks.flush()
    }

    /// Flush and return the underlying writers
    pub fn into_inner(self) -> Result<(W, W), AirdropError> {
        self.sinks.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Accepted, Address, Amount, Candidate, RawRecord, SkipReason, SkippedRecord,
    };
    use rstest::rstest;

    const ADDR: &str = "0x1111111111111111111111111111111111111111";

    fn router(layout: OutputLayout, with_reasons: bool) -> OutcomeRouter<Vec<u8>> {
        OutcomeRouter::new(
            SinkPair::from_writers(Vec::new(), Vec::new()),
            layout,
            with_reasons,
        )
    }

    fn candidate(amount: u64) -> Candidate {
        Candidate {
            target: Address::parse(ADDR).unwrap(),
            amount: Amount::from(amount),
        }
    }

    fn outputs(router: OutcomeRouter<Vec<u8>>) -> (String, String) {
        let (accepted, skipped) = router.into_inner().unwrap();
        (
            String::from_utf8(accepted).unwrap(),
            String::from_utf8(skipped).unwrap(),
        )
    }

    #[test]
    fn test_each_record_lands_in_exactly_one_sink() {
        let mut router = router(OutputLayout::Transfer, false);
        let mut summary = RunSummary::new();

        router
            .route(
                Classification::Accepted(Accepted::Transfer(candidate(10))),
                &mut summary,
            )
            .unwrap();
        router
            .route(
                Classification::Skipped(SkippedRecord::candidate(
                    candidate(5),
                    SkipReason::QuotaWouldBeExceeded,
                )),
                &mut summary,
            )
            .unwrap();

        assert_eq!(summary.sent.len(), 1);
        assert_eq!(summary.skipped.len(), 1);

        let (accepted, skipped) = outputs(router);
        assert_eq!(accepted, format!("{},10\n", ADDR));
        assert_eq!(skipped, format!("{},5\n", ADDR));
    }

    #[rstest]
    #[case::transfer_without_reason(OutputLayout::Transfer, false, "bad,7\n")]
    #[case::transfer_with_reason(OutputLayout::Transfer, true, "bad,7,invalid_identifier\n")]
    #[case::validation_without_reason(OutputLayout::Validation, false, "bad\n")]
    #[case::validation_with_reason(OutputLayout::Validation, true, "bad,invalid_identifier\n")]
    fn test_skipped_layout(
        #[case] layout: OutputLayout,
        #[case] with_reasons: bool,
        #[case] expected: &str,
    ) {
        let mut router = router(layout, with_reasons);
        let mut summary = RunSummary::new();
        router
            .route(
                Classification::Skipped(SkippedRecord::raw(
                    RawRecord::new(1, vec!["bad".to_string(), "7".to_string()]),
                    SkipReason::InvalidIdentifier,
                )),
                &mut summary,
            )
            .unwrap();

        let (_, skipped) = outputs(router);
        assert_eq!(skipped, expected);
    }

    /// `,x` in validation mode echoes an empty identifier, not `""`
    #[test]
    fn test_empty_identifier_is_an_empty_line() {
        let mut router = router(OutputLayout::Validation, false);
        let mut summary = RunSummary::new();
        router
            .route(
                Classification::Skipped(SkippedRecord::raw(
                    RawRecord::new(1, vec![String::new(), "x".to_string()]),
                    SkipReason::InvalidIdentifier,
                )),
                &mut summary,
            )
            .unwrap();

        let (_, skipped) = outputs(router);
        assert_eq!(skipped, "\n");
    }

    #[test]
    fn test_balances_layout() {
        let mut router = router(OutputLayout::Balances, false);
        let mut summary = RunSummary::new();
        router
            .route(
                Classification::Accepted(Accepted::Balances {
                    target: Address::parse(ADDR).unwrap(),
                    balances: vec!["1.5".to_string(), "0.0".to_string()],
                }),
                &mut summary,
            )
            .unwrap();

        let (accepted, _) = outputs(router);
        assert_eq!(accepted, format!("{},1.5,0.0\n", ADDR));
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("disk full"))
        }
    }

    #[test]
    fn test_sink_failure_surfaces_on_flush() {
        let mut router = OutcomeRouter::new(
            SinkPair::from_writers(BrokenWriter, BrokenWriter),
            OutputLayout::Validation,
            false,
        );
        let mut summary = RunSummary::new();

        // csv buffers the row, so the error shows up at the latest on flush
        let routed = router.route(
            Classification::Accepted(Accepted::Valid(Address::parse(ADDR).unwrap())),
            &mut summary,
        );
        let flushed = router.flush();

        assert!(routed.is_err() || flushed.is_err());
        assert!(matches!(
            flushed,
            Err(AirdropError::SinkWrite { .. })
        ));
    }
}
