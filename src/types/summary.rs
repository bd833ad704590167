//! End-of-run summary
//!
//! Built one record at a time by the pipeline driver; it reflects every record
//! read so far even when the run ends in a fatal error.

use super::record::{Accepted, HaltMarker, SkipReason, SkippedRecord};
use std::collections::BTreeMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records written to the accepted sink, in input order
    pub sent: Vec<Accepted>,
    /// Records written to the skipped sink, in input order
    pub skipped: Vec<SkippedRecord>,
    /// Set once, when the ceiling would first have been crossed
    pub halted_early: Option<HaltMarker>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records read so far
    pub fn total(&self) -> usize {
        self.sent.len() + self.skipped.len()
    }

    /// Skipped record count per reason
    pub fn skip_counts(&self) -> BTreeMap<SkipReason, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.skipped {
            *counts.entry(record.reason).or_insert(0) += 1;
        }
        counts
    }

    /// Human-readable report for the console
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Accepted: {}", self.sent.len());
        for accepted in &self.sent {
            let _ = writeln!(out, "  {}", accepted.fields().join(","));
        }

        let _ = writeln!(out, "Skipped: {}", self.skipped.len());
        for (reason, count) in self.skip_counts() {
            let _ = writeln!(out, "  {}: {}", reason, count);
        }
        for skipped in &self.skipped {
            let _ = writeln!(out, "  {} ({})", skipped.identifier(), skipped.reason);
        }

        match &self.halted_early {
            Some(marker) => {
                let _ = writeln!(out, "{}", marker);
            }
            None => {
                let _ = writeln!(out, "Completed the whole list!");
            }
        }
        out
    }
}
