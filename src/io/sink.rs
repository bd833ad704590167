//! Output sinks and file naming
//!
//! Every run writes two CSV files side by side: one for accepted records and one
//! for skipped records. Rows are appended in arrival order and never rewritten.

use crate::types::AirdropError;
use chrono::{DateTime, Utc};
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Row layout and file naming for one pipeline mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// `identifier,amount` / `identifier,amount`
    Transfer,
    /// `identifier,balance1,balance2,...` / `identifier`
    Balances,
    /// `identifier` / `identifier`
    Validation,
}

impl OutputLayout {
    /// File name suffix of the accepted sink
    pub fn accepted_suffix(&self) -> &'static str {
        match self {
            OutputLayout::Transfer => "received",
            OutputLayout::Balances => "balances",
            OutputLayout::Validation => "valid",
        }
    }

    /// File name suffix of the skipped sink
    pub fn skipped_suffix(&self) -> &'static str {
        match self {
            OutputLayout::Transfer | OutputLayout::Balances => "skipped",
            OutputLayout::Validation => "invalid",
        }
    }

    /// Whether skipped rows carry an amount column
    pub fn skipped_has_amount(&self) -> bool {
        matches!(self, OutputLayout::Transfer)
    }
}

/// Paths of the two output files of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub accepted: PathBuf,
    pub skipped: PathBuf,
}

impl OutputPaths {
    /// `<dir>/<timestamp>_<suffix>.csv` for both sinks
    pub fn new(dir: &Path, layout: OutputLayout, now: DateTime<Utc>) -> Self {
        let stamp = timestamp_prefix(now);
        Self {
            accepted: dir.join(format!("{}_{}.csv", stamp, layout.accepted_suffix())),
            skipped: dir.join(format!("{}_{}.csv", stamp, layout.skipped_suffix())),
        }
    }
}

/// UTC timestamp used to prefix output files
pub fn timestamp_prefix(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d-%H-%M-%S").to_string()
}

/// The accepted and skipped CSV writers of one run
pub struct SinkPair<W: Write> {
    accepted: Writer<W>,
    skipped: Writer<W>,
}

impl SinkPair<File> {
    /// Create both files, and the output directory if needed
    ///
    /// # Errors
    ///
    /// Returns `SinkWrite` if the directory or either file cannot be created.
    pub fn create(paths: &OutputPaths) -> Result<Self, AirdropError> {
        for path in [&paths.accepted, &paths.skipped] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AirdropError::sink_write(
                        "output",
                        format!("Failed to create '{}': {}", parent.display(), e),
                    )
                })?;
            }
        }

        let open = |sink: &str, path: &Path| {
            File::create(path).map_err(|e| {
                AirdropError::sink_write(
                    sink,
                    format!("Failed to create '{}': {}", path.display(), e),
                )
            })
        };

        Ok(Self::from_writers(
            open("accepted", &paths.accepted)?,
            open("skipped", &paths.skipped)?,
        ))
    }
}

impl<W: Write> SinkPair<W> {
    pub fn from_writers(accepted: W, skipped: W) -> Self {
        Self {
            accepted: writer(accepted),
            skipped: writer(skipped),
        }
    }

    /// Append one row to the accepted sink
    pub fn write_accepted(&mut self, fields: &[String]) -> Result<(), AirdropError> {
        write_row(&mut self.accepted, fields)
            .map_err(|e| AirdropError::sink_write("accepted", e))
    }

    /// Append one row to the skipped sink
    pub fn write_skipped(&mut self, fields: &[String]) -> Result<(), AirdropError> {
        write_row(&mut self.skipped, fields)
            .map_err(|e| AirdropError::sink_write("skipped", e))
    }

    /// Flush both sinks
    ///
    /// Both are attempted even if the first fails; the first error is returned.
    pub fn flush(&mut self) -> Result<(), AirdropError> {
        let accepted = self
            .accepted
            .flush()
            .map_err(|e| AirdropError::sink_write("accepted", e.to_string()));
        let skipped = self
            .skipped
            .flush()
            .map_err(|e| AirdropError::sink_write("skipped", e.to_string()));
        accepted.and(skipped)
    }

    /// Flush and hand back the underlying writers
    pub fn into_inner(self) -> Result<(W, W), AirdropError> {
        let accepted = self
            .accepted
            .into_inner()
            .map_err(|e| AirdropError::sink_write("accepted", e.to_string()))?;
        let skipped = self
            .skipped
            .into_inner()
            .map_err(|e| AirdropError::sink_write("skipped", e.to_string()))?;
        Ok((accepted, skipped))
    }
}

/// Write one record, echoing a lone empty field as an empty line
///
/// The csv writer quotes a single empty field as `""` so the row stays
/// readable as a record; the outputs mirror the input text instead.
fn write_row<W: Write>(writer: &mut Writer<W>, fields: &[String]) -> Result<(), String> {
    if let [only] = fields {
        if only.is_empty() {
            writer.flush().map_err(|e| e.to_string())?;
            return writer.get_mut().write_all(b"\n").map_err(|e| e.to_string());
        }
    }
    writer.write_record(fields).map_err(|e| e.to_string())
}

fn writer<W: Write>(inner: W) -> Writer<W> {
    WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(inner)
}
