//! Pipeline driver
//!
//! Runs one strategy over one record source, routing every classification to
//! the sinks. Records are handled strictly in input order, one at a time.
//!
//! # State machine
//!
//! ```text
//! Idle ──run──▶ Running ──source exhausted──▶ Completed
//!                  │──cancellation token────▶ Cancelled
//!                  └──source/sink/prepare error──▶ Fatal
//! ```
//!
//! Hitting the run ceiling is not a terminal state: the remaining records are
//! still read and routed to the skipped sink. Sinks are flushed on every exit
//! path, and the summary built so far is always returned.

use crate::core::router::OutcomeRouter;
use crate::io::{OutputPaths, RecordSource, SinkPair};
use crate::strategy::RecordStrategy;
use crate::types::{AirdropError, Classification, RunSummary};
use chrono::Utc;
use futures::io::AsyncRead;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Fatal,
}

/// Final outcome of a run
#[derive(Debug)]
pub struct RunReport {
    pub state: RunState,
    pub summary: RunSummary,
    /// Set when the run ended in `Fatal`
    pub error: Option<AirdropError>,
}

impl RunReport {
    /// Only a run that read its whole input counts as a success
    pub fn is_success(&self) -> bool {
        self.state == RunState::Completed
    }
}

pub struct PipelineDriver<R: AsyncRead + Unpin + Send, W: Write> {
    strategy: Box<dyn RecordStrategy>,
    source: RecordSource<R>,
    router: OutcomeRouter<W>,
    summary: RunSummary,
    state: RunState,
    cancel: CancellationToken,
}

impl<R: AsyncRead + Unpin + Send, W: Write> PipelineDriver<R, W> {
    /// # Arguments
    ///
    /// * `strategy` - Per-record behaviour of the run mode
    /// * `source` - Input records
    /// * `router` - Accepted and skipped sinks
    /// * `cancel` - Checked between records
    pub fn new(
        strategy: Box<dyn RecordStrategy>,
        source: RecordSource<R>,
        router: OutcomeRouter<W>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            strategy,
            source,
            router,
            summary: RunSummary::new(),
            state: RunState::Idle,
            cancel,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Drive the run to a terminal state
    ///
    /// A driver runs once; calling this again returns an empty report in the
    /// same terminal state.
    pub async fn run(&mut self) -> RunReport {
        if self.state != RunState::Idle {
            return self.finish(self.state, None);
        }
        self.state = RunState::Running;

        if let Err(error) = self.strategy.prepare().await {
            return self.fail(error);
        }

        let outcome = self.drain().await;
        let flushed = self.router.flush();

        match (outcome, flushed) {
            (Ok(state), Ok(())) => self.finish(state, None),
            (Ok(_), Err(error)) => self.finish(RunState::Fatal, Some(error)),
            (Err(error), flushed) => {
                if let Err(flush_error) = flushed {
                    warn!(error = %flush_error, "failed to flush sinks after fatal error");
                }
                self.finish(RunState::Fatal, Some(error))
            }
        }
    }

    /// Give back the router, and with it the sink writers
    pub fn into_router(self) -> OutcomeRouter<W> {
        self.router
    }

    async fn drain(&mut self) -> Result<RunState, AirdropError> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(RunState::Cancelled);
            }

            let Some(record) = self.source.next_record().await? else {
                return Ok(RunState::Completed);
            };

            let line = record.line;
            let classification = self.strategy.classify(record).await;
            observe(line, &classification);
            self.router.route(classification, &mut self.summary)?;
        }
    }

    fn fail(&mut self, error: AirdropError) -> RunReport {
        if let Err(flush_error) = self.router.flush() {
            warn!(error = %flush_error, "failed to flush sinks after fatal error");
        }
        self.finish(RunState::Fatal, Some(error))
    }

    fn finish(&mut self, state: RunState, error: Option<AirdropError>) -> RunReport {
        self.state = state;
        self.summary.halted_early = self.strategy.halt_marker().cloned();
        let summary = std::mem::take(&mut self.summary);

        match (&state, &error) {
            (_, Some(error)) => error!(%error, records = summary.total(), "run failed"),
            (RunState::Cancelled, _) => warn!(records = summary.total(), "run cancelled"),
            _ => info!(
                sent = summary.sent.len(),
                skipped = summary.skipped.len(),
                "run completed"
            ),
        }

        RunReport {
            state,
            summary,
            error,
        }
    }
}

/// Log one classification event
fn observe(line: u64, classification: &Classification) {
    match classification {
        Classification::Accepted(accepted) => {
            info!(line, recipient = %accepted.target(), "accepted");
        }
        Classification::Skipped(skipped) => {
            info!(line, recipient = %skipped.identifier(), reason = %skipped.reason, "skipped");
        }
    }
}

/// Options for a file-to-file run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub delimiter: u8,
    pub output_dir: PathBuf,
    pub with_reasons: bool,
}

/// Run `strategy` over the file at `input`, writing timestamped output files
///
/// The input is opened before the output files are created, so a missing input
/// leaves nothing behind.
///
/// # Returns
///
/// The report together with the paths of the two output files.
///
/// # Errors
///
/// Returns `SourceRead` if the input cannot be opened and `SinkWrite` if the
/// output files cannot be created. Errors during the run are in the report.
pub async fn run_file(
    strategy: Box<dyn RecordStrategy>,
    input: &Path,
    options: &RunOptions,
    cancel: CancellationToken,
) -> Result<(RunReport, OutputPaths), AirdropError> {
    let source = RecordSource::open(input, options.delimiter).await?;

    let layout = strategy.layout();
    let paths = OutputPaths::new(&options.output_dir, layout, Utc::now());
    let sinks = SinkPair::create(&paths)?;
    info!(
        accepted = %paths.accepted.display(),
        skipped = %paths.skipped.display(),
        "writing outputs"
    );

    let router = OutcomeRouter::new(sinks, layout, options.with_reasons);
    let mut driver = PipelineDriver::new(strategy, source, router, cancel);
    let report = driver.run().await;

    Ok((report, paths))
}
