//! I/O module
//!
//! Handles streaming CSV input and the two per-run CSV outputs.
//!
//! # Components
//!
//! - `record_source` - Streaming reader yielding one raw record at a time
//! - `sink` - Accepted/skipped CSV writers, output layouts and file naming

pub mod record_source;
pub mod sink;

pub use record_source::RecordSource;
pub use sink::{timestamp_prefix, OutputLayout, OutputPaths, SinkPair};
