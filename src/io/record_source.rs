//! Streaming record source
//!
//! Turns a byte stream of delimited rows into [`RawRecord`]s, one row at a time.
//!
//! # Design
//!
//! The RecordSource uses:
//! - csv-async for streaming CSV parsing
//! - tokio's file handle through the futures compatibility layer
//!
//! ```text
//! File → Compat → csv_async::AsyncReader → RecordSource → RawRecord
//! ```
//!
//! There is no header row, and rows with any number of columns are forwarded:
//! rejecting a wrong column count is the validator's job. Only read and decoding
//! failures surface as errors.

use crate::types::{AirdropError, RawRecord};
use csv_async::{AsyncReaderBuilder, StringRecord, Trim};
use futures::io::AsyncRead;
use std::path::Path;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

/// Lazy, non-restartable sequence of input rows
pub struct RecordSource<R: AsyncRead + Unpin + Send> {
    reader: csv_async::AsyncReader<R>,
    record: StringRecord,
    rows_read: u64,
}

impl RecordSource<Compat<tokio::fs::File>> {
    /// Open a file for streaming
    ///
    /// # Errors
    ///
    /// Returns `SourceRead` if the file cannot be opened.
    pub async fn open(path: &Path, delimiter: u8) -> Result<Self, AirdropError> {
        let file = tokio::fs::File::open(path).await.map_err(|e| {
            AirdropError::source_read(format!(
                "Failed to open file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(Self::from_reader(file.compat(), delimiter))
    }
}

impl<R: AsyncRead + Unpin + Send> RecordSource<R> {
    /// Wrap an async reader
    pub fn from_reader(reader: R, delimiter: u8) -> Self {
        let reader = AsyncReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(delimiter)
            .create_reader(reader);

        Self {
            reader,
            record: StringRecord::new(),
            rows_read: 0,
        }
    }

    /// Read the next row
    ///
    /// Returns `Ok(None)` once the input is exhausted.
    pub async fn next_record(&mut self) -> Result<Option<RawRecord>, AirdropError> {
        if !self.reader.read_record(&mut self.record).await? {
            return Ok(None);
        }

        self.rows_read += 1;
        let line = self
            .record
            .position()
            .map(|pos| pos.line())
            .unwrap_or(self.rows_read);
        let fields = self.record.iter().map(str::to_string).collect();

        Ok(Some(RawRecord::new(line, fields)))
    }

    /// Rows yielded so far
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }
}
