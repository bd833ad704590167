//! Error types for the airdrop pipeline
//!
//! Only resource-level failures live here. Per-record failures are not errors:
//! they are [`SkipReason`](super::SkipReason) tags routed to the skipped sink.
//!
//! # Error Categories
//!
//! - **Configuration Errors**: missing credentials, zero asset address, bad thresholds
//! - **Source Errors**: the input file cannot be opened or read mid-stream
//! - **Sink Errors**: an output file cannot be created or written
//! - **Ledger Errors**: transport failures, RPC errors, reverts and timeouts

use thiserror::Error;

/// Fatal error for a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AirdropError {
    /// Configuration is missing or invalid
    ///
    /// Raised before any record is read.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the problem
        message: String,
    },

    /// The record source could not be opened or failed mid-stream
    #[error("Source read error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    SourceRead {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the read error
        message: String,
    },

    /// An output sink could not be created or written
    #[error("Sink write error ({sink}): {message}")]
    SinkWrite {
        /// Which sink failed ("accepted" or "skipped")
        sink: String,
        /// Description of the write error
        message: String,
    },

    /// A ledger call failed outside of per-record processing
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Error raised by a ledger capability
///
/// Inside the pipeline these are caught by the submitter and turned into
/// `SubmissionFailed` skips.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The endpoint could not be reached
    #[error("Ledger transport error: {0}")]
    Transport(String),

    /// The node answered with an error object
    #[error("Ledger RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// JSON-RPC error message
        message: String,
    },

    /// The transaction was included but reverted
    #[error("Transaction {tx_hash} reverted")]
    Reverted {
        /// Hash of the reverted transaction
        tx_hash: String,
    },

    /// The transfer was rejected before inclusion
    #[error("Transfer rejected: {0}")]
    Rejected(String),

    /// The node answered with something we could not decode
    #[error("Invalid ledger response: {0}")]
    InvalidResponse(String),

    /// Confirmation did not arrive in time
    #[error("Timed out after {secs}s waiting for confirmation")]
    Timeout {
        /// Configured timeout in seconds
        secs: u64,
    },
}

// csv_async is the reader side, so its errors are source errors
impl From<csv_async::Error> for AirdropError {
    fn from(error: csv_async::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        AirdropError::SourceRead {
            line,
            message: error.to_string(),
        }
    }
}

impl AirdropError {
    /// Create a Configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        AirdropError::Configuration {
            message: message.into(),
        }
    }

    /// Create a SourceRead error without a line number
    pub fn source_read(message: impl Into<String>) -> Self {
        AirdropError::SourceRead {
            line: None,
            message: message.into(),
        }
    }

    /// Create a SinkWrite error
    pub fn sink_write(sink: &str, message: impl Into<String>) -> Self {
        AirdropError::SinkWrite {
            sink: sink.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::configuration(
        AirdropError::configuration("Missing sender account"),
        "Configuration error: Missing sender account"
    )]
    #[case::source_read_with_line(
        AirdropError::SourceRead { line: Some(7), message: "invalid UTF-8".to_string() },
        "Source read error at line 7: invalid UTF-8"
    )]
    #[case::source_read_without_line(
        AirdropError::source_read("No such file"),
        "Source read error: No such file"
    )]
    #[case::sink_write(
        AirdropError::sink_write("skipped", "disk full"),
        "Sink write error (skipped): disk full"
    )]
    #[case::ledger_passthrough(
        AirdropError::Ledger(LedgerError::Timeout { secs: 30 }),
        "Timed out after 30s waiting for confirmation"
    )]
    fn test_error_display(#[case] error: AirdropError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::rpc(
        LedgerError::Rpc { code: -32000, message: "nonce too low".to_string() },
        "Ledger RPC error -32000: nonce too low"
    )]
    #[case::reverted(
        LedgerError::Reverted { tx_hash: "0xabc".to_string() },
        "Transaction 0xabc reverted"
    )]
    #[case::transport(
        LedgerError::Transport("connection refused".to_string()),
        "Ledger transport error: connection refused"
    )]
    fn test_ledger_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }
}
