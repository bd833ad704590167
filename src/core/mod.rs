//! Core business logic module
//!
//! This module contains the pipeline components:
//! - `traits` - The ledger capability the pipeline talks to
//! - `validator` - Pure record validation
//! - `quota` - Per-run ceiling with separate admit and commit steps
//! - `submitter` - Transfer submission with a bounded confirmation wait
//! - `router` - Routing of classified records to the two sinks
//! - `driver` - Run state machine and file-to-file runs

pub mod driver;
pub mod quota;
pub mod router;
pub mod submitter;
pub mod traits;
pub mod validator;

pub use driver::{run_file, PipelineDriver, RunOptions, RunReport, RunState};
pub use quota::{Admission, QuotaGuard};
pub use router::OutcomeRouter;
pub use submitter::{Submission, TransferSubmitter};
pub use traits::{Confirmation, Ledger};
pub use validator::{validate, ValidationMode};
