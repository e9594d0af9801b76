//! The error taxonomy from spec §7. Parse errors and resolution failures
//! are intentionally *not* represented here: they are non-fatal, absorbed
//! at the pass boundary, logged via `tracing`, and reflected only in the
//! run summary's counters (see `cgraph-analyze::RunSummary`).

use thiserror::Error;

/// Fatal errors that propagate to the pipeline's caller (spec §7:
/// "Configuration and sink errors propagate to the caller. Internal
/// invariants abort the entire run.").
#[derive(Debug, Error)]
pub enum CgraphError {
    /// Invalid paths, missing grammar for a requested language, unreadable
    /// ignore file. The pipeline refuses to start.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Persistent I/O failure against the ingestor sink. Aborts the run
    /// after attempting a final flush of already-enqueued work.
    #[error("sink error: {0}")]
    Sink(String),

    /// Detected by assertions on the registry or AST shape; indicates a
    /// bug. Reported with the offending QN or file path.
    #[error("internal invariant violation at {location}: {detail}")]
    Internal { location: String, detail: String },
}

impl CgraphError {
    pub fn internal(location: impl Into<String>, detail: impl Into<String>) -> Self {
        CgraphError::Internal { location: location.into(), detail: detail.into() }
    }
}
