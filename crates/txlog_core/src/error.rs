//! Error types for the transaction log.
//!
//! Two tiers exist. [`InvariantViolation`] means the log's bookkeeping has
//! diverged from reality and nothing it reports can be trusted any more.
//! Everything else in [`CoreError`] is an ordinary failure of one
//! transaction. Lookup misses are not errors at all.

use crate::types::{Tid, TidHash};
use std::fmt;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in transaction log operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Operation not permitted in the transaction's current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// A pre-commit check rejected the transaction. It is still running.
    #[error("pre-commit check failed for transaction {tid}: {reason}")]
    PreCommitFailed {
        /// The rejected transaction.
        tid: Tid,
        /// Reason given by the check.
        reason: String,
    },

    /// Internal bookkeeping diverged. Fatal.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl CoreError {
    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a pre-commit failure.
    pub fn pre_commit_failed(tid: Tid, reason: impl Into<String>) -> Self {
        Self::PreCommitFailed {
            tid,
            reason: reason.into(),
        }
    }

    /// Returns true if the error signals a broken invariant.
    ///
    /// Callers must treat these as a fatal system condition rather than a
    /// failure of the transaction they were working on.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Invariant(_))
    }

    /// Returns the invariant violation, if this is one.
    #[must_use]
    pub fn as_invariant(&self) -> Option<&InvariantViolation> {
        match self {
            Self::Invariant(violation) => Some(violation),
            _ => None,
        }
    }
}

/// Which piece of bookkeeping diverged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// A TID hash was already present in the running registry.
    DuplicateRunning,
    /// A TID hash was already present in the committed map.
    DuplicateCommitted,
    /// A TID expected in the running registry was absent.
    MissingRunning,
    /// A snapshot slot expected in the in-use registry was absent.
    MissingSnapshot,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::DuplicateRunning => "already running",
            Self::DuplicateCommitted => "already committed",
            Self::MissingRunning => "not running",
            Self::MissingSnapshot => "has no snapshot in use",
        };
        f.write_str(text)
    }
}

/// The transaction log's internal state no longer matches reality.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("it's a bug: TID {hash} {tid} {kind}")]
pub struct InvariantViolation {
    /// What went wrong.
    pub kind: ViolationKind,
    /// Hash of the affected TID.
    pub hash: TidHash,
    /// The affected TID.
    pub tid: Tid,
}

impl InvariantViolation {
    /// Creates a violation for `tid`.
    #[must_use]
    pub fn new(kind: ViolationKind, tid: Tid) -> Self {
        Self {
            kind,
            hash: tid.tid_hash(),
            tid,
        }
    }
}
