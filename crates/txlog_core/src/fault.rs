//! Unrecoverable-fault channel.
//!
//! Rollback must never fail observably, yet it can discover that the
//! registries disagree with the transaction it was handed. Such a fault is
//! delivered to a [`FaultHandler`] instead of being returned. The default
//! handler terminates the process; tests install one that records.

use crate::error::InvariantViolation;

/// Receives invariant violations that cannot be returned to the caller.
pub trait FaultHandler: Send + Sync {
    /// Called once per detected violation.
    fn on_fatal(&self, violation: &InvariantViolation);
}

/// Logs the violation and aborts the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct AbortOnFault;

impl FaultHandler for AbortOnFault {
    fn on_fatal(&self, violation: &InvariantViolation) {
        tracing::error!(
            tid = %violation.tid,
            hash = %violation.hash,
            "{violation}; aborting"
        );
        std::process::abort();
    }
}
