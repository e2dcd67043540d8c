//! Test fixtures and log helpers.

use parking_lot::Mutex;
use std::sync::Arc;
use txlog_core::{
    CoreResult, Csn, FaultHandler, InvariantViolation, LogConfig, TransactionLog,
    TransactionRef,
};
use uuid::Uuid;

/// Host id used by [`deterministic_log`].
pub const DETERMINISTIC_HOST: Uuid = Uuid::from_bytes([0x7a; 16]);

/// Fault handler that records violations instead of aborting.
#[derive(Debug, Default)]
pub struct RecordingFaultHandler {
    faults: Mutex<Vec<InvariantViolation>>,
}

impl RecordingFaultHandler {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every violation recorded so far.
    pub fn faults(&self) -> Vec<InvariantViolation> {
        self.faults.lock().clone()
    }

    /// Number of recorded violations.
    pub fn len(&self) -> usize {
        self.faults.lock().len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.faults.lock().is_empty()
    }
}

impl FaultHandler for RecordingFaultHandler {
    fn on_fatal(&self, violation: &InvariantViolation) {
        self.faults.lock().push(violation.clone());
    }
}

/// Creates a log whose rollback faults are recorded rather than fatal.
pub fn recording_log() -> (TransactionLog, Arc<RecordingFaultHandler>) {
    let recorder = Arc::new(RecordingFaultHandler::new());
    let config = LogConfig::new().fault_handler(recorder.clone());
    (TransactionLog::new(config), recorder)
}

/// Creates a recording log with a fixed host id, for reproducible TIDs.
pub fn deterministic_log() -> (TransactionLog, Arc<RecordingFaultHandler>) {
    let recorder = Arc::new(RecordingFaultHandler::new());
    let config = LogConfig::new()
        .host_id(DETERMINISTIC_HOST)
        .fault_handler(recorder.clone());
    (TransactionLog::new(config), recorder)
}

/// Begins a transaction, writes `object` and commits it.
pub fn commit_write(log: &TransactionLog, object: &str) -> CoreResult<(TransactionRef, Csn)> {
    let txn = log.begin_transaction()?;
    txn.add_write(object)?;
    let csn = log.commit_transaction(&txn)?;
    Ok((txn, csn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_log_starts_clean() {
        let (log, faults) = recording_log();
        assert_eq!(log.running_count(), 0);
        assert!(faults.is_empty());
    }

    #[test]
    fn deterministic_log_uses_fixed_host() {
        let (a, _) = deterministic_log();
        let (b, _) = deterministic_log();
        let ta = a.begin_transaction().unwrap();
        let tb = b.begin_transaction().unwrap();
        assert_eq!(ta.tid(), tb.tid());
    }

    #[test]
    fn commit_write_records_csn() {
        let (log, _) = recording_log();
        let (txn, csn) = commit_write(&log, "part").unwrap();
        assert_eq!(log.get_csn(&txn.tid()), csn);
        assert_eq!(log.latest_snapshot(), csn);
    }
}
