//! Replays generated operations against a log and checks its invariants.

use crate::fixtures::{recording_log, RecordingFaultHandler};
use crate::generators::LogOperation;
use std::sync::Arc;
use txlog_core::{CoreError, Csn, TransactionLog, TransactionRef, TransactionState};

/// Drives a [`TransactionLog`] and verifies it against a simple model.
///
/// Every method returns `Err(description)` on the first broken property.
pub struct ModelChecker {
    log: TransactionLog,
    faults: Arc<RecordingFaultHandler>,
    /// Live transactions, in begin order.
    live: Vec<TransactionRef>,
    /// Concluded transactions with their expected `get_csn` result.
    concluded: Vec<(TransactionRef, Csn)>,
    /// Last CSN issued to a write commit.
    last_csn: Csn,
}

impl ModelChecker {
    /// Creates a checker over a fresh recording log.
    pub fn new() -> Self {
        let (log, faults) = recording_log();
        Self {
            log,
            faults,
            live: Vec::new(),
            concluded: Vec::new(),
            last_csn: Csn::MAX_RESERVED,
        }
    }

    /// Returns the log under test.
    pub fn log(&self) -> &TransactionLog {
        &self.log
    }

    /// Number of live transactions in the model.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Runs every operation, checking invariants after each one.
    pub fn run(&mut self, ops: &[LogOperation]) -> Result<(), String> {
        for op in ops {
            self.apply(op)?;
            self.check_invariants()?;
        }
        Ok(())
    }

    /// Applies one operation. Operations that target an empty set are skipped.
    pub fn apply(&mut self, op: &LogOperation) -> Result<(), String> {
        match op {
            LogOperation::Begin => {
                let txn = self.log.begin_transaction().map_err(|e| e.to_string())?;
                if txn.snapshot() != self.last_csn {
                    return Err(format!(
                        "begin got snapshot {} but latest commit is {}",
                        txn.snapshot(),
                        self.last_csn
                    ));
                }
                self.live.push(txn);
            }
            LogOperation::Write { target, object } => {
                if let Some(txn) = self.pick_live(target) {
                    txn.add_write(format!("part_{object}"))
                        .map_err(|e| e.to_string())?;
                }
            }
            LogOperation::Commit { target } => {
                if self.live.is_empty() {
                    return Ok(());
                }
                let txn = self.live.remove(target.index(self.live.len()));
                let read_only = txn.is_read_only();
                let csn = self.log.commit_transaction(&txn).map_err(|e| e.to_string())?;

                if read_only {
                    if csn != txn.snapshot() {
                        return Err(format!(
                            "read-only commit returned {csn}, expected its snapshot {}",
                            txn.snapshot()
                        ));
                    }
                    self.concluded.push((txn, Csn::UNKNOWN));
                } else {
                    if csn <= self.last_csn {
                        return Err(format!("CSN {csn} not above previous {}", self.last_csn));
                    }
                    self.last_csn = csn;
                    self.concluded.push((txn, csn));
                }
            }
            LogOperation::RejectedCommit { target } => {
                if let Some(txn) = self.pick_live(target) {
                    txn.add_pre_commit_check(|_| Err("rejected by model".to_string()))
                        .map_err(|e| e.to_string())?;
                    match self.log.commit_transaction(&txn) {
                        Err(CoreError::PreCommitFailed { .. }) => {}
                        other => return Err(format!("expected pre-commit failure, got {other:?}")),
                    }
                    if txn.state() != TransactionState::Running {
                        return Err(format!("rejected transaction is {}", txn.state()));
                    }
                    // A rejected transaction can only be rolled back.
                    self.live.retain(|t| !Arc::ptr_eq(t, &txn));
                    self.log.rollback_transaction(&txn);
                    self.concluded.push((txn, Csn::UNKNOWN));
                }
            }
            LogOperation::Rollback { target } => {
                if self.live.is_empty() {
                    return Ok(());
                }
                let txn = self.live.remove(target.index(self.live.len()));
                self.log.rollback_transaction(&txn);
                if txn.state() != TransactionState::RolledBack {
                    return Err(format!("rolled back transaction is {}", txn.state()));
                }
                self.concluded.push((txn, Csn::UNKNOWN));
            }
            LogOperation::StaleRollback { target } => {
                if self.concluded.is_empty() {
                    return Ok(());
                }
                let (txn, _) = &self.concluded[target.index(self.concluded.len())];
                let before = txn.state();
                let running = self.log.running_count();
                self.log.rollback_transaction(txn);
                if txn.state() != before || self.log.running_count() != running {
                    return Err(format!("rollback of concluded {} changed state", txn.tid()));
                }
            }
        }
        Ok(())
    }

    /// Checks every invariant against the current state.
    pub fn check_invariants(&self) -> Result<(), String> {
        let log = &self.log;

        if !self.faults.is_empty() {
            return Err(format!("faults reported: {:?}", self.faults.faults()));
        }

        let running = log.running_transactions();
        let snapshots = log.snapshots_in_use();
        if running.len() != self.live.len() || snapshots.len() != self.live.len() {
            return Err(format!(
                "model has {} live, log has {} running and {} snapshots",
                self.live.len(),
                running.len(),
                snapshots.len()
            ));
        }

        let mut expected: Vec<_> = self.live.iter().map(|t| t.snapshot()).collect();
        expected.sort();
        if snapshots != expected {
            return Err(format!("snapshots {snapshots:?} != running snapshots {expected:?}"));
        }

        for txn in &self.live {
            if log.try_get_running_transaction(txn.tid().tid_hash()).is_none() {
                return Err(format!("live transaction {} not running", txn.tid()));
            }
        }

        let oldest = log.oldest_snapshot();
        match self.live.iter().map(|t| t.snapshot()).min() {
            Some(min) if oldest != min => {
                return Err(format!("oldest snapshot {oldest} != minimum live {min}"));
            }
            None if oldest != log.latest_snapshot() => {
                return Err(format!(
                    "oldest snapshot {oldest} != latest {} with nothing running",
                    log.latest_snapshot()
                ));
            }
            _ => {}
        }

        if log.latest_snapshot() != self.last_csn {
            return Err(format!(
                "latest snapshot {} != last CSN {}",
                log.latest_snapshot(),
                self.last_csn
            ));
        }

        for (txn, csn) in &self.concluded {
            let actual = log.get_csn(&txn.tid());
            if actual != *csn {
                return Err(format!("get_csn({}) = {actual}, expected {csn}", txn.tid()));
            }
            if log.try_get_running_transaction(txn.tid().tid_hash()).is_some() {
                return Err(format!("concluded transaction {} still running", txn.tid()));
            }
        }

        Ok(())
    }

    fn pick_live(&self, target: &proptest::sample::Index) -> Option<TransactionRef> {
        if self.live.is_empty() {
            None
        } else {
            Some(Arc::clone(&self.live[target.index(self.live.len())]))
        }
    }
}

impl Default for ModelChecker {
    fn default() -> Self {
        Self::new()
    }
}
