//! Transaction log.

use crate::config::LogConfig;
use crate::error::{CoreError, CoreResult, InvariantViolation, ViolationKind};
use crate::snapshots::SnapshotList;
use crate::stats::TransactionStats;
use crate::transaction::state::{Transaction, TransactionRef};
use crate::types::{Csn, LocalTid, Snapshot, Tid, TidHash};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Transactions currently in flight.
///
/// The map and the snapshot list are guarded together: an entry is added
/// to or removed from both in one critical section.
#[derive(Default)]
struct RunningRegistry {
    running: HashMap<TidHash, TransactionRef>,
    snapshots: SnapshotList,
}

/// Commit history, guarded by the commit lock.
struct CommitRegistry {
    /// Last CSN issued.
    csn_counter: u64,
    tid_to_csn: HashMap<TidHash, Csn>,
}

/// Assigns commit sequence numbers and tracks live transactions.
///
/// The transaction log provides:
/// - Snapshot assignment at begin (one atomic load)
/// - A single serialization point for write commits
/// - CSN lookup by TID for visibility checks
/// - The oldest snapshot still in use (the reclamation horizon)
///
/// ## Locks
///
/// Two locks, never nested in each other: the running-registry lock guards
/// the running map and the snapshots-in-use list; the commit lock guards the
/// CSN counter and the committed-TID map.
///
/// ## Memory ordering
///
/// CSN allocation and the committed-map insert happen under the commit lock,
/// so they are totally ordered with every other commit and every `get_csn`.
/// `latest_snapshot` is stored with `Release` while the commit lock is held
/// and loaded with `Acquire` without any lock. A reader racing a commit may
/// see the previous value; beginning at an older committed snapshot is still
/// a consistent read view, only a more conservative one.
///
/// A log is created once and shared by reference or `Arc`; nothing is
/// persisted and there is no global instance.
pub struct TransactionLog {
    config: LogConfig,
    /// Most recent committed CSN.
    latest_snapshot: AtomicU64,
    /// Last local TID issued.
    local_tid_counter: AtomicU64,
    running: Mutex<RunningRegistry>,
    commit: Mutex<CommitRegistry>,
    stats: TransactionStats,
}

impl TransactionLog {
    /// Creates a new transaction log.
    pub fn new(config: LogConfig) -> Self {
        Self {
            config,
            latest_snapshot: AtomicU64::new(Csn::MAX_RESERVED.as_u64()),
            local_tid_counter: AtomicU64::new(LocalTid::MAX_RESERVED.as_u64()),
            running: Mutex::new(RunningRegistry::default()),
            commit: Mutex::new(CommitRegistry {
                csn_counter: Csn::MAX_RESERVED.as_u64(),
                tid_to_csn: HashMap::new(),
            }),
            stats: TransactionStats::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Returns the process instance id embedded in every TID.
    pub fn host_id(&self) -> Uuid {
        self.config.host_id
    }

    /// Returns the counters.
    pub fn stats(&self) -> &TransactionStats {
        &self.stats
    }

    /// Returns the most recent committed CSN.
    pub fn latest_snapshot(&self) -> Snapshot {
        Csn::new(self.latest_snapshot.load(Ordering::Acquire))
    }

    /// Begins a new transaction.
    ///
    /// The snapshot is frozen here. The transaction is visible to
    /// `try_get_running_transaction` and `oldest_snapshot` as soon as this
    /// returns.
    ///
    /// # Errors
    ///
    /// A TID hash that is already running is an invariant violation.
    pub fn begin_transaction(&self) -> CoreResult<TransactionRef> {
        let txn = {
            let mut registry = self.running.lock();
            let snapshot = self.latest_snapshot();
            let local_tid = LocalTid::new(1 + self.local_tid_counter.fetch_add(1, Ordering::Relaxed));
            let tid = Tid::new(snapshot, local_tid, self.config.host_id);
            let hash = tid.tid_hash();

            if registry.running.contains_key(&hash) {
                drop(registry);
                return Err(self.violation(ViolationKind::DuplicateRunning, tid));
            }

            let slot = registry.snapshots.push_back(snapshot);
            let txn = Arc::new(Transaction::new(tid, snapshot, slot));
            registry.running.insert(hash, Arc::clone(&txn));
            txn
        };

        self.stats.record_start();
        tracing::trace!(tid = %txn.tid(), hash = %txn.tid().tid_hash(), "beginning transaction");
        Ok(txn)
    }

    /// Commits a transaction and returns its CSN.
    ///
    /// A read-only transaction gets its own snapshot back; nothing is
    /// allocated or recorded for it.
    ///
    /// # Errors
    ///
    /// - `PreCommitFailed` or `InvalidOperation` from the pre-commit hook:
    ///   the transaction is still running and should be rolled back.
    /// - `Invariant`: bookkeeping diverged; treat as fatal.
    pub fn commit_transaction(&self, txn: &Transaction) -> CoreResult<Csn> {
        if let Err(err) = txn.before_commit() {
            if matches!(err, CoreError::PreCommitFailed { .. }) {
                self.stats.record_pre_commit_failure();
            }
            return Err(err);
        }

        let tid = txn.tid();
        let new_csn = if txn.is_read_only() {
            tracing::trace!(%tid, "closing read-only transaction");
            let csn = txn.snapshot();
            if !txn.reach_commit_point(csn) {
                return Err(rolled_back_during_commit(tid));
            }
            self.stats.record_read_only();
            csn
        } else {
            tracing::debug!(%tid, description = %txn.description(), "committing transaction");
            let csn = self.commit_point(txn)?;
            self.stats.record_commit();
            csn
        };

        tracing::debug!(%tid, csn = new_csn.as_u64(), "transaction committed");

        txn.after_commit(new_csn);
        self.deregister(txn)?;
        Ok(new_csn)
    }

    /// Allocates the CSN, records it and publishes it, all under the commit lock.
    fn commit_point(&self, txn: &Transaction) -> CoreResult<Csn> {
        let tid = txn.tid();
        let hash = tid.tid_hash();
        let mut commit = self.commit.lock();

        if commit.tid_to_csn.contains_key(&hash) {
            drop(commit);
            return Err(self.violation(ViolationKind::DuplicateCommitted, tid));
        }

        let csn = Csn::new(commit.csn_counter + 1);
        if !txn.reach_commit_point(csn) {
            return Err(rolled_back_during_commit(tid));
        }

        commit.csn_counter = csn.as_u64();
        commit.tid_to_csn.insert(hash, csn);
        self.latest_snapshot.store(csn.as_u64(), Ordering::Release);
        Ok(csn)
    }

    /// Rolls back a transaction.
    ///
    /// Never fails. A transaction already committed or rolled back is left
    /// alone. If the registries have lost track of the transaction, the
    /// violation goes to the configured fault handler, which by default
    /// aborts the process.
    pub fn rollback_transaction(&self, txn: &Transaction) {
        tracing::trace!(tid = %txn.tid(), "rolling back transaction");
        if !txn.rollback() {
            return;
        }

        if let Err(err) = self.deregister(txn) {
            if let Some(violation) = err.as_invariant() {
                self.config.fault_handler.on_fatal(violation);
            }
        }
        txn.finish_rollback();
        self.stats.record_rollback();
    }

    /// Runs `f` in a new transaction.
    ///
    /// Commits if `f` returns `Ok`, rolls back otherwise. A failed commit is
    /// rolled back as well. Returns the closure's value and the commit CSN.
    pub fn with_transaction<F, T>(&self, f: F) -> CoreResult<(T, Csn)>
    where
        F: FnOnce(&Transaction) -> CoreResult<T>,
    {
        let txn = self.begin_transaction()?;
        let value = match f(&txn) {
            Ok(value) => value,
            Err(err) => {
                self.rollback_transaction(&txn);
                return Err(err);
            }
        };
        match self.commit_transaction(&txn) {
            Ok(csn) => Ok((value, csn)),
            Err(err) => {
                self.rollback_transaction(&txn);
                Err(err)
            }
        }
    }

    /// Returns the commit CSN of `tid`.
    ///
    /// [`Csn::PREHISTORIC`] for the prehistoric TID, [`Csn::UNKNOWN`] if the
    /// TID never committed a write (it may still be running).
    ///
    /// # Panics
    ///
    /// Panics if `tid` is [`Tid::EMPTY`].
    pub fn get_csn(&self, tid: &Tid) -> Csn {
        assert!(!tid.is_empty(), "get_csn called with the empty TID");
        self.get_csn_by_hash(tid.tid_hash())
    }

    /// Returns the commit CSN of the TID with hash `hash`.
    ///
    /// # Panics
    ///
    /// Panics if `hash` is zero or the hash of [`Tid::EMPTY`].
    pub fn get_csn_by_hash(&self, hash: TidHash) -> Csn {
        assert!(hash.as_u64() != 0, "get_csn called with a zero TID hash");
        assert!(
            hash != Tid::EMPTY.tid_hash(),
            "get_csn called with the empty TID"
        );
        if hash == Tid::PREHISTORIC.tid_hash() {
            return Csn::PREHISTORIC;
        }

        self.commit
            .lock()
            .tid_to_csn
            .get(&hash)
            .copied()
            .unwrap_or(Csn::UNKNOWN)
    }

    /// Returns the oldest snapshot held by a running transaction.
    ///
    /// When nothing is running this is the latest snapshot. Versions
    /// superseded before this point are invisible to every live reader.
    pub fn oldest_snapshot(&self) -> Snapshot {
        let registry = self.running.lock();
        registry
            .snapshots
            .front()
            .unwrap_or_else(|| self.latest_snapshot())
    }

    /// Looks up a running transaction by TID hash.
    pub fn try_get_running_transaction(&self, hash: TidHash) -> Option<TransactionRef> {
        self.running.lock().running.get(&hash).cloned()
    }

    /// Returns the number of running transactions.
    #[must_use]
    pub fn running_count(&self) -> usize {
        self.running.lock().running.len()
    }

    /// Returns the number of entries in the committed-TID map.
    ///
    /// The map only grows for the lifetime of the log.
    #[must_use]
    pub fn committed_count(&self) -> usize {
        self.commit.lock().tid_to_csn.len()
    }

    /// Returns the running transactions, oldest first.
    pub fn running_transactions(&self) -> Vec<TransactionRef> {
        let mut running: Vec<_> = self.running.lock().running.values().cloned().collect();
        running.sort_by_key(|txn| txn.tid().local_tid);
        running
    }

    /// Returns the in-use snapshots, oldest first.
    pub fn snapshots_in_use(&self) -> Vec<Snapshot> {
        self.running.lock().snapshots.iter().collect()
    }

    /// Removes `txn` from the running map and the snapshot list together.
    fn deregister(&self, txn: &Transaction) -> CoreResult<()> {
        let tid = txn.tid();
        let kind = {
            let mut registry = self.running.lock();
            if registry.running.remove(&tid.tid_hash()).is_none() {
                Some(ViolationKind::MissingRunning)
            } else if registry.snapshots.remove(txn.snapshot_slot()).is_none() {
                Some(ViolationKind::MissingSnapshot)
            } else {
                None
            }
        };

        match kind {
            Some(kind) => Err(self.violation(kind, tid)),
            None => Ok(()),
        }
    }

    fn violation(&self, kind: ViolationKind, tid: Tid) -> CoreError {
        let violation = InvariantViolation::new(kind, tid);
        self.stats.record_invariant_violation();
        tracing::error!(%tid, hash = %violation.hash, "{violation}");
        violation.into()
    }
}

fn rolled_back_during_commit(tid: Tid) -> CoreError {
    CoreError::invalid_operation(format!(
        "transaction {tid} was rolled back during commit"
    ))
}

impl Default for TransactionLog {
    fn default() -> Self {
        Self::new(LogConfig::default())
    }
}

impl std::fmt::Debug for TransactionLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionLog")
            .field("host_id", &self.config.host_id)
            .field("latest_snapshot", &self.latest_snapshot())
            .field("oldest_snapshot", &self.oldest_snapshot())
            .field("running_count", &self.running_count())
            .field("committed_count", &self.committed_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvariantViolation;
    use crate::fault::FaultHandler;
    use crate::transaction::TransactionState;
    use std::thread;

    #[derive(Default)]
    struct Recorder {
        faults: Mutex<Vec<InvariantViolation>>,
    }

    impl FaultHandler for Recorder {
        fn on_fatal(&self, violation: &InvariantViolation) {
            self.faults.lock().push(violation.clone());
        }
    }

    fn create_log() -> TransactionLog {
        TransactionLog::default()
    }

    fn create_recording_log() -> (TransactionLog, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let config = LogConfig::new().fault_handler(recorder.clone());
        (TransactionLog::new(config), recorder)
    }

    fn write_txn(log: &TransactionLog) -> TransactionRef {
        let txn = log.begin_transaction().unwrap();
        txn.add_write("part").unwrap();
        txn
    }

    #[test]
    fn fresh_log_starts_at_reserved_ceiling() {
        let log = create_log();
        assert_eq!(log.latest_snapshot(), Csn::MAX_RESERVED);
        assert_eq!(log.oldest_snapshot(), Csn::MAX_RESERVED);
        assert_eq!(log.running_count(), 0);
    }

    #[test]
    fn begin_registers_transaction() {
        let log = create_log();
        let txn = log.begin_transaction().unwrap();

        assert_eq!(txn.snapshot(), Csn::MAX_RESERVED);
        assert_eq!(txn.tid().start_csn, Csn::MAX_RESERVED);
        assert_eq!(txn.tid().local_tid, LocalTid::new(3));
        assert_eq!(txn.tid().host_id, log.host_id());
        assert_eq!(log.running_count(), 1);

        let found = log.try_get_running_transaction(txn.tid().tid_hash()).unwrap();
        assert!(Arc::ptr_eq(&found, &txn));
    }

    #[test]
    fn local_tids_increase() {
        let log = create_log();
        let a = log.begin_transaction().unwrap();
        let b = log.begin_transaction().unwrap();
        assert!(b.tid().local_tid > a.tid().local_tid);
    }

    #[test]
    fn first_write_commit_gets_first_issued_csn() {
        let log = create_log();
        let txn = write_txn(&log);
        let csn = log.commit_transaction(&txn).unwrap();

        assert_eq!(csn, Csn::new(3));
        assert_eq!(log.get_csn(&txn.tid()), csn);
        assert_eq!(log.latest_snapshot(), csn);
        assert_eq!(txn.state(), TransactionState::Committed);
        assert_eq!(log.running_count(), 0);
        assert!(log.try_get_running_transaction(txn.tid().tid_hash()).is_none());
    }

    #[test]
    fn csns_strictly_increase() {
        let log = create_log();
        let mut last = Csn::MAX_RESERVED;
        for _ in 0..20 {
            let txn = write_txn(&log);
            let csn = log.commit_transaction(&txn).unwrap();
            assert!(csn > last);
            last = csn;
        }
        assert_eq!(log.committed_count(), 20);
    }

    #[test]
    fn read_only_commit_echoes_snapshot() {
        let log = create_log();
        let writer = write_txn(&log);
        let committed = log.commit_transaction(&writer).unwrap();

        let reader = log.begin_transaction().unwrap();
        let csn = log.commit_transaction(&reader).unwrap();

        assert_eq!(csn, reader.snapshot());
        assert_eq!(csn, committed);
        assert_eq!(log.get_csn(&reader.tid()), Csn::UNKNOWN);
        assert_eq!(log.latest_snapshot(), committed);
        assert_eq!(log.committed_count(), 1);
        assert_eq!(log.running_count(), 0);
    }

    #[test]
    fn failed_pre_commit_check_leaves_transaction_running() {
        let log = create_log();
        let txn = write_txn(&log);
        txn.add_pre_commit_check(|_| Err("conflict".to_string()))
            .unwrap();

        let err = log.commit_transaction(&txn).unwrap_err();
        assert!(matches!(err, CoreError::PreCommitFailed { .. }));
        assert!(!err.is_fatal());
        assert_eq!(txn.state(), TransactionState::Running);
        assert_eq!(log.running_count(), 1);
        assert_eq!(log.latest_snapshot(), Csn::MAX_RESERVED);

        log.rollback_transaction(&txn);
        assert_eq!(log.running_count(), 0);
        assert_eq!(log.stats().pre_commit_failures(), 1);
    }

    #[test]
    fn cannot_commit_twice() {
        let log = create_log();
        let txn = write_txn(&log);
        log.commit_transaction(&txn).unwrap();

        let err = log.commit_transaction(&txn).unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation { .. }));
        assert_eq!(log.committed_count(), 1);
    }

    #[test]
    fn rollback_deregisters() {
        let log = create_log();
        let txn = write_txn(&log);
        log.rollback_transaction(&txn);

        assert_eq!(txn.state(), TransactionState::RolledBack);
        assert_eq!(txn.csn(), Csn::ROLLED_BACK);
        assert_eq!(log.running_count(), 0);
        assert_eq!(log.get_csn(&txn.tid()), Csn::UNKNOWN);
        assert!(log.snapshots_in_use().is_empty());
    }

    #[test]
    fn rollback_after_commit_is_noop() {
        let (log, recorder) = create_recording_log();
        let txn = write_txn(&log);
        let csn = log.commit_transaction(&txn).unwrap();
        let other = log.begin_transaction().unwrap();

        log.rollback_transaction(&txn);
        log.rollback_transaction(&txn);

        assert_eq!(txn.state(), TransactionState::Committed);
        assert_eq!(log.get_csn(&txn.tid()), csn);
        assert_eq!(log.running_count(), 1);
        assert!(log.try_get_running_transaction(other.tid().tid_hash()).is_some());
        assert!(recorder.faults.lock().is_empty());
        assert_eq!(log.stats().transactions_rolled_back(), 0);
    }

    #[test]
    fn double_rollback_is_noop() {
        let (log, recorder) = create_recording_log();
        let txn = log.begin_transaction().unwrap();
        log.rollback_transaction(&txn);
        log.rollback_transaction(&txn);

        assert!(recorder.faults.lock().is_empty());
        assert_eq!(log.stats().transactions_rolled_back(), 1);
    }

    #[test]
    fn oldest_snapshot_tracks_running_transactions() {
        let log = create_log();

        let t1 = write_txn(&log);
        let csn1 = log.commit_transaction(&t1).unwrap();

        let t2 = log.begin_transaction().unwrap();
        let t4 = write_txn(&log);
        let csn2 = log.commit_transaction(&t4).unwrap();
        let t3 = log.begin_transaction().unwrap();

        assert_eq!(t2.snapshot(), csn1);
        assert_eq!(t3.snapshot(), csn2);
        assert_eq!(log.oldest_snapshot(), csn1);

        log.rollback_transaction(&t2);
        assert_eq!(log.oldest_snapshot(), csn2);

        log.commit_transaction(&t3).unwrap();
        assert_eq!(log.oldest_snapshot(), log.latest_snapshot());
    }

    #[test]
    fn prehistoric_tid_is_always_visible() {
        let log = create_log();
        assert_eq!(log.get_csn(&Tid::PREHISTORIC), Csn::PREHISTORIC);
    }

    #[test]
    #[should_panic(expected = "empty TID")]
    fn empty_tid_lookup_panics() {
        let log = create_log();
        log.get_csn(&Tid::EMPTY);
    }

    #[test]
    #[should_panic(expected = "zero TID hash")]
    fn zero_hash_lookup_panics() {
        let log = create_log();
        log.get_csn_by_hash(TidHash(0));
    }

    #[test]
    fn unknown_tid_yields_unknown_csn() {
        let log = create_log();
        let tid = Tid::new(Csn::new(9), LocalTid::new(9), Uuid::new_v4());
        assert_eq!(log.get_csn(&tid), Csn::UNKNOWN);
    }

    #[test]
    fn duplicate_running_hash_is_detected() {
        let log = create_log();
        let txn = log.begin_transaction().unwrap();

        // Rewind the counter so the next begin produces the same TID.
        log.local_tid_counter
            .store(txn.tid().local_tid.as_u64() - 1, Ordering::Relaxed);
        let err = log.begin_transaction().unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(
            err.as_invariant().map(|v| v.kind),
            Some(ViolationKind::DuplicateRunning)
        );
        assert_eq!(log.running_count(), 1);
        assert_eq!(log.snapshots_in_use().len(), 1);
        assert_eq!(log.stats().invariant_violations(), 1);
    }

    #[test]
    fn duplicate_committed_hash_is_detected() {
        let log = create_log();
        let txn = write_txn(&log);
        log.commit
            .lock()
            .tid_to_csn
            .insert(txn.tid().tid_hash(), Csn::new(100));

        let err = log.commit_transaction(&txn).unwrap_err();
        assert_eq!(
            err.as_invariant().map(|v| v.kind),
            Some(ViolationKind::DuplicateCommitted)
        );
        assert_eq!(log.latest_snapshot(), Csn::MAX_RESERVED);
    }

    #[test]
    fn commit_of_unregistered_transaction_is_detected() {
        let log = create_log();
        let txn = write_txn(&log);
        log.running.lock().running.remove(&txn.tid().tid_hash());

        let err = log.commit_transaction(&txn).unwrap_err();
        assert_eq!(
            err.as_invariant().map(|v| v.kind),
            Some(ViolationKind::MissingRunning)
        );
    }

    #[test]
    fn rollback_of_unregistered_transaction_reaches_fault_handler() {
        let (log, recorder) = create_recording_log();
        let txn = log.begin_transaction().unwrap();
        log.running.lock().running.remove(&txn.tid().tid_hash());

        log.rollback_transaction(&txn);

        let faults = recorder.faults.lock();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].kind, ViolationKind::MissingRunning);
        assert_eq!(faults[0].tid, txn.tid());
    }

    #[test]
    fn rollback_with_missing_snapshot_reaches_fault_handler() {
        let (log, recorder) = create_recording_log();
        let txn = log.begin_transaction().unwrap();
        log.running.lock().snapshots.remove(txn.snapshot_slot());

        log.rollback_transaction(&txn);

        let faults = recorder.faults.lock();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].kind, ViolationKind::MissingSnapshot);
    }

    #[test]
    fn with_transaction_commits_on_ok() {
        let log = create_log();
        let (value, csn) = log
            .with_transaction(|txn| {
                txn.add_write("part")?;
                Ok(42)
            })
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(csn, log.latest_snapshot());
        assert_eq!(log.running_count(), 0);
    }

    #[test]
    fn with_transaction_rolls_back_on_err() {
        let log = create_log();
        let result: CoreResult<((), Csn)> = log.with_transaction(|txn| {
            txn.add_write("part")?;
            Err(CoreError::invalid_operation("intentional"))
        });

        assert!(result.is_err());
        assert_eq!(log.running_count(), 0);
        assert_eq!(log.committed_count(), 0);
        assert_eq!(log.stats().transactions_rolled_back(), 1);
    }

    #[test]
    fn with_transaction_rolls_back_failed_commit() {
        let log = create_log();
        let result = log.with_transaction(|txn| {
            txn.add_write("part")?;
            txn.add_pre_commit_check(|_| Err("rejected".to_string()))?;
            Ok(())
        });

        assert!(matches!(result, Err(CoreError::PreCommitFailed { .. })));
        assert_eq!(log.running_count(), 0);
    }

    #[test]
    fn running_transactions_sorted_by_begin() {
        let log = create_log();
        let a = log.begin_transaction().unwrap();
        let b = log.begin_transaction().unwrap();
        let c = log.begin_transaction().unwrap();
        log.rollback_transaction(&b);

        let running: Vec<_> = log.running_transactions().iter().map(|t| t.tid()).collect();
        assert_eq!(running, vec![a.tid(), c.tid()]);
    }

    #[test]
    fn concurrent_commits_get_distinct_csns() {
        let log = Arc::new(create_log());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    let mut csns = Vec::new();
                    for _ in 0..100 {
                        let txn = write_txn(&log);
                        csns.push((txn.tid(), log.commit_transaction(&txn).unwrap()));
                    }
                    csns
                })
            })
            .collect();

        let mut all = Vec::new();
        for handle in handles {
            let csns = handle.join().unwrap();
            // Commits issued by one thread are ordered.
            assert!(csns.windows(2).all(|w| w[0].1 < w[1].1));
            all.extend(csns);
        }

        let mut values: Vec<_> = all.iter().map(|(_, csn)| *csn).collect();
        values.sort();
        values.dedup();
        assert_eq!(values.len(), 800);
        assert_eq!(log.latest_snapshot(), Csn::new(2 + 800));
        for (tid, csn) in all {
            assert_eq!(log.get_csn(&tid), csn);
        }
        assert_eq!(log.running_count(), 0);
        assert!(log.snapshots_in_use().is_empty());
    }
}
