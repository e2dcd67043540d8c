//! Transaction object and its lifecycle.

use crate::error::{CoreError, CoreResult};
use crate::snapshots::SlotHandle;
use crate::types::{Csn, Snapshot, Tid};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared handle to a transaction.
///
/// Held by the caller and, while the transaction is live, by the log's
/// running registry. The last holder frees it.
pub type TransactionRef = Arc<Transaction>;

/// Caller validation run right before the commit point.
///
/// Returning `Err(reason)` rejects the commit and leaves the transaction
/// running. Checks must not register further checks.
pub type PreCommitCheck = Box<dyn Fn(&Transaction) -> Result<(), String> + Send + Sync>;

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can record writes.
    Running,
    /// Pre-commit checks passed; the commit is in progress.
    Committing,
    /// Transaction has been committed.
    Committed,
    /// Rollback started; the log is deregistering it.
    RollingBack,
    /// Transaction has been rolled back.
    RolledBack,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Running => "running",
            Self::Committing => "committing",
            Self::Committed => "committed",
            Self::RollingBack => "rolling back",
            Self::RolledBack => "rolled back",
        };
        f.write_str(text)
    }
}

struct Inner {
    state: TransactionState,
    /// Names of the objects this transaction wrote, in first-write order.
    writes: Vec<String>,
}

/// A transaction tracked by the [`TransactionLog`](crate::TransactionLog).
///
/// Created by `begin_transaction`. The log drives the lifecycle hooks; the
/// caller records writes and registers pre-commit checks.
pub struct Transaction {
    tid: Tid,
    snapshot: Snapshot,
    snapshot_slot: SlotHandle,
    /// `UNKNOWN` until the commit point, then the CSN, or `ROLLED_BACK`.
    csn: AtomicU64,
    inner: Mutex<Inner>,
    checks: Mutex<Vec<PreCommitCheck>>,
}

impl Transaction {
    pub(crate) fn new(tid: Tid, snapshot: Snapshot, snapshot_slot: SlotHandle) -> Self {
        Self {
            tid,
            snapshot,
            snapshot_slot,
            csn: AtomicU64::new(Csn::UNKNOWN.as_u64()),
            inner: Mutex::new(Inner {
                state: TransactionState::Running,
                writes: Vec::new(),
            }),
            checks: Mutex::new(Vec::new()),
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn tid(&self) -> Tid {
        self.tid
    }

    /// Returns the read view this transaction began with.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.inner.lock().state
    }

    /// Returns the commit CSN.
    ///
    /// [`Csn::UNKNOWN`] before the commit point, [`Csn::ROLLED_BACK`] after a
    /// rollback. A read-only commit reports its own snapshot.
    #[must_use]
    pub fn csn(&self) -> Csn {
        Csn::new(self.csn.load(Ordering::Acquire))
    }

    /// Returns true if the transaction has recorded no writes.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.inner.lock().writes.is_empty()
    }

    /// Returns the names of the objects written so far.
    #[must_use]
    pub fn writes(&self) -> Vec<String> {
        self.inner.lock().writes.clone()
    }

    /// Records a write to `object`.
    ///
    /// Only allowed while running. Repeated writes to one object are
    /// recorded once.
    pub fn add_write(&self, object: impl Into<String>) -> CoreResult<()> {
        let mut inner = self.inner.lock();
        Self::ensure_running(self.tid, inner.state)?;
        let object = object.into();
        if !inner.writes.contains(&object) {
            inner.writes.push(object);
        }
        Ok(())
    }

    /// Registers a check run by `before_commit`.
    pub fn add_pre_commit_check<F>(&self, check: F) -> CoreResult<()>
    where
        F: Fn(&Transaction) -> Result<(), String> + Send + Sync + 'static,
    {
        Self::ensure_running(self.tid, self.state())?;
        self.checks.lock().push(Box::new(check));
        Ok(())
    }

    /// Human-readable summary for diagnostics.
    #[must_use]
    pub fn description(&self) -> String {
        let inner = self.inner.lock();
        if inner.writes.is_empty() {
            format!("{} read-only", self.tid)
        } else {
            format!("{} wrote [{}]", self.tid, inner.writes.join(", "))
        }
    }

    pub(crate) fn snapshot_slot(&self) -> SlotHandle {
        self.snapshot_slot
    }

    /// Runs the pre-commit checks and moves to `Committing`.
    ///
    /// A failing check leaves the transaction `Running`.
    pub(crate) fn before_commit(&self) -> CoreResult<()> {
        Self::ensure_running(self.tid, self.state())?;

        {
            let checks = self.checks.lock();
            for check in checks.iter() {
                check(self).map_err(|reason| CoreError::pre_commit_failed(self.tid, reason))?;
            }
        }

        let mut inner = self.inner.lock();
        Self::ensure_running(self.tid, inner.state)?;
        inner.state = TransactionState::Committing;
        Ok(())
    }

    /// Stamps the CSN at the commit point.
    ///
    /// Called under the commit lock. Returns false if a concurrent rollback
    /// got here first, in which case nothing is stamped.
    pub(crate) fn reach_commit_point(&self, csn: Csn) -> bool {
        let inner = self.inner.lock();
        if inner.state != TransactionState::Committing {
            return false;
        }
        self.csn.store(csn.as_u64(), Ordering::Release);
        true
    }

    /// Finalizes a commit with `csn`.
    pub(crate) fn after_commit(&self, csn: Csn) {
        let mut inner = self.inner.lock();
        debug_assert_eq!(inner.state, TransactionState::Committing);
        self.csn.store(csn.as_u64(), Ordering::Release);
        inner.state = TransactionState::Committed;
    }

    /// Starts a rollback.
    ///
    /// Returns true if the log must deregister the transaction. A
    /// transaction already past its commit point, or already rolled back,
    /// returns false and is left untouched.
    pub(crate) fn rollback(&self) -> bool {
        let mut inner = self.inner.lock();
        let past_commit_point = self.csn() != Csn::UNKNOWN;
        match inner.state {
            TransactionState::Running => {}
            TransactionState::Committing if !past_commit_point => {}
            _ => return false,
        }
        inner.state = TransactionState::RollingBack;
        true
    }

    /// Completes a rollback after deregistration.
    pub(crate) fn finish_rollback(&self) {
        let mut inner = self.inner.lock();
        self.csn.store(Csn::ROLLED_BACK.as_u64(), Ordering::Release);
        inner.state = TransactionState::RolledBack;
    }

    fn ensure_running(tid: Tid, state: TransactionState) -> CoreResult<()> {
        match state {
            TransactionState::Running => Ok(()),
            other => Err(CoreError::invalid_operation(format!(
                "transaction {tid} is {other}"
            ))),
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("tid", &self.tid)
            .field("snapshot", &self.snapshot)
            .field("state", &self.state())
            .field("csn", &self.csn())
            .finish_non_exhaustive()
    }
}
