//! Transaction log statistics.
//!
//! # Usage
//!
//! ```rust
//! use txlog_core::TransactionLog;
//!
//! let log = TransactionLog::default();
//! let txn = log.begin_transaction().unwrap();
//! log.rollback_transaction(&txn);
//!
//! let stats = log.stats().snapshot();
//! assert_eq!(stats.transactions_started, 1);
//! assert_eq!(stats.transactions_rolled_back, 1);
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Transaction log counters.
///
/// All counters are atomic and monotonically increasing. They are updated
/// with `Relaxed` ordering and carry no synchronization.
#[derive(Debug, Default)]
pub struct TransactionStats {
    /// Transactions begun.
    transactions_started: AtomicU64,
    /// Write transactions that passed the commit point.
    transactions_committed: AtomicU64,
    /// Read-only transactions closed by commit.
    transactions_read_only: AtomicU64,
    /// Transactions deregistered by rollback.
    transactions_rolled_back: AtomicU64,
    /// Commits rejected by a pre-commit check.
    pre_commit_failures: AtomicU64,
    /// Invariant violations detected.
    invariant_violations: AtomicU64,
}

impl TransactionStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_start(&self) {
        self.transactions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit(&self) {
        self.transactions_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read_only(&self) {
        self.transactions_read_only.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rollback(&self) {
        self.transactions_rolled_back.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_pre_commit_failure(&self) {
        self.pre_commit_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invariant_violation(&self) {
        self.invariant_violations.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of transactions begun.
    pub fn transactions_started(&self) -> u64 {
        self.transactions_started.load(Ordering::Relaxed)
    }

    /// Returns the number of committed write transactions.
    pub fn transactions_committed(&self) -> u64 {
        self.transactions_committed.load(Ordering::Relaxed)
    }

    /// Returns the number of read-only transactions closed by commit.
    pub fn transactions_read_only(&self) -> u64 {
        self.transactions_read_only.load(Ordering::Relaxed)
    }

    /// Returns the number of rolled back transactions.
    pub fn transactions_rolled_back(&self) -> u64 {
        self.transactions_rolled_back.load(Ordering::Relaxed)
    }

    /// Returns the number of commits rejected before the commit point.
    pub fn pre_commit_failures(&self) -> u64 {
        self.pre_commit_failures.load(Ordering::Relaxed)
    }

    /// Returns the number of invariant violations detected.
    ///
    /// Anything other than zero means the process should not be trusted.
    pub fn invariant_violations(&self) -> u64 {
        self.invariant_violations.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            transactions_started: self.transactions_started(),
            transactions_committed: self.transactions_committed(),
            transactions_read_only: self.transactions_read_only(),
            transactions_rolled_back: self.transactions_rolled_back(),
            pre_commit_failures: self.pre_commit_failures(),
            invariant_violations: self.invariant_violations(),
        }
    }
}

/// A point-in-time copy of [`TransactionStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    /// Transactions begun.
    pub transactions_started: u64,
    /// Committed write transactions.
    pub transactions_committed: u64,
    /// Read-only transactions closed by commit.
    pub transactions_read_only: u64,
    /// Rolled back transactions.
    pub transactions_rolled_back: u64,
    /// Commits rejected by a pre-commit check.
    pub pre_commit_failures: u64,
    /// Invariant violations detected.
    pub invariant_violations: u64,
}

impl StatsSnapshot {
    /// Transactions begun but not yet concluded when the snapshot was taken.
    ///
    /// Approximate: counters are read one at a time.
    pub fn in_flight(&self) -> u64 {
        self.transactions_started.saturating_sub(
            self.transactions_committed
                + self.transactions_read_only
                + self.transactions_rolled_back,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = TransactionStats::new();
        assert_eq!(stats.transactions_started(), 0);
        assert_eq!(stats.transactions_committed(), 0);
        assert_eq!(stats.invariant_violations(), 0);
    }

    #[test]
    fn record_transactions() {
        let stats = TransactionStats::new();

        stats.record_start();
        stats.record_start();
        stats.record_start();
        stats.record_commit();
        stats.record_read_only();

        let snap = stats.snapshot();
        assert_eq!(snap.transactions_started, 3);
        assert_eq!(snap.transactions_committed, 1);
        assert_eq!(snap.transactions_read_only, 1);
        assert_eq!(snap.in_flight(), 1);
    }

    #[test]
    fn concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(TransactionStats::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let s = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    s.record_start();
                    s.record_rollback();
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(stats.transactions_started(), 1000);
        assert_eq!(stats.transactions_rolled_back(), 1000);
    }
}
