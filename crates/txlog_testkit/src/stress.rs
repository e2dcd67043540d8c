//! Stress tests for the transaction log.
//!
//! These workloads run begin/commit/rollback from many threads at once and
//! verify the ordering and bookkeeping guarantees afterwards.

use rand::Rng;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use txlog_core::{Csn, StatsSnapshot, TransactionLog};

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of worker threads.
    pub threads: usize,
    /// Transactions begun by each worker.
    pub transactions_per_thread: usize,
    /// Fraction of transactions that record a write.
    pub write_ratio: f64,
    /// Fraction of transactions that are rolled back instead of committed.
    pub rollback_ratio: f64,
    /// Threads that only poll the snapshot horizon while workers run.
    pub observers: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            transactions_per_thread: 1_000,
            write_ratio: 0.5,
            rollback_ratio: 0.2,
            observers: 1,
        }
    }
}

/// Result of a stress test run.
#[derive(Debug, Clone, Serialize)]
pub struct StressTestResult {
    /// Write transactions committed.
    pub committed: usize,
    /// Read-only transactions committed.
    pub read_only: usize,
    /// Transactions rolled back.
    pub rolled_back: usize,
    /// Operations that returned an error.
    pub failed: usize,
    /// Ordering or bookkeeping violations observed.
    pub violations: Vec<String>,
    /// Total duration.
    pub duration: Duration,
    /// Transactions per second.
    pub transactions_per_second: f64,
    /// Latest snapshot after the run.
    pub latest_snapshot: Csn,
    /// Oldest snapshot after the run.
    pub oldest_snapshot: Csn,
    /// Log counters after the run.
    pub stats: StatsSnapshot,
}

impl StressTestResult {
    /// Returns true if nothing failed and no violation was observed.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.violations.is_empty()
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Committed (write): {}", self.committed);
        println!("Committed (read-only): {}", self.read_only);
        println!("Rolled back: {}", self.rolled_back);
        println!("Failed: {}", self.failed);
        println!("Violations: {}", self.violations.len());
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} txn/sec", self.transactions_per_second);
        println!("Latest snapshot: {}", self.latest_snapshot);
        println!("Oldest snapshot: {}", self.oldest_snapshot);
    }
}

#[derive(Default)]
struct WorkerTally {
    committed: usize,
    read_only: usize,
    rolled_back: usize,
    failed: usize,
    violations: Vec<String>,
}

/// Runs a mixed begin/commit/rollback workload from many threads.
///
/// Each worker checks that its own write CSNs increase, that a read-only
/// commit echoes its snapshot and that a committed TID resolves to its CSN.
/// Observers check that the horizon never passes the latest snapshot and
/// that the latest snapshot never goes backwards. After the run the log
/// must have nothing running.
pub fn stress_mixed_workload(log: Arc<TransactionLog>, config: &StressConfig) -> StressTestResult {
    let done = Arc::new(AtomicBool::new(false));
    let start = Instant::now();

    let observers: Vec<_> = (0..config.observers)
        .map(|_| {
            let log = Arc::clone(&log);
            let done = Arc::clone(&done);
            thread::spawn(move || observe_horizon(&log, &done))
        })
        .collect();

    let workers: Vec<_> = (0..config.threads)
        .map(|worker| {
            let log = Arc::clone(&log);
            let config = config.clone();
            thread::spawn(move || run_worker(&log, &config, worker))
        })
        .collect();

    let mut total = WorkerTally::default();
    for handle in workers {
        match handle.join() {
            Ok(tally) => {
                total.committed += tally.committed;
                total.read_only += tally.read_only;
                total.rolled_back += tally.rolled_back;
                total.failed += tally.failed;
                total.violations.extend(tally.violations);
            }
            Err(_) => total.violations.push("worker panicked".to_string()),
        }
    }
    done.store(true, Ordering::Release);
    for handle in observers {
        match handle.join() {
            Ok(violations) => total.violations.extend(violations),
            Err(_) => total.violations.push("observer panicked".to_string()),
        }
    }
    let duration = start.elapsed();

    if log.running_count() != 0 {
        total
            .violations
            .push(format!("{} transactions still running", log.running_count()));
    }
    if !log.snapshots_in_use().is_empty() {
        total.violations.push("snapshots still in use".to_string());
    }

    let transactions = total.committed + total.read_only + total.rolled_back;
    let transactions_per_second = if duration.as_secs_f64() > 0.0 {
        transactions as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    StressTestResult {
        committed: total.committed,
        read_only: total.read_only,
        rolled_back: total.rolled_back,
        failed: total.failed,
        violations: total.violations,
        duration,
        transactions_per_second,
        latest_snapshot: log.latest_snapshot(),
        oldest_snapshot: log.oldest_snapshot(),
        stats: log.stats().snapshot(),
    }
}

fn run_worker(log: &TransactionLog, config: &StressConfig, worker: usize) -> WorkerTally {
    let mut rng = rand::thread_rng();
    let mut tally = WorkerTally::default();
    let mut last_csn = Csn::MAX_RESERVED;

    for i in 0..config.transactions_per_thread {
        let txn = match log.begin_transaction() {
            Ok(txn) => txn,
            Err(err) => {
                tally.failed += 1;
                tally.violations.push(format!("begin failed: {err}"));
                continue;
            }
        };

        if log.oldest_snapshot() > txn.snapshot() {
            tally
                .violations
                .push(format!("horizon passed running snapshot {}", txn.snapshot()));
        }

        if rng.gen_bool(config.write_ratio) && txn.add_write(format!("w{worker}_{i}")).is_err() {
            tally.failed += 1;
        }

        if rng.gen_bool(config.rollback_ratio) {
            log.rollback_transaction(&txn);
            tally.rolled_back += 1;
            continue;
        }

        let read_only = txn.is_read_only();
        match log.commit_transaction(&txn) {
            Ok(csn) if read_only => {
                if csn != txn.snapshot() {
                    tally
                        .violations
                        .push(format!("read-only commit returned {csn}"));
                }
                tally.read_only += 1;
            }
            Ok(csn) => {
                if csn <= last_csn {
                    tally
                        .violations
                        .push(format!("CSN {csn} not above {last_csn}"));
                }
                if log.get_csn(&txn.tid()) != csn {
                    tally
                        .violations
                        .push(format!("get_csn({}) disagrees with {csn}", txn.tid()));
                }
                last_csn = csn;
                tally.committed += 1;
            }
            Err(err) => {
                tally.failed += 1;
                log.rollback_transaction(&txn);
                if err.is_fatal() {
                    tally.violations.push(err.to_string());
                }
            }
        }
    }

    tally
}

fn observe_horizon(log: &TransactionLog, done: &AtomicBool) -> Vec<String> {
    let mut violations = Vec::new();
    let mut last_latest = Csn::MAX_RESERVED;

    while !done.load(Ordering::Acquire) {
        let oldest = log.oldest_snapshot();
        let latest = log.latest_snapshot();
        if latest < last_latest {
            violations.push(format!("latest snapshot went back from {last_latest} to {latest}"));
        }
        if oldest > latest {
            violations.push(format!("oldest snapshot {oldest} above latest {latest}"));
        }
        last_latest = latest;
        thread::yield_now();
    }

    violations
}
