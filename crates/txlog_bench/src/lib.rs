//! Benchmark utilities.

use rand::Rng;
use txlog_core::{TransactionLog, TransactionRef};

/// Begins `count` transactions and leaves them running.
///
/// Used to measure operations against a populated running registry.
pub fn hold_readers(log: &TransactionLog, count: usize) -> Vec<TransactionRef> {
    (0..count)
        .filter_map(|_| log.begin_transaction().ok())
        .collect()
}

/// Commits `count` single-write transactions so the committed map is populated.
pub fn commit_history(log: &TransactionLog, count: usize) -> Vec<TransactionRef> {
    let mut committed = Vec::with_capacity(count);
    for i in 0..count {
        let Ok(txn) = log.begin_transaction() else {
            continue;
        };
        if txn.add_write(format!("part_{i}")).is_ok() && log.commit_transaction(&txn).is_ok() {
            committed.push(txn);
        }
    }
    committed
}

/// Picks a random element of `items`.
pub fn pick<T>(items: &[T]) -> Option<&T> {
    if items.is_empty() {
        return None;
    }
    let index = rand::thread_rng().gen_range(0..items.len());
    items.get(index)
}
