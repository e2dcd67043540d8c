//! Version visibility.
//!
//! A version stamped with the TID of the transaction that created it is
//! visible to a reader at snapshot `S` once that TID committed with a CSN
//! `<= S`. Uncommitted, rolled back and read-only TIDs resolve to
//! [`Csn::UNKNOWN`] and are never visible to anyone else.

use crate::transaction::{Transaction, TransactionLog};
use crate::types::{Csn, Snapshot, Tid};

/// Returns true if a version created by `creator` is visible at `snapshot`.
///
/// # Panics
///
/// Panics if `creator` is [`Tid::EMPTY`].
pub fn is_visible_at(log: &TransactionLog, creator: &Tid, snapshot: Snapshot) -> bool {
    let csn = log.get_csn(creator);
    csn != Csn::UNKNOWN && csn <= snapshot
}

/// Returns true if a version created by `creator` is visible to `reader`.
///
/// A transaction always sees its own writes.
pub fn is_visible(log: &TransactionLog, creator: &Tid, reader: &Transaction) -> bool {
    *creator == reader.tid() || is_visible_at(log, creator, reader.snapshot())
}
