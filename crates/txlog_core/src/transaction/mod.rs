//! Transaction tracking with snapshot isolation.
//!
//! The [`TransactionLog`] hands every transaction a snapshot at begin,
//! serializes write commits through a single commit point that assigns
//! commit sequence numbers, and keeps track of which snapshots are still in
//! use so storage can reclaim versions no reader needs.

mod log;
mod state;

pub use log::TransactionLog;
pub use state::{PreCommitCheck, Transaction, TransactionRef, TransactionState};
