//! # TxLog Core
//!
//! MVCC transaction log for a storage engine.
//!
//! This crate provides:
//! - Transaction identities and commit sequence numbers
//! - Snapshot assignment and commit serialization
//! - CSN lookup for visibility checks
//! - The oldest in-use snapshot, for version reclamation
//!
//! ```rust
//! use txlog_core::{Csn, TransactionLog};
//!
//! let log = TransactionLog::default();
//!
//! let txn = log.begin_transaction()?;
//! txn.add_write("all_1_1_0")?;
//! let csn = log.commit_transaction(&txn)?;
//!
//! assert_eq!(log.get_csn(&txn.tid()), csn);
//! assert_eq!(log.oldest_snapshot(), csn);
//! # Ok::<(), txlog_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod fault;
mod snapshots;
mod stats;
mod transaction;
mod types;
mod visibility;

pub use config::LogConfig;
pub use error::{CoreError, CoreResult, InvariantViolation, ViolationKind};
pub use fault::{AbortOnFault, FaultHandler};
pub use snapshots::{SlotHandle, SnapshotList};
pub use stats::{StatsSnapshot, TransactionStats};
pub use transaction::{
    PreCommitCheck, Transaction, TransactionLog, TransactionRef, TransactionState,
};
pub use types::{Csn, LocalTid, Snapshot, Tid, TidHash};
pub use visibility::{is_visible, is_visible_at};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
