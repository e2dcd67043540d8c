//! # TxLog Testkit
//!
//! Test utilities for TxLog.
//!
//! This crate provides:
//! - Fixtures: recording fault handler and preconfigured logs
//! - Property-based operation generators using proptest
//! - A model checker that replays operations and verifies invariants
//! - Concurrent stress workloads
//!
//! ## Usage
//!
//! ```rust
//! use txlog_testkit::prelude::*;
//!
//! let (log, faults) = recording_log();
//! let (txn, csn) = commit_write(&log, "part").unwrap();
//! assert_eq!(log.get_csn(&txn.tid()), csn);
//! assert!(faults.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod model;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::model::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use model::*;
pub use stress::*;
