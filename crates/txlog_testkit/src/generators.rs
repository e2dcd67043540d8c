//! Property-based test generators using proptest.
//!
//! Operations address live transactions by [`prop::sample::Index`], so any
//! generated sequence is valid no matter how many transactions are running
//! when it is replayed.

use proptest::prelude::*;
use proptest::sample::Index;

/// One step of a generated transaction workload.
#[derive(Debug, Clone)]
pub enum LogOperation {
    /// Begin a transaction.
    Begin,
    /// Record a write on a live transaction.
    Write {
        /// Which live transaction.
        target: Index,
        /// Object written.
        object: u8,
    },
    /// Commit a live transaction.
    Commit {
        /// Which live transaction.
        target: Index,
    },
    /// Commit a live transaction whose pre-commit check rejects it.
    RejectedCommit {
        /// Which live transaction.
        target: Index,
    },
    /// Roll back a live transaction.
    Rollback {
        /// Which live transaction.
        target: Index,
    },
    /// Roll back an already concluded transaction.
    StaleRollback {
        /// Which concluded transaction.
        target: Index,
    },
}

/// Strategy for generating a single operation.
pub fn log_operation_strategy() -> impl Strategy<Value = LogOperation> {
    prop_oneof![
        4 => Just(LogOperation::Begin),
        4 => (any::<Index>(), any::<u8>())
            .prop_map(|(target, object)| LogOperation::Write { target, object }),
        3 => any::<Index>().prop_map(|target| LogOperation::Commit { target }),
        1 => any::<Index>().prop_map(|target| LogOperation::RejectedCommit { target }),
        2 => any::<Index>().prop_map(|target| LogOperation::Rollback { target }),
        1 => any::<Index>().prop_map(|target| LogOperation::StaleRollback { target }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<LogOperation>> {
    prop::collection::vec(log_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn sequences_respect_length(ops in operation_sequence_strategy(5, 20)) {
            prop_assert!(ops.len() >= 5);
            prop_assert!(ops.len() < 20);
        }
    }
}
