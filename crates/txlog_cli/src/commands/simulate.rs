//! Simulate command implementation.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use txlog_core::{LogConfig, TransactionLog};
use txlog_testkit::{stress_mixed_workload, StressConfig, StressTestResult};

/// Errors from the simulate command.
#[derive(Debug, Error)]
pub enum SimulateError {
    /// A ratio outside `0.0..=1.0`.
    #[error("{name} must be between 0 and 1, got {value}")]
    InvalidRatio {
        /// Option name.
        name: &'static str,
        /// Value given.
        value: f64,
    },
    /// Zero worker threads.
    #[error("at least one worker thread is required")]
    NoThreads,
    /// Unknown output format.
    #[error("unknown format '{0}', expected text or json")]
    UnknownFormat(String),
    /// The workload observed a violation.
    #[error("workload reported {0} violations")]
    Violations(usize),
}

/// Workload options.
#[derive(Debug, Clone)]
pub struct SimulateOptions {
    /// Worker threads.
    pub threads: usize,
    /// Transactions per worker.
    pub transactions: usize,
    /// Fraction of transactions that write.
    pub write_ratio: f64,
    /// Fraction of transactions rolled back.
    pub rollback_ratio: f64,
    /// Horizon observer threads.
    pub observers: usize,
}

impl SimulateOptions {
    fn validate(&self) -> Result<StressConfig, SimulateError> {
        if self.threads == 0 {
            return Err(SimulateError::NoThreads);
        }
        for (name, value) in [
            ("write-ratio", self.write_ratio),
            ("rollback-ratio", self.rollback_ratio),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimulateError::InvalidRatio { name, value });
            }
        }
        Ok(StressConfig {
            threads: self.threads,
            transactions_per_thread: self.transactions,
            write_ratio: self.write_ratio,
            rollback_ratio: self.rollback_ratio,
            observers: self.observers,
        })
    }
}

/// Simulation report.
#[derive(Debug, Serialize)]
pub struct SimulateReport {
    /// Host id of the simulated log.
    pub host_id: String,
    /// Committed entries held by the log.
    pub committed_tids: usize,
    /// Workload result.
    #[serde(flatten)]
    pub result: StressTestResult,
}

/// Runs the simulate command.
pub fn run(options: &SimulateOptions, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if format != "text" && format != "json" {
        return Err(SimulateError::UnknownFormat(format.to_string()).into());
    }
    let config = options.validate()?;

    let log = Arc::new(TransactionLog::new(LogConfig::new()));
    tracing::info!(
        host_id = %log.host_id(),
        threads = config.threads,
        transactions = config.transactions_per_thread,
        "starting simulation"
    );

    let result = stress_mixed_workload(Arc::clone(&log), &config);
    let report = SimulateReport {
        host_id: log.host_id().to_string(),
        committed_tids: log.committed_count(),
        result,
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text(&report);
    }

    for violation in &report.result.violations {
        tracing::error!(%violation, "workload violation");
    }
    if !report.result.violations.is_empty() {
        return Err(SimulateError::Violations(report.result.violations.len()).into());
    }
    Ok(())
}

fn print_text(report: &SimulateReport) {
    report.result.print_summary("Simulation");
    println!("Host: {}", report.host_id);
    println!("Committed TIDs held: {}", report.committed_tids);
    let stats = &report.result.stats;
    println!("Pre-commit failures: {}", stats.pre_commit_failures);
    println!("Invariant violations: {}", stats.invariant_violations);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> SimulateOptions {
        SimulateOptions {
            threads: 2,
            transactions: 50,
            write_ratio: 0.5,
            rollback_ratio: 0.2,
            observers: 1,
        }
    }

    #[test]
    fn validates_ratios() {
        let bad = SimulateOptions {
            write_ratio: 1.5,
            ..options()
        };
        assert!(matches!(
            bad.validate(),
            Err(SimulateError::InvalidRatio { name: "write-ratio", .. })
        ));
    }

    #[test]
    fn rejects_zero_threads() {
        let bad = SimulateOptions {
            threads: 0,
            ..options()
        };
        assert!(matches!(bad.validate(), Err(SimulateError::NoThreads)));
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(run(&options(), "yaml").is_err());
    }

    #[test]
    fn json_report_includes_counts() {
        let config = options().validate().unwrap();
        let log = Arc::new(TransactionLog::default());
        let result = stress_mixed_workload(Arc::clone(&log), &config);
        let report = SimulateReport {
            host_id: log.host_id().to_string(),
            committed_tids: log.committed_count(),
            result,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["committed_tids"], report.committed_tids);
        assert_eq!(json["committed"], report.result.committed);
        assert!(json["stats"]["transactions_started"].is_u64());
    }

    #[test]
    fn simulate_runs_clean() {
        run(&options(), "json").unwrap();
    }
}
