//! TxLog CLI
//!
//! Command-line tools for exercising the transaction log.
//!
//! # Commands
//!
//! - `simulate` - Run a concurrent workload and report counters
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// TxLog command-line tools.
#[derive(Parser)]
#[command(name = "txlog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a concurrent begin/commit/rollback workload
    Simulate {
        /// Number of worker threads
        #[arg(short, long, default_value = "4")]
        threads: usize,

        /// Transactions begun by each worker
        #[arg(short = 'n', long, default_value = "1000")]
        transactions: usize,

        /// Fraction of transactions that write
        #[arg(short, long, default_value = "0.5")]
        write_ratio: f64,

        /// Fraction of transactions rolled back
        #[arg(short, long, default_value = "0.2")]
        rollback_ratio: f64,

        /// Threads polling the snapshot horizon
        #[arg(long, default_value = "1")]
        observers: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Simulate {
            threads,
            transactions,
            write_ratio,
            rollback_ratio,
            observers,
            format,
        } => {
            let options = commands::simulate::SimulateOptions {
                threads,
                transactions,
                write_ratio,
                rollback_ratio,
                observers,
            };
            commands::simulate::run(&options, &format)?;
        }
        Commands::Version => {
            println!("TxLog CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("TxLog Core v{}", txlog_core::VERSION);
        }
    }

    Ok(())
}
