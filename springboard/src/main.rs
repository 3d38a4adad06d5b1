//! Springboard driver
//!
//! Builds long continuation chains and drains them through the trampoline,
//! reporting pool statistics. Handy for checking stack safety and pool reuse
//! on a given machine.

mod runner;

use clap::{Parser, Subcommand};
use springboard::PoolConfig;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "springboard", version, about = "Continuation trampoline driver")]
struct Cli {
    /// Nodes created when the pool is built
    #[arg(long, default_value_t = 100)]
    initial_capacity: usize,

    /// Growth batch for an empty pool
    #[arg(long, default_value_t = 100)]
    first_growth: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a nested chain of `depth` steps up front, then evaluate it
    Chain {
        #[arg(long, default_value_t = 100_000)]
        depth: u64,
    },
    /// Build each step from the previous result while evaluating
    Bounce {
        #[arg(long, default_value_t = 100_000)]
        depth: u64,
    },
}

fn main() -> ExitCode {
    let log_level = std::env::var("SPRINGBOARD_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let cli = Cli::parse();
    let config = PoolConfig {
        initial_capacity: cli.initial_capacity,
        first_growth: cli.first_growth,
    };

    let result = match cli.command {
        Command::Chain { depth } => runner::run_chain(config, depth),
        Command::Bounce { depth } => runner::run_bounce(config, depth),
    };

    match result {
        Ok(report) => {
            info!("Evaluation completed");
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Evaluation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
