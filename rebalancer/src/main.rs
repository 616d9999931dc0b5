//! CLI entry point for the vsebook rebalancer.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use vsebook_rebalancer::config::Config;
use vsebook_rebalancer::error::Error;
use vsebook_rebalancer::execution::{self, OrderRequest, RunOptions};
use vsebook_rebalancer::target::TargetSpec;

/// Exit status when a pass finished but some trades were skipped or refused.
const EXIT_PARTIAL: i32 = 3;

#[derive(Parser)]
#[command(name = "rebalancer")]
#[command(about = "Portfolio rebalancer for MarketWatch Virtual Stock Exchange games")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Preview, confirm, and execute rebalance orders
    Run {
        /// Path to target.json
        target: PathBuf,

        /// Show plan without executing
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt (for automation/cron)
        #[arg(long)]
        force: bool,
    },

    /// Show current game positions
    Positions,

    /// Check login and game access
    Status,

    /// Compare actual positions vs target
    Reconcile {
        /// Path to target.json
        target: PathBuf,
    },

    /// Submit a single order
    Order {
        /// Buy, Sell, Short, or Cover
        action: String,

        ticker: String,

        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        shares: u64,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

fn load_target(path: &Path) -> TargetSpec {
    match TargetSpec::load(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading target: {e}");
            process::exit(1);
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Run {
            target,
            dry_run,
            force,
        } => {
            let spec = load_target(&target);
            let opts = RunOptions {
                dry_run,
                force,
                target_file: target.display().to_string(),
            };
            execution::run(&config, &spec, &opts).map(|outcome| outcome.failures())
        }
        Command::Positions => execution::show_positions(&config).map(|()| 0),
        Command::Status => execution::check_status(&config).map(|()| 0),
        Command::Reconcile { target } => {
            let spec = load_target(&target);
            execution::run_reconcile(&config, &spec).map(|()| 0)
        }
        Command::Order {
            action,
            ticker,
            shares,
            force,
        } => {
            let req = OrderRequest {
                action,
                ticker,
                shares,
                force,
            };
            execution::place_order(&config, &req).map(|receipt| usize::from(!receipt.success))
        }
    };

    match result {
        Ok(0) => {}
        Ok(failures) => {
            eprintln!("\n{failures} trade(s) did not go through; see the audit log.");
            process::exit(EXIT_PARTIAL);
        }
        Err(Error::Aborted(msg)) => eprintln!("{msg}"),
        Err(e) if e.is_fatal_pass_error() => {
            eprintln!("\nRebalance aborted: {e}");
            process::exit(e.exit_code());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(e.exit_code());
        }
    }
}
