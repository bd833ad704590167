//! Token Airdrop CLI
//!
//! Command-line interface for distributing tokens, looking up balances and
//! validating addresses from CSV lists.
//!
//! # Usage
//!
//! ```bash
//! airdrop --network testnet send recipients.csv
//! airdrop send --dry-run recipients.csv
//! airdrop --output-dir out balances addresses.csv
//! airdrop --skip-reasons validate addresses.csv
//! ```
//!
//! Each run writes two timestamped CSV files to the output directory and prints
//! a summary to stdout. Logs go to stderr; set `RUST_LOG` to change the level.
//!
//! # Exit Codes
//!
//! - 0: The whole list was processed
//! - 1: Configuration error, unreadable input, failed output, or Ctrl-C

use std::process;
use token_airdrop::cli;
use token_airdrop::config::Credentials;
use token_airdrop::core::{run_file, RunOptions};
use token_airdrop::strategy;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info";

fn main() {
    let args = cli::parse_args();

    // A missing .env is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .with_writer(std::io::stderr)
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            process::exit(1);
        }
    };

    let succeeded = runtime.block_on(async {
        let strategy = match Credentials::from_env().and_then(|c| strategy::create_strategy(&args, &c)) {
            Ok(strategy) => strategy,
            Err(e) => {
                error!(error = %e, "configuration error");
                eprintln!("Error: {}", e);
                return false;
            }
        };

        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, stopping after the current record");
                on_signal.cancel();
            }
        });

        let options = RunOptions {
            delimiter: args.options.delimiter,
            output_dir: args.options.output_dir.clone(),
            with_reasons: args.options.skip_reasons,
        };

        match run_file(strategy, args.command.input(), &options, cancel).await {
            Ok((report, paths)) => {
                print!("{}", report.summary.render());
                println!("Accepted records: {}", paths.accepted.display());
                println!("Skipped records: {}", paths.skipped.display());
                if let Some(e) = &report.error {
                    eprintln!("Error: {}", e);
                }
                report.is_success()
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                false
            }
        }
    });

    if !succeeded {
        process::exit(1);
    }
}

/// Filter from `RUST_LOG` directives, or `info` when unset, empty or invalid
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}
