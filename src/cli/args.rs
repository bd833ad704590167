use crate::config::Network;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Distribute tokens, look up balances and validate addresses from CSV lists
#[derive(Parser, Debug)]
#[command(name = "airdrop")]
#[command(about = "Distribute tokens, look up balances and validate addresses from CSV lists", long_about = None)]
pub struct CliArgs {
    #[command(flatten)]
    pub options: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// Network whose configuration section is used
    #[arg(
        long = "network",
        value_name = "NETWORK",
        default_value = "localhost",
        global = true,
        help = "Network to run against: 'localhost', 'testnet' or 'mainnet'"
    )]
    pub network: Network,

    /// Path to the TOML configuration file
    #[arg(
        long = "config",
        value_name = "PATH",
        default_value = "airdrop.toml",
        global = true,
        help = "Path to the TOML configuration file"
    )]
    pub config: PathBuf,

    /// Directory the two output files are written to
    #[arg(
        long = "output-dir",
        value_name = "DIR",
        default_value = ".",
        global = true,
        help = "Directory for the output files"
    )]
    pub output_dir: PathBuf,

    /// Input field delimiter
    #[arg(
        long = "delimiter",
        value_name = "CHAR",
        default_value = ",",
        value_parser = parse_delimiter,
        global = true,
        help = "Single-byte field delimiter of the input file"
    )]
    pub delimiter: u8,

    /// Append the skip reason to every skipped row
    #[arg(
        long = "skip-reasons",
        global = true,
        help = "Append a reason column to the skipped output"
    )]
    pub skip_reasons: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Send tokens to every recipient in the list
    Send {
        /// CSV file with `address,amount` rows
        #[arg(value_name = "INPUT", help = "Path to the recipients CSV file")]
        input: PathBuf,

        /// Settle against an in-memory ledger instead of the network
        #[arg(long = "dry-run", help = "Simulate transfers without touching the network")]
        dry_run: bool,
    },
    /// Look up the configured asset balances of every address
    Balances {
        /// CSV file with one address per row
        #[arg(value_name = "INPUT", help = "Path to the addresses CSV file")]
        input: PathBuf,
    },
    /// Check every address for format and checksum
    Validate {
        /// CSV file with one address per row
        #[arg(value_name = "INPUT", help = "Path to the addresses CSV file")]
        input: PathBuf,
    },
}

impl Command {
    pub fn input(&self) -> &PathBuf {
        match self {
            Command::Send { input, .. } | Command::Balances { input } | Command::Validate { input } => {
                input
            }
        }
    }

    /// Whether the subcommand reads the configuration file
    pub fn needs_config(&self) -> bool {
        !matches!(self, Command::Validate { .. })
    }
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value.as_bytes() {
        [byte] => Ok(*byte),
        b"\\t" => Ok(b'\t'),
        _ => Err(format!(
            "delimiter must be a single byte, got '{}'",
            value
        )),
    }
}
