//! Record strategies
//!
//! Each subcommand is one [`RecordStrategy`]: the per-mode wiring of validator,
//! quota guard, submitter and ledger that turns a raw record into a
//! classification. The pipeline driver is the same for all of them, so a
//! strategy only decides what happens to one record.
//!
//! - `airdrop` - validate, admit against the ceiling, transfer, confirm
//! - `balances` - validate, read every configured asset balance
//! - `validate` - address format and checksum only

use crate::cli::{CliArgs, Command};
use crate::config::{ConfigFile, Credentials, NetworkSettings};
use crate::core::traits::Ledger;
use crate::io::OutputLayout;
use crate::ledger::{InMemoryLedger, JsonRpcLedger};
use crate::types::{AirdropError, Classification, HaltMarker, RawRecord};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub mod airdrop;
pub mod balances;
pub mod validate;

pub use airdrop::AirdropStrategy;
pub use balances::BalanceStrategy;
pub use validate::ValidateStrategy;

/// Per-record behaviour of one run mode
#[async_trait]
pub trait RecordStrategy: Send {
    /// Row layout of the two output files
    fn layout(&self) -> OutputLayout;

    /// Called once before the first record
    ///
    /// # Errors
    ///
    /// An error here is fatal; no record is read.
    async fn prepare(&mut self) -> Result<(), AirdropError> {
        Ok(())
    }

    /// Classify one record, performing its side effects
    ///
    /// Never fails: every problem with a record becomes a skip reason.
    async fn classify(&mut self, record: RawRecord) -> Classification;

    /// Where the run ceiling was first hit, if it was
    fn halt_marker(&self) -> Option<&HaltMarker> {
        None
    }
}

/// Create the strategy for the selected subcommand
///
/// The configuration file is only read by subcommands that need it.
///
/// # Arguments
///
/// * `args` - Parsed command line
/// * `credentials` - Signing key and endpoint override from the environment
///
/// # Errors
///
/// Returns `Configuration` for an unreadable or incomplete configuration, or a
/// missing private key on a live send.
pub fn create_strategy(
    args: &CliArgs,
    credentials: &Credentials,
) -> Result<Box<dyn RecordStrategy>, AirdropError> {
    if !args.command.needs_config() {
        return Ok(Box::new(ValidateStrategy::new()));
    }

    let settings = ConfigFile::load(&args.options.config)?.network(args.options.network, credentials)?;
    info!(network = %settings.network, rpc_url = %settings.rpc_url, "loaded configuration");

    match &args.command {
        Command::Send { dry_run: true, .. } => {
            let airdrop = settings.airdrop()?;
            let sender = settings.sender();
            let ledger =
                InMemoryLedger::new().with_balance(&airdrop.token, &sender, airdrop.ceiling);
            info!(%sender, "dry run, transfers settle in memory");

            Ok(Box::new(AirdropStrategy::new(
                Arc::new(ledger) as Arc<dyn Ledger>,
                &airdrop,
                sender,
                settings.confirmation_timeout,
            )))
        }
        Command::Send { .. } => {
            let airdrop = settings.airdrop()?;
            let signer = settings.require_signer()?;
            let sender = signer.address().clone();
            info!(%sender, "transfers are signed locally");

            let ledger = rpc_client(&settings)?.with_signer(signer, settings.transaction);
            Ok(Box::new(AirdropStrategy::new(
                Arc::new(ledger) as Arc<dyn Ledger>,
                &airdrop,
                sender,
                settings.confirmation_timeout,
            )))
        }
        Command::Balances { .. } => Ok(Box::new(BalanceStrategy::new(
            Arc::new(rpc_client(&settings)?) as Arc<dyn Ledger>,
            settings.assets()?,
            settings.confirmation_timeout,
        ))),
        Command::Validate { .. } => Ok(Box::new(ValidateStrategy::new())),
    }
}

fn rpc_client(settings: &NetworkSettings) -> Result<JsonRpcLedger, AirdropError> {
    JsonRpcLedger::new(settings.rpc_url.clone(), settings.poll_interval)
        .map_err(|e| AirdropError::configuration(format!("Failed to create RPC client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PRIVATE_KEY_ENV;
    use crate::ledger::LocalSigner;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const TOKEN: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    const KEY: &str = "0x4646464646464646464646464646464646464646464646464646464646464646";

    fn config_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[networks.localhost]
rpc_url = "http://127.0.0.1:8545"

[networks.localhost.airdrop]
token = "{TOKEN}"
decimals = 0
min_per_transfer = "1"
max_per_run = "100"

[[networks.localhost.balances.assets]]
symbol = "TKN"
address = "{TOKEN}"
decimals = 0
"#
        )
        .unwrap();
        file.flush().unwrap();
        file
    }

    fn args(config: &NamedTempFile, command: &[&str]) -> CliArgs {
        let mut argv = vec!["airdrop", "--config", config.path().to_str().unwrap()];
        argv.extend_from_slice(command);
        CliArgs::try_parse_from(argv).unwrap()
    }

    fn signing_key() -> Credentials {
        Credentials {
            signer: Some(LocalSigner::from_hex(KEY).unwrap()),
            rpc_url: None,
        }
    }

    #[test]
    fn test_validate_needs_no_config() {
        let args = CliArgs::try_parse_from(["airdrop", "--config", "missing.toml", "validate", "x.csv"])
            .unwrap();
        let strategy = create_strategy(&args, &Credentials::default()).unwrap();
        assert_eq!(strategy.layout(), OutputLayout::Validation);
    }

    #[test]
    fn test_live_send_requires_private_key() {
        let config = config_file();
        let result = create_strategy(&args(&config, &["send", "x.csv"]), &Credentials::default());

        let error = result.err().unwrap();
        assert!(matches!(error, AirdropError::Configuration { .. }));
        assert!(error.to_string().contains(PRIVATE_KEY_ENV));
    }

    #[test]
    fn test_dry_run_without_private_key() {
        let config = config_file();
        let strategy =
            create_strategy(&args(&config, &["send", "--dry-run", "x.csv"]), &Credentials::default())
                .unwrap();
        assert_eq!(strategy.layout(), OutputLayout::Transfer);
    }

    #[rstest::rstest]
    #[case::send(&["send", "x.csv"], OutputLayout::Transfer)]
    #[case::balances(&["balances", "x.csv"], OutputLayout::Balances)]
    fn test_live_strategies(#[case] command: &[&str], #[case] layout: OutputLayout) {
        let config = config_file();
        let strategy = create_strategy(&args(&config, command), &signing_key()).unwrap();
        assert_eq!(strategy.layout(), layout);
    }

    #[test]
    fn test_missing_config_file() {
        let args = CliArgs::try_parse_from(["airdrop", "--config", "missing.toml", "send", "x.csv"])
            .unwrap();
        assert!(matches!(
            create_strategy(&args, &signing_key()),
            Err(AirdropError::Configuration { .. })
        ));
    }
}
