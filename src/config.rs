//! Per-network configuration
//!
//! Settings come from a TOML file keyed by network name, plus two environment
//! variables (a `.env` file is honoured):
//!
//! - `AIRDROP_PRIVATE_KEY` - hex key of the sending account, required for live
//!   sends; transfers are signed locally with it
//! - `AIRDROP_RPC_URL` - overrides the network's `rpc_url`
//!
//! ```toml
//! [networks.testnet]
//! rpc_url = "https://data-seed-prebsc-1-s1.binance.org:8545"
//! chain_id = 97
//! gas_price = 20000000000
//! confirmation_timeout_secs = 120
//! poll_interval_ms = 500
//!
//! [networks.testnet.airdrop]
//! token = "0x..."
//! decimals = 18
//! min_per_transfer = "1"
//! max_per_run = "100000"
//!
//! [[networks.testnet.balances.assets]]
//! symbol = "TKN"
//! address = "0x..."
//! decimals = 18
//! ```
//!
//! `chain_id`, `gas_price` (wei) and `gas_limit` are optional; the node is
//! asked for whatever is left out. Everything is checked before a run starts;
//! problems are `Configuration` errors.

use crate::ledger::{LocalSigner, TransactionSettings};
use crate::types::{Address, AirdropError, Amount};
use clap::ValueEnum;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const PRIVATE_KEY_ENV: &str = "AIRDROP_PRIVATE_KEY";
pub const RPC_URL_ENV: &str = "AIRDROP_RPC_URL";

/// Networks a run can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Network {
    Localhost,
    Testnet,
    Mainnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Localhost => "localhost",
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The whole configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub networks: HashMap<String, NetworkConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    pub chain_id: Option<u64>,
    pub gas_price: Option<u64>,
    pub gas_limit: Option<u64>,
    pub airdrop: Option<AirdropConfig>,
    pub balances: Option<BalancesConfig>,
}

fn default_confirmation_timeout_secs() -> u64 {
    120
}

fn default_poll_interval_ms() -> u64 {
    500
}

/// Thresholds are token units, scaled by `decimals` when resolved
#[derive(Debug, Clone, Deserialize)]
pub struct AirdropConfig {
    pub token: String,
    pub decimals: u8,
    pub min_per_transfer: String,
    pub max_per_run: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalancesConfig {
    pub assets: Vec<AssetConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
}

/// Values taken from the environment
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub signer: Option<LocalSigner>,
    pub rpc_url: Option<String>,
}

impl Credentials {
    /// Read credentials from the process environment
    pub fn from_env() -> Result<Self, AirdropError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through `lookup`; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AirdropError> {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let signer = read(PRIVATE_KEY_ENV)
            .map(|raw| {
                LocalSigner::from_hex(&raw).map_err(|e| {
                    AirdropError::configuration(format!("{}: {}", PRIVATE_KEY_ENV, e))
                })
            })
            .transpose()?;

        Ok(Self {
            signer,
            rpc_url: read(RPC_URL_ENV),
        })
    }
}

/// Settings for one network, environment applied
#[derive(Debug, Clone)]
pub struct NetworkSettings {
    pub network: Network,
    pub rpc_url: String,
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
    pub transaction: TransactionSettings,
    pub signer: Option<LocalSigner>,
    airdrop: Option<AirdropConfig>,
    balances: Option<BalancesConfig>,
}

/// Checked airdrop settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirdropSettings {
    pub token: Address,
    pub decimals: u8,
    /// Smallest amount worth sending, base units
    pub minimum: Amount,
    /// Per-run ceiling, base units
    pub ceiling: Amount,
}

/// One asset queried by the balance flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub symbol: String,
    pub address: Address,
    pub decimals: u8,
}

impl ConfigFile {
    /// Load and parse a TOML configuration file
    pub fn load(path: &Path) -> Result<Self, AirdropError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AirdropError::configuration(format!(
                "Failed to read config '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, AirdropError> {
        toml::from_str(text)
            .map_err(|e| AirdropError::configuration(format!("Invalid config: {}", e)))
    }

    /// Select a network and apply the environment to it
    pub fn network(
        &self,
        network: Network,
        credentials: &Credentials,
    ) -> Result<NetworkSettings, AirdropError> {
        let config = self.networks.get(network.as_str()).ok_or_else(|| {
            AirdropError::configuration(format!("No configuration for network '{}'", network))
        })?;

        let rpc_url = credentials
            .rpc_url
            .clone()
            .unwrap_or_else(|| config.rpc_url.clone());

        Ok(NetworkSettings {
            network,
            rpc_url,
            confirmation_timeout: Duration::from_secs(config.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            transaction: TransactionSettings {
                chain_id: config.chain_id,
                gas_price: config.gas_price,
                gas_limit: config.gas_limit,
            },
            signer: credentials.signer.clone(),
            airdrop: config.airdrop.clone(),
            balances: config.balances.clone(),
        })
    }
}

impl NetworkSettings {
    /// The sending key, required for live sends
    pub fn require_signer(&self) -> Result<LocalSigner, AirdropError> {
        self.signer.clone().ok_or_else(|| {
            AirdropError::configuration(format!("Missing private key ({})", PRIVATE_KEY_ENV))
        })
    }

    /// Account transfers are sent from, the zero address without a key
    pub fn sender(&self) -> Address {
        self.signer
            .as_ref()
            .map(|signer| signer.address().clone())
            .unwrap_or_else(Address::zero)
    }

    /// Checked airdrop section
    pub fn airdrop(&self) -> Result<AirdropSettings, AirdropError> {
        let config = self.airdrop.as_ref().ok_or_else(|| {
            AirdropError::configuration(format!(
                "No airdrop section for network '{}'",
                self.network
            ))
        })?;

        let token = parse_contract("token", &config.token)?;
        let threshold = |name: &str, value: &str| {
            Amount::parse_units(value, config.decimals).map_err(|e| {
                AirdropError::configuration(format!("Invalid {}: {}", name, e))
            })
        };
        let minimum = threshold("min_per_transfer", &config.min_per_transfer)?;
        let ceiling = threshold("max_per_run", &config.max_per_run)?;

        if minimum > ceiling {
            return Err(AirdropError::configuration(
                "min_per_transfer is larger than max_per_run",
            ));
        }

        Ok(AirdropSettings {
            token,
            decimals: config.decimals,
            minimum,
            ceiling,
        })
    }

    /// Checked balance assets, in configuration order
    pub fn assets(&self) -> Result<Vec<Asset>, AirdropError> {
        let config = self.balances.as_ref().ok_or_else(|| {
            AirdropError::configuration(format!(
                "No balances section for network '{}'",
                self.network
            ))
        })?;

        if config.assets.is_empty() {
            return Err(AirdropError::configuration("No balance assets configured"));
        }

        config
            .assets
            .iter()
            .map(|asset| {
                Ok(Asset {
                    symbol: asset.symbol.clone(),
                    address: parse_contract(&asset.symbol, &asset.address)?,
                    decimals: asset.decimals,
                })
            })
            .collect()
    }
}

fn parse_contract(name: &str, text: &str) -> Result<Address, AirdropError> {
    let address = Address::parse(text).map_err(|e| {
        AirdropError::configuration(format!("Invalid {} address '{}': {}", name, text, e))
    })?;
    if address.is_zero() {
        return Err(AirdropError::configuration(format!(
            "Missing {} contract address (zero address)",
            name
        )));
    }
    Ok(address)
}
