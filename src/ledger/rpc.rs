//! JSON-RPC ledger client
//!
//! Talks to an Ethereum-compatible node over HTTP:
//!
//! - `balance_of` is an `eth_call` of the token's `balanceOf(address)`
//! - `transfer` signs `transfer(address,uint256)` locally with the sender's
//!   key, submits it with `eth_sendRawTransaction`, then polls
//!   `eth_getTransactionReceipt` until the transaction is included
//!
//! The nonce is the sender's pending transaction count. Chain id, gas price and
//! gas limit come from [`TransactionSettings`] when set and from the node
//! otherwise. The client does not bound the confirmation wait; the submitter
//! does.

use super::signer::{LegacyTransaction, LocalSigner};
use crate::core::traits::{Confirmation, Ledger};
use crate::types::{Address, Amount, LedgerError};
use async_trait::async_trait;
use primitive_types::U256;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// `balanceOf(address)`
const BALANCE_OF_SELECTOR: &str = "70a08231";
/// `transfer(address,uint256)`
const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionReceipt {
    transaction_hash: String,
    block_number: Option<String>,
    status: Option<String>,
}

/// Chain and fee parameters of signed transfers
///
/// `None` values are asked of the node for every transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionSettings {
    pub chain_id: Option<u64>,
    /// Wei per gas unit
    pub gas_price: Option<u64>,
    pub gas_limit: Option<u64>,
}

pub struct JsonRpcLedger {
    url: String,
    client: Client,
    poll_interval: Duration,
    next_id: AtomicU64,
    signer: Option<LocalSigner>,
    transaction: TransactionSettings,
}

impl JsonRpcLedger {
    /// Create a client for the node at `url`
    ///
    /// `poll_interval` is the pause between receipt polls.
    pub fn new(url: impl Into<String>, poll_interval: Duration) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LedgerError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
            poll_interval,
            next_id: AtomicU64::new(1),
            signer: None,
            transaction: TransactionSettings::default(),
        })
    }

    /// Sign transfers with `signer`
    ///
    /// Without a signer the client is read-only and every transfer is rejected.
    pub fn with_signer(mut self, signer: LocalSigner, transaction: TransactionSettings) -> Self {
        self.signer = Some(signer);
        self.transaction = transaction;
        self
    }

    /// Perform one JSON-RPC call
    ///
    /// `Ok(None)` means the node answered with a `null` result.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, LedgerError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });
        debug!(method, "ledger request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(format!("{} request failed: {}", method, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Transport(format!(
                "{} failed with status {}: {}",
                method, status, body
            )));
        }

        let body = response.json::<RpcResponse<T>>().await.map_err(|e| {
            LedgerError::InvalidResponse(format!("Failed to parse {} response: {}", method, e))
        })?;

        if let Some(error) = body.error {
            return Err(LedgerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(body.result)
    }

    /// A call whose result is a hex quantity
    async fn quantity(&self, method: &str, params: Value) -> Result<U256, LedgerError> {
        let result: String = self
            .call(method, params)
            .await?
            .ok_or_else(|| LedgerError::InvalidResponse(format!("{} returned null", method)))?;
        decode_quantity(&result)
    }

    /// Configured value, or the node's answer to `method`
    async fn setting(
        &self,
        configured: Option<u64>,
        method: &str,
        params: Value,
    ) -> Result<U256, LedgerError> {
        match configured {
            Some(value) => Ok(U256::from(value)),
            None => self.quantity(method, params).await,
        }
    }

    async fn receipt(&self, tx_hash: &str) -> Result<Option<TransactionReceipt>, LedgerError> {
        self.call("eth_getTransactionReceipt", json!([tx_hash])).await
    }
}

#[async_trait]
impl Ledger for JsonRpcLedger {
    async fn balance_of(&self, asset: &Address, holder: &Address) -> Result<Amount, LedgerError> {
        let data = format!("0x{}{}", BALANCE_OF_SELECTOR, encode_address(holder));
        let result: String = self
            .call(
                "eth_call",
                json!([{ "to": asset.to_lower_hex(), "data": data }, "latest"]),
            )
            .await?
            .ok_or_else(|| LedgerError::InvalidResponse("eth_call returned null".to_string()))?;

        decode_uint256(&result)
    }

    async fn transfer(
        &self,
        asset: &Address,
        sender: &Address,
        target: &Address,
        amount: Amount,
    ) -> Result<Confirmation, LedgerError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or_else(|| LedgerError::Rejected("no signing key configured".to_string()))?;
        if signer.address() != sender {
            return Err(LedgerError::Rejected(format!(
                "sender {} is not the signing key's account {}",
                sender,
                signer.address()
            )));
        }

        let data = transfer_calldata(target, amount);
        let call = json!({
            "from": sender.to_lower_hex(),
            "to": asset.to_lower_hex(),
            "data": format!("0x{}", hex::encode(&data)),
        });

        let nonce = self
            .quantity(
                "eth_getTransactionCount",
                json!([sender.to_lower_hex(), "pending"]),
            )
            .await?;
        let gas_price = self
            .setting(self.transaction.gas_price, "eth_gasPrice", json!([]))
            .await?;
        let gas_limit = self
            .setting(self.transaction.gas_limit, "eth_estimateGas", json!([call]))
            .await?;
        let chain_id = self
            .setting(self.transaction.chain_id, "eth_chainId", json!([]))
            .await?;
        if chain_id > U256::from(u64::MAX) {
            return Err(LedgerError::InvalidResponse(format!(
                "chain id {} does not fit in 64 bits",
                chain_id
            )));
        }

        let raw = signer.sign(&LegacyTransaction {
            nonce,
            gas_price,
            gas_limit,
            to: asset.clone(),
            value: U256::zero(),
            data,
            chain_id: chain_id.low_u64(),
        })?;
        let tx_hash: String = self
            .call("eth_sendRawTransaction", json!([raw]))
            .await?
            .ok_or_else(|| {
                LedgerError::InvalidResponse("eth_sendRawTransaction returned null".to_string())
            })?;
        debug!(%tx_hash, "transfer submitted, waiting for receipt");

        loop {
            if let Some(receipt) = self.receipt(&tx_hash).await? {
                return confirmation_from_receipt(receipt);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn confirmation_from_receipt(receipt: TransactionReceipt) -> Result<Confirmation, LedgerError> {
    if receipt.status.as_deref() != Some("0x1") {
        return Err(LedgerError::Reverted {
            tx_hash: receipt.transaction_hash,
        });
    }

    Ok(Confirmation {
        block_number: receipt
            .block_number
            .as_deref()
            .and_then(|n| u64::from_str_radix(n.trim_start_matches("0x"), 16).ok()),
        tx_hash: receipt.transaction_hash,
    })
}

/// ABI word for an address: 12 zero bytes then the 20 address bytes
fn encode_address(address: &Address) -> String {
    format!("{}{}", "00".repeat(12), hex::encode(address.as_bytes()))
}

/// Call data of `transfer(target, amount)`
fn transfer_calldata(target: &Address, amount: Amount) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 64);
    data.extend_from_slice(&TRANSFER_SELECTOR);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(target.as_bytes());

    let mut word = [0u8; 32];
    amount.as_u256().to_big_endian(&mut word);
    data.extend_from_slice(&word);
    data
}

fn decode_quantity(text: &str) -> Result<U256, LedgerError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    U256::from_str_radix(digits, 16)
        .map_err(|_| LedgerError::InvalidResponse(format!("bad quantity '{}'", text)))
}

fn decode_uint256(data: &str) -> Result<Amount, LedgerError> {
    let digits = data.trim_start_matches("0x");
    let bytes = hex::decode(digits)
        .map_err(|e| LedgerError::InvalidResponse(format!("bad hex '{}': {}", data, e)))?;
    if bytes.len() != 32 {
        return Err(LedgerError::InvalidResponse(format!(
            "expected a 32-byte word, got {} bytes",
            bytes.len()
        )));
    }
    Ok(Amount::new(U256::from_big_endian(&bytes)))
}
