//! Local transaction signing
//!
//! Transfers are signed in-process with the sender's secp256k1 key and
//! submitted as raw transactions, so the node never holds the key. Transactions
//! are legacy (type 0) with EIP-155 replay protection:
//!
//! - signing payload: `rlp([nonce, gas_price, gas_limit, to, value, data, chain_id, 0, 0])`
//! - signed form: `rlp([nonce, gas_price, gas_limit, to, value, data, v, r, s])`
//!   with `v = recovery_id + chain_id * 2 + 35`

use crate::types::address::ADDRESS_LEN;
use crate::types::{Address, AirdropError, LedgerError};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use primitive_types::U256;
use rlp::RlpStream;
use sha3::{Digest, Keccak256};
use std::fmt;

/// An unsigned legacy transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

impl LegacyTransaction {
    fn append_body(&self, stream: &mut RlpStream) {
        stream.append(&self.nonce);
        stream.append(&self.gas_price);
        stream.append(&self.gas_limit);
        stream.append(&self.to.as_bytes().to_vec());
        stream.append(&self.value);
        stream.append(&self.data);
    }

    /// RLP payload whose hash is signed
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(9);
        self.append_body(&mut stream);
        stream.append(&self.chain_id);
        stream.append(&0u8);
        stream.append(&0u8);
        stream.out().to_vec()
    }

    pub fn signing_hash(&self) -> [u8; 32] {
        Keccak256::digest(self.signing_payload()).into()
    }
}

/// A sender key held in memory
#[derive(Clone)]
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl LocalSigner {
    /// Parse a 32-byte private key written as hex, `0x` optional
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the text is not 64 hex digits or not a valid
    /// secp256k1 scalar. The key itself never appears in the message.
    pub fn from_hex(text: &str) -> Result<Self, AirdropError> {
        let digits = text.trim();
        let digits = digits.strip_prefix("0x").unwrap_or(digits);

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| {
            AirdropError::configuration("Private key must be 32 bytes of hex")
        })?;
        let key = SigningKey::from_slice(&bytes).map_err(|_| {
            AirdropError::configuration("Private key is not a valid secp256k1 key")
        })?;

        Ok(Self::from_key(key))
    }

    fn from_key(key: SigningKey) -> Self {
        let point = key.verifying_key().to_encoded_point(false);
        let hash = Keccak256::digest(&point.as_bytes()[1..]);

        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&hash[32 - ADDRESS_LEN..]);
        Self {
            key,
            address: Address::from_bytes(bytes),
        }
    }

    /// Account the key controls
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Sign `tx` and return the raw transaction, `0x` prefixed
    ///
    /// # Errors
    ///
    /// Returns `Rejected` if signing fails, which only happens for a degenerate
    /// hash.
    pub fn sign(&self, tx: &LegacyTransaction) -> Result<String, LedgerError> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&tx.signing_hash())
            .map_err(|e| LedgerError::Rejected(format!("signing failed: {}", e)))?;

        let v = u64::from(recovery_id.to_byte()) + tx.chain_id * 2 + 35;
        let rs = signature.to_bytes();

        let mut stream = RlpStream::new_list(9);
        tx.append_body(&mut stream);
        stream.append(&v);
        stream.append(&U256::from_big_endian(&rs[..32]));
        stream.append(&U256::from_big_endian(&rs[32..]));
        Ok(format!("0x{}", hex::encode(stream.out())))
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address.to_checksum())
            .finish_non_exhaustive()
    }
}
