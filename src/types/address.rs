//! Ledger account identifiers
//!
//! An [`Address`] is a 20-byte account reference written as 40 hex digits with an
//! optional `0x` prefix. Mixed-case input must carry a valid EIP-55 checksum;
//! all-lowercase and all-uppercase input is accepted as is.

use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Number of bytes in an address
pub const ADDRESS_LEN: usize = 20;

/// Why a string is not an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    /// Not 40 hex digits
    Format,
    /// Mixed case that does not match the EIP-55 checksum
    Checksum,
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressError::Format => write!(f, "expected 40 hex digits"),
            AddressError::Checksum => write!(f, "bad checksum"),
        }
    }
}

impl std::error::Error for AddressError {}

/// A validated account identifier
///
/// Keeps the text it was parsed from so outputs can echo the input verbatim.
#[derive(Debug, Clone)]
pub struct Address {
    bytes: [u8; ADDRESS_LEN],
    original: String,
}

impl Address {
    /// The all-zero address
    pub fn zero() -> Self {
        Self::from_bytes([0u8; ADDRESS_LEN])
    }

    /// Build an address from raw bytes, rendered in checksummed form
    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        let original = checksum_encode(&bytes);
        Self { bytes, original }
    }

    /// Parse and validate an address
    pub fn parse(text: &str) -> Result<Self, AddressError> {
        // only a lowercase prefix counts, `0X...` fails the length check
        let digits = text.strip_prefix("0x").unwrap_or(text);

        if digits.len() != ADDRESS_LEN * 2 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressError::Format);
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| AddressError::Format)?;

        let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
        let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
        if has_lower && has_upper && checksum_encode(&bytes)[2..] != *digits {
            return Err(AddressError::Checksum);
        }

        Ok(Self {
            bytes,
            original: text.to_string(),
        })
    }

    /// Whether `text` is a valid address
    pub fn is_valid(text: &str) -> bool {
        Self::parse(text).is_ok()
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.bytes
    }

    /// The text this address was parsed from
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// EIP-55 checksummed rendering, `0x` prefixed
    pub fn to_checksum(&self) -> String {
        checksum_encode(&self.bytes)
    }

    /// Lowercase rendering, `0x` prefixed
    pub fn to_lower_hex(&self) -> String {
        format!("0x{}", hex::encode(self.bytes))
    }

    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|b| *b == 0)
    }
}

fn checksum_encode(bytes: &[u8; ADDRESS_LEN]) -> String {
    let lower = hex::encode(bytes);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(2 + lower.len());
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

// Equality is on the account, not on how it was written
impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Address {}

impl std::hash::Hash for Address {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
