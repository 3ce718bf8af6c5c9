//! Identity types for ledger participants and assets.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of an address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Errors produced when parsing an [`Address`] from text.
#[derive(Debug, Error, PartialEq)]
pub enum AddressError {
    /// Wrong number of hex digits.
    #[error("Invalid address length: expected {expected} hex digits, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Non-hex characters in the address.
    #[error("Invalid address hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// A 20-byte account or contract identity.
///
/// Rendered as `0x`-prefixed lowercase hex and serialized as that string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Deterministically derive an address from a label.
    ///
    /// Takes the first 20 bytes of `sha256(label)`. Used to mint stable
    /// identities for simulated users and mock contracts.
    pub fn derive(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[..ADDRESS_LEN]);
        Self(bytes)
    }

    /// Parse from hex, with or without a `0x` prefix.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        if digits.len() != ADDRESS_LEN * 2 {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_LEN * 2,
                actual: digits.len(),
            });
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Check if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display_and_parse() {
        let address = Address::from_bytes([0xab; ADDRESS_LEN]);
        let text = address.to_string();
        assert_eq!(text, format!("0x{}", "ab".repeat(ADDRESS_LEN)));
        assert_eq!(Address::parse(&text).unwrap(), address);
        assert_eq!(Address::parse(&text[2..]).unwrap(), address);
    }

    #[test]
    fn test_address_parse_errors() {
        assert_eq!(
            Address::parse("0x1234"),
            Err(AddressError::InvalidLength {
                expected: 40,
                actual: 4
            })
        );
        assert!(matches!(
            Address::parse(&"zz".repeat(ADDRESS_LEN)),
            Err(AddressError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_derive_is_stable() {
        let a = Address::derive("user1");
        assert_eq!(a, Address::derive("user1"));
        assert_ne!(a, Address::derive("user2"));
        assert!(!a.is_zero());
        assert!(Address::ZERO.is_zero());
    }

    #[test]
    fn test_address_serializes_as_string() {
        let address = Address::derive("owner");
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{address}\""));

        let parsed: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, address);
        assert!(serde_json::from_str::<Address>("\"0x12\"").is_err());
    }
}
