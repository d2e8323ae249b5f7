//! Core type definitions for the transaction model.
//!
//! These are the vocabulary types the rest of the crate builds on. They
//! are deliberately small, validated at construction, and cheap to clone.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// The string is not a well-formed Meridian account address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid account address {0:?}: expected \"mrd:\" followed by 40 hex characters")]
pub struct AddressError(pub String);

/// A ledger account address: `mrd:` plus the 40-hex account identifier.
///
/// Addresses reference externally-owned identity records; the wallet core
/// validates their shape and otherwise treats them as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Validates and wraps an address string. The hex part is accepted in
    /// either case and canonicalized to lowercase.
    pub fn new(s: &str) -> Result<Address, AddressError> {
        let hex_part = s
            .strip_prefix(config::ADDRESS_PREFIX)
            .ok_or_else(|| AddressError(s.to_string()))?;
        let valid = hex_part.len() == config::ADDRESS_HEX_LENGTH
            && hex_part.bytes().all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(AddressError(s.to_string()));
        }
        Ok(Address(format!(
            "{}{}",
            config::ADDRESS_PREFIX,
            hex_part.to_ascii_lowercase()
        )))
    }

    /// Builds an address from a raw account identifier. Infallible: the
    /// identifier length is fixed by the type.
    pub fn from_account_id(id: &[u8; config::ACCOUNT_ID_LENGTH]) -> Address {
        Address(format!("{}{}", config::ADDRESS_PREFIX, hex::encode(id)))
    }

    /// The canonical address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::new(&value)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> String {
        addr.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Destination
// ---------------------------------------------------------------------------

/// Where a payment goes: an address plus the optional tag some custodial
/// receivers require to route incoming funds internally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub address: Address,
    pub tag: Option<u32>,
}

impl Destination {
    /// A destination with no tag.
    pub fn to_address(address: Address) -> Destination {
        Destination { address, tag: None }
    }

    /// A destination with a routing tag.
    pub fn with_tag(address: Address, tag: u32) -> Destination {
        Destination {
            address,
            tag: Some(tag),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tag {
            Some(tag) => write!(f, "{}#{}", self.address, tag),
            None => write!(f, "{}", self.address),
        }
    }
}

// ---------------------------------------------------------------------------
// TxKind
// ---------------------------------------------------------------------------

/// Classification of a transaction instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxKind {
    /// System-generated, never user-authored. Structural validation only.
    Pseudo,
    /// User-authored and ledger-recorded; full business-rule validation.
    Genuine,
    /// A wire type this client's catalogue does not recognize; handled
    /// generically with kind-specific validation skipped.
    Fallback,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pseudo => write!(f, "Pseudo"),
            Self::Genuine => write!(f, "Genuine"),
            Self::Fallback => write!(f, "Fallback"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
