//! # Field System
//!
//! Every attribute a transaction carries is declared as a [`FieldDef`]:
//! a name plus a [`FieldKind`] that pins down the wire constraint. The
//! per-type tables are fixed, ordered, `'static` data — what used to be
//! string-keyed dynamic slots in older wallet codebases is a closed enum
//! here, so an unhandled kind is a compile error, not a runtime surprise.
//!
//! Constraint enforcement lives in the typed setters on each transaction
//! struct; they all funnel through this module's validators. The contract
//! is uniform: setting a defined value that violates the kind's constraint
//! fails with [`TypeValidationError`]; clearing a field never fails.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::amount::AmountError;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A field setter received a defined value that violates the field's wire
/// constraint. Always local, always correctable before another attempt.
#[derive(Debug, Error)]
pub enum TypeValidationError {
    /// Blob fields hold hex-encoded bytes: even length, hex digits only.
    #[error("field {field}: expected an even-length hexadecimal string, got {value:?}")]
    InvalidHexBlob { field: &'static str, value: String },

    /// An amount field rejected its value (delegated to the amount codec).
    #[error("field {field}: {source}")]
    InvalidAmount {
        field: &'static str,
        #[source]
        source: AmountError,
    },

    /// An account field received something that is not a ledger address.
    #[error("field {field}: {value:?} is not a valid account address")]
    InvalidAccount { field: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// Field Kinds
// ---------------------------------------------------------------------------

/// The closed set of wire shapes a transaction field can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Hex-encoded opaque bytes (even-length, case-insensitive on input).
    Blob,
    /// A 32-bit unsigned integer.
    UInt32,
    /// An amount in any of the three forms; validated by the amount codec.
    Amount,
    /// A ledger account address.
    Account,
    /// A flag bitmask; folded and unfolded by the flag registry.
    Flags,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob => write!(f, "Blob"),
            Self::UInt32 => write!(f, "UInt32"),
            Self::Amount => write!(f, "Amount"),
            Self::Account => write!(f, "Account"),
            Self::Flags => write!(f, "Flags"),
        }
    }
}

/// One declared field of a transaction type: its wire name, shape, and
/// whether validation demands it be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

// ---------------------------------------------------------------------------
// HexBlob
// ---------------------------------------------------------------------------

/// A validated hex-encoded byte string.
///
/// Input is accepted case-insensitively and stored exactly as given, so a
/// value read back is byte-for-byte the value that was set. Callers that
/// need byte equality across spellings compare [`HexBlob::to_bytes`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexBlob(String);

impl HexBlob {
    /// Validates `value` against the blob constraint for `field`.
    pub fn parse(field: &'static str, value: &str) -> Result<HexBlob, TypeValidationError> {
        let valid = !value.is_empty()
            && value.len() % 2 == 0
            && value.bytes().all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(TypeValidationError::InvalidHexBlob {
                field,
                value: value.to_string(),
            });
        }
        Ok(HexBlob(value.to_string()))
    }

    /// The hex string exactly as it was set.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The decoded bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        // Validated at construction; decoding cannot fail.
        hex::decode(&self.0).unwrap_or_default()
    }

    /// Decoded byte length.
    pub fn len_bytes(&self) -> usize {
        self.0.len() / 2
    }
}

impl fmt::Display for HexBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_blob_reads_back_exactly_what_was_set() {
        for s in ["deadBEEF", "CAFEBABE", "00", "0123456789abcdef"] {
            let blob = HexBlob::parse("InvoiceId", s).unwrap();
            assert_eq!(blob.as_str(), s);
        }
        assert_eq!(HexBlob::parse("X", "deadBEEF").unwrap().len_bytes(), 4);
    }

    #[test]
    fn hex_blob_rejects_odd_length() {
        match HexBlob::parse("InvoiceId", "ABC") {
            Err(TypeValidationError::InvalidHexBlob { field, value }) => {
                assert_eq!(field, "InvoiceId");
                assert_eq!(value, "ABC");
            }
            other => panic!("expected InvalidHexBlob, got {:?}", other),
        }
    }

    #[test]
    fn hex_blob_rejects_non_hex() {
        assert!(HexBlob::parse("InvoiceId", "GHIJ").is_err());
        assert!(HexBlob::parse("InvoiceId", "12 34").is_err());
        assert!(HexBlob::parse("InvoiceId", "").is_err());
    }

    #[test]
    fn byte_equality_across_spellings() {
        let a = HexBlob::parse("X", "abcd").unwrap();
        let b = HexBlob::parse("X", "ABCD").unwrap();
        assert_ne!(a, b, "spelling is preserved");
        assert_eq!(a.to_bytes(), b.to_bytes(), "bytes are equal");
    }
}
