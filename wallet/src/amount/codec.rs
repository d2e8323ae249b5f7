//! Wire encoding, NFT ordinal mapping, and display normalization.
//!
//! One decimal field format carries two very different things: ordinary
//! currency quantities, and NFT ordinals parked in a reserved magnitude
//! range no genuine quantity reaches (see `config`). This module is the
//! single place that distinguishes the two, in both directions.
//!
//! Display is policy, not truth: a value too small or too large for the
//! wallet's 8-significant-digit window is shown truncated and *flagged*,
//! while the exact wire string stays recoverable. Nothing here ever
//! rewrites a stored value.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::value::{DecimalError, DecimalValue};
use crate::config;
use crate::transaction::types::Address;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by amount validation, encoding, or decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// The decimal literal itself was unusable.
    #[error(transparent)]
    Decimal(#[from] DecimalError),

    /// An NFT ordinal outside `1..=MAX_NFT_ORDINAL`. Zero is excluded by
    /// convention: the zero wire value always means the zero quantity.
    #[error("NFT ordinal {got:?} outside the supported range 1..={max}")]
    OrdinalOutOfRange { got: String, max: u64 },

    /// A quantity landed in the reserved NFT magnitude range. Sending it
    /// as-is would be decoded as a token on the far side.
    #[error("value {0:?} lies in the reserved NFT range and cannot be sent as a quantity")]
    ReservedRange(String),

    /// A wire value sits in the NFT range but does not decode to a whole
    /// in-range ordinal.
    #[error("wire value {value:?} is in the NFT range but does not decode to an ordinal")]
    MalformedNftEncoding { value: String },

    /// A native amount that is not a plain integer count of motes.
    #[error("native amount must be an integer count of motes, got {0:?}")]
    MalformedMotes(String),

    /// A native amount exceeding the total supply.
    #[error("native amount {got} exceeds the total supply of {max} motes")]
    ExceedsSupply { got: u64, max: u64 },

    /// A currency code that is not three ASCII uppercase alphanumerics.
    #[error("currency code {0:?} must be three ASCII uppercase alphanumerics")]
    BadCurrencyCode(String),

    /// An issued currency spoofing the native ticker.
    #[error("issued currency must not reuse the native code {0:?}")]
    NativeCodeReuse(String),

    /// A transfer rate outside the ledger's accepted band.
    #[error("transfer rate {got} outside {base}..={max} billionths")]
    BadTransferRate { got: u32, base: u32, max: u32 },

    /// A wire amount that is neither a motes string nor an issued object.
    #[error("wire amount must be a motes string or an issued-currency object")]
    MalformedWire,
}

// ---------------------------------------------------------------------------
// Wire Encoding
// ---------------------------------------------------------------------------

/// Encodes a user-side value into its wire spelling.
///
/// With `is_nft` set, `value` must be a whole ordinal in
/// `1..=MAX_NFT_ORDINAL`; it is mapped into the reserved range as
/// `<ordinal> × 10^NFT_VALUE_EXPONENT`. Otherwise `value` must be a valid
/// non-negative decimal and passes through byte-for-byte — exactness is
/// the caller's to keep, so we never reformat it.
pub fn to_wire(value: &str, is_nft: bool) -> Result<String, AmountError> {
    if is_nft {
        let ordinal: u64 = value
            .parse()
            .map_err(|_| AmountError::OrdinalOutOfRange {
                got: value.to_string(),
                max: config::MAX_NFT_ORDINAL,
            })?;
        return encode_nft_ordinal(ordinal);
    }

    let parsed = DecimalValue::parse(value)?;
    if in_nft_range(&parsed) {
        return Err(AmountError::ReservedRange(value.to_string()));
    }
    Ok(value.to_string())
}

/// Encodes an ordinal directly (the typed construction path).
pub fn encode_nft_ordinal(ordinal: u64) -> Result<String, AmountError> {
    if ordinal == 0 || ordinal > config::MAX_NFT_ORDINAL {
        return Err(AmountError::OrdinalOutOfRange {
            got: ordinal.to_string(),
            max: config::MAX_NFT_ORDINAL,
        });
    }
    Ok(format!("{}e{}", ordinal, config::NFT_VALUE_EXPONENT))
}

/// Whether a parsed wire value sits in the reserved NFT magnitude range.
fn in_nft_range(value: &DecimalValue) -> bool {
    !value.is_zero() && value.adjusted_exponent() <= config::NFT_RANGE_CEILING_EXPONENT
}

// ---------------------------------------------------------------------------
// Wire Decoding
// ---------------------------------------------------------------------------

/// What a wire value turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireDecoded {
    /// An ordinary quantity, normalized for display.
    Quantity(DisplayAmount),
    /// A reserved-range value decoded back to its NFT ordinal.
    NftOrdinal(u64),
}

/// How the displayed text relates to the exact value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Truncation {
    /// Shown exactly (up to the significant-digit window).
    None,
    /// Below the displayable floor; shown as the ellipsis marker.
    Low,
    /// Above the displayable ceiling; shown integer-rounded.
    High,
}

/// A display-ready rendering of a quantity.
///
/// `text` is what the screen shows; `raw` is the exact wire string, kept
/// so the original is recoverable on demand regardless of truncation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayAmount {
    /// Display text, already bounded to the wallet's precision window.
    pub text: String,
    /// Whether (and how) the display text truncates the real value.
    pub truncation: Truncation,
    /// The exact wire string this rendering was derived from.
    pub raw: String,
}

/// Decodes a wire value: detects the reserved NFT range and otherwise
/// produces a display rendering under the wallet's precision policy.
///
/// Zero always displays as the literal `"0"` — it is never NFT-encoded
/// and never truncated.
pub fn from_wire(wire_value: &str) -> Result<WireDecoded, AmountError> {
    let parsed = DecimalValue::parse(wire_value)?;

    if parsed.is_zero() {
        return Ok(WireDecoded::Quantity(DisplayAmount {
            text: "0".to_string(),
            truncation: Truncation::None,
            raw: wire_value.to_string(),
        }));
    }

    if in_nft_range(&parsed) {
        return decode_nft_ordinal(&parsed, wire_value).map(WireDecoded::NftOrdinal);
    }

    let floor = DecimalValue::from_parts(1, config::MIN_DISPLAY_EXPONENT);
    if parsed < floor {
        return Ok(WireDecoded::Quantity(DisplayAmount {
            text: config::TRUNCATED_LOW_MARKER.to_string(),
            truncation: Truncation::Low,
            raw: wire_value.to_string(),
        }));
    }

    let ceiling = DecimalValue::from_parts(config::MAX_DISPLAY_MAGNITUDE, 0);
    if parsed > ceiling {
        return Ok(WireDecoded::Quantity(DisplayAmount {
            text: parsed.integer_rounded_string(),
            truncation: Truncation::High,
            raw: wire_value.to_string(),
        }));
    }

    Ok(WireDecoded::Quantity(DisplayAmount {
        text: parsed
            .round_sig(config::DISPLAY_SIGNIFICANT_DIGITS)
            .to_plain_string(),
        truncation: Truncation::None,
        raw: wire_value.to_string(),
    }))
}

/// Recovers the ordinal from a reserved-range value. The encoding admits
/// trailing-zero drift (`1000e-81` and `1e-78` are the same value), so the
/// decoder works from the normalized form.
fn decode_nft_ordinal(value: &DecimalValue, original: &str) -> Result<u64, AmountError> {
    let malformed = || AmountError::MalformedNftEncoding {
        value: original.to_string(),
    };

    let shift = value.exponent() - config::NFT_VALUE_EXPONENT;
    if shift < 0 {
        // Finer-grained than the encoding produces: not a whole ordinal.
        return Err(malformed());
    }
    let ordinal = (value.mantissa() as u128)
        .checked_mul(10u128.pow(shift as u32))
        .ok_or_else(malformed)?;
    if ordinal == 0 || ordinal > config::MAX_NFT_ORDINAL as u128 {
        return Err(malformed());
    }
    Ok(ordinal as u64)
}

// ---------------------------------------------------------------------------
// Transfer Rates
// ---------------------------------------------------------------------------

/// An issuer's configured transfer rate, in billionths of the base.
/// `TRANSFER_RATE_BASE` (1.0×) means no fee; the ledger caps rates at 2.0×.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferRate(u32);

impl TransferRate {
    /// Validates a raw billionths value against the ledger's band.
    pub fn new(billionths: u32) -> Result<TransferRate, AmountError> {
        if billionths < config::TRANSFER_RATE_BASE || billionths > config::MAX_TRANSFER_RATE {
            return Err(AmountError::BadTransferRate {
                got: billionths,
                base: config::TRANSFER_RATE_BASE,
                max: config::MAX_TRANSFER_RATE,
            });
        }
        Ok(TransferRate(billionths))
    }

    /// The raw billionths value.
    pub fn billionths(&self) -> u32 {
        self.0
    }

    /// `true` when the issuer actually charges something.
    pub fn has_fee(&self) -> bool {
        self.0 > config::TRANSFER_RATE_BASE
    }
}

/// Whether a payment must be marked partial: required whenever the issuer
/// charges a transfer fee, and in the self-issuance edge case where the
/// payer *is* the issuer (the deducted and delivered amounts can then
/// legitimately differ).
pub fn requires_partial_payment(
    rate: Option<TransferRate>,
    payer: &Address,
    issuer: &Address,
) -> bool {
    rate.is_some_and(|r| r.has_fee()) || payer == issuer
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
