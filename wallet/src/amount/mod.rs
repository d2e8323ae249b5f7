//! # Amount Model
//!
//! Normalization layer between user-entered values, the ledger's wire
//! formats, and the reserved NFT-identifier encoding.
//!
//! ```text
//! value.rs — exact mantissa/exponent decimals (no floats near money)
//! codec.rs — wire encode/decode, NFT range, display policy, transfer rates
//! mod.rs   — the Amount tagged union and its wire JSON forms
//! ```
//!
//! An [`Amount`] is exactly one of three forms:
//!
//! - **Native** — an integer count of motes, a plain string on the wire.
//! - **Issued** — currency code + issuer + exact decimal value string.
//! - **NftToken** — issued-shaped on the wire, but the value sits in the
//!   reserved magnitude range and decodes to a token ordinal.

mod codec;
mod value;

pub use codec::{
    from_wire, requires_partial_payment, to_wire, AmountError, DisplayAmount, TransferRate,
    Truncation, WireDecoded,
};
pub use value::{DecimalError, DecimalValue};

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config;
use crate::transaction::types::Address;

// ---------------------------------------------------------------------------
// CurrencyCode
// ---------------------------------------------------------------------------

/// A three-character issued-currency ticker.
///
/// Three ASCII uppercase alphanumerics, and never the native ticker —
/// native value moves as motes, not as a trust line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Validates and wraps a ticker string.
    pub fn new(code: &str) -> Result<CurrencyCode, AmountError> {
        let valid = code.len() == 3
            && code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
        if !valid {
            return Err(AmountError::BadCurrencyCode(code.to_string()));
        }
        if code == config::NATIVE_CURRENCY {
            return Err(AmountError::NativeCodeReuse(code.to_string()));
        }
        Ok(CurrencyCode(code.to_string()))
    }

    /// The ticker string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> String {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Amount Forms
// ---------------------------------------------------------------------------

/// An integer count of motes. The wire form is a plain decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeAmount {
    motes: u64,
}

impl NativeAmount {
    /// Wraps a motes count, bounded by the total supply.
    pub fn new(motes: u64) -> Result<NativeAmount, AmountError> {
        if motes > config::MAX_NATIVE_MOTES {
            return Err(AmountError::ExceedsSupply {
                got: motes,
                max: config::MAX_NATIVE_MOTES,
            });
        }
        Ok(NativeAmount { motes })
    }

    /// Parses the wire string form.
    pub fn from_wire_str(s: &str) -> Result<NativeAmount, AmountError> {
        let motes: u64 = s
            .parse()
            .map_err(|_| AmountError::MalformedMotes(s.to_string()))?;
        NativeAmount::new(motes)
    }

    /// The raw motes count.
    pub fn motes(&self) -> u64 {
        self.motes
    }

    /// Human-readable MRD rendering, e.g. `1_500_000` motes → `"1.500000 MRD"`.
    pub fn display_mrd(&self) -> String {
        let whole = self.motes / config::MOTES_PER_MRD;
        let frac = self.motes % config::MOTES_PER_MRD;
        format!("{}.{:06} {}", whole, frac, config::NATIVE_CURRENCY)
    }
}

/// An issued-currency amount: the exact value string the user or the wire
/// supplied, preserved byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedAmount {
    currency: CurrencyCode,
    issuer: Address,
    value: String,
}

impl IssuedAmount {
    /// Validates the value through the codec and wraps the triple.
    pub fn new(
        currency: CurrencyCode,
        issuer: Address,
        value: &str,
    ) -> Result<IssuedAmount, AmountError> {
        let value = codec::to_wire(value, false)?;
        Ok(IssuedAmount {
            currency,
            issuer,
            value,
        })
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn issuer(&self) -> &Address {
        &self.issuer
    }

    /// The exact decimal value string.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Display rendering under the wallet's precision policy.
    pub fn display(&self) -> DisplayAmount {
        match codec::from_wire(&self.value) {
            // Construction validated the value as a quantity, so the codec
            // cannot see anything else here.
            Ok(WireDecoded::Quantity(display)) => display,
            _ => DisplayAmount {
                text: self.value.clone(),
                truncation: Truncation::None,
                raw: self.value.clone(),
            },
        }
    }
}

/// An NFT ordinal riding in the issued-currency wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftAmount {
    currency: CurrencyCode,
    issuer: Address,
    ordinal: u64,
}

impl NftAmount {
    /// Wraps an ordinal, range-checked against the encoding's capacity.
    pub fn new(
        currency: CurrencyCode,
        issuer: Address,
        ordinal: u64,
    ) -> Result<NftAmount, AmountError> {
        // Encoding validates the range; the string itself is rebuilt on
        // demand by `wire_value`.
        codec::encode_nft_ordinal(ordinal)?;
        Ok(NftAmount {
            currency,
            issuer,
            ordinal,
        })
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn issuer(&self) -> &Address {
        &self.issuer
    }

    /// The decoded token ordinal.
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    /// The reserved-range wire spelling of this ordinal.
    pub fn wire_value(&self) -> String {
        // Range was checked at construction; re-encoding cannot fail.
        codec::encode_nft_ordinal(self.ordinal).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// A ledger amount: exactly one of the three forms is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Amount {
    /// Native currency, counted in motes.
    Native(NativeAmount),
    /// An issued-currency quantity.
    Issued(IssuedAmount),
    /// An NFT ordinal in the reserved encoding.
    NftToken(NftAmount),
}

impl Amount {
    /// `true` when the amount represents a strictly positive quantity.
    /// NFT amounts are always positive: ordinal zero does not exist.
    pub fn is_positive(&self) -> bool {
        match self {
            Amount::Native(n) => n.motes() > 0,
            Amount::Issued(i) => DecimalValue::parse(i.value())
                .map(|v| !v.is_zero())
                .unwrap_or(false),
            Amount::NftToken(_) => true,
        }
    }

    /// The issuing account, for the two issued-shaped forms.
    pub fn issuer(&self) -> Option<&Address> {
        match self {
            Amount::Native(_) => None,
            Amount::Issued(i) => Some(i.issuer()),
            Amount::NftToken(n) => Some(n.issuer()),
        }
    }

    /// The issuer whose transfer rate can apply: issued quantities only.
    /// NFT ordinals are identifiers, not quantities — no fee math applies.
    pub fn fee_issuer(&self) -> Option<&Address> {
        match self {
            Amount::Issued(i) => Some(i.issuer()),
            _ => None,
        }
    }

    /// Serializes to the wire JSON form: a motes string for native, an
    /// object for the issued shapes.
    pub fn to_wire_json(&self) -> Value {
        match self {
            Amount::Native(n) => Value::String(n.motes().to_string()),
            Amount::Issued(i) => json!({
                "currency": i.currency().as_str(),
                "issuer": i.issuer().as_str(),
                "value": i.value(),
            }),
            Amount::NftToken(n) => json!({
                "currency": n.currency().as_str(),
                "issuer": n.issuer().as_str(),
                "value": n.wire_value(),
            }),
        }
    }

    /// Parses the wire JSON form, classifying issued-shaped values through
    /// the codec so reserved-range values come back as NFT ordinals.
    pub fn from_wire_json(value: &Value) -> Result<Amount, AmountError> {
        match value {
            Value::String(motes) => Ok(Amount::Native(NativeAmount::from_wire_str(motes)?)),
            Value::Object(map) => {
                let field = |name: &str| {
                    map.get(name)
                        .and_then(Value::as_str)
                        .ok_or(AmountError::MalformedWire)
                };
                let currency = CurrencyCode::new(field("currency")?)?;
                let issuer = Address::new(field("issuer")?)
                    .map_err(|_| AmountError::MalformedWire)?;
                let raw_value = field("value")?;
                match codec::from_wire(raw_value)? {
                    WireDecoded::NftOrdinal(ordinal) => {
                        Ok(Amount::NftToken(NftAmount::new(currency, issuer, ordinal)?))
                    }
                    WireDecoded::Quantity(_) => Ok(Amount::Issued(IssuedAmount {
                        currency,
                        issuer,
                        value: raw_value.to_string(),
                    })),
                }
            }
            _ => Err(AmountError::MalformedWire),
        }
    }

    /// Appends the canonical byte form used for transaction hashing.
    /// A one-byte tag keeps the three forms from ever colliding.
    pub(crate) fn signable_bytes(&self, buf: &mut Vec<u8>) {
        match self {
            Amount::Native(n) => {
                buf.push(b'N');
                buf.extend_from_slice(&n.motes().to_le_bytes());
            }
            Amount::Issued(i) => {
                buf.push(b'I');
                buf.extend_from_slice(i.currency().as_str().as_bytes());
                buf.extend_from_slice(i.issuer().as_str().as_bytes());
                buf.push(0x00);
                buf.extend_from_slice(i.value().as_bytes());
                buf.push(0x00);
            }
            Amount::NftToken(n) => {
                buf.push(b'T');
                buf.extend_from_slice(n.currency().as_str().as_bytes());
                buf.extend_from_slice(n.issuer().as_str().as_bytes());
                buf.push(0x00);
                buf.extend_from_slice(&n.ordinal().to_le_bytes());
            }
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Native(n) => write!(f, "{}", n.display_mrd()),
            Amount::Issued(i) => write!(f, "{} {}", i.display().text, i.currency()),
            Amount::NftToken(n) => write!(f, "NFT #{} ({})", n.ordinal(), n.currency()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_account_id(&[byte; config::ACCOUNT_ID_LENGTH])
    }

    fn usd() -> CurrencyCode {
        CurrencyCode::new("USD").unwrap()
    }

    #[test]
    fn currency_code_validation() {
        assert!(CurrencyCode::new("USD").is_ok());
        assert!(CurrencyCode::new("X42").is_ok());
        assert!(CurrencyCode::new("usd").is_err());
        assert!(CurrencyCode::new("USDC").is_err());
        assert!(CurrencyCode::new("U$").is_err());
        // The native ticker is off-limits for issued currencies.
        assert!(matches!(
            CurrencyCode::new(config::NATIVE_CURRENCY),
            Err(AmountError::NativeCodeReuse(_))
        ));
    }

    #[test]
    fn native_amount_bounds() {
        assert!(NativeAmount::new(0).is_ok());
        assert!(NativeAmount::new(config::MAX_NATIVE_MOTES).is_ok());
        assert!(NativeAmount::new(config::MAX_NATIVE_MOTES + 1).is_err());
        assert!(NativeAmount::from_wire_str("abc").is_err());
        assert!(NativeAmount::from_wire_str("-5").is_err());
    }

    #[test]
    fn native_display() {
        let amt = NativeAmount::new(1_500_000).unwrap();
        assert_eq!(amt.display_mrd(), "1.500000 MRD");
    }

    #[test]
    fn issued_amount_preserves_exact_value() {
        let amt = IssuedAmount::new(usd(), addr(1), "123.456789123").unwrap();
        assert_eq!(amt.value(), "123.456789123");
        // Display truncates, the stored value does not.
        assert_eq!(amt.display().text, "123.45679");
        assert_eq!(amt.display().raw, "123.456789123");
    }

    #[test]
    fn issued_amount_rejects_reserved_range() {
        assert!(IssuedAmount::new(usd(), addr(1), "1e-81").is_err());
    }

    #[test]
    fn amount_positivity() {
        let native_zero = Amount::Native(NativeAmount::new(0).unwrap());
        let native_one = Amount::Native(NativeAmount::new(1).unwrap());
        let issued_zero = Amount::Issued(IssuedAmount::new(usd(), addr(1), "0").unwrap());
        let nft = Amount::NftToken(NftAmount::new(usd(), addr(1), 7).unwrap());

        assert!(!native_zero.is_positive());
        assert!(native_one.is_positive());
        assert!(!issued_zero.is_positive());
        assert!(nft.is_positive());
    }

    #[test]
    fn wire_json_round_trip_native() {
        let amt = Amount::Native(NativeAmount::new(42).unwrap());
        let wire = amt.to_wire_json();
        assert_eq!(wire, Value::String("42".to_string()));
        assert_eq!(Amount::from_wire_json(&wire).unwrap(), amt);
    }

    #[test]
    fn wire_json_round_trip_issued() {
        let amt = Amount::Issued(IssuedAmount::new(usd(), addr(2), "12.5").unwrap());
        let round = Amount::from_wire_json(&amt.to_wire_json()).unwrap();
        assert_eq!(round, amt);
    }

    #[test]
    fn wire_json_classifies_nft() {
        let amt = Amount::NftToken(NftAmount::new(usd(), addr(2), 4242).unwrap());
        let wire = amt.to_wire_json();
        match Amount::from_wire_json(&wire).unwrap() {
            Amount::NftToken(n) => assert_eq!(n.ordinal(), 4242),
            other => panic!("expected NftToken, got {:?}", other),
        }
    }

    #[test]
    fn malformed_wire_amounts_rejected() {
        assert!(Amount::from_wire_json(&Value::Bool(true)).is_err());
        assert!(Amount::from_wire_json(&serde_json::json!({"currency": "USD"})).is_err());
    }

    #[test]
    fn signable_bytes_distinguish_forms() {
        let issued = Amount::Issued(IssuedAmount::new(usd(), addr(1), "7").unwrap());
        let nft = Amount::NftToken(NftAmount::new(usd(), addr(1), 7).unwrap());
        let (mut a, mut b) = (Vec::new(), Vec::new());
        issued.signable_bytes(&mut a);
        nft.signable_bytes(&mut b);
        assert_ne!(a, b);
    }
}
