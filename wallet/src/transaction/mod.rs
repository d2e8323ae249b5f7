//! # Transaction Module
//!
//! The typed transaction catalogue and its wire round trip.
//!
//! ## Architecture
//!
//! ```text
//! types.rs          — Address, Destination, TxKind vocabulary types
//! payment.rs        — Payment (genuine): the full business-rule type
//! account_config.rs — AccountConfig (genuine): account option changes
//! pseudo.rs         — FeeAdjust (pseudo): system-generated records
//! fallback.rs       — Fallback: anything the catalogue does not know
//! mod.rs            — the closed Transaction enum and shared capabilities
//! ```
//!
//! ## Design Decisions
//!
//! - Dispatch over the catalogue is a closed enum plus pattern matching.
//!   Adding a type means the compiler walks you through every place that
//!   must learn about it; no string-keyed lookup can silently miss one.
//! - The wire form is JSON keyed by field name. The *canonical* form used
//!   for hashing is [`Transaction::signable_bytes`]: a deterministic
//!   concatenation with NUL separators and fixed-width little-endian
//!   integers, because JSON key order is nobody's friend.
//! - Unrecognized wire types become [`Fallback`] rather than errors: the
//!   wallet renders what it can and round-trips the rest untouched.

pub mod account_config;
pub mod fallback;
pub mod payment;
pub mod pseudo;
pub mod types;

pub use account_config::AccountConfig;
pub use fallback::Fallback;
pub use payment::{Payment, PARTIAL_PAYMENT_FLAG};
pub use pseudo::FeeAdjust;
pub use types::{Address, AddressError, Destination, TxKind};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::crypto::double_sha256;
use crate::field::FieldDef;
use crate::flags::{FlagTable, UnknownFlagNameError, ACCOUNT_CONFIG_FLAGS, NO_FLAGS, PAYMENT_FLAGS};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A business rule failed before submission. Every reason is written for
/// the person correcting the input — these surface in the UI with no
/// network round trip behind them.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// No destination was set.
    #[error("destination is missing: choose who receives this payment")]
    MissingDestination,

    /// The destination is the sending account itself.
    #[error("destination {address} is the sending account: a payment cannot pay its sender")]
    SelfPayment { address: String },

    /// No amount was set.
    #[error("amount is missing: enter how much to send")]
    MissingAmount,

    /// The amount is zero.
    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    /// The issuer's transfer fee applies but the partial flag is absent.
    #[error("the issuer charges a transfer fee: the payment must be marked partial")]
    MissingPartialPayment,

    /// A flag name in the set is not registered for this type.
    #[error(transparent)]
    UnknownFlag(#[from] UnknownFlagNameError),
}

/// A wire object could not be serialized or deserialized.
#[derive(Debug, Error)]
pub enum WireError {
    /// The wire value is not a JSON object.
    #[error("wire transaction must be a JSON object")]
    NotAnObject,

    /// The object lacks its type discriminant.
    #[error("wire transaction is missing the TransactionType field")]
    MissingTypeName,

    /// A required field is absent.
    #[error("missing required field {0}")]
    MissingField(&'static str),

    /// A field is present but unusable.
    #[error("field {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    /// Folding the flag set hit an unregistered name.
    #[error(transparent)]
    UnknownFlag(#[from] UnknownFlagNameError),
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// The closed transaction catalogue.
///
/// The shared capability set — kind, type name, account, field table,
/// validate, wire round trip, canonical bytes — dispatches over this enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Transaction {
    Payment(Payment),
    AccountConfig(AccountConfig),
    FeeAdjust(FeeAdjust),
    Fallback(Fallback),
}

impl Transaction {
    /// Instance classification: pseudo, genuine, or fallback.
    pub fn kind(&self) -> TxKind {
        match self {
            Transaction::Payment(_) | Transaction::AccountConfig(_) => TxKind::Genuine,
            Transaction::FeeAdjust(_) => TxKind::Pseudo,
            Transaction::Fallback(_) => TxKind::Fallback,
        }
    }

    /// The concrete type identifier, as it appears on the wire.
    pub fn type_name(&self) -> &str {
        match self {
            Transaction::Payment(_) => "Payment",
            Transaction::AccountConfig(_) => "AccountConfig",
            Transaction::FeeAdjust(_) => "FeeAdjust",
            Transaction::Fallback(f) => f.type_name(),
        }
    }

    /// The signing/source account. Pseudo transactions have none, and a
    /// fallback only has one if the wire carried a well-formed address.
    pub fn account(&self) -> Option<Address> {
        match self {
            Transaction::Payment(p) => Some(p.account().clone()),
            Transaction::AccountConfig(c) => Some(c.account().clone()),
            Transaction::FeeAdjust(_) => None,
            Transaction::Fallback(f) => f.account(),
        }
    }

    /// The fixed, ordered field table of the concrete type. Fallback
    /// instances expose no declared fields — their content is generic.
    pub fn fields(&self) -> &'static [FieldDef] {
        match self {
            Transaction::Payment(_) => Payment::FIELDS,
            Transaction::AccountConfig(_) => AccountConfig::FIELDS,
            Transaction::FeeAdjust(_) | Transaction::Fallback(_) => &[],
        }
    }

    /// The flag table scoped to this type.
    pub fn flag_table(&self) -> &'static FlagTable {
        match self {
            Transaction::Payment(_) => &PAYMENT_FLAGS,
            Transaction::AccountConfig(_) => &ACCOUNT_CONFIG_FLAGS,
            Transaction::FeeAdjust(_) | Transaction::Fallback(_) => &NO_FLAGS,
        }
    }

    /// Runs the type's validation. Genuine types enforce business rules;
    /// pseudo and fallback instances are structural-only, so they pass —
    /// their structure was already proven at construction or parse time.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Transaction::Payment(p) => p.validate(),
            Transaction::AccountConfig(c) => c.validate(),
            Transaction::FeeAdjust(_) | Transaction::Fallback(_) => Ok(()),
        }
    }

    /// Serializes to the wire JSON object.
    pub fn to_wire(&self) -> Result<Value, WireError> {
        match self {
            Transaction::Payment(p) => p.to_wire(),
            Transaction::AccountConfig(c) => c.to_wire(),
            Transaction::FeeAdjust(f) => Ok(f.to_wire()),
            Transaction::Fallback(f) => Ok(f.to_wire()),
        }
    }

    /// Parses a wire JSON object, routing unknown types to [`Fallback`].
    pub fn from_wire(value: &Value) -> Result<Transaction, WireError> {
        let map = value.as_object().ok_or(WireError::NotAnObject)?;
        let type_name = map
            .get("TransactionType")
            .and_then(Value::as_str)
            .ok_or(WireError::MissingTypeName)?;

        match type_name {
            "Payment" => Ok(Transaction::Payment(Payment::from_wire(map)?)),
            "AccountConfig" => Ok(Transaction::AccountConfig(AccountConfig::from_wire(map)?)),
            "FeeAdjust" => Ok(Transaction::FeeAdjust(FeeAdjust::from_wire(map)?)),
            other => Ok(Transaction::Fallback(Fallback::from_wire(other, map))),
        }
    }

    /// The canonical byte representation hashed into the transaction hash
    /// and signed by the signing capability. Deterministic by
    /// construction; independent of JSON spelling.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);
        match self {
            Transaction::Payment(p) => p.signable_bytes(&mut buf),
            Transaction::AccountConfig(c) => c.signable_bytes(&mut buf),
            Transaction::FeeAdjust(f) => f.signable_bytes(&mut buf),
            Transaction::Fallback(f) => f.signable_bytes(&mut buf),
        }
        buf
    }

    /// `hex(double_sha256(signable_bytes))` — the transaction hash before
    /// the ledger confirms it.
    pub fn hash_hex(&self) -> String {
        hex::encode(double_sha256(&self.signable_bytes()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::{Amount, NativeAmount};
    use crate::config;

    fn addr(byte: u8) -> Address {
        Address::from_account_id(&[byte; config::ACCOUNT_ID_LENGTH])
    }

    fn sample_payment() -> Transaction {
        let mut p = Payment::new(addr(1));
        p.set_destination(Some(addr(2).as_str())).unwrap();
        p.set_amount(Some(Amount::Native(NativeAmount::new(1_000_000).unwrap())));
        Transaction::Payment(p)
    }

    #[test]
    fn kinds_classify_correctly() {
        assert_eq!(sample_payment().kind(), TxKind::Genuine);
        assert_eq!(
            Transaction::FeeAdjust(FeeAdjust::new(10, 1)).kind(),
            TxKind::Pseudo
        );

        let wire = serde_json::json!({ "TransactionType": "Mystery" });
        let tx = Transaction::from_wire(&wire).unwrap();
        assert_eq!(tx.kind(), TxKind::Fallback);
        assert_eq!(tx.type_name(), "Mystery");
    }

    #[test]
    fn pseudo_has_no_account() {
        assert!(Transaction::FeeAdjust(FeeAdjust::new(10, 1)).account().is_none());
    }

    #[test]
    fn pseudo_validation_is_structural_only() {
        assert!(Transaction::FeeAdjust(FeeAdjust::new(0, 0)).validate().is_ok());
    }

    #[test]
    fn wire_round_trip_known_type() {
        let tx = sample_payment();
        let wire = tx.to_wire().unwrap();
        assert_eq!(Transaction::from_wire(&wire).unwrap(), tx);
    }

    #[test]
    fn wire_round_trip_unknown_type_preserves_everything() {
        let wire = serde_json::json!({
            "TransactionType": "EscrowFinish",
            "Account": addr(4).as_str(),
            "TokenId": "BEEF",
            "SomeFutureField": 42,
        });
        let tx = Transaction::from_wire(&wire).unwrap();
        assert_eq!(tx.to_wire().unwrap(), wire);

        match &tx {
            Transaction::Fallback(f) => assert_eq!(f.identifier(), Some("BEEF")),
            other => panic!("expected Fallback, got {:?}", other),
        }
    }

    #[test]
    fn non_object_wire_rejected() {
        assert!(matches!(
            Transaction::from_wire(&serde_json::json!("Payment")),
            Err(WireError::NotAnObject)
        ));
        assert!(matches!(
            Transaction::from_wire(&serde_json::json!({})),
            Err(WireError::MissingTypeName)
        ));
    }

    #[test]
    fn hash_is_deterministic_and_hex() {
        let h1 = sample_payment().hash_hex();
        let h2 = sample_payment().hash_hex();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_changes_with_content() {
        let tx1 = sample_payment();
        let mut p = Payment::new(addr(1));
        p.set_destination(Some(addr(3).as_str())).unwrap();
        p.set_amount(Some(Amount::Native(NativeAmount::new(1_000_000).unwrap())));
        let tx2 = Transaction::Payment(p);
        assert_ne!(tx1.hash_hex(), tx2.hash_hex());
    }

    #[test]
    fn field_tables_expose_declared_order() {
        let tx = sample_payment();
        let names: Vec<&str> = tx.fields().iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            [
                "Account",
                "Destination",
                "DestinationTag",
                "Amount",
                "TransferRate",
                "Flags",
                "InvoiceId"
            ]
        );
    }
}
