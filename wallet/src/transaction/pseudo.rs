//! Pseudo transactions.
//!
//! The ledger itself emits these — no user authors one, no wallet signs
//! one. The client still has to decode them faithfully when they show up
//! in account history, so the catalogue carries the one kind we render:
//! the periodic base-fee adjustment. Validation is structural only; there
//! are no business rules to break on a record the ledger already applied.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::WireError;

/// A system-generated base-fee update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeAdjust {
    base_fee_motes: u64,
    ledger_index: u64,
}

impl FeeAdjust {
    pub fn new(base_fee_motes: u64, ledger_index: u64) -> FeeAdjust {
        FeeAdjust {
            base_fee_motes,
            ledger_index,
        }
    }

    /// The new base fee, in motes.
    pub fn base_fee_motes(&self) -> u64 {
        self.base_fee_motes
    }

    /// The ledger index the adjustment took effect in.
    pub fn ledger_index(&self) -> u64 {
        self.ledger_index
    }

    pub(crate) fn to_wire(&self) -> Value {
        let mut map = Map::new();
        map.insert("TransactionType".into(), Value::from("FeeAdjust"));
        map.insert(
            "BaseFee".into(),
            Value::from(self.base_fee_motes.to_string()),
        );
        map.insert("LedgerIndex".into(), Value::from(self.ledger_index));
        Value::Object(map)
    }

    pub(crate) fn from_wire(map: &Map<String, Value>) -> Result<FeeAdjust, WireError> {
        let base_fee = map
            .get("BaseFee")
            .and_then(Value::as_str)
            .ok_or(WireError::MissingField("BaseFee"))?;
        let base_fee_motes: u64 = base_fee.parse().map_err(|_| WireError::InvalidField {
            field: "BaseFee",
            reason: "expected an integer motes string".to_string(),
        })?;
        let ledger_index = map
            .get("LedgerIndex")
            .and_then(Value::as_u64)
            .ok_or(WireError::MissingField("LedgerIndex"))?;
        Ok(FeeAdjust::new(base_fee_motes, ledger_index))
    }

    pub(crate) fn signable_bytes(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(b"FeeAdjust");
        buf.push(0x00);
        buf.extend_from_slice(&self.base_fee_motes.to_le_bytes());
        buf.extend_from_slice(&self.ledger_index.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_round_trip() {
        let fee = FeeAdjust::new(12, 9_000_001);
        let wire = fee.to_wire();
        let map = wire.as_object().unwrap();
        assert_eq!(map["TransactionType"], "FeeAdjust");
        assert_eq!(map["BaseFee"], "12");
        assert_eq!(FeeAdjust::from_wire(map).unwrap(), fee);
    }

    #[test]
    fn rejects_non_integer_fee() {
        let wire = serde_json::json!({
            "TransactionType": "FeeAdjust",
            "BaseFee": "12.5",
            "LedgerIndex": 1,
        });
        assert!(FeeAdjust::from_wire(wire.as_object().unwrap()).is_err());
    }
}
