//! Fallback handling for unrecognized transaction types.
//!
//! The ledger grows new transaction types faster than wallet releases
//! ship. When the wire hands us a type the catalogue does not know, we
//! keep every field verbatim, expose the structural ones generically, and
//! skip kind-specific validation entirely — rendering an honest "unknown
//! transaction" row beats refusing to show history at all.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::transaction::types::Address;

/// Wire field names that uniquely identify the resource a transaction
/// touches, probed in order by [`Fallback::identifier`].
const IDENTIFIER_FIELDS: &[&str] = &["TokenId", "ResourceId", "ChannelId"];

/// A transaction of a type this client does not recognize.
///
/// The raw wire object is preserved byte-for-byte (minus JSON reordering),
/// so a round trip through the wallet loses nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fallback {
    type_name: String,
    fields: Map<String, Value>,
}

impl Fallback {
    /// The wire type identifier we failed to recognize.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The signing account, when the wire carries a well-formed one.
    pub fn account(&self) -> Option<Address> {
        self.fields
            .get("Account")
            .and_then(Value::as_str)
            .and_then(|s| Address::new(s).ok())
    }

    /// Generic access to any preserved field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The uniquely-identifying resource field, if one is present. Probes
    /// the known identifier names in order.
    pub fn identifier(&self) -> Option<&str> {
        IDENTIFIER_FIELDS
            .iter()
            .find_map(|name| self.fields.get(*name).and_then(Value::as_str))
    }

    pub(crate) fn to_wire(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert(
            "TransactionType".into(),
            Value::from(self.type_name.as_str()),
        );
        Value::Object(map)
    }

    pub(crate) fn from_wire(type_name: &str, map: &Map<String, Value>) -> Fallback {
        let mut fields = map.clone();
        fields.remove("TransactionType");
        Fallback {
            type_name: type_name.to_string(),
            fields,
        }
    }

    pub(crate) fn signable_bytes(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.type_name.as_bytes());
        buf.push(0x00);
        // serde_json's map iterates in key order, so this is deterministic.
        for (key, value) in &self.fields {
            buf.extend_from_slice(key.as_bytes());
            buf.push(0x00);
            buf.extend_from_slice(value.to_string().as_bytes());
            buf.push(0x00);
        }
    }
}
