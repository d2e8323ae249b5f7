//! The AccountConfig transaction type.
//!
//! A genuine type that adjusts the sending account's own options: routing
//! requirements, incoming-payment policy, and an optional messaging key.
//! Next to `Payment` it is almost boring, which is the point — it shows
//! the hierarchy's shape without payment-specific rules.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ValidationError, WireError};
use crate::field::{FieldDef, FieldKind, HexBlob, TypeValidationError};
use crate::flags::{FlagSet, UnknownFlagNameError, ACCOUNT_CONFIG_FLAGS};
use crate::transaction::types::Address;

/// Adjusts the options of the sending account itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountConfig {
    account: Address,
    flags: FlagSet,
    message_key: Option<HexBlob>,
}

impl AccountConfig {
    /// The fixed, ordered field set of this type.
    pub const FIELDS: &'static [FieldDef] = &[
        FieldDef {
            name: "Account",
            kind: FieldKind::Account,
            required: true,
        },
        FieldDef {
            name: "Flags",
            kind: FieldKind::Flags,
            required: false,
        },
        FieldDef {
            name: "MessageKey",
            kind: FieldKind::Blob,
            required: false,
        },
    ];

    pub fn new(account: Address) -> AccountConfig {
        AccountConfig {
            account,
            flags: FlagSet::new(),
            message_key: None,
        }
    }

    pub fn account(&self) -> &Address {
        &self.account
    }

    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn message_key(&self) -> Option<&HexBlob> {
        self.message_key.as_ref()
    }

    /// Sets or clears the messaging public key blob.
    pub fn set_message_key(&mut self, value: Option<&str>) -> Result<(), TypeValidationError> {
        self.message_key = match value {
            None => None,
            Some(s) => Some(HexBlob::parse("MessageKey", s)?),
        };
        Ok(())
    }

    /// Activates a named flag, checked against this type's table.
    pub fn set_flag(&mut self, name: &str) -> Result<(), UnknownFlagNameError> {
        let canonical = ACCOUNT_CONFIG_FLAGS.require(name)?;
        self.flags.insert(canonical);
        Ok(())
    }

    /// Deactivates a named flag.
    pub fn clear_flag(&mut self, name: &str) {
        self.flags.remove(name);
    }

    pub(crate) fn set_flags_raw(&mut self, flags: FlagSet) {
        self.flags = flags;
    }

    /// Business rules: the flag set must fold against this type's table.
    /// Everything else is enforced at construction.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ACCOUNT_CONFIG_FLAGS.fold(&self.flags)?;
        Ok(())
    }

    pub(crate) fn to_wire(&self) -> Result<Value, WireError> {
        let mut map = Map::new();
        map.insert("TransactionType".into(), Value::from("AccountConfig"));
        map.insert("Account".into(), Value::from(self.account.as_str()));
        let bits = ACCOUNT_CONFIG_FLAGS.fold(&self.flags)?;
        if bits != 0 {
            map.insert("Flags".into(), Value::from(bits));
        }
        if let Some(key) = &self.message_key {
            map.insert("MessageKey".into(), Value::from(key.as_str()));
        }
        Ok(Value::Object(map))
    }

    pub(crate) fn from_wire(map: &Map<String, Value>) -> Result<AccountConfig, WireError> {
        let account_str = map
            .get("Account")
            .and_then(Value::as_str)
            .ok_or(WireError::MissingField("Account"))?;
        let account = Address::new(account_str).map_err(|e| WireError::InvalidField {
            field: "Account",
            reason: e.to_string(),
        })?;

        let mut config = AccountConfig::new(account);

        if let Some(bits) = map.get("Flags") {
            let bits = bits
                .as_u64()
                .and_then(|b| u32::try_from(b).ok())
                .ok_or(WireError::InvalidField {
                    field: "Flags",
                    reason: "expected a 32-bit unsigned integer".to_string(),
                })?;
            config.set_flags_raw(ACCOUNT_CONFIG_FLAGS.unfold(bits));
        }

        if let Some(key) = map.get("MessageKey") {
            let key = key.as_str().ok_or(WireError::InvalidField {
                field: "MessageKey",
                reason: "expected a string".to_string(),
            })?;
            config
                .set_message_key(Some(key))
                .map_err(|e| WireError::InvalidField {
                    field: "MessageKey",
                    reason: e.to_string(),
                })?;
        }

        Ok(config)
    }

    pub(crate) fn signable_bytes(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(b"AccountConfig");
        buf.push(0x00);
        buf.extend_from_slice(self.account.as_str().as_bytes());
        buf.push(0x00);
        for name in self.flags.names() {
            buf.extend_from_slice(name.as_bytes());
            buf.push(0x00);
        }
        buf.extend_from_slice(&self.flags.extra_bits().to_le_bytes());
        match &self.message_key {
            Some(key) => {
                buf.push(0x01);
                buf.extend_from_slice(key.as_str().as_bytes());
                buf.push(0x00);
            }
            None => buf.push(0x00),
        }
    }
}
