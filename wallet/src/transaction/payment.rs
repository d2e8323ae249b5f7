//! The Payment transaction type.
//!
//! A payment moves value — native motes, an issued-currency quantity, or
//! an NFT ordinal in the reserved encoding — from the sending account to a
//! destination. This is the workhorse genuine type, and the one with real
//! business rules: destination sanity, positive amounts, and the
//! partial-payment flag whenever issuer transfer fees make the delivered
//! amount diverge from the deducted one.
//!
//! Fields are fixed, typed, and mutated only through the validating
//! setters; the wire constraint of each field is enforced at the setter,
//! so a `Payment` that exists is structurally sound and `validate()` is
//! purely about business rules.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ValidationError, WireError};
use crate::amount::{requires_partial_payment, Amount, TransferRate};
use crate::field::{FieldDef, FieldKind, HexBlob, TypeValidationError};
use crate::flags::{FlagSet, UnknownFlagNameError, PAYMENT_FLAGS};
use crate::transaction::types::{Address, Destination};

/// Name of the flag that permits partial delivery.
pub const PARTIAL_PAYMENT_FLAG: &str = "PartialPayment";

/// A value transfer from `account` to `destination`.
///
/// Destination address and tag are stored as the wire stores them — two
/// independent optional fields; [`Payment::destination`] assembles the
/// pair view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    account: Address,
    destination: Option<Address>,
    destination_tag: Option<u32>,
    amount: Option<Amount>,
    transfer_rate: Option<TransferRate>,
    flags: FlagSet,
    invoice_id: Option<HexBlob>,
}

impl Payment {
    /// The fixed, ordered field set of this type.
    pub const FIELDS: &'static [FieldDef] = &[
        FieldDef {
            name: "Account",
            kind: FieldKind::Account,
            required: true,
        },
        FieldDef {
            name: "Destination",
            kind: FieldKind::Account,
            required: true,
        },
        FieldDef {
            name: "DestinationTag",
            kind: FieldKind::UInt32,
            required: false,
        },
        FieldDef {
            name: "Amount",
            kind: FieldKind::Amount,
            required: true,
        },
        FieldDef {
            name: "TransferRate",
            kind: FieldKind::UInt32,
            required: false,
        },
        FieldDef {
            name: "Flags",
            kind: FieldKind::Flags,
            required: false,
        },
        FieldDef {
            name: "InvoiceId",
            kind: FieldKind::Blob,
            required: false,
        },
    ];

    /// Creates a draft payment from the sending account. Everything else
    /// is set through the field setters.
    pub fn new(account: Address) -> Payment {
        Payment {
            account,
            destination: None,
            destination_tag: None,
            amount: None,
            transfer_rate: None,
            flags: FlagSet::new(),
            invoice_id: None,
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn account(&self) -> &Address {
        &self.account
    }

    pub fn destination_address(&self) -> Option<&Address> {
        self.destination.as_ref()
    }

    pub fn destination_tag(&self) -> Option<u32> {
        self.destination_tag
    }

    /// The assembled destination view, when an address is set.
    pub fn destination(&self) -> Option<Destination> {
        self.destination.as_ref().map(|address| Destination {
            address: address.clone(),
            tag: self.destination_tag,
        })
    }

    pub fn amount(&self) -> Option<&Amount> {
        self.amount.as_ref()
    }

    pub fn transfer_rate(&self) -> Option<TransferRate> {
        self.transfer_rate
    }

    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn invoice_id(&self) -> Option<&HexBlob> {
        self.invoice_id.as_ref()
    }

    // -- field setters ------------------------------------------------------
    //
    // Uniform contract: a defined value is validated against the field's
    // wire constraint; `None` clears the field and never fails.

    /// Sets or clears the destination from an address string. A failed set
    /// leaves the previous destination untouched.
    pub fn set_destination(&mut self, value: Option<&str>) -> Result<(), TypeValidationError> {
        self.destination = match value {
            None => None,
            Some(s) => Some(Address::new(s).map_err(|_| {
                TypeValidationError::InvalidAccount {
                    field: "Destination",
                    value: s.to_string(),
                }
            })?),
        };
        Ok(())
    }

    /// Sets or clears the destination routing tag.
    pub fn set_destination_tag(&mut self, tag: Option<u32>) {
        self.destination_tag = tag;
    }

    /// Sets or clears the amount. Amounts are validated at construction
    /// (the codec owns the rules), so the typed setter cannot fail.
    pub fn set_amount(&mut self, amount: Option<Amount>) {
        self.amount = amount;
    }

    /// Sets or clears the issuer's transfer rate.
    pub fn set_transfer_rate(&mut self, rate: Option<TransferRate>) {
        self.transfer_rate = rate;
    }

    /// Sets or clears the invoice identifier (hex blob).
    pub fn set_invoice_id(&mut self, value: Option<&str>) -> Result<(), TypeValidationError> {
        self.invoice_id = match value {
            None => None,
            Some(s) => Some(HexBlob::parse("InvoiceId", s)?),
        };
        Ok(())
    }

    /// Activates a named flag, checked against the Payment flag table.
    pub fn set_flag(&mut self, name: &str) -> Result<(), UnknownFlagNameError> {
        let canonical = PAYMENT_FLAGS.require(name)?;
        self.flags.insert(canonical);
        Ok(())
    }

    /// Deactivates a named flag.
    pub fn clear_flag(&mut self, name: &str) {
        self.flags.remove(name);
    }

    /// Replaces the whole flag set (wire deserialization path).
    pub(crate) fn set_flags_raw(&mut self, flags: FlagSet) {
        self.flags = flags;
    }

    // -- business rules -----------------------------------------------------

    /// Whether this payment's amount and rate demand the partial flag.
    fn partial_payment_required(&self) -> bool {
        match self.amount.as_ref().and_then(Amount::fee_issuer) {
            Some(issuer) => requires_partial_payment(self.transfer_rate, &self.account, issuer),
            None => false,
        }
    }

    /// Applies derived state: activates the partial-payment flag whenever
    /// the transfer rate or self-issuance requires it. Called by the
    /// lifecycle's validation transition after the rate lookup; idempotent.
    pub fn normalize(&mut self) {
        if self.partial_payment_required() {
            self.flags.insert(PARTIAL_PAYMENT_FLAG);
        }
    }

    /// Runs the payment's business rules, cheapest first. Reasons are
    /// written for the person who has to fix the input, because they are
    /// surfaced before anything touches the network.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let destination = self
            .destination
            .as_ref()
            .ok_or(ValidationError::MissingDestination)?;

        if *destination == self.account {
            return Err(ValidationError::SelfPayment {
                address: self.account.as_str().to_string(),
            });
        }

        let amount = self.amount.as_ref().ok_or(ValidationError::MissingAmount)?;
        if !amount.is_positive() {
            return Err(ValidationError::NonPositiveAmount);
        }

        // Every name in the flag set must fold for this type.
        PAYMENT_FLAGS.fold(&self.flags)?;

        if self.partial_payment_required() && !self.flags.contains(PARTIAL_PAYMENT_FLAG) {
            return Err(ValidationError::MissingPartialPayment);
        }

        Ok(())
    }

    // -- wire ---------------------------------------------------------------

    pub(crate) fn to_wire(&self) -> Result<Value, WireError> {
        let mut map = Map::new();
        map.insert("TransactionType".into(), Value::from("Payment"));
        map.insert("Account".into(), Value::from(self.account.as_str()));
        if let Some(dest) = &self.destination {
            map.insert("Destination".into(), Value::from(dest.as_str()));
        }
        if let Some(tag) = self.destination_tag {
            map.insert("DestinationTag".into(), Value::from(tag));
        }
        if let Some(amount) = &self.amount {
            map.insert("Amount".into(), amount.to_wire_json());
        }
        if let Some(rate) = self.transfer_rate {
            map.insert("TransferRate".into(), Value::from(rate.billionths()));
        }
        let bits = PAYMENT_FLAGS.fold(&self.flags)?;
        if bits != 0 {
            map.insert("Flags".into(), Value::from(bits));
        }
        if let Some(blob) = &self.invoice_id {
            map.insert("InvoiceId".into(), Value::from(blob.as_str()));
        }
        Ok(Value::Object(map))
    }

    pub(crate) fn from_wire(map: &Map<String, Value>) -> Result<Payment, WireError> {
        let account_str =
            str_field(map, "Account")?.ok_or(WireError::MissingField("Account"))?;
        let account = Address::new(account_str).map_err(|e| WireError::InvalidField {
            field: "Account",
            reason: e.to_string(),
        })?;

        let mut payment = Payment::new(account);

        payment
            .set_destination(str_field(map, "Destination")?)
            .map_err(|e| WireError::InvalidField {
                field: "Destination",
                reason: e.to_string(),
            })?;

        if let Some(tag) = map.get("DestinationTag") {
            let tag = tag
                .as_u64()
                .and_then(|t| u32::try_from(t).ok())
                .ok_or(WireError::InvalidField {
                    field: "DestinationTag",
                    reason: "expected a 32-bit unsigned integer".to_string(),
                })?;
            payment.set_destination_tag(Some(tag));
        }

        if let Some(amount) = map.get("Amount") {
            let amount = Amount::from_wire_json(amount).map_err(|e| WireError::InvalidField {
                field: "Amount",
                reason: e.to_string(),
            })?;
            payment.set_amount(Some(amount));
        }

        if let Some(rate) = map.get("TransferRate") {
            let raw = rate
                .as_u64()
                .and_then(|r| u32::try_from(r).ok())
                .ok_or(WireError::InvalidField {
                    field: "TransferRate",
                    reason: "expected a 32-bit unsigned integer".to_string(),
                })?;
            let rate = TransferRate::new(raw).map_err(|e| WireError::InvalidField {
                field: "TransferRate",
                reason: e.to_string(),
            })?;
            payment.set_transfer_rate(Some(rate));
        }

        if let Some(bits) = map.get("Flags") {
            let bits = bits
                .as_u64()
                .and_then(|b| u32::try_from(b).ok())
                .ok_or(WireError::InvalidField {
                    field: "Flags",
                    reason: "expected a 32-bit unsigned integer".to_string(),
                })?;
            payment.set_flags_raw(PAYMENT_FLAGS.unfold(bits));
        }

        payment
            .set_invoice_id(str_field(map, "InvoiceId")?)
            .map_err(|e| WireError::InvalidField {
                field: "InvoiceId",
                reason: e.to_string(),
            })?;

        Ok(payment)
    }

    /// Appends this payment's canonical bytes for hashing: NUL-separated
    /// strings, fixed-width little-endian integers, presence tags for the
    /// optional fields.
    pub(crate) fn signable_bytes(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(b"Payment");
        buf.push(0x00);
        buf.extend_from_slice(self.account.as_str().as_bytes());
        buf.push(0x00);

        match &self.destination {
            Some(dest) => {
                buf.push(0x01);
                buf.extend_from_slice(dest.as_str().as_bytes());
                buf.push(0x00);
            }
            None => buf.push(0x00),
        }
        match self.destination_tag {
            Some(tag) => {
                buf.push(0x01);
                buf.extend_from_slice(&tag.to_le_bytes());
            }
            None => buf.push(0x00),
        }

        match &self.amount {
            Some(amount) => {
                buf.push(0x01);
                amount.signable_bytes(buf);
            }
            None => buf.push(0x00),
        }

        match self.transfer_rate {
            Some(rate) => {
                buf.push(0x01);
                buf.extend_from_slice(&rate.billionths().to_le_bytes());
            }
            None => buf.push(0x00),
        }

        for name in self.flags.names() {
            buf.extend_from_slice(name.as_bytes());
            buf.push(0x00);
        }
        buf.extend_from_slice(&self.flags.extra_bits().to_le_bytes());

        match &self.invoice_id {
            Some(blob) => {
                buf.push(0x01);
                buf.extend_from_slice(blob.as_str().as_bytes());
                buf.push(0x00);
            }
            None => buf.push(0x00),
        }
    }
}

/// Reads an optional string field from a wire object, rejecting non-string
/// values with the field's name in the error.
fn str_field<'m>(
    map: &'m Map<String, Value>,
    name: &'static str,
) -> Result<Option<&'m str>, WireError> {
    match map.get(name) {
        None => Ok(None),
        Some(v) => v.as_str().map(Some).ok_or(WireError::InvalidField {
            field: name,
            reason: "expected a string".to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
