//! # Flag Registry
//!
//! Transaction options travel on the wire as one unsigned bitmask. Each
//! transaction type registers its named flags in a `'static` [`FlagTable`];
//! folding a [`FlagSet`] produces the integer, unfolding recovers the
//! names. Bits the table does not know are carried through verbatim as an
//! opaque remainder — the wallet must never destroy information another
//! client or a newer ledger amendment put there.
//!
//! Folding an unregistered *name* is a programmer error and fails with
//! [`UnknownFlagNameError`]. Unfolding never fails.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A flag name was folded against a transaction type that does not
/// register it. This is a bug in the calling code, not user input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("flag {name:?} is not registered for transaction type {tx_type}")]
pub struct UnknownFlagNameError {
    /// The name that failed to resolve.
    pub name: String,
    /// The transaction type whose table was consulted.
    pub tx_type: &'static str,
}

// ---------------------------------------------------------------------------
// Flag Tables
// ---------------------------------------------------------------------------

/// One named flag and the bit position it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagDef {
    pub name: &'static str,
    pub bit: u32,
}

/// The flags a transaction type recognizes. Immutable, process-wide,
/// safe for unsynchronized concurrent reads.
#[derive(Debug)]
pub struct FlagTable {
    tx_type: &'static str,
    defs: &'static [FlagDef],
}

/// Payment flags.
pub static PAYMENT_FLAGS: FlagTable = FlagTable {
    tx_type: "Payment",
    defs: &[
        FlagDef {
            name: "NoDirectPath",
            bit: 16,
        },
        FlagDef {
            name: "PartialPayment",
            bit: 17,
        },
        FlagDef {
            name: "LimitQuality",
            bit: 18,
        },
    ],
};

/// AccountConfig flags.
pub static ACCOUNT_CONFIG_FLAGS: FlagTable = FlagTable {
    tx_type: "AccountConfig",
    defs: &[
        FlagDef {
            name: "RequireDestTag",
            bit: 16,
        },
        FlagDef {
            name: "DisallowIncoming",
            bit: 17,
        },
    ],
};

/// The empty table, for types that define no flags. Unfolding through it
/// preserves every bit as the opaque remainder.
pub static NO_FLAGS: FlagTable = FlagTable {
    tx_type: "(none)",
    defs: &[],
};

impl FlagTable {
    /// The transaction type this table is scoped to.
    pub fn tx_type(&self) -> &'static str {
        self.tx_type
    }

    /// The registered definitions, in declaration order.
    pub fn defs(&self) -> &'static [FlagDef] {
        self.defs
    }

    /// Resolves a name to its bit position.
    pub fn bit_for(&self, name: &str) -> Option<u32> {
        self.defs.iter().find(|d| d.name == name).map(|d| d.bit)
    }

    /// Resolves a name, erroring the way `fold` would.
    pub fn require(&self, name: &str) -> Result<&'static str, UnknownFlagNameError> {
        self.defs
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.name)
            .ok_or_else(|| UnknownFlagNameError {
                name: name.to_string(),
                tx_type: self.tx_type,
            })
    }

    /// Mask of every bit this table knows about.
    fn known_mask(&self) -> u32 {
        self.defs.iter().fold(0, |mask, d| mask | (1 << d.bit))
    }

    /// Folds a flag set into the single wire integer: registered names
    /// become their bits, and the set's opaque remainder is OR-ed back in
    /// so unknown bits survive the round trip.
    pub fn fold(&self, set: &FlagSet) -> Result<u32, UnknownFlagNameError> {
        let mut bits = set.extra_bits;
        for name in &set.names {
            let bit = self
                .bit_for(name)
                .ok_or_else(|| UnknownFlagNameError {
                    name: name.clone(),
                    tx_type: self.tx_type,
                })?;
            bits |= 1 << bit;
        }
        Ok(bits)
    }

    /// Unfolds a wire integer into names plus the unrecognized remainder.
    /// Never fails: bits we cannot name are still bits we keep.
    pub fn unfold(&self, bits: u32) -> FlagSet {
        let mut names = BTreeSet::new();
        for def in self.defs {
            if bits & (1 << def.bit) != 0 {
                names.insert(def.name.to_string());
            }
        }
        FlagSet {
            names,
            extra_bits: bits & !self.known_mask(),
        }
    }
}

// ---------------------------------------------------------------------------
// FlagSet
// ---------------------------------------------------------------------------

/// The flags active on one transaction: named flags plus any unnamed bits
/// observed on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSet {
    names: BTreeSet<String>,
    extra_bits: u32,
}

impl FlagSet {
    /// An empty set.
    pub fn new() -> FlagSet {
        FlagSet::default()
    }

    /// Adds a named flag. Name validity is checked at fold time (or up
    /// front via [`FlagTable::require`]).
    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }

    /// Removes a named flag.
    pub fn remove(&mut self, name: &str) {
        self.names.remove(name);
    }

    /// Whether a named flag is active.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// `true` when no names and no extra bits are set.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.extra_bits == 0
    }

    /// The active names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Unnamed wire bits carried through from a previous unfold.
    pub fn extra_bits(&self) -> u32 {
        self.extra_bits
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.names().collect();
        if self.extra_bits != 0 {
            write!(f, "{:?}+0x{:08X}", names, self.extra_bits)
        } else {
            write!(f, "{:?}", names)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_positions_unique_within_each_table() {
        for table in [&PAYMENT_FLAGS, &ACCOUNT_CONFIG_FLAGS] {
            let mut seen = 0u32;
            for def in table.defs() {
                let bit = 1 << def.bit;
                assert_eq!(seen & bit, 0, "{} bit {} collides", table.tx_type(), def.bit);
                seen |= bit;
            }
        }
    }

    #[test]
    fn fold_unfold_round_trip() {
        let mut set = FlagSet::new();
        set.insert("PartialPayment");
        set.insert("LimitQuality");

        let bits = PAYMENT_FLAGS.fold(&set).unwrap();
        assert_eq!(bits, (1 << 17) | (1 << 18));
        assert_eq!(PAYMENT_FLAGS.unfold(bits), set);
    }

    #[test]
    fn empty_set_folds_to_zero() {
        assert_eq!(PAYMENT_FLAGS.fold(&FlagSet::new()).unwrap(), 0);
        assert!(PAYMENT_FLAGS.unfold(0).is_empty());
    }

    #[test]
    fn unknown_name_fails_fold() {
        let mut set = FlagSet::new();
        set.insert("RequireDestTag"); // an AccountConfig flag, not a Payment one

        match PAYMENT_FLAGS.fold(&set) {
            Err(UnknownFlagNameError { name, tx_type }) => {
                assert_eq!(name, "RequireDestTag");
                assert_eq!(tx_type, "Payment");
            }
            other => panic!("expected UnknownFlagNameError, got {:?}", other),
        }
    }

    #[test]
    fn unknown_bits_survive_round_trip() {
        // Bit 5 and bit 30 are registered nowhere.
        let wire = (1 << 17) | (1 << 5) | (1 << 30);
        let set = PAYMENT_FLAGS.unfold(wire);

        assert!(set.contains("PartialPayment"));
        assert_eq!(set.extra_bits(), (1 << 5) | (1 << 30));

        // Refolding reproduces the exact wire integer, extra bits included.
        assert_eq!(PAYMENT_FLAGS.fold(&set).unwrap(), wire);
    }

    #[test]
    fn unfold_never_fails_even_on_all_ones() {
        let set = NO_FLAGS.unfold(u32::MAX);
        assert_eq!(set.extra_bits(), u32::MAX);
        assert_eq!(set.names().count(), 0);
    }

    #[test]
    fn require_resolves_registered_names() {
        assert_eq!(PAYMENT_FLAGS.require("PartialPayment").unwrap(), "PartialPayment");
        assert!(PAYMENT_FLAGS.require("Nonsense").is_err());
    }
}
