// Copyright (c) 2026 Meridian Labs. MIT License.
// See LICENSE for details.

//! # Meridian Wallet — Core Library
//!
//! The transaction engine of the Meridian mobile wallet, minus every
//! pixel. Screens, navigation, and localization live upstairs; this crate
//! owns the parts that can actually lose someone's money: the typed field
//! system, the amount codec, the flag registry, the transaction
//! catalogue, and the lifecycle that walks a draft to a verified ledger
//! outcome without double-submitting along the way.
//!
//! ## Architecture
//!
//! The modules mirror the concerns of a wallet core, leaves first:
//!
//! - **config** — Every protocol constant. Hardcode one elsewhere and you
//!   owe the team coffee.
//! - **field** — Per-field wire constraints: validated setters instead of
//!   stringly-typed slots.
//! - **amount** — Exact decimals, the reserved NFT-ordinal encoding, and
//!   display truncation that never touches the stored value.
//! - **flags** — Named options ↔ one bitmask, unknown bits preserved.
//! - **transaction** — The closed catalogue: Payment, AccountConfig, the
//!   FeeAdjust pseudo record, and Fallback for everything newer than us.
//! - **lifecycle** — Draft → Validated → Signed → Submitted → Verified |
//!   Failed, with the submission/verification asymmetry treated with the
//!   respect an irrevocable broadcast deserves.
//! - **crypto** — Transaction hashing and a reference Ed25519 signer.
//! - **rpc** — JSON-RPC types and the reqwest reference client for the
//!   node-facing collaborator traits.
//!
//! ## Design Philosophy
//!
//! 1. Validation happens before the network ever hears about it.
//! 2. No floating point anywhere near money. Anywhere.
//! 3. "Submitted" is a promise to find out, not a success.
//! 4. Information from the wire survives us: unknown flags, unknown
//!    fields, and unknown transaction types all round-trip untouched.

pub mod amount;
pub mod config;
pub mod crypto;
pub mod field;
pub mod flags;
pub mod lifecycle;
pub mod rpc;
pub mod transaction;
