//! External collaborator interfaces for the transaction lifecycle.
//!
//! The wallet core never owns key material, sockets, or issuer state; it
//! drives these four capabilities and branches on what they report. Each
//! is an object-safe async trait so production wiring (RPC client,
//! platform keystore) and test doubles plug in the same way.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::amount::TransferRate;
use crate::transaction::{Address, Transaction};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The signing capability declined or could not produce a signature.
/// Nothing has touched the network when this is raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    /// The signer (or the user behind it) declined to sign.
    #[error("signing declined: {reason}")]
    Declined { reason: String },

    /// No key material is available for the requesting account.
    #[error("no signing key available for account {account}")]
    KeyUnavailable { account: String },
}

/// A network call failed before a usable answer arrived.
///
/// For submission this is the ambiguous case: the transaction may or may
/// not have reached the ledger. Callers surface it and re-query by hash;
/// they do not blind-retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The HTTP request itself failed (connect, timeout, TLS, ...).
    #[error("transport failure: {detail}")]
    Http { detail: String },

    /// The service answered, but not with anything parseable.
    #[error("malformed service response: {detail}")]
    BadResponse { detail: String },

    /// The service answered with an RPC-level error.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
}

// ---------------------------------------------------------------------------
// Data carried across the boundaries
// ---------------------------------------------------------------------------

/// A signed, serialized transaction ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBlob {
    /// Hex-encoded signed envelope.
    pub blob: String,
    /// The transaction hash, fixed at signing time. This is the handle
    /// for every later outcome query.
    pub tx_hash: String,
}

/// The submission service's acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAck {
    /// Whether the node accepted the blob for forwarding. Acceptance is
    /// NOT success — only the verified outcome settles that.
    pub accepted: bool,
    /// The hash the node computed for the submitted blob.
    pub provisional_hash: String,
    /// The node's terse result code, when it provided one.
    pub engine_result: Option<String>,
}

/// The ledger's final word on an applied transaction.
///
/// `applied = false` is a *confirmed* business-level failure (for example
/// funds that evaporated between validation and apply time) — a different
/// animal entirely from "we could not find out".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerOutcome {
    /// Whether the transaction achieved its effect.
    pub applied: bool,
    /// The ledger's result code, e.g. `mesSUCCESS` or `mecPATH_DRY`.
    pub result_code: String,
    /// The ledger index the transaction was recorded in.
    pub ledger_index: u64,
}

/// Result of one outcome query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeLookup {
    /// The ledger has a validated, final outcome.
    Final(LedgerOutcome),
    /// The hash is not (yet) in a validated ledger. Poll again.
    NotFound,
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// The opaque signing capability. Owns key material outside this core.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Produces a signed, serialized blob for `transaction` on behalf of
    /// `account`.
    async fn sign(
        &self,
        transaction: &Transaction,
        account: &Address,
    ) -> Result<SignedBlob, SigningError>;
}

/// The ledger submission service.
#[async_trait]
pub trait SubmissionService: Send + Sync {
    /// Sends a signed blob to the ledger. A `Ok(SubmitAck)` answer is
    /// authoritative about acceptance; an `Err(TransportError)` is not
    /// authoritative about anything.
    async fn submit(&self, blob: &SignedBlob) -> Result<SubmitAck, TransportError>;
}

/// The ledger query service for final outcomes.
#[async_trait]
pub trait OutcomeQuery: Send + Sync {
    /// Looks up the validated outcome of a transaction hash.
    async fn outcome(&self, tx_hash: &str) -> Result<OutcomeLookup, TransportError>;
}

/// Issuer transfer-rate lookup.
#[async_trait]
pub trait TransferRateLookup: Send + Sync {
    /// The issuer's configured transfer rate, or `None` when the issuer
    /// has never set one.
    async fn transfer_rate(&self, issuer: &Address)
        -> Result<Option<TransferRate>, TransportError>;
}
