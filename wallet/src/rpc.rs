//! # Ledger JSON-RPC Client
//!
//! Type-safe JSON-RPC 2.0 definitions for the node API the wallet talks
//! to, plus [`LedgerRpcClient`], the reqwest-backed reference
//! implementation of the network collaborator traits.
//!
//! Method names are prefixed `mrd_` so a node can co-host other JSON-RPC
//! services without collisions.
//!
//! | Method                      | Description                             |
//! |-----------------------------|-----------------------------------------|
//! | `mrd_submitTransaction`     | Submit a signed blob for forwarding     |
//! | `mrd_getTransactionOutcome` | Final validated outcome for a tx hash   |
//! | `mrd_getIssuerSettings`     | Issuer configuration (transfer rate)    |
//!
//! Every transport, HTTP, parse, and RPC-level failure maps to
//! [`TransportError`]; the lifecycle controller decides what each one
//! means for the flow.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::amount::TransferRate;
use crate::lifecycle::services::{
    LedgerOutcome, OutcomeLookup, OutcomeQuery, SignedBlob, SubmissionService, SubmitAck,
    TransferRateLookup, TransportError,
};
use crate::transaction::Address;

// ---------------------------------------------------------------------------
// RPC Method Enumeration
// ---------------------------------------------------------------------------

/// Supported JSON-RPC methods. The wire name is the serde rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcMethod {
    /// Submit a signed transaction blob.
    /// Parameters: `{ blob, hash }`
    #[serde(rename = "mrd_submitTransaction")]
    SubmitTransaction,
    /// Fetch the final validated outcome for a transaction hash.
    /// Parameters: `{ hash }`
    #[serde(rename = "mrd_getTransactionOutcome")]
    GetTransactionOutcome,
    /// Fetch an issuer's configuration.
    /// Parameters: `{ issuer }`
    #[serde(rename = "mrd_getIssuerSettings")]
    GetIssuerSettings,
}

// ---------------------------------------------------------------------------
// RPC Request / Response
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Always "2.0".
    pub jsonrpc: String,
    /// Request identifier, echoed back in the response.
    pub id: u64,
    /// The method to invoke.
    pub method: RpcMethod,
    /// Method-specific parameters.
    #[serde(default)]
    pub params: Value,
}

impl RpcRequest {
    pub fn new(id: u64, method: RpcMethod, params: Value) -> RpcRequest {
        RpcRequest {
            jsonrpc: "2.0".to_string(),
            id,
            method,
            params,
        }
    }
}

/// A JSON-RPC 2.0 response. Exactly one of `result`/`error` is set by a
/// conforming node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// A JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResult {
    accepted: bool,
    provisional_hash: String,
    #[serde(default)]
    engine_result: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeResult {
    found: bool,
    #[serde(default)]
    applied: Option<bool>,
    #[serde(default)]
    result_code: Option<String>,
    #[serde(default)]
    ledger_index: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssuerSettingsResult {
    #[serde(default)]
    transfer_rate: Option<u32>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Reference implementation of the submission, outcome-query, and
/// transfer-rate collaborators over a node's HTTP JSON-RPC endpoint.
pub struct LedgerRpcClient {
    http: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl LedgerRpcClient {
    /// A client for the given endpoint (e.g. `http://127.0.0.1:8821`).
    pub fn new(endpoint: impl Into<String>) -> LedgerRpcClient {
        LedgerRpcClient {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One JSON-RPC call: POST, status check, envelope check, unwrap.
    async fn call(&self, method: RpcMethod, params: Value) -> Result<Value, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);

        tracing::debug!(?method, id, "rpc call");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportError::Http {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                detail: format!("http status {}", status),
            });
        }

        let envelope: RpcResponse =
            response.json().await.map_err(|e| TransportError::BadResponse {
                detail: e.to_string(),
            })?;

        if let Some(err) = envelope.error {
            return Err(TransportError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        envelope.result.ok_or_else(|| TransportError::BadResponse {
            detail: "response carries neither result nor error".to_string(),
        })
    }

    fn parse<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, TransportError> {
        serde_json::from_value(value).map_err(|e| TransportError::BadResponse {
            detail: e.to_string(),
        })
    }
}

#[async_trait]
impl SubmissionService for LedgerRpcClient {
    async fn submit(&self, blob: &SignedBlob) -> Result<SubmitAck, TransportError> {
        let result = self
            .call(
                RpcMethod::SubmitTransaction,
                json!({ "blob": blob.blob, "hash": blob.tx_hash }),
            )
            .await?;
        let parsed: SubmitResult = Self::parse(result)?;
        Ok(SubmitAck {
            accepted: parsed.accepted,
            provisional_hash: parsed.provisional_hash,
            engine_result: parsed.engine_result,
        })
    }
}

#[async_trait]
impl OutcomeQuery for LedgerRpcClient {
    async fn outcome(&self, tx_hash: &str) -> Result<OutcomeLookup, TransportError> {
        let result = self
            .call(RpcMethod::GetTransactionOutcome, json!({ "hash": tx_hash }))
            .await?;
        let parsed: OutcomeResult = Self::parse(result)?;

        if !parsed.found {
            return Ok(OutcomeLookup::NotFound);
        }
        match (parsed.applied, parsed.result_code, parsed.ledger_index) {
            (Some(applied), Some(result_code), Some(ledger_index)) => {
                Ok(OutcomeLookup::Final(LedgerOutcome {
                    applied,
                    result_code,
                    ledger_index,
                }))
            }
            _ => Err(TransportError::BadResponse {
                detail: "found outcome lacks applied/resultCode/ledgerIndex".to_string(),
            }),
        }
    }
}

#[async_trait]
impl TransferRateLookup for LedgerRpcClient {
    async fn transfer_rate(
        &self,
        issuer: &Address,
    ) -> Result<Option<TransferRate>, TransportError> {
        let result = self
            .call(RpcMethod::GetIssuerSettings, json!({ "issuer": issuer.as_str() }))
            .await?;
        let parsed: IssuerSettingsResult = Self::parse(result)?;

        match parsed.transfer_rate {
            None => Ok(None),
            Some(raw) => TransferRate::new(raw)
                .map(Some)
                .map_err(|e| TransportError::BadResponse {
                    detail: e.to_string(),
                }),
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
    fn method_names_serialize_with_prefix() {
        assert_eq!(
            serde_json::to_string(&RpcMethod::SubmitTransaction).unwrap(),
            "\"mrd_submitTransaction\""
        );
        assert_eq!(
            serde_json::to_string(&RpcMethod::GetIssuerSettings).unwrap(),
            "\"mrd_getIssuerSettings\""
        );
    }

    #[test]
    fn request_envelope_shape() {
        let req = RpcRequest::new(7, RpcMethod::GetTransactionOutcome, json!({"hash": "AB"}));
        let wire = serde_json::to_value(&req).unwrap();
        assert_eq!(wire["jsonrpc"], "2.0");
        assert_eq!(wire["id"], 7);
        assert_eq!(wire["method"], "mrd_getTransactionOutcome");
        assert_eq!(wire["params"]["hash"], "AB");
    }

    #[test]
    fn submit_result_parses_camel_case() {
        let parsed: SubmitResult = serde_json::from_value(json!({
            "accepted": true,
            "provisionalHash": "C0FFEE",
        }))
        .unwrap();
        assert!(parsed.accepted);
        assert_eq!(parsed.provisional_hash, "C0FFEE");
        assert!(parsed.engine_result.is_none());
    }

    #[test]
    fn outcome_result_tolerates_not_found() {
        let parsed: OutcomeResult = serde_json::from_value(json!({ "found": false })).unwrap();
        assert!(!parsed.found);
        assert!(parsed.applied.is_none());
    }

    #[test]
    fn response_envelope_round_trip() {
        let resp = RpcResponse {
            jsonrpc: "2.0".to_string(),
            id: 3,
            result: Some(json!({"found": false})),
            error: None,
        };
        let wire = serde_json::to_string(&resp).unwrap();
        assert!(!wire.contains("error"), "None fields are omitted");
        let back: RpcResponse = serde_json::from_str(&wire).unwrap();
        assert_eq!(back.id, 3);
    }
}
