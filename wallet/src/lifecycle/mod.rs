//! # Transaction Lifecycle
//!
//! The state machine that takes a draft transaction to a terminal answer:
//!
//! ```text
//!   Draft → Validated → Signed → Submitted → Verifying ─┬→ Verified(outcome)
//!                                                       └→ Failed(reason)
//! ```
//!
//! Two rules shape everything here:
//!
//! 1. **Everything local resolves before anything irrevocable.** Errors
//!    up through signing are ordinary `Result`s — correct the input and
//!    try again, nothing has left the device. From submission onward an
//!    external, non-retractable effect may exist, so failures become
//!    *terminal states* the caller branches on, not exceptions.
//! 2. **"Submitted" is not "succeeded", and "failed" is not "rejected".**
//!    `Verified` carries the ledger's own verdict — which can be a
//!    business-level failure discovered at apply time. `Failed` with a
//!    verification timeout means the outcome is simply unknown: keep the
//!    hash and ask again later.
//!
//! Concurrency: one flow drives one transaction. The `&mut` receivers
//! make concurrent transitions on the same flow unrepresentable; callers
//! sharing a flow across tasks wrap it in `tokio::sync::Mutex`. Flows for
//! different transactions are fully independent.

pub mod services;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::transaction::{Transaction, ValidationError};
use services::{
    LedgerOutcome, OutcomeLookup, OutcomeQuery, SignedBlob, Signer, SigningError,
    SubmissionService, TransferRateLookup, TransportError,
};

// ---------------------------------------------------------------------------
// Status & Outcomes
// ---------------------------------------------------------------------------

/// Why a flow ended without a verified ledger outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The submission service explicitly declined the blob. Nothing was
    /// broadcast; verification is pointless.
    SubmissionRejected { engine_result: String },

    /// Transport failed before acceptance was confirmed. Ambiguous: the
    /// transaction may or may not have reached the ledger. The hash stays
    /// recorded for a later re-query.
    Transport { detail: String },

    /// The polling budget ran out with no final outcome. NOT a ledger
    /// rejection — the true outcome is unknown.
    VerificationTimeout { attempts: u32, budget: Duration },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubmissionRejected { engine_result } => {
                write!(f, "submission rejected ({})", engine_result)
            }
            Self::Transport { detail } => write!(f, "transport failure: {}", detail),
            Self::VerificationTimeout { attempts, budget } => write!(
                f,
                "verification timeout after {} attempts over {:?}",
                attempts, budget
            ),
        }
    }
}

/// The terminal answer of a driven flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The ledger produced a final outcome — possibly a business-level
    /// failure, but a *known* one.
    Verified(LedgerOutcome),
    /// The flow ended without a verified outcome.
    Failed(FailureReason),
}

/// Lifecycle status of one transaction flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleStatus {
    Draft,
    Validated,
    Signed,
    Submitted,
    Verifying,
    Verified(LedgerOutcome),
    Failed(FailureReason),
}

impl LifecycleStatus {
    /// Short tag for transition errors and logs.
    fn tag(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Validated => "Validated",
            Self::Signed => "Signed",
            Self::Submitted => "Submitted",
            Self::Verifying => "Verifying",
            Self::Verified(_) => "Verified",
            Self::Failed(_) => "Failed",
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors the controller raises before any irrevocable effect exists.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A transition was attempted from the wrong state. Programmer error;
    /// the flow's state is left untouched.
    #[error("cannot {attempted} a transaction in state {from}")]
    InvalidTransition {
        from: &'static str,
        attempted: &'static str,
    },

    /// Business-rule validation failed. No side effects occurred.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The signing capability declined. No side effects occurred.
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// The issuer transfer-rate lookup failed during validation. Still
    /// pre-side-effect: nothing was signed or sent.
    #[error("issuer settings lookup failed: {0}")]
    RateLookup(TransportError),

    /// The transaction has no signing account (pseudo transactions are
    /// ledger-authored; the wallet cannot drive one).
    #[error("transaction type {type_name} has no signing account")]
    NoSigningAccount { type_name: String },
}

// ---------------------------------------------------------------------------
// Lifecycle record
// ---------------------------------------------------------------------------

/// The mutable record of one transaction's journey.
///
/// Owned by whichever flow (screen, task, test) is sending the
/// transaction; the controller borrows it per transition and never keeps
/// it. To share one across tasks, wrap it in `tokio::sync::Mutex` — the
/// controller's `&mut` receivers are the per-instance exclusion guard.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    flow_id: Uuid,
    status: LifecycleStatus,
    created_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
    tx_hash: Option<String>,
    signed_blob: Option<SignedBlob>,
}

impl Lifecycle {
    /// A fresh draft-state record.
    pub fn new() -> Lifecycle {
        Lifecycle {
            flow_id: Uuid::new_v4(),
            status: LifecycleStatus::Draft,
            created_at: Utc::now(),
            submitted_at: None,
            tx_hash: None,
            signed_blob: None,
        }
    }

    /// Correlation id for logs; carries no ledger meaning.
    pub fn flow_id(&self) -> Uuid {
        self.flow_id
    }

    pub fn status(&self) -> &LifecycleStatus {
        &self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    /// The transaction hash, once signing fixed it. Survives every later
    /// failure so the caller can re-query an ambiguous outcome.
    pub fn tx_hash(&self) -> Option<&str> {
        self.tx_hash.as_deref()
    }

    /// `true` once the flow reached `Verified` or `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            LifecycleStatus::Verified(_) | LifecycleStatus::Failed(_)
        )
    }

    /// The terminal outcome, if the flow has one.
    pub fn outcome(&self) -> Option<FlowOutcome> {
        match &self.status {
            LifecycleStatus::Verified(o) => Some(FlowOutcome::Verified(o.clone())),
            LifecycleStatus::Failed(r) => Some(FlowOutcome::Failed(r.clone())),
            _ => None,
        }
    }

    fn require(&self, expected: &[&'static str], attempted: &'static str) -> Result<(), LifecycleError> {
        if expected.contains(&self.status.tag()) {
            Ok(())
        } else {
            Err(LifecycleError::InvalidTransition {
                from: self.status.tag(),
                attempted,
            })
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Lifecycle::new()
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Polling budget for the verify step.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleConfig {
    /// Maximum outcome queries before declaring the result unknown.
    pub verify_attempts: u32,
    /// Delay between consecutive queries.
    pub verify_interval: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        LifecycleConfig {
            verify_attempts: config::VERIFY_ATTEMPTS,
            verify_interval: config::VERIFY_INTERVAL,
        }
    }
}

impl LifecycleConfig {
    /// Total wall-clock budget the verify step may consume.
    pub fn verify_budget(&self) -> Duration {
        self.verify_interval * self.verify_attempts
    }
}

/// Drives transactions through the lifecycle against the four external
/// capabilities. Stateless apart from its collaborators; one controller
/// serves any number of concurrent flows.
pub struct LifecycleController {
    signer: Arc<dyn Signer>,
    submission: Arc<dyn SubmissionService>,
    query: Arc<dyn OutcomeQuery>,
    rates: Arc<dyn TransferRateLookup>,
    config: LifecycleConfig,
}

impl LifecycleController {
    pub fn new(
        signer: Arc<dyn Signer>,
        submission: Arc<dyn SubmissionService>,
        query: Arc<dyn OutcomeQuery>,
        rates: Arc<dyn TransferRateLookup>,
    ) -> LifecycleController {
        LifecycleController {
            signer,
            submission,
            query,
            rates,
            config: LifecycleConfig::default(),
        }
    }

    /// Overrides the polling budget (tests use tiny ones).
    pub fn with_config(mut self, config: LifecycleConfig) -> LifecycleController {
        self.config = config;
        self
    }

    /// `Draft → Validated`. Fetches the issuer transfer rate where one
    /// can apply, normalizes derived flags, then runs the type's rules.
    /// No side effects; failures leave the flow in `Draft`.
    pub async fn validate(
        &self,
        flow: &mut Lifecycle,
        tx: &mut Transaction,
    ) -> Result<(), LifecycleError> {
        flow.require(&["Draft", "Validated"], "validate")?;

        if let Transaction::Payment(payment) = tx {
            let issuer = payment
                .amount()
                .and_then(|a| a.fee_issuer().cloned());
            if let Some(issuer) = issuer {
                let rate = self
                    .rates
                    .transfer_rate(&issuer)
                    .await
                    .map_err(LifecycleError::RateLookup)?;
                // The lookup is authoritative: it sets or clears the field.
                payment.set_transfer_rate(rate.filter(|r| r.has_fee()));
            }
            payment.normalize();
        }

        tx.validate()?;

        flow.status = LifecycleStatus::Validated;
        tracing::debug!(flow = %flow.flow_id, tx_type = tx.type_name(), "validated");
        Ok(())
    }

    /// `Validated → Signed`. Invokes the signing capability; on success
    /// the transaction hash is fixed on the flow.
    pub async fn sign(
        &self,
        flow: &mut Lifecycle,
        tx: &Transaction,
    ) -> Result<(), LifecycleError> {
        flow.require(&["Validated"], "sign")?;

        let account = tx.account().ok_or_else(|| LifecycleError::NoSigningAccount {
            type_name: tx.type_name().to_string(),
        })?;

        let blob = self.signer.sign(tx, &account).await?;
        flow.tx_hash = Some(blob.tx_hash.clone());
        flow.signed_blob = Some(blob);
        flow.status = LifecycleStatus::Signed;
        tracing::debug!(flow = %flow.flow_id, hash = flow.tx_hash.as_deref(), "signed");
        Ok(())
    }

    /// `Signed → Submitted | Failed`. One attempt, no silent retries:
    /// a signature is single-use-safe, but a second broadcast of an
    /// already-sent blob is exactly the double-spend scare we exist to
    /// avoid. Rejection and transport failure are *terminal states*
    /// returned in `Ok`, not errors — by now an external effect may
    /// exist and the caller must branch on outcome.
    pub async fn submit(&self, flow: &mut Lifecycle) -> Result<Option<FlowOutcome>, LifecycleError> {
        flow.require(&["Signed"], "submit")?;

        let blob = match &flow.signed_blob {
            Some(blob) => blob.clone(),
            // Unreachable when status is Signed; keep the invariant noisy
            // rather than panicking inside a wallet.
            None => {
                return Err(LifecycleError::InvalidTransition {
                    from: flow.status.tag(),
                    attempted: "submit",
                })
            }
        };

        match self.submission.submit(&blob).await {
            Ok(ack) if ack.accepted => {
                flow.submitted_at = Some(Utc::now());
                flow.status = LifecycleStatus::Submitted;
                tracing::info!(
                    flow = %flow.flow_id,
                    hash = %ack.provisional_hash,
                    "submitted to ledger"
                );
                Ok(None)
            }
            Ok(ack) => {
                let reason = FailureReason::SubmissionRejected {
                    engine_result: ack
                        .engine_result
                        .unwrap_or_else(|| "rejected".to_string()),
                };
                tracing::warn!(flow = %flow.flow_id, %reason, "submission rejected");
                flow.status = LifecycleStatus::Failed(reason.clone());
                Ok(Some(FlowOutcome::Failed(reason)))
            }
            Err(err) => {
                // Ambiguous: the blob may have been broadcast. Keep the
                // hash for re-query and surface the failure as terminal.
                let reason = FailureReason::Transport {
                    detail: err.to_string(),
                };
                tracing::warn!(flow = %flow.flow_id, %reason, "submission transport failure");
                flow.status = LifecycleStatus::Failed(reason.clone());
                Ok(Some(FlowOutcome::Failed(reason)))
            }
        }
    }

    /// `Submitted → Verifying → Verified | Failed`. Polls the outcome
    /// query under the configured budget. Transport hiccups consume an
    /// attempt and keep polling — reads are idempotent, unlike submits.
    pub async fn verify(&self, flow: &mut Lifecycle) -> Result<FlowOutcome, LifecycleError> {
        flow.require(&["Submitted"], "verify")?;

        let hash = match flow.tx_hash.clone() {
            Some(hash) => hash,
            None => {
                return Err(LifecycleError::InvalidTransition {
                    from: flow.status.tag(),
                    attempted: "verify",
                })
            }
        };

        flow.status = LifecycleStatus::Verifying;
        let attempts = self.config.verify_attempts;

        for attempt in 1..=attempts {
            match self.query.outcome(&hash).await {
                Ok(OutcomeLookup::Final(outcome)) => {
                    tracing::info!(
                        flow = %flow.flow_id,
                        applied = outcome.applied,
                        result = %outcome.result_code,
                        ledger = outcome.ledger_index,
                        "verified"
                    );
                    flow.status = LifecycleStatus::Verified(outcome.clone());
                    return Ok(FlowOutcome::Verified(outcome));
                }
                Ok(OutcomeLookup::NotFound) => {
                    tracing::debug!(flow = %flow.flow_id, attempt, "outcome not yet available");
                }
                Err(err) => {
                    tracing::warn!(flow = %flow.flow_id, attempt, %err, "outcome query failed");
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.config.verify_interval).await;
            }
        }

        let reason = FailureReason::VerificationTimeout {
            attempts,
            budget: self.config.verify_budget(),
        };
        tracing::warn!(flow = %flow.flow_id, %reason, "verification budget exhausted");
        flow.status = LifecycleStatus::Failed(reason.clone());
        Ok(FlowOutcome::Failed(reason))
    }

    /// Drives the full lifecycle in order and returns the terminal
    /// outcome. `Err` means the flow stopped before any external effect;
    /// `Ok` always carries a terminal state to branch on.
    pub async fn run(
        &self,
        flow: &mut Lifecycle,
        tx: &mut Transaction,
    ) -> Result<FlowOutcome, LifecycleError> {
        self.validate(flow, tx).await?;
        self.sign(flow, tx).await?;
        if let Some(outcome) = self.submit(flow).await? {
            return Ok(outcome);
        }
        self.verify(flow).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_lifecycle_is_draft() {
        let flow = Lifecycle::new();
        assert_eq!(*flow.status(), LifecycleStatus::Draft);
        assert!(!flow.is_terminal());
        assert!(flow.tx_hash().is_none());
        assert!(flow.outcome().is_none());
    }

    #[test]
    fn flow_ids_are_unique() {
        assert_ne!(Lifecycle::new().flow_id(), Lifecycle::new().flow_id());
    }

    #[test]
    fn verify_budget_multiplies_out() {
        let cfg = LifecycleConfig {
            verify_attempts: 4,
            verify_interval: Duration::from_millis(250),
        };
        assert_eq!(cfg.verify_budget(), Duration::from_secs(1));
    }

    #[test]
    fn failure_reasons_display_distinctly() {
        let timeout = FailureReason::VerificationTimeout {
            attempts: 10,
            budget: Duration::from_secs(10),
        };
        let rejected = FailureReason::SubmissionRejected {
            engine_result: "mecINSUFFICIENT_FUNDS".to_string(),
        };
        assert!(timeout.to_string().contains("timeout"));
        assert!(rejected.to_string().contains("mecINSUFFICIENT_FUNDS"));
        assert_ne!(timeout.to_string(), rejected.to_string());
    }
}
