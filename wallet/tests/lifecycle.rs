//! End-to-end tests for the transaction lifecycle.
//!
//! These exercise the full path from draft payment through validation,
//! signing, submission, and outcome verification, with scripted
//! collaborators standing in for the node. They prove the controller's
//! contract: local failures before any external effect, terminal states
//! after, and a hard line between "the ledger said no" and "nobody knows".
//!
//! Each test builds its own controller and mocks. No shared state, no
//! ordering dependencies.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use meridian_wallet::amount::{Amount, CurrencyCode, IssuedAmount, NativeAmount, TransferRate};
use meridian_wallet::config;
use meridian_wallet::crypto::{LocalSigner, WalletKeypair};
use meridian_wallet::lifecycle::services::{
    LedgerOutcome, OutcomeLookup, OutcomeQuery, SignedBlob, Signer, SigningError,
    SubmissionService, SubmitAck, TransferRateLookup, TransportError,
};
use meridian_wallet::lifecycle::{
    FailureReason, FlowOutcome, Lifecycle, LifecycleConfig, LifecycleController, LifecycleError,
    LifecycleStatus,
};
use meridian_wallet::transaction::{
    Address, Payment, Transaction, ValidationError, PARTIAL_PAYMENT_FLAG,
};

// ---------------------------------------------------------------------------
// Test Doubles
// ---------------------------------------------------------------------------

/// Submission service answering from a fixed script and counting calls.
struct MockSubmission {
    response: Result<SubmitAck, TransportError>,
    calls: AtomicU32,
}

impl MockSubmission {
    fn accepting() -> MockSubmission {
        MockSubmission {
            response: Ok(SubmitAck {
                accepted: true,
                provisional_hash: "feed".to_string(),
                engine_result: Some("mesQUEUED".to_string()),
            }),
            calls: AtomicU32::new(0),
        }
    }

    fn rejecting(engine_result: &str) -> MockSubmission {
        MockSubmission {
            response: Ok(SubmitAck {
                accepted: false,
                provisional_hash: "feed".to_string(),
                engine_result: Some(engine_result.to_string()),
            }),
            calls: AtomicU32::new(0),
        }
    }

    fn failing() -> MockSubmission {
        MockSubmission {
            response: Err(TransportError::Http {
                detail: "connection reset by peer".to_string(),
            }),
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmissionService for MockSubmission {
    async fn submit(&self, _blob: &SignedBlob) -> Result<SubmitAck, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

/// Outcome query answering from a queue of scripted responses; once the
/// queue drains it keeps answering `NotFound`.
struct MockQuery {
    script: Mutex<VecDeque<Result<OutcomeLookup, TransportError>>>,
    calls: AtomicU32,
}

impl MockQuery {
    fn scripted(script: Vec<Result<OutcomeLookup, TransportError>>) -> MockQuery {
        MockQuery {
            script: Mutex::new(script.into()),
            calls: AtomicU32::new(0),
        }
    }

    fn never_found() -> MockQuery {
        MockQuery::scripted(Vec::new())
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OutcomeQuery for MockQuery {
    async fn outcome(&self, _tx_hash: &str) -> Result<OutcomeLookup, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(OutcomeLookup::NotFound))
    }
}

/// Transfer-rate lookup with a fixed per-issuer answer.
struct MockRates {
    rate: Option<TransferRate>,
}

#[async_trait]
impl TransferRateLookup for MockRates {
    async fn transfer_rate(
        &self,
        _issuer: &Address,
    ) -> Result<Option<TransferRate>, TransportError> {
        Ok(self.rate)
    }
}

/// A signer that refuses everything, for proving it is never reached.
struct RefusingSigner;

#[async_trait]
impl Signer for RefusingSigner {
    async fn sign(
        &self,
        _transaction: &Transaction,
        _account: &Address,
    ) -> Result<SignedBlob, SigningError> {
        Err(SigningError::Declined {
            reason: "test signer must not be reached".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fast_config() -> LifecycleConfig {
    LifecycleConfig {
        verify_attempts: 3,
        verify_interval: Duration::from_millis(1),
    }
}

fn success_outcome() -> LedgerOutcome {
    LedgerOutcome {
        applied: true,
        result_code: "mesSUCCESS".to_string(),
        ledger_index: 4_242,
    }
}

fn addr(byte: u8) -> Address {
    Address::from_account_id(&[byte; config::ACCOUNT_ID_LENGTH])
}

/// A keypair-backed signer and a valid native payment drawn on its account.
fn signer_and_payment() -> (Arc<LocalSigner>, Transaction) {
    let signer = LocalSigner::new(WalletKeypair::generate());
    let mut payment = Payment::new(signer.address());
    payment.set_destination(Some(addr(2).as_str())).unwrap();
    payment.set_amount(Some(Amount::Native(NativeAmount::new(5_000_000).unwrap())));
    (Arc::new(signer), Transaction::Payment(payment))
}

fn controller(
    signer: Arc<dyn Signer>,
    submission: Arc<MockSubmission>,
    query: Arc<MockQuery>,
    rate: Option<TransferRate>,
) -> LifecycleController {
    LifecycleController::new(signer, submission, query, Arc::new(MockRates { rate }))
        .with_config(fast_config())
}

// ---------------------------------------------------------------------------
// 1. Full Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_lifecycle_reaches_verified_success() {
    let (signer, mut tx) = signer_and_payment();
    let submission = Arc::new(MockSubmission::accepting());
    let query = Arc::new(MockQuery::scripted(vec![
        Ok(OutcomeLookup::NotFound),
        Ok(OutcomeLookup::Final(success_outcome())),
    ]));
    let ctl = controller(signer, Arc::clone(&submission), Arc::clone(&query), None);

    let mut flow = Lifecycle::new();
    let outcome = ctl.run(&mut flow, &mut tx).await.unwrap();

    assert_eq!(outcome, FlowOutcome::Verified(success_outcome()));
    assert!(flow.is_terminal());
    assert_eq!(submission.calls(), 1);
    assert_eq!(query.calls(), 2, "one NotFound poll, then the outcome");
    assert!(flow.tx_hash().is_some());
}

#[tokio::test]
async fn verified_business_failure_is_not_failed() {
    // The ledger *recorded* the transaction and reports it failed at
    // apply time. That is a known outcome — Verified, not Failed.
    let (signer, mut tx) = signer_and_payment();
    let failure = LedgerOutcome {
        applied: false,
        result_code: "mecINSUFFICIENT_FUNDS".to_string(),
        ledger_index: 4_243,
    };
    let submission = Arc::new(MockSubmission::accepting());
    let query = Arc::new(MockQuery::scripted(vec![Ok(OutcomeLookup::Final(
        failure.clone(),
    ))]));
    let ctl = controller(signer, submission, query, None);

    let mut flow = Lifecycle::new();
    let outcome = ctl.run(&mut flow, &mut tx).await.unwrap();

    match outcome {
        FlowOutcome::Verified(o) => {
            assert!(!o.applied);
            assert_eq!(o.result_code, "mecINSUFFICIENT_FUNDS");
        }
        FlowOutcome::Failed(r) => panic!("apply-time failure reported as Failed({})", r),
    }
    assert!(matches!(flow.status(), LifecycleStatus::Verified(_)));
}

// ---------------------------------------------------------------------------
// 2. Submission Outcomes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rejected_submission_fails_without_verifying() {
    let (signer, mut tx) = signer_and_payment();
    let submission = Arc::new(MockSubmission::rejecting("mecFEE_TOO_LOW"));
    let query = Arc::new(MockQuery::never_found());
    let ctl = controller(signer, Arc::clone(&submission), Arc::clone(&query), None);

    let mut flow = Lifecycle::new();
    let outcome = ctl.run(&mut flow, &mut tx).await.unwrap();

    match outcome {
        FlowOutcome::Failed(FailureReason::SubmissionRejected { engine_result }) => {
            assert_eq!(engine_result, "mecFEE_TOO_LOW");
        }
        other => panic!("expected SubmissionRejected, got {:?}", other),
    }
    assert_eq!(query.calls(), 0, "verify must never start after rejection");
    assert!(flow.is_terminal());
}

#[tokio::test]
async fn transport_failure_is_terminal_and_keeps_hash() {
    let (signer, mut tx) = signer_and_payment();
    let submission = Arc::new(MockSubmission::failing());
    let query = Arc::new(MockQuery::never_found());
    let ctl = controller(signer, submission, Arc::clone(&query), None);

    let mut flow = Lifecycle::new();
    let outcome = ctl.run(&mut flow, &mut tx).await.unwrap();

    match outcome {
        FlowOutcome::Failed(FailureReason::Transport { detail }) => {
            assert!(detail.contains("connection reset"));
        }
        other => panic!("expected Transport failure, got {:?}", other),
    }
    // The outcome is ambiguous; the hash must survive for re-query.
    assert!(flow.tx_hash().is_some());
    assert_eq!(query.calls(), 0);
}

// ---------------------------------------------------------------------------
// 3. Verification Budget
// ---------------------------------------------------------------------------

#[tokio::test]
async fn verification_timeout_is_distinct_from_rejection() {
    let (signer, mut tx) = signer_and_payment();
    let submission = Arc::new(MockSubmission::accepting());
    let query = Arc::new(MockQuery::never_found());
    let ctl = controller(signer, submission, Arc::clone(&query), None);

    let mut flow = Lifecycle::new();
    let outcome = ctl.run(&mut flow, &mut tx).await.unwrap();

    match outcome {
        FlowOutcome::Failed(FailureReason::VerificationTimeout { attempts, .. }) => {
            assert_eq!(attempts, 3);
        }
        other => panic!("expected VerificationTimeout, got {:?}", other),
    }
    assert_eq!(query.calls(), 3, "the whole budget was spent");
    // The hash remains so the caller can re-query later.
    assert!(flow.tx_hash().is_some());
}

#[tokio::test]
async fn query_transport_errors_consume_attempts_but_keep_polling() {
    let (signer, mut tx) = signer_and_payment();
    let submission = Arc::new(MockSubmission::accepting());
    let query = Arc::new(MockQuery::scripted(vec![
        Err(TransportError::Http {
            detail: "blip".to_string(),
        }),
        Ok(OutcomeLookup::Final(success_outcome())),
    ]));
    let ctl = controller(signer, submission, Arc::clone(&query), None);

    let mut flow = Lifecycle::new();
    let outcome = ctl.run(&mut flow, &mut tx).await.unwrap();

    assert_eq!(outcome, FlowOutcome::Verified(success_outcome()));
    assert_eq!(query.calls(), 2);
}

// ---------------------------------------------------------------------------
// 4. Validation Gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_destination_never_reaches_the_signer() {
    let signer = LocalSigner::new(WalletKeypair::generate());
    let mut payment = Payment::new(signer.address());
    payment.set_amount(Some(Amount::Native(NativeAmount::new(1).unwrap())));
    let mut tx = Transaction::Payment(payment);

    let submission = Arc::new(MockSubmission::accepting());
    let query = Arc::new(MockQuery::never_found());
    // A signer that errors if touched proves sign() was never attempted.
    let ctl = controller(
        Arc::new(RefusingSigner),
        Arc::clone(&submission),
        query,
        None,
    );

    let mut flow = Lifecycle::new();
    match ctl.run(&mut flow, &mut tx).await {
        Err(LifecycleError::Validation(ValidationError::MissingDestination)) => {}
        other => panic!("expected MissingDestination, got {:?}", other),
    }
    assert_eq!(*flow.status(), LifecycleStatus::Draft, "no transition happened");
    assert_eq!(submission.calls(), 0);
    assert!(flow.tx_hash().is_none());
}

#[tokio::test]
async fn issuer_fee_sets_partial_payment_flag_during_validation() {
    let signer = LocalSigner::new(WalletKeypair::generate());
    let account = signer.address();
    let issuer = addr(7);

    let mut payment = Payment::new(account);
    payment.set_destination(Some(addr(2).as_str())).unwrap();
    payment.set_amount(Some(Amount::Issued(
        IssuedAmount::new(CurrencyCode::new("USD").unwrap(), issuer, "25").unwrap(),
    )));
    let mut tx = Transaction::Payment(payment);

    let fee_rate = TransferRate::new(config::TRANSFER_RATE_BASE + 20_000_000).unwrap();
    let submission = Arc::new(MockSubmission::accepting());
    let query = Arc::new(MockQuery::scripted(vec![Ok(OutcomeLookup::Final(
        success_outcome(),
    ))]));
    let ctl = controller(Arc::new(signer), submission, query, Some(fee_rate));

    let mut flow = Lifecycle::new();
    ctl.validate(&mut flow, &mut tx).await.unwrap();

    match &tx {
        Transaction::Payment(p) => {
            assert!(
                p.flags().contains(PARTIAL_PAYMENT_FLAG),
                "validated payment with issuer fee must carry the partial flag"
            );
            assert_eq!(p.transfer_rate(), Some(fee_rate));
        }
        other => panic!("unexpected {:?}", other),
    }

    // And the rest of the flow still completes.
    let outcome = ctl.run(&mut flow, &mut tx).await.unwrap();
    assert!(matches!(outcome, FlowOutcome::Verified(_)));
}

#[tokio::test]
async fn no_fee_no_partial_flag_after_validation() {
    let signer = LocalSigner::new(WalletKeypair::generate());
    let mut payment = Payment::new(signer.address());
    payment.set_destination(Some(addr(2).as_str())).unwrap();
    payment.set_amount(Some(Amount::Issued(
        IssuedAmount::new(CurrencyCode::new("EUR").unwrap(), addr(7), "10").unwrap(),
    )));
    let mut tx = Transaction::Payment(payment);

    let submission = Arc::new(MockSubmission::accepting());
    let query = Arc::new(MockQuery::never_found());
    let ctl = controller(Arc::new(signer), submission, query, None);

    let mut flow = Lifecycle::new();
    ctl.validate(&mut flow, &mut tx).await.unwrap();

    match &tx {
        Transaction::Payment(p) => assert!(!p.flags().contains(PARTIAL_PAYMENT_FLAG)),
        other => panic!("unexpected {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// 5. Transition Discipline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sign_before_validate_is_rejected() {
    let (signer, tx) = signer_and_payment();
    let submission = Arc::new(MockSubmission::accepting());
    let query = Arc::new(MockQuery::never_found());
    let ctl = controller(signer, submission, query, None);

    let mut flow = Lifecycle::new();
    match ctl.sign(&mut flow, &tx).await {
        Err(LifecycleError::InvalidTransition { from, attempted }) => {
            assert_eq!(from, "Draft");
            assert_eq!(attempted, "sign");
        }
        other => panic!("expected InvalidTransition, got {:?}", other),
    }
    assert_eq!(*flow.status(), LifecycleStatus::Draft);
}

#[tokio::test]
async fn verify_before_submit_is_rejected() {
    let (signer, _tx) = signer_and_payment();
    let submission = Arc::new(MockSubmission::accepting());
    let query = Arc::new(MockQuery::never_found());
    let ctl = controller(signer, submission, Arc::clone(&query), None);

    let mut flow = Lifecycle::new();
    assert!(matches!(
        ctl.verify(&mut flow).await,
        Err(LifecycleError::InvalidTransition { .. })
    ));
    assert_eq!(query.calls(), 0);
}

#[tokio::test]
async fn terminal_flows_refuse_further_transitions() {
    let (signer, mut tx) = signer_and_payment();
    let submission = Arc::new(MockSubmission::rejecting("mecFEE_TOO_LOW"));
    let query = Arc::new(MockQuery::never_found());
    let ctl = controller(signer, Arc::clone(&submission), query, None);

    let mut flow = Lifecycle::new();
    let _ = ctl.run(&mut flow, &mut tx).await.unwrap();
    assert!(flow.is_terminal());

    // A failed flow cannot be re-submitted: the state machine is done.
    assert!(matches!(
        ctl.submit(&mut flow).await,
        Err(LifecycleError::InvalidTransition { .. })
    ));
    assert_eq!(submission.calls(), 1);
}

#[tokio::test]
async fn pseudo_transactions_cannot_be_driven_to_signing() {
    use meridian_wallet::transaction::FeeAdjust;

    let (signer, _) = signer_and_payment();
    let submission = Arc::new(MockSubmission::accepting());
    let query = Arc::new(MockQuery::never_found());
    let ctl = controller(signer, submission, query, None);

    let mut tx = Transaction::FeeAdjust(FeeAdjust::new(12, 1));
    let mut flow = Lifecycle::new();

    // Structural validation passes; signing has no account to sign for.
    ctl.validate(&mut flow, &mut tx).await.unwrap();
    match ctl.sign(&mut flow, &tx).await {
        Err(LifecycleError::NoSigningAccount { type_name }) => {
            assert_eq!(type_name, "FeeAdjust");
        }
        other => panic!("expected NoSigningAccount, got {:?}", other),
    }
}
