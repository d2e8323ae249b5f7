// Copyright (c) 2026 Meridian Labs. MIT License.
// See LICENSE for details.

//! # Meridian CLI
//!
//! Entry point for the `meridian-cli` binary. Parses arguments,
//! initializes logging, wires the wallet core's collaborator traits to a
//! real node (RPC client) and a local Ed25519 signer, and drives the
//! transaction lifecycle end to end.
//!
//! Subcommands:
//!
//! - `send`          — build, validate, sign, submit, and verify a payment
//! - `decode-amount` — print the codec's view of a wire value
//! - `version`       — print build version information

mod cli;
mod logging;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use meridian_wallet::amount::{
    self, Amount, CurrencyCode, IssuedAmount, NativeAmount, NftAmount, Truncation, WireDecoded,
};
use meridian_wallet::crypto::{LocalSigner, WalletKeypair};
use meridian_wallet::lifecycle::{FailureReason, FlowOutcome, Lifecycle, LifecycleController};
use meridian_wallet::rpc::LedgerRpcClient;
use meridian_wallet::transaction::{Address, Payment, Transaction};

use cli::{Commands, DecodeAmountArgs, MeridianCli, SendArgs};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = MeridianCli::parse();

    match cli.command {
        Commands::Send(args) => send(args).await,
        Commands::DecodeAmount(args) => decode_amount(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Builds and drives a payment through the full lifecycle.
async fn send(args: SendArgs) -> Result<()> {
    logging::init_logging(
        "meridian_cli=info,meridian_wallet=info",
        LogFormat::from_str_lossy(&args.log_format),
    );

    let keypair = WalletKeypair::from_hex(&args.key).context("loading signing key")?;
    let signer = LocalSigner::new(keypair);
    let account = signer.address();

    tracing::info!(account = %account, rpc = %args.rpc_url, "preparing payment");

    // --- Build the draft ---
    let mut payment = Payment::new(account);
    payment
        .set_destination(Some(&args.destination))
        .context("setting destination")?;
    payment.set_destination_tag(args.destination_tag);
    payment.set_amount(Some(parse_amount(&args)?));
    if let Some(invoice) = args.invoice_id.as_deref() {
        payment
            .set_invoice_id(Some(invoice))
            .context("setting invoice id")?;
    }
    let mut tx = Transaction::Payment(payment);

    // --- Wire the collaborators ---
    let rpc = Arc::new(LedgerRpcClient::new(args.rpc_url));
    let submission: Arc<dyn meridian_wallet::lifecycle::services::SubmissionService> = rpc.clone();
    let query: Arc<dyn meridian_wallet::lifecycle::services::OutcomeQuery> = rpc.clone();
    let rates: Arc<dyn meridian_wallet::lifecycle::services::TransferRateLookup> = rpc;
    let controller = LifecycleController::new(Arc::new(signer), submission, query, rates);

    // --- Drive ---
    let mut flow = Lifecycle::new();
    let outcome = controller
        .run(&mut flow, &mut tx)
        .await
        .context("lifecycle stopped before submission")?;

    match outcome {
        FlowOutcome::Verified(o) if o.applied => {
            println!(
                "verified: {} in ledger {} ({})",
                flow.tx_hash().unwrap_or("<unknown>"),
                o.ledger_index,
                o.result_code
            );
            Ok(())
        }
        FlowOutcome::Verified(o) => {
            bail!(
                "ledger recorded the transaction but it failed to apply: {} (ledger {})",
                o.result_code,
                o.ledger_index
            );
        }
        FlowOutcome::Failed(FailureReason::VerificationTimeout { attempts, budget }) => {
            bail!(
                "outcome unknown after {} polls over {:?}; re-query hash {} later",
                attempts,
                budget,
                flow.tx_hash().unwrap_or("<unknown>")
            );
        }
        FlowOutcome::Failed(reason) => bail!("payment failed: {}", reason),
    }
}

/// Parses the amount arguments into the right [`Amount`] form.
fn parse_amount(args: &SendArgs) -> Result<Amount> {
    match (&args.currency, &args.issuer) {
        (None, None) => {
            let motes: u64 = args
                .amount
                .parse()
                .context("native amounts are integer motes")?;
            Ok(Amount::Native(NativeAmount::new(motes)?))
        }
        (Some(currency), Some(issuer)) => {
            let currency = CurrencyCode::new(currency)?;
            let issuer = Address::new(issuer)?;
            if args.nft {
                let ordinal: u64 = args.amount.parse().context("NFT ordinal must be a whole number")?;
                Ok(Amount::NftToken(NftAmount::new(currency, issuer, ordinal)?))
            } else {
                Ok(Amount::Issued(IssuedAmount::new(
                    currency,
                    issuer,
                    &args.amount,
                )?))
            }
        }
        // clap's `requires` keeps these unrepresentable; belt and braces.
        _ => bail!("--currency and --issuer must be given together"),
    }
}

/// Prints the codec's interpretation of a wire value.
fn decode_amount(args: DecodeAmountArgs) -> Result<()> {
    match amount::from_wire(&args.value)? {
        WireDecoded::NftOrdinal(ordinal) => {
            println!("nft ordinal: {}", ordinal);
        }
        WireDecoded::Quantity(display) => {
            let flag = match display.truncation {
                Truncation::None => "exact",
                Truncation::Low => "truncated-low",
                Truncation::High => "truncated-high",
            };
            println!("display: {} ({})", display.text, flag);
            println!("raw:     {}", display.raw);
        }
    }
    Ok(())
}

fn print_version() {
    println!("meridian-cli {}", env!("CARGO_PKG_VERSION"));
}
