//! # CLI Interface
//!
//! Command-line argument structure for `meridian-cli` using `clap`
//! derive. Three subcommands: `send`, `decode-amount`, and `version`.

use clap::{Parser, Subcommand};

use meridian_wallet::config;

/// Meridian wallet diagnostic client.
///
/// Drives the wallet core's transaction lifecycle from a terminal against
/// a node's JSON-RPC endpoint. This is a development tool, not the mobile
/// app — but it runs the exact code paths the app runs.
#[derive(Parser, Debug)]
#[command(
    name = "meridian-cli",
    about = "Meridian wallet diagnostic client",
    version,
    propagate_version = true
)]
pub struct MeridianCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build, validate, sign, submit, and verify a payment.
    Send(SendArgs),
    /// Decode a wire amount value: NFT detection, display text,
    /// truncation flags.
    DecodeAmount(DecodeAmountArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `send` subcommand.
#[derive(Parser, Debug)]
pub struct SendArgs {
    /// RPC endpoint of the node to talk to.
    #[arg(long, env = "MERIDIAN_RPC_URL", default_value = config::DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Hex-encoded Ed25519 seed of the sending account.
    ///
    /// **Never pass this flag in production** — it exists for devnet
    /// plumbing. Real key material belongs in the platform keystore.
    #[arg(long, env = "MERIDIAN_KEY", hide_env_values = true)]
    pub key: String,

    /// Destination account address (`mrd:` + 40 hex).
    #[arg(long)]
    pub destination: String,

    /// Optional destination routing tag.
    #[arg(long)]
    pub destination_tag: Option<u32>,

    /// Amount to send: motes for native, a decimal string for issued.
    #[arg(long)]
    pub amount: String,

    /// Issued-currency ticker (three uppercase alphanumerics). When
    /// omitted, the amount is native motes.
    #[arg(long, requires = "issuer")]
    pub currency: Option<String>,

    /// Issuer account of the issued currency.
    #[arg(long, requires = "currency")]
    pub issuer: Option<String>,

    /// Treat the amount as an NFT ordinal instead of a quantity.
    #[arg(long, requires = "currency")]
    pub nft: bool,

    /// Optional invoice identifier (even-length hex).
    #[arg(long)]
    pub invoice_id: Option<String>,

    /// Log format: "pretty" or "json".
    #[arg(long, env = "MERIDIAN_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `decode-amount` subcommand.
#[derive(Parser, Debug)]
pub struct DecodeAmountArgs {
    /// The wire value to decode, e.g. `"123.45"` or `"7e-81"`.
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        MeridianCli::command().debug_assert();
    }
}
