//! # Wallet Configuration & Constants
//!
//! Every protocol constant the wallet core relies on lives here. The ledger
//! defines most of these; the display thresholds are wallet policy. Either
//! way, nothing outside this module gets to hardcode them.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Native Currency
// ---------------------------------------------------------------------------

/// Ticker of the ledger's native currency. Issued currencies must not
/// reuse this code — a three-letter "MRD" trust line is always a spoof.
pub const NATIVE_CURRENCY: &str = "MRD";

/// Smallest indivisible unit of the native currency ("motes").
/// 1 MRD = 10^6 motes. All native amounts on the wire are integer motes.
pub const MOTES_PER_MRD: u64 = 1_000_000;

/// Total native supply in motes: 100 billion MRD. No wire amount may
/// exceed this; anything larger is malformed, not merely ambitious.
pub const MAX_NATIVE_MOTES: u64 = 100_000_000_000 * MOTES_PER_MRD;

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Prefix of every Meridian account address.
pub const ADDRESS_PREFIX: &str = "mrd:";

/// Account identifier length in bytes (double-SHA-256 of the public key,
/// truncated).
pub const ACCOUNT_ID_LENGTH: usize = 20;

/// Hex length of the account identifier part of an address.
pub const ADDRESS_HEX_LENGTH: usize = 2 * ACCOUNT_ID_LENGTH;

// ---------------------------------------------------------------------------
// Issued-Value Decimal Format
// ---------------------------------------------------------------------------

/// Maximum significant decimal digits an issued-currency value may carry
/// on the wire. The ledger's decimal format stores a 16-digit mantissa;
/// a 17th digit would be silently lost, so we reject it up front.
pub const MAX_VALUE_SIGNIFICANT_DIGITS: u32 = 16;

/// Smallest normalized exponent of a wire decimal value.
pub const MIN_VALUE_EXPONENT: i32 = -96;

/// Largest normalized exponent of a wire decimal value.
pub const MAX_VALUE_EXPONENT: i32 = 80;

// ---------------------------------------------------------------------------
// NFT Encoding
// ---------------------------------------------------------------------------
//
// Non-fungible token ordinals ride inside the issued-currency decimal
// format at a magnitude no genuine quantity ever reaches. The boundary is
// convention, not arithmetic — these three constants *are* the convention,
// and everything else derives from them.

/// Exponent used when encoding an NFT ordinal: ordinal `n` becomes the
/// wire value `n × 10^-81`.
pub const NFT_VALUE_EXPONENT: i32 = -81;

/// Detection ceiling: a non-zero wire value whose order of magnitude is at
/// or below `10^-70` is treated as NFT-encoded. The gap between -70 and
/// the smallest displayable quantity (10^-8) is deliberately enormous.
pub const NFT_RANGE_CEILING_EXPONENT: i32 = -70;

/// Largest NFT ordinal the encoding supports. Twelve digits is the full
/// mantissa headroom between the encoding exponent and the detection
/// ceiling: a 13-digit ordinal would push the encoded value's magnitude
/// past `10^-70` and out of the reserved range.
pub const MAX_NFT_ORDINAL: u64 = 999_999_999_999;

// ---------------------------------------------------------------------------
// Display Policy
// ---------------------------------------------------------------------------

/// Significant digits shown for an issued-currency amount. The exact wire
/// string is always preserved; this bounds only what the screen shows.
pub const DISPLAY_SIGNIFICANT_DIGITS: u32 = 8;

/// Order-of-magnitude floor for display. A positive value below `10^-8`
/// renders as the ellipsis marker rather than a misleading row of zeros.
pub const MIN_DISPLAY_EXPONENT: i32 = -8;

/// Marker shown for a positive amount too small to display faithfully.
pub const TRUNCATED_LOW_MARKER: &str = "0…";

/// Largest magnitude displayed with full precision. Above this the wallet
/// shows an integer-rounded figure and flags the truncation.
pub const MAX_DISPLAY_MAGNITUDE: u64 = 99_999;

// ---------------------------------------------------------------------------
// Transfer Rates
// ---------------------------------------------------------------------------

/// Transfer-rate base: a rate of exactly this value means the issuer
/// charges no fee. Rates are expressed in billionths of the base.
pub const TRANSFER_RATE_BASE: u32 = 1_000_000_000;

/// Largest transfer rate an issuer may configure (a 100% fee). The ledger
/// rejects anything above this, so the wallet does too.
pub const MAX_TRANSFER_RATE: u32 = 2_000_000_000;

// ---------------------------------------------------------------------------
// Lifecycle Timing
// ---------------------------------------------------------------------------

/// How many times the verify step polls the ledger for a final outcome
/// before giving up.
pub const VERIFY_ATTEMPTS: u32 = 10;

/// Delay between verification polls. Ten attempts at one second apiece
/// comfortably covers the ledger's close cadence.
pub const VERIFY_INTERVAL: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Networking Defaults
// ---------------------------------------------------------------------------

/// Default JSON-RPC port of a Meridian node.
pub const DEFAULT_RPC_PORT: u16 = 8821;

/// Default RPC endpoint used by the reference client when none is given.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8821";
