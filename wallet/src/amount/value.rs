//! Exact decimal values for ledger amounts.
//!
//! The ledger's issued-currency format is a decimal mantissa/exponent pair,
//! and the NFT-encoding convention parks token ordinals at magnitudes like
//! `10^-81` — far outside what any fixed-point library represents. So the
//! codec carries its own exact form: an unsigned 64-bit mantissa and a
//! signed exponent, integer math only, no floating point anywhere near
//! money.

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

use crate::config;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while parsing or validating a decimal value string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecimalError {
    /// The value string was empty.
    #[error("empty value string")]
    Empty,

    /// The value string is not a decimal literal the wire format accepts.
    #[error("malformed decimal literal {0:?}")]
    Malformed(String),

    /// Amount fields are unsigned; a leading minus is always an error.
    #[error("negative values cannot appear in amount fields")]
    Negative,

    /// More significant digits than the ledger's decimal mantissa holds.
    /// Accepting this would silently lose precision, so we refuse.
    #[error("value carries {digits} significant digits (wire limit is {limit})")]
    TooPrecise { digits: u32, limit: u32 },

    /// Normalized exponent outside the wire format's representable range.
    #[error("exponent {exponent} outside the wire range {min}..={max}")]
    ExponentOutOfRange { exponent: i32, min: i32, max: i32 },
}

// ---------------------------------------------------------------------------
// DecimalValue
// ---------------------------------------------------------------------------

/// An exact non-negative decimal number: `mantissa × 10^exponent`.
///
/// Invariants:
/// - zero is canonically `{ mantissa: 0, exponent: 0 }`;
/// - a non-zero mantissa never ends in a zero digit (trailing zeros are
///   folded into the exponent), so equal values have equal representations
///   and `==` is value equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalValue {
    mantissa: u64,
    exponent: i32,
}

impl DecimalValue {
    /// The canonical zero value.
    pub const ZERO: DecimalValue = DecimalValue {
        mantissa: 0,
        exponent: 0,
    };

    /// Parses a wire decimal string.
    ///
    /// Accepted forms: `"0"`, `"123"`, `"0.45"`, `"123.45"`, `"2e10"`,
    /// `"15e-82"`, `"1.5E-9"`. Whitespace, signs other than the exponent's,
    /// and thousands separators are rejected — this is the wire format,
    /// not a locale-aware input parser.
    pub fn parse(input: &str) -> Result<DecimalValue, DecimalError> {
        if input.is_empty() {
            return Err(DecimalError::Empty);
        }
        if input.starts_with('-') {
            return Err(DecimalError::Negative);
        }

        let malformed = || DecimalError::Malformed(input.to_string());

        // Optional exponent suffix.
        let (body, mut exponent) = match input.find(['e', 'E']) {
            Some(pos) => {
                let exp_str = &input[pos + 1..];
                if exp_str.is_empty() {
                    return Err(malformed());
                }
                let exp: i64 = exp_str.parse().map_err(|_| malformed())?;
                (&input[..pos], exp)
            }
            None => (input, 0i64),
        };

        // Mantissa body: digits with at most one decimal point.
        let (int_part, frac_part) = match body.find('.') {
            Some(pos) => (&body[..pos], &body[pos + 1..]),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(malformed());
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(malformed());
        }
        exponent -= frac_part.len() as i64;

        // Collect significant digits, dropping leading zeros.
        let mut digits = String::with_capacity(int_part.len() + frac_part.len());
        digits.push_str(int_part);
        digits.push_str(frac_part);
        let significant = digits.trim_start_matches('0');
        if significant.is_empty() {
            return Ok(DecimalValue::ZERO);
        }

        // Fold trailing zeros into the exponent so the mantissa is minimal.
        let trimmed = significant.trim_end_matches('0');
        exponent += (significant.len() - trimmed.len()) as i64;

        let sig_count = trimmed.len() as u32;
        if sig_count > config::MAX_VALUE_SIGNIFICANT_DIGITS {
            return Err(DecimalError::TooPrecise {
                digits: sig_count,
                limit: config::MAX_VALUE_SIGNIFICANT_DIGITS,
            });
        }

        // 16 significant digits always fit a u64.
        let mantissa: u64 = trimmed.parse().map_err(|_| malformed())?;

        if exponent < config::MIN_VALUE_EXPONENT as i64
            || exponent > config::MAX_VALUE_EXPONENT as i64
        {
            return Err(DecimalError::ExponentOutOfRange {
                exponent: exponent.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
                min: config::MIN_VALUE_EXPONENT,
                max: config::MAX_VALUE_EXPONENT,
            });
        }

        Ok(DecimalValue {
            mantissa,
            exponent: exponent as i32,
        })
    }

    /// Builds a value from already-normalized parts. Used by the NFT codec;
    /// trailing zeros in `mantissa` are folded so the invariants hold.
    pub(crate) fn from_parts(mut mantissa: u64, mut exponent: i32) -> DecimalValue {
        if mantissa == 0 {
            return DecimalValue::ZERO;
        }
        while mantissa % 10 == 0 {
            mantissa /= 10;
            exponent += 1;
        }
        DecimalValue { mantissa, exponent }
    }

    /// Returns `true` for the zero value.
    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    /// The normalized mantissa.
    pub fn mantissa(&self) -> u64 {
        self.mantissa
    }

    /// The normalized exponent.
    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    /// Number of significant digits in the mantissa (0 for zero).
    pub fn sig_digits(&self) -> u32 {
        if self.mantissa == 0 {
            0
        } else {
            self.mantissa.ilog10() + 1
        }
    }

    /// Order of magnitude: the exponent the value would have written as
    /// `d.ddd × 10^n`. Zero reports 0; callers check `is_zero` first.
    pub fn adjusted_exponent(&self) -> i32 {
        if self.mantissa == 0 {
            0
        } else {
            self.exponent + self.sig_digits() as i32 - 1
        }
    }

    /// Rounds half-up to at most `digits` significant digits.
    pub fn round_sig(&self, digits: u32) -> DecimalValue {
        if self.sig_digits() <= digits || digits == 0 {
            return *self;
        }
        let drop = self.sig_digits() - digits;
        let divisor = 10u64.pow(drop);
        let rounded = (self.mantissa + divisor / 2) / divisor;
        DecimalValue::from_parts(rounded, self.exponent + drop as i32)
    }

    /// Formats as a plain decimal string: `"123"`, `"0.00045"`, `"123.45"`.
    /// No exponent notation, no trailing zeros.
    pub fn to_plain_string(&self) -> String {
        if self.mantissa == 0 {
            return "0".to_string();
        }
        let digits = self.mantissa.to_string();
        if self.exponent >= 0 {
            let mut out = digits;
            out.extend(std::iter::repeat('0').take(self.exponent as usize));
            return out;
        }
        let point = digits.len() as i32 + self.exponent;
        if point > 0 {
            let (int_part, frac_part) = digits.split_at(point as usize);
            format!("{}.{}", int_part, frac_part)
        } else {
            let mut out = String::from("0.");
            out.extend(std::iter::repeat('0').take((-point) as usize));
            out.push_str(&digits);
            out
        }
    }

    /// Formats as `<mantissa>e<exponent>`, the compact wire spelling used
    /// for reserved-range values.
    pub fn to_scientific_string(&self) -> String {
        format!("{}e{}", self.mantissa, self.exponent)
    }

    /// The value rounded half-up to an integer, as a digit string.
    /// Used for the truncated-high display path.
    pub fn integer_rounded_string(&self) -> String {
        if self.mantissa == 0 {
            return "0".to_string();
        }
        if self.exponent >= 0 {
            return self.to_plain_string();
        }
        if self.adjusted_exponent() < -1 {
            // Strictly below 0.1 — rounds to zero whatever the digits are.
            return "0".to_string();
        }
        // -exponent <= sig_digits + 1 here, so the divisor fits u128.
        let divisor = 10u128.pow((-self.exponent) as u32);
        let rounded = (self.mantissa as u128 + divisor / 2) / divisor;
        rounded.to_string()
    }
}

impl PartialOrd for DecimalValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DecimalValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_zero(), other.is_zero()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }
        match self.adjusted_exponent().cmp(&other.adjusted_exponent()) {
            Ordering::Equal => {}
            ord => return ord,
        }
        // Same order of magnitude: align mantissas to equal digit counts.
        let (a, b) = (self.mantissa as u128, other.mantissa as u128);
        let (da, db) = (self.sig_digits(), other.sig_digits());
        let a = a * 10u128.pow(db.max(da) - da);
        let b = b * 10u128.pow(db.max(da) - db);
        a.cmp(&b)
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Plain form for anything a human might read in a log line;
        // scientific for the reserved-range magnitudes.
        if self.exponent < -30 || self.exponent > 30 {
            write!(f, "{}", self.to_scientific_string())
        } else {
            write!(f, "{}", self.to_plain_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
