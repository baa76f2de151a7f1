//! Human-readable rendering of dashboard values.
//!
//! Amounts follow en-US conventions: comma digit grouping, `$` prefix for
//! currency and a leading minus sign for negative values. Digits beyond
//! the displayed precision are truncated.

use std::fmt;

use alloy::primitives::{Address, U256};
use fastnum::{D256, UD256, decimal::RoundingMode};
use itertools::Itertools;

use crate::{
    market::{MarketEntry, MarketSummary},
    num::Converter,
};

const CURRENCY_DIGITS: u8 = 2;
const NUMBER_DIGITS: u8 = 3;
const PERCENT_DIGITS: u8 = 9;

/// Decimal value that can be split into sign and fixed-point magnitude.
pub trait FixedPoint {
    /// Returns `(is_negative, |value| * 10^digits)`.
    fn to_fixed(self, digits: u8) -> (bool, U256);
}

impl FixedPoint for UD256 {
    fn to_fixed(self, digits: u8) -> (bool, U256) {
        let truncated = self.with_rounding_mode(RoundingMode::Down);
        (false, Converter::new(digits).to_unsigned(truncated))
    }
}

impl FixedPoint for D256 {
    fn to_fixed(self, digits: u8) -> (bool, U256) {
        // Magnitude is truncated, so -3.509 shows as -3.50 and not -3.51
        let (_, magnitude) = self.unsigned_abs().to_fixed(digits);
        (self.is_negative(), magnitude)
    }
}

/// Formats as US dollars with cents, e.g. `$1,234.50` or `-$3.50`.
pub fn format_currency(value: impl FixedPoint) -> String {
    let (negative, int, frac) = split(value, CURRENCY_DIGITS);
    format!(
        "{}${}.{:0width$}",
        sign(negative),
        group(int),
        frac,
        width = CURRENCY_DIGITS as usize
    )
}

/// Formats with digit grouping and up to three fractional digits,
/// e.g. `1,234,567.5`.
pub fn format_number(value: impl FixedPoint) -> String {
    let (negative, int, frac) = split(value, NUMBER_DIGITS);
    format!(
        "{}{}{}",
        sign(negative),
        group(int),
        fraction(frac, NUMBER_DIGITS)
    )
}

/// Formats a percentage without grouping, e.g. `-0.0125%`.
pub fn format_percent(value: impl FixedPoint) -> String {
    let (negative, int, frac) = split(value, PERCENT_DIGITS);
    format!("{}{}{}%", sign(negative), int, fraction(frac, PERCENT_DIGITS))
}

/// Abbreviates an address to its first 6 and last 4 characters,
/// e.g. `0xf53C...0c8d`.
pub fn short_address(address: &Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Label of the connected network relative to the required one.
pub fn network_label(chain_id: Option<u64>, required_chain_id: u64, chain_name: &str) -> String {
    match chain_id {
        Some(id) if id == required_chain_id => format!("{chain_name} ✅"),
        Some(id) => format!("Unknown Network ({id}) ❌"),
        None => "Unknown Network (unset) ❌".to_string(),
    }
}

fn split(value: impl FixedPoint, digits: u8) -> (bool, U256, u64) {
    let (negative, scaled) = value.to_fixed(digits);
    let base = U256::from(10u64).pow(U256::from(digits));
    let frac = (scaled % base).to::<u64>();
    let int = scaled / base;
    (negative && !scaled.is_zero(), int, frac)
}

fn sign(negative: bool) -> &'static str {
    if negative { "-" } else { "" }
}

fn group(int: U256) -> String {
    let digits = int.to_string();
    digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
        .join(",")
}

/// `.ddd` with trailing zeros removed, empty for a whole number.
fn fraction(frac: u64, digits: u8) -> String {
    if frac == 0 {
        return String::new();
    }
    let padded = format!("{:0width$}", frac, width = digits as usize);
    format!(".{}", padded.trim_end_matches('0'))
}

impl fmt::Display for MarketSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Open Interest   {}", format_currency(self.open_interest()))?;
        writeln!(f, "  Funding Rate    {}", format_percent(self.funding_rate()))?;
        writeln!(f, "  Volume          {}", format_number(self.volume()))?;
        write!(f, "  Unrealized PNL  {}", format_currency(self.unrealized_pnl()))
    }
}

impl fmt::Display for MarketEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}]  ID: {}", self.name(), self.symbol(), self.id())?;
        match self.summary() {
            Some(summary) => write!(f, "{summary}"),
            None => write!(f, "  Error loading market summary"),
        }
    }
}
