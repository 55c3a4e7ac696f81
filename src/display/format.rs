//! Amount, address and time formatting.

use alloy::primitives::utils::parse_ether;
use alloy::primitives::{Address, TxHash, U256};
use serde::Serialize;
use thiserror::Error;

/// Decimals of every token the client handles.
pub const TOKEN_DECIMALS: u32 = 18;

/// Upper bound on displayed fraction digits.
const MAX_PLACES: u32 = TOKEN_DECIMALS;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisplayError {
    #[error("invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: String },
}

fn pow10(exp: u32) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Split a scaled integer into (whole, truncated fraction digits).
fn split(value: U256, scale: u32, places: u32) -> (U256, String) {
    let unit = pow10(scale);
    let whole = value / unit;
    if places == 0 {
        return (whole, String::new());
    }
    let frac = (value % unit) / pow10(scale - places);
    (whole, format!("{:0>width$}", frac.to_string(), width = places as usize))
}

/// Human-readable token amount with thousands grouping.
///
/// Zero renders as `0.00` (for two places). A non-zero amount that would
/// truncate to zero renders as `<0.01`.
pub fn format_amount(wei: U256, places: u32) -> String {
    let places = places.min(MAX_PLACES);
    let (whole, frac) = split(wei, TOKEN_DECIMALS, places);

    if !wei.is_zero() && whole.is_zero() && frac.bytes().all(|b| b == b'0') {
        return if places == 0 {
            "<1".to_string()
        } else {
            format!("<0.{}1", "0".repeat(places as usize - 1))
        };
    }

    let whole = group_thousands(&whole.to_string());
    if places == 0 {
        whole
    } else {
        format!("{}.{}", whole, frac)
    }
}

/// Token amount truncated to `places`, no grouping.
pub fn format_fixed(wei: U256, places: u32) -> String {
    let places = places.min(MAX_PLACES);
    let (whole, frac) = split(wei, TOKEN_DECIMALS, places);
    if places == 0 {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac)
    }
}

/// `numerator / denominator` truncated to `places`, or `None` for a zero denominator.
pub fn format_ratio(numerator: U256, denominator: U256, places: u32) -> Option<String> {
    if denominator.is_zero() {
        return None;
    }
    let places = places.min(MAX_PLACES);
    let scaled = numerator.saturating_mul(pow10(places)) / denominator;
    let (whole, frac) = split(scaled, places, places);
    Some(if places == 0 {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac)
    })
}

/// Value in USD at the fixed 1.5 USD per token rate.
pub fn usd_wei(wei: U256) -> U256 {
    wei.saturating_mul(U256::from(3)) / U256::from(2)
}

/// `format_amount` of the USD value.
pub fn format_usd(wei: U256) -> String {
    format_amount(usd_wei(wei), 2)
}

/// Lossy conversion for ratios that are only ever displayed.
pub fn units_to_f64(wei: U256) -> f64 {
    let unit = pow10(TOKEN_DECIMALS);
    let whole: f64 = (wei / unit).to_string().parse().unwrap_or(f64::MAX);
    let frac: f64 = (wei % unit).to_string().parse().unwrap_or(0.0);
    whole + frac / 1e18
}

/// Parse a decimal token amount ("1.5") into base units.
pub fn parse_amount(input: &str) -> Result<U256, DisplayError> {
    let trimmed = input.trim();
    parse_ether(trimmed).map_err(|e| DisplayError::InvalidAmount {
        input: trimmed.to_string(),
        reason: e.to_string(),
    })
}

/// `0x1234...abcd`.
pub fn short_address(address: Address) -> String {
    let full = address.to_checksum(None);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Explorer link for a transaction.
pub fn explorer_tx_url(explorer_base: &str, tx_hash: TxHash) -> String {
    format!("{}/tx/{}", explorer_base.trim_end_matches('/'), tx_hash)
}

/// Remaining time split for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Countdown {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Countdown {
    pub fn from_secs(total: u64) -> Self {
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }
}

impl std::fmt::Display for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}h {:02}m {:02}s", self.hours, self.minutes, self.seconds)
    }
}
