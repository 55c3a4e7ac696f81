//! Presentation helpers.
//!
//! All amounts are 18-decimal token units held as `U256`. Formatting stays
//! in integer math so large balances never pass through a float.

pub mod format;

pub use format::{
    explorer_tx_url, format_amount, format_fixed, format_ratio, format_usd, parse_amount, usd_wei,
    short_address, units_to_f64, Countdown, DisplayError, TOKEN_DECIMALS,
};
