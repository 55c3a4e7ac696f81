//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, slippage bounded)
//! - Check the token set matches the three-pair DEX layout
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DappConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::DappConfig;

/// Maximum slippage tolerance accepted (50%).
pub const MAX_SLIPPAGE_BPS: u32 = 5_000;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid RPC URL '{0}'")]
    InvalidRpcUrl(String),

    #[error("{0} address must not be zero")]
    ZeroAddress(&'static str),

    #[error("expected exactly 3 tokens, found {0}")]
    TokenCount(usize),

    #[error("token {0} is configured more than once")]
    DuplicateToken(Address),

    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),

    #[error("slippage {0} bps exceeds maximum of {MAX_SLIPPAGE_BPS} bps")]
    SlippageTooHigh(u32),

    #[error("gas multiplier {0} must be at least 1.0")]
    GasMultiplier(f64),

    #[error("allowance poll max {max_ms} ms is below base {base_ms} ms")]
    PollMaxBelowBase { base_ms: u64, max_ms: u64 },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &DappConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let network = &config.network;
    if url::Url::parse(&network.rpc_url).is_err() {
        errors.push(ValidationError::InvalidRpcUrl(network.rpc_url.clone()));
    }
    for failover in &network.failover_urls {
        if url::Url::parse(failover).is_err() {
            errors.push(ValidationError::InvalidRpcUrl(failover.clone()));
        }
    }
    if network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::NonPositive("network.rpc_timeout_secs"));
    }
    if network.gas_price_multiplier < 1.0 {
        errors.push(ValidationError::GasMultiplier(network.gas_price_multiplier));
    }
    if network.gas_limit_multiplier < 1.0 {
        errors.push(ValidationError::GasMultiplier(network.gas_limit_multiplier));
    }

    let contracts = &config.contracts;
    for (name, addr) in [
        ("contracts.dex", contracts.dex),
        ("contracts.faucet", contracts.faucet),
        ("contracts.nft", contracts.nft),
        ("contracts.marketplace", contracts.marketplace),
    ] {
        if addr.is_zero() {
            errors.push(ValidationError::ZeroAddress(name));
        }
    }

    if contracts.tokens.len() != 3 {
        errors.push(ValidationError::TokenCount(contracts.tokens.len()));
    }
    let mut seen = HashSet::new();
    for token in &contracts.tokens {
        if token.address.is_zero() {
            errors.push(ValidationError::ZeroAddress("contracts.tokens"));
        } else if !seen.insert(token.address) {
            errors.push(ValidationError::DuplicateToken(token.address));
        }
    }

    for (name, value) in [
        ("polling.balance_interval_ms", config.polling.balance_interval_ms),
        ("polling.reserves_interval_ms", config.polling.reserves_interval_ms),
        ("sequencer.receipt_timeout_secs", config.sequencer.receipt_timeout_secs),
        ("sequencer.receipt_poll_interval_ms", config.sequencer.receipt_poll_interval_ms),
        ("sequencer.allowance_poll_base_ms", config.sequencer.allowance_poll_base_ms),
        ("sequencer.allowance_poll_max_ms", config.sequencer.allowance_poll_max_ms),
        ("nft.scan_range", config.nft.scan_range),
    ] {
        if value == 0 {
            errors.push(ValidationError::NonPositive(name));
        }
    }

    let sequencer = &config.sequencer;
    if sequencer.allowance_poll_max_ms < sequencer.allowance_poll_base_ms {
        errors.push(ValidationError::PollMaxBelowBase {
            base_ms: sequencer.allowance_poll_base_ms,
            max_ms: sequencer.allowance_poll_max_ms,
        });
    }

    if config.swap.slippage_bps > MAX_SLIPPAGE_BPS {
        errors.push(ValidationError::SlippageTooHigh(config.swap.slippage_bps));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
