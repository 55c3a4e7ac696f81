//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};

/// Root configuration for the dapp client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DappConfig {
    /// RPC endpoint and chain settings.
    pub network: NetworkConfig,

    /// Deployed contract addresses.
    pub contracts: ContractsConfig,

    /// Read polling intervals.
    pub polling: PollingConfig,

    /// Approve-then-act sequencing settings.
    pub sequencer: SequencerConfig,

    /// Swap defaults.
    pub swap: SwapConfig,

    /// NFT marketplace settings.
    pub nft: NftConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Chain connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID (167012 for Kasplex testnet, 31337 for local Anvil).
    pub chain_id: u64,

    /// Block explorer base URL used for transaction links.
    pub explorer_url: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations required before a receipt counts.
    pub confirmation_blocks: u32,

    /// Gas price multiplier (1.0 = node estimate, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Gas limit multiplier applied to `eth_estimateGas`.
    pub gas_limit_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://rpc.kasplextest.xyz/".to_string(),
            failover_urls: Vec::new(),
            chain_id: 167_012,
            explorer_url: "https://etherscan.io".to_string(),
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            gas_price_multiplier: 1.2,
            gas_limit_multiplier: 1.2,
            max_gas_price_gwei: 500,
        }
    }
}

/// A fungible token the DEX trades.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenConfig {
    /// Ticker symbol (e.g. "PLAT").
    pub symbol: String,

    /// Human readable name.
    pub name: String,

    /// ERC-20 contract address.
    pub address: Address,
}

/// Addresses of the deployed contracts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractsConfig {
    /// Three-pair DEX (swaps, liquidity, reserves).
    pub dex: Address,

    /// Time-gated faucet.
    pub faucet: Address,

    /// ERC-721 collection traded on the marketplace.
    pub nft: Address,

    /// NFT marketplace (escrow listings).
    pub marketplace: Address,

    /// Tokens A, B and C, in pair order.
    pub tokens: Vec<TokenConfig>,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            dex: address!("E0AdC4976bfbd0b59eBba32047F0B17756621EBd"),
            faucet: address!("607D41d416304C0440ED374377AC0AA839d254AA"),
            nft: address!("DA47f9cB54F34BbF1988bD6263634CF8F4816DB2"),
            marketplace: address!("cf1731f89A0E4e5Af0e2EB8b433E1De66e7E0FD0"),
            tokens: vec![
                TokenConfig {
                    symbol: "PLAT".to_string(),
                    name: "Platinum Token".to_string(),
                    address: address!("0e0Fd4B9D8B114Ee75CbC65ed80eE49F3EA45D95"),
                },
                TokenConfig {
                    symbol: "SIMP".to_string(),
                    name: "Simple Token".to_string(),
                    address: address!("26a25ACc7ad5b30f92e8B1f69Df7266b367a9b83"),
                },
                TokenConfig {
                    symbol: "LMN".to_string(),
                    name: "Lemon Token".to_string(),
                    address: address!("268c876dFf9f364d1f8Dc9e5dE0c0A8f56C286E6"),
                },
            ],
        }
    }
}

/// Polling intervals for the read layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Balances, allowances and swap previews, in milliseconds.
    pub balance_interval_ms: u64,

    /// Pool reserves and marketplace listings, in milliseconds.
    pub reserves_interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            balance_interval_ms: 5_000,
            reserves_interval_ms: 10_000,
        }
    }
}

/// How much to approve when an allowance is short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalPolicy {
    /// Approve 2^256 - 1 so later actions skip the approval step.
    #[default]
    Unlimited,
    /// Approve exactly the amount the action needs.
    Exact,
}

/// Approve-then-act sequencing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Approval amount policy.
    pub approval_policy: ApprovalPolicy,

    /// Upper bound on waiting for an approved allowance to become visible.
    pub allowance_poll_timeout_ms: u64,

    /// Base delay between allowance polls (exponential backoff).
    pub allowance_poll_base_ms: u64,

    /// Maximum delay between allowance polls.
    pub allowance_poll_max_ms: u64,

    /// Maximum time to wait for a receipt in seconds.
    pub receipt_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub receipt_poll_interval_ms: u64,

    /// Time spent in the success stage before returning to idle.
    pub success_reset_ms: u64,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            approval_policy: ApprovalPolicy::Unlimited,
            allowance_poll_timeout_ms: 15_000,
            allowance_poll_base_ms: 250,
            allowance_poll_max_ms: 2_000,
            receipt_timeout_secs: 120,
            receipt_poll_interval_ms: 2_000,
            success_reset_ms: 5_000,
        }
    }
}

/// Swap defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SwapConfig {
    /// Default slippage tolerance in basis points (50 = 0.5%).
    pub slippage_bps: u32,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self { slippage_bps: 50 }
    }
}

/// NFT marketplace settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NftConfig {
    /// Token ids 1..=scan_range are checked for active listings.
    pub scan_range: u64,
}

impl Default for NftConfig {
    fn default() -> Self {
        Self { scan_range: 10 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (overridden by `RUST_LOG`).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "kasplex_dapp=info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
