//! Pool statistics for the three DEX pairs.

use alloy::primitives::U256;
use serde::Serialize;

use crate::display::{format_ratio, usd_wei};
use crate::flows::liquidity::pair_tokens;
use crate::flows::portfolio::percent_of_total;
use crate::flows::FlowContext;
use crate::market::{Pair, TokenRegistry};
use crate::reads::ReadKey;

#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    pub pair: Pair,
    pub symbol0: String,
    pub symbol1: String,
    pub reserve0: U256,
    pub reserve1: U256,
    /// `reserve1 / reserve0`, 6 decimals; `None` for an empty pool.
    pub price_ratio: Option<String>,
    pub share0_pct: f64,
    pub share1_pct: f64,
    /// `(reserve0 + reserve1) * 1.5`.
    pub tvl_usd: U256,
}

pub fn pool_stats(registry: &TokenRegistry, pair: Pair, reserve0: U256, reserve1: U256) -> PoolStats {
    let (token0, token1) = pair_tokens(registry, pair);
    let total = reserve0.saturating_add(reserve1);
    PoolStats {
        pair,
        symbol0: token0.symbol.clone(),
        symbol1: token1.symbol.clone(),
        reserve0,
        reserve1,
        price_ratio: format_ratio(reserve1, reserve0, 6),
        share0_pct: percent_of_total(reserve0, total),
        share1_pct: percent_of_total(reserve1, total),
        tvl_usd: usd_wei(total),
    }
}

/// Stats for every pool whose reserves could be read.
pub async fn fetch_pools(ctx: &FlowContext) -> Vec<PoolStats> {
    let keys: Vec<ReadKey> = Pair::ALL.into_iter().map(ReadKey::Reserves).collect();
    let values = ctx.reads.fetch_many(&keys).await;

    Pair::ALL
        .into_iter()
        .zip(values)
        .filter_map(|(pair, value)| {
            let (r0, r1) = value.and_then(|v| v.as_reserves())?;
            Some(pool_stats(&ctx.registry, pair, r0, r1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContractsConfig;

    #[test]
    fn test_pool_stats() {
        let registry = TokenRegistry::from_config(&ContractsConfig::default().tokens).unwrap();
        let unit = U256::from(10u64).pow(U256::from(18));
        let stats = pool_stats(&registry, Pair::AB, unit * U256::from(100), unit * U256::from(300));

        assert_eq!(stats.symbol0, "PLAT");
        assert_eq!(stats.price_ratio.as_deref(), Some("3.000000"));
        assert_eq!(stats.share0_pct, 25.0);
        assert_eq!(stats.share1_pct, 75.0);
        assert_eq!(stats.tvl_usd, unit * U256::from(600));
    }

    #[test]
    fn test_empty_pool() {
        let registry = TokenRegistry::from_config(&ContractsConfig::default().tokens).unwrap();
        let stats = pool_stats(&registry, Pair::AC, U256::ZERO, U256::ZERO);
        assert_eq!(stats.price_ratio, None);
        assert_eq!(stats.share0_pct, 0.0);
        assert_eq!(stats.tvl_usd, U256::ZERO);
    }
}
