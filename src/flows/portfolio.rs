//! Portfolio summary: token balances, shares and NFT count.

use alloy::primitives::{Address, U256};
use serde::Serialize;

use crate::display::usd_wei;
use crate::flows::{FlowContext, FlowError};
use crate::market::{Token, TokenRegistry};
use crate::reads::ReadKey;

#[derive(Debug, Clone, Serialize)]
pub struct Holding {
    pub token: Token,
    pub balance: U256,
    pub usd_value: U256,
    /// Share of the total token holdings, two decimals.
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Portfolio {
    pub owner: Address,
    pub holdings: Vec<Holding>,
    pub total: U256,
    pub total_usd: U256,
    pub nft_count: u64,
}

/// `amount / total` in percent with two decimals, computed in integer math.
/// Zero when the total is zero.
pub fn percent_of_total(amount: U256, total: U256) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    let basis_points = amount.saturating_mul(U256::from(10_000)) / total;
    u64::try_from(basis_points).unwrap_or(u64::MAX) as f64 / 100.0
}

/// Assemble a portfolio from balances in registry order. Unread balances count as zero.
pub fn build_portfolio(
    owner: Address,
    registry: &TokenRegistry,
    balances: &[Option<U256>],
    nft_count: u64,
) -> Portfolio {
    let amounts: Vec<U256> = registry
        .all()
        .iter()
        .enumerate()
        .map(|(i, _)| balances.get(i).copied().flatten().unwrap_or_default())
        .collect();
    let total = amounts
        .iter()
        .fold(U256::ZERO, |acc, a| acc.saturating_add(*a));

    let holdings = registry
        .all()
        .iter()
        .zip(&amounts)
        .map(|(token, balance)| Holding {
            token: token.clone(),
            balance: *balance,
            usd_value: usd_wei(*balance),
            percent: percent_of_total(*balance, total),
        })
        .collect();

    Portfolio {
        owner,
        holdings,
        total,
        total_usd: usd_wei(total),
        nft_count,
    }
}

pub async fn fetch_portfolio(ctx: &FlowContext) -> Result<Portfolio, FlowError> {
    let owner = ctx.owner()?;
    let mut keys: Vec<ReadKey> = ctx
        .registry
        .all()
        .iter()
        .map(|t| ReadKey::TokenBalance {
            token: t.address,
            owner,
        })
        .collect();
    keys.push(ReadKey::NftBalance(owner));

    let mut values: Vec<Option<U256>> = ctx
        .reads
        .fetch_many(&keys)
        .await
        .into_iter()
        .map(|v| v.and_then(|v| v.as_amount()))
        .collect();
    let nft_count = values
        .pop()
        .flatten()
        .map(|n| u64::try_from(n).unwrap_or(u64::MAX))
        .unwrap_or(0);

    Ok(build_portfolio(owner, &ctx.registry, &values, nft_count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContractsConfig;

    fn registry() -> TokenRegistry {
        TokenRegistry::from_config(&ContractsConfig::default().tokens).unwrap()
    }

    #[test]
    fn test_percent_of_total() {
        assert_eq!(percent_of_total(U256::from(1), U256::from(3)), 33.33);
        assert_eq!(percent_of_total(U256::from(5), U256::ZERO), 0.0);
        assert_eq!(percent_of_total(U256::from(7), U256::from(7)), 100.0);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let balances = [
            Some(U256::from(1_000)),
            Some(U256::from(2_000)),
            Some(U256::from(3_001)),
        ];
        let portfolio = build_portfolio(Address::ZERO, &registry(), &balances, 2);
        let sum: f64 = portfolio.holdings.iter().map(|h| h.percent).sum();
        assert!((sum - 100.0).abs() < 0.05);
        assert_eq!(portfolio.total, U256::from(6_001));
        assert_eq!(portfolio.nft_count, 2);
    }

    #[test]
    fn test_empty_portfolio() {
        let portfolio = build_portfolio(Address::ZERO, &registry(), &[None, None, None], 0);
        assert_eq!(portfolio.total, U256::ZERO);
        assert!(portfolio.holdings.iter().all(|h| h.percent == 0.0));
        assert_eq!(portfolio.total_usd, U256::ZERO);
    }
}
