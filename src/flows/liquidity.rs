//! Add liquidity to one of the three pools.

use alloy::primitives::U256;

use crate::contracts::ContractCall;
use crate::flows::{require_positive, FlowContext, FlowError};
use crate::market::{Pair, Token, TokenRegistry};
use crate::reads::ReadKey;
use crate::sequencer::{ApprovalRequirement, SequenceRequest};

/// The pool's two tokens, in reserve order.
pub fn pair_tokens(registry: &TokenRegistry, pair: Pair) -> (&Token, &Token) {
    let (first, second) = pair.slots();
    (registry.get(first), registry.get(second))
}

/// Build the approve-approve-add request.
pub async fn prepare_add_liquidity(
    ctx: &FlowContext,
    pair: Pair,
    amount1: U256,
    amount2: U256,
) -> Result<SequenceRequest, FlowError> {
    let owner = ctx.owner()?;
    require_positive(amount1, "first amount")?;
    require_positive(amount2, "second amount")?;

    let dex = ctx.config.contracts.dex;
    let (token1, token2) = pair_tokens(&ctx.registry, pair);
    ctx.require_balance(token1, owner, amount1).await?;
    ctx.require_balance(token2, owner, amount2).await?;

    let approvals = vec![
        ApprovalRequirement {
            token: token1.address,
            spender: dex,
            amount: amount1,
        },
        ApprovalRequirement {
            token: token2.address,
            spender: dex,
            amount: amount2,
        },
    ];

    let mut invalidates = Vec::with_capacity(5);
    for token in [token1, token2] {
        invalidates.push(ReadKey::TokenBalance {
            token: token.address,
            owner,
        });
        invalidates.push(ReadKey::Allowance {
            token: token.address,
            owner,
            spender: dex,
        });
    }
    invalidates.push(ReadKey::Reserves(pair));

    Ok(SequenceRequest {
        flow: "add_liquidity",
        approvals,
        action: ContractCall::add_liquidity(dex, pair, amount1, amount2),
        invalidates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContractsConfig;

    #[test]
    fn test_pair_tokens_follow_reserve_order() {
        let registry = TokenRegistry::from_config(&ContractsConfig::default().tokens).unwrap();
        let (first, second) = pair_tokens(&registry, Pair::BC);
        assert_eq!(first.symbol, "SIMP");
        assert_eq!(second.symbol, "LMN");
    }
}
