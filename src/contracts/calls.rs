//! State-changing call descriptors.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;

use crate::contracts::abi::{IERC20, IFaucet, IMarketplace, ITripleSwap};
use crate::market::{Pair, TokenSlot};

/// A write the client wants mined: target contract plus ABI-encoded input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    /// Contract the transaction is sent to.
    pub target: Address,
    /// Function name, for logs and metrics.
    pub function: &'static str,
    /// ABI-encoded call data (selector + arguments).
    pub data: Bytes,
}

impl ContractCall {
    fn encode<C: SolCall>(target: Address, function: &'static str, call: C) -> Self {
        Self {
            target,
            function,
            data: call.abi_encode().into(),
        }
    }

    /// `token.approve(spender, amount)`.
    pub fn approve(token: Address, spender: Address, amount: U256) -> Self {
        Self::encode(token, "approve", IERC20::approveCall { spender, amount })
    }

    /// `dex.swapExactInput(pair, tokenIn, amountIn, minAmountOut, recipient)`.
    pub fn swap_exact_input(
        dex: Address,
        pair: Pair,
        token_in: Address,
        amount_in: U256,
        min_amount_out: U256,
        recipient: Address,
    ) -> Self {
        Self::encode(
            dex,
            "swapExactInput",
            ITripleSwap::swapExactInputCall {
                pair: pair.id(),
                tokenIn: token_in,
                amountIn: amount_in,
                minAmountOut: min_amount_out,
                recipient,
            },
        )
    }

    /// `dex.addLiquidity(pair, amount1, amount2)`.
    pub fn add_liquidity(dex: Address, pair: Pair, amount1: U256, amount2: U256) -> Self {
        Self::encode(
            dex,
            "addLiquidity",
            ITripleSwap::addLiquidityCall {
                pair: pair.id(),
                amount1,
                amount2,
            },
        )
    }

    /// `marketplace.buyWithTokenX(tokenId)` for the chosen payment token.
    pub fn buy_nft(marketplace: Address, pay_with: TokenSlot, token_id: u64) -> Self {
        let token_id = U256::from(token_id);
        match pay_with {
            TokenSlot::A => Self::encode(
                marketplace,
                "buyWithTokenA",
                IMarketplace::buyWithTokenACall { tokenId: token_id },
            ),
            TokenSlot::B => Self::encode(
                marketplace,
                "buyWithTokenB",
                IMarketplace::buyWithTokenBCall { tokenId: token_id },
            ),
            TokenSlot::C => Self::encode(
                marketplace,
                "buyWithTokenC",
                IMarketplace::buyWithTokenCCall { tokenId: token_id },
            ),
        }
    }

    /// `marketplace.listNFT(tokenId, priceInTokenA)`.
    pub fn list_nft(marketplace: Address, token_id: u64, price_in_token_a: U256) -> Self {
        Self::encode(
            marketplace,
            "listNFT",
            IMarketplace::listNFTCall {
                tokenId: U256::from(token_id),
                priceInTokenA: price_in_token_a,
            },
        )
    }

    /// `faucet.claim()`.
    pub fn claim(faucet: Address) -> Self {
        Self::encode(faucet, "claim", IFaucet::claimCall {})
    }
}
