//! Token swap: quote and request building.

use alloy::primitives::U256;
use serde::Serialize;

use crate::config::validation::MAX_SLIPPAGE_BPS;
use crate::contracts::ContractCall;
use crate::display::{format_ratio, units_to_f64};
use crate::flows::{require_positive, FlowContext, FlowError};
use crate::market::{Pair, TokenSlot};
use crate::reads::ReadKey;
use crate::sequencer::{ApprovalRequirement, SequenceRequest};

const BPS: u64 = 10_000;

/// A priced swap, recomputed on demand.
#[derive(Debug, Clone, Serialize)]
pub struct SwapQuote {
    pub token_in: TokenSlot,
    pub token_out: TokenSlot,
    pub pair: Pair,
    pub amount_in: U256,
    /// `previewSwap` result.
    pub amount_out: U256,
    pub slippage_bps: u32,
    pub min_amount_out: U256,
    pub price_impact_pct: f64,
    /// Output per unit of input, 6 decimals.
    pub exchange_rate: Option<String>,
}

impl SwapQuote {
    /// Re-price the minimum output for another slippage tolerance, capped at
    /// `MAX_SLIPPAGE_BPS`.
    pub fn with_slippage(mut self, slippage_bps: u32) -> Self {
        self.slippage_bps = slippage_bps.min(MAX_SLIPPAGE_BPS);
        self.min_amount_out = min_amount_out(self.amount_out, self.slippage_bps);
        self
    }
}

/// `preview * (1 - slippage)`, rounded down.
pub fn min_amount_out(preview: U256, slippage_bps: u32) -> U256 {
    let keep = BPS.saturating_sub(slippage_bps as u64);
    preview.saturating_mul(U256::from(keep)) / U256::from(BPS)
}

/// `|out / in - 1| * 100`, zero for a zero input.
pub fn price_impact_pct(amount_in: U256, amount_out: U256) -> f64 {
    let amount_in = units_to_f64(amount_in);
    if amount_in == 0.0 {
        return 0.0;
    }
    (units_to_f64(amount_out) / amount_in - 1.0).abs() * 100.0
}

pub fn exchange_rate(amount_in: U256, amount_out: U256) -> Option<String> {
    format_ratio(amount_out, amount_in, 6)
}

/// Price `amount_in` of `token_in` against `token_out`.
pub async fn quote(
    ctx: &FlowContext,
    token_in: TokenSlot,
    token_out: TokenSlot,
    amount_in: U256,
) -> Result<SwapQuote, FlowError> {
    let pair = Pair::resolve(token_in, token_out)?;
    require_positive(amount_in, "swap amount")?;

    let key = ReadKey::SwapPreview {
        pair,
        token_in: ctx.registry.get(token_in).address,
        amount_in,
    };
    let amount_out = ctx.amount(&key, "swap preview").await?;
    let slippage_bps = ctx.config.swap.slippage_bps;

    Ok(SwapQuote {
        token_in,
        token_out,
        pair,
        amount_in,
        amount_out,
        slippage_bps,
        min_amount_out: min_amount_out(amount_out, slippage_bps),
        price_impact_pct: price_impact_pct(amount_in, amount_out),
        exchange_rate: exchange_rate(amount_in, amount_out),
    })
}

/// Build the approve-then-swap request for a quote.
pub async fn prepare_swap(ctx: &FlowContext, quote: &SwapQuote) -> Result<SequenceRequest, FlowError> {
    let owner = ctx.owner()?;
    require_positive(quote.amount_in, "swap amount")?;

    let dex = ctx.config.contracts.dex;
    let token_in = ctx.registry.get(quote.token_in);
    let token_out = ctx.registry.get(quote.token_out);
    ctx.require_balance(token_in, owner, quote.amount_in).await?;

    let mut invalidates = vec![
        ReadKey::TokenBalance {
            token: token_in.address,
            owner,
        },
        ReadKey::TokenBalance {
            token: token_out.address,
            owner,
        },
        ReadKey::Allowance {
            token: token_in.address,
            owner,
            spender: dex,
        },
        ReadKey::SwapPreview {
            pair: quote.pair,
            token_in: token_in.address,
            amount_in: quote.amount_in,
        },
    ];
    invalidates.extend(Pair::ALL.into_iter().map(ReadKey::Reserves));

    Ok(SequenceRequest {
        flow: "swap",
        approvals: vec![ApprovalRequirement {
            token: token_in.address,
            spender: dex,
            amount: quote.amount_in,
        }],
        action: ContractCall::swap_exact_input(
            dex,
            quote.pair,
            token_in.address,
            quote.amount_in,
            quote.min_amount_out,
            owner,
        ),
        invalidates,
    })
}
