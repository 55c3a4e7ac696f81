//! Faucet claim with cooldown.

use alloy::primitives::{Address, U256};
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::contracts::ContractCall;
use crate::display::Countdown;
use crate::flows::{FlowContext, FlowError};
use crate::market::TokenSlot;
use crate::reads::ReadKey;
use crate::sequencer::SequenceRequest;

/// Faucet state as seen by one user.
#[derive(Debug, Clone, Serialize)]
pub struct FaucetStatus {
    pub user: Address,
    pub last_claim: u64,
    pub claim_interval: u64,
    pub claim_amount: Option<U256>,
    pub cooldown: Countdown,
    pub can_claim: bool,
    /// Faucet-held balance per token symbol; `None` if unread.
    pub reserves: Vec<(String, Option<U256>)>,
}

/// A configured token the faucet does not hand out under the same slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenMismatch {
    pub slot: TokenSlot,
    pub configured: Address,
    pub on_chain: Address,
}

/// Seconds until the next claim: `max(0, last + interval - now)`.
pub fn cooldown_remaining(last_claim: u64, interval: u64, now: u64) -> u64 {
    last_claim.saturating_add(interval).saturating_sub(now)
}

pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn to_secs(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

async fn claim_timing(ctx: &FlowContext, user: Address) -> Result<(u64, u64), FlowError> {
    let last = ctx.amount(&ReadKey::LastClaim(user), "last claim time").await?;
    let interval = ctx.amount(&ReadKey::ClaimInterval, "claim interval").await?;
    Ok((to_secs(last), to_secs(interval)))
}

pub async fn fetch_status(ctx: &FlowContext, now: u64) -> Result<FaucetStatus, FlowError> {
    let user = ctx.owner()?;
    let (last_claim, claim_interval) = claim_timing(ctx, user).await?;
    let claim_amount = ctx.reads.fetch_amount(&ReadKey::ClaimAmount).await;

    let faucet = ctx.config.contracts.faucet;
    let keys: Vec<ReadKey> = ctx
        .registry
        .all()
        .iter()
        .map(|t| ReadKey::TokenBalance {
            token: t.address,
            owner: faucet,
        })
        .collect();
    let balances = ctx.reads.fetch_many(&keys).await;
    let reserves = ctx
        .registry
        .all()
        .iter()
        .zip(balances)
        .map(|(t, v)| (t.symbol.clone(), v.and_then(|v| v.as_amount())))
        .collect();

    let remaining = cooldown_remaining(last_claim, claim_interval, now);
    Ok(FaucetStatus {
        user,
        last_claim,
        claim_interval,
        claim_amount,
        cooldown: Countdown::from_secs(remaining),
        can_claim: remaining == 0,
        reserves,
    })
}

/// Compare the token registry with the faucet's `tokenA/B/C()`.
///
/// Slots the faucet could not be asked about are skipped.
pub async fn registry_mismatches(ctx: &FlowContext) -> Vec<TokenMismatch> {
    let keys: Vec<ReadKey> = TokenSlot::ALL.into_iter().map(ReadKey::FaucetToken).collect();
    let answers = ctx.reads.fetch_many(&keys).await;

    TokenSlot::ALL
        .into_iter()
        .zip(answers)
        .filter_map(|(slot, answer)| {
            let on_chain = answer?.as_address()?;
            let configured = ctx.registry.get(slot).address;
            (configured != on_chain).then_some(TokenMismatch {
                slot,
                configured,
                on_chain,
            })
        })
        .collect()
}

/// Build the claim request; refuses while the cooldown is running.
pub async fn prepare_claim(ctx: &FlowContext, now: u64) -> Result<SequenceRequest, FlowError> {
    let user = ctx.owner()?;
    let (last_claim, interval) = claim_timing(ctx, user).await?;
    let remaining = cooldown_remaining(last_claim, interval, now);
    if remaining > 0 {
        return Err(FlowError::CooldownActive(Countdown::from_secs(remaining)));
    }

    let faucet = ctx.config.contracts.faucet;
    let mut invalidates = vec![ReadKey::LastClaim(user)];
    for token in ctx.registry.all() {
        invalidates.push(ReadKey::TokenBalance {
            token: token.address,
            owner: user,
        });
        invalidates.push(ReadKey::TokenBalance {
            token: token.address,
            owner: faucet,
        });
    }

    Ok(SequenceRequest {
        flow: "claim",
        approvals: Vec::new(),
        action: ContractCall::claim(faucet),
        invalidates,
    })
}
