//! Read keys and values.
//!
//! A `ReadKey` names exactly one on-chain entity. Writes declare the keys
//! they affect so the cache can be invalidated per entity instead of
//! re-fetching everything.

use alloy::primitives::{Address, U256};
use serde::Serialize;

use crate::market::{Pair, TokenSlot};

/// One view call against one on-chain entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ReadKey {
    /// Native coin balance.
    NativeBalance(Address),
    /// `token.balanceOf(owner)`.
    TokenBalance { token: Address, owner: Address },
    /// `token.allowance(owner, spender)`.
    Allowance {
        token: Address,
        owner: Address,
        spender: Address,
    },
    /// `dex.getReservesXY()`.
    Reserves(Pair),
    /// `dex.previewSwap(pair, tokenIn, amountIn)`.
    SwapPreview {
        pair: Pair,
        token_in: Address,
        amount_in: U256,
    },
    /// `marketplace.getListing(tokenId)`.
    Listing(u64),
    /// `marketplace.calculatePriceInToken(tokenId, token)`.
    PriceInToken { token_id: u64, token: Address },
    /// `nft.ownerOf(tokenId)`.
    NftOwner(u64),
    /// `nft.balanceOf(owner)`.
    NftBalance(Address),
    /// `faucet.lastClaimTime(user)`.
    LastClaim(Address),
    /// `faucet.CLAIM_INTERVAL()`.
    ClaimInterval,
    /// `faucet.CLAIM_AMOUNT()`.
    ClaimAmount,
    /// `faucet.tokenA()` / `tokenB()` / `tokenC()`.
    FaucetToken(TokenSlot),
}

impl ReadKey {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ReadKey::NativeBalance(_) => "native_balance",
            ReadKey::TokenBalance { .. } => "token_balance",
            ReadKey::Allowance { .. } => "allowance",
            ReadKey::Reserves(_) => "reserves",
            ReadKey::SwapPreview { .. } => "swap_preview",
            ReadKey::Listing(_) => "listing",
            ReadKey::PriceInToken { .. } => "price_in_token",
            ReadKey::NftOwner(_) => "nft_owner",
            ReadKey::NftBalance(_) => "nft_balance",
            ReadKey::LastClaim(_) => "last_claim",
            ReadKey::ClaimInterval => "claim_interval",
            ReadKey::ClaimAmount => "claim_amount",
            ReadKey::FaucetToken(_) => "faucet_token",
        }
    }

    /// The wallet this read is scoped to, if any.
    pub fn owner(&self) -> Option<Address> {
        match self {
            ReadKey::NativeBalance(owner)
            | ReadKey::TokenBalance { owner, .. }
            | ReadKey::Allowance { owner, .. }
            | ReadKey::NftBalance(owner)
            | ReadKey::LastClaim(owner) => Some(*owner),
            _ => None,
        }
    }
}

/// Decoded `getListing` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub seller: Address,
    /// Price denominated in token A.
    pub price: U256,
    pub active: bool,
}

/// Decoded view-call result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReadValue {
    Amount(U256),
    Reserves { reserve0: U256, reserve1: U256 },
    Listing(Listing),
    Address(Address),
}

impl ReadValue {
    pub fn as_amount(&self) -> Option<U256> {
        match self {
            ReadValue::Amount(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_reserves(&self) -> Option<(U256, U256)> {
        match self {
            ReadValue::Reserves { reserve0, reserve1 } => Some((*reserve0, *reserve1)),
            _ => None,
        }
    }

    pub fn as_listing(&self) -> Option<&Listing> {
        match self {
            ReadValue::Listing(listing) => Some(listing),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            ReadValue::Address(a) => Some(*a),
            _ => None,
        }
    }
}
