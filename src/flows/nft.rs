//! NFT marketplace: listing scan, purchase and listing.

use alloy::primitives::{Address, U256};
use futures_util::future::join_all;
use serde::Serialize;

use crate::contracts::ContractCall;
use crate::flows::{require_positive, FlowContext, FlowError};
use crate::market::TokenSlot;
use crate::reads::ReadKey;
use crate::sequencer::{ApprovalRequirement, SequenceRequest};

/// A marketplace listing joined with the token's current owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingView {
    pub token_id: u64,
    pub seller: Address,
    /// Asking price in token A.
    pub price: U256,
    pub active: bool,
    pub owner: Option<Address>,
}

impl ListingView {
    pub fn is_owned_by(&self, address: Address) -> bool {
        self.owner == Some(address)
    }
}

/// Read listing and owner for one token id.
pub async fn fetch_listing(ctx: &FlowContext, token_id: u64) -> Result<ListingView, FlowError> {
    let keys = [ReadKey::Listing(token_id), ReadKey::NftOwner(token_id)];
    let mut values = ctx.reads.fetch_many(&keys).await.into_iter();

    let listing = values
        .next()
        .flatten()
        .and_then(|v| v.as_listing().cloned())
        .ok_or(FlowError::NoData("listing"))?;
    let owner = values.next().flatten().and_then(|v| v.as_address());

    Ok(ListingView {
        token_id,
        seller: listing.seller,
        price: listing.price,
        active: listing.active,
        owner,
    })
}

/// Active listings among token ids `1..=scan_range`, in id order.
pub async fn scan_listings(ctx: &FlowContext) -> Vec<ListingView> {
    let range = 1..=ctx.config.nft.scan_range;
    let results = join_all(range.map(|id| fetch_listing(ctx, id))).await;
    results
        .into_iter()
        .filter_map(Result::ok)
        .filter(|listing| listing.active)
        .collect()
}

/// Price of `token_id` quoted in the payment token.
pub async fn price_in(ctx: &FlowContext, token_id: u64, pay_with: TokenSlot) -> Result<U256, FlowError> {
    let key = ReadKey::PriceInToken {
        token_id,
        token: ctx.registry.get(pay_with).address,
    };
    ctx.amount(&key, "price in token").await
}

/// Build the approve-then-buy request.
pub async fn prepare_buy(
    ctx: &FlowContext,
    token_id: u64,
    pay_with: TokenSlot,
) -> Result<SequenceRequest, FlowError> {
    let buyer = ctx.owner()?;
    let listing = fetch_listing(ctx, token_id).await?;
    if !listing.active {
        return Err(FlowError::ListingInactive(token_id));
    }
    if listing.is_owned_by(buyer) {
        return Err(FlowError::AlreadyOwner(token_id));
    }

    let price = price_in(ctx, token_id, pay_with).await?;
    let token = ctx.registry.get(pay_with);
    ctx.require_balance(token, buyer, price).await?;

    let marketplace = ctx.config.contracts.marketplace;
    Ok(SequenceRequest {
        flow: "buy_nft",
        approvals: vec![ApprovalRequirement {
            token: token.address,
            spender: marketplace,
            amount: price,
        }],
        action: ContractCall::buy_nft(marketplace, pay_with, token_id),
        invalidates: vec![
            ReadKey::Listing(token_id),
            ReadKey::NftOwner(token_id),
            ReadKey::PriceInToken {
                token_id,
                token: token.address,
            },
            ReadKey::TokenBalance {
                token: token.address,
                owner: buyer,
            },
            ReadKey::Allowance {
                token: token.address,
                owner: buyer,
                spender: marketplace,
            },
            ReadKey::NftBalance(buyer),
        ],
    })
}

/// Build the list request. Listing needs no token approval.
pub fn prepare_list(
    ctx: &FlowContext,
    token_id: u64,
    price_in_token_a: U256,
) -> Result<SequenceRequest, FlowError> {
    ctx.owner()?;
    require_positive(price_in_token_a, "listing price")?;

    Ok(SequenceRequest {
        flow: "list_nft",
        approvals: Vec::new(),
        action: ContractCall::list_nft(ctx.config.contracts.marketplace, token_id, price_in_token_a),
        invalidates: vec![ReadKey::Listing(token_id)],
    })
}
