//! Per-page flows.
//!
//! # Responsibilities
//! - Turn user input into a `SequenceRequest` after client-side guards
//! - Derive display values (quotes, pool stats, portfolio, faucet cooldown)
//!
//! Guards are advisory. The contracts remain the source of truth and
//! will reject anything the client misses.

pub mod faucet;
pub mod liquidity;
pub mod nft;
pub mod pools;
pub mod portfolio;
pub mod swap;

use alloy::primitives::{Address, U256};
use std::sync::Arc;
use thiserror::Error;

use crate::config::DappConfig;
use crate::display::Countdown;
use crate::market::{PairError, Token, TokenRegistry};
use crate::reads::{ReadKey, ReadLayer};
use crate::session::{Session, SessionError};

/// Everything a flow needs: configuration, tokens, reads and the wallet session.
#[derive(Debug, Clone)]
pub struct FlowContext {
    pub config: Arc<DappConfig>,
    pub registry: TokenRegistry,
    pub reads: ReadLayer,
    pub session: Session,
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("wallet not connected")]
    NotConnected,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("cannot trade a token against itself")]
    SameToken,

    #[error("insufficient {symbol} balance: need {required}, have {available}")]
    InsufficientBalance {
        symbol: String,
        required: U256,
        available: U256,
    },

    #[error("you already own NFT #{0}")]
    AlreadyOwner(u64),

    #[error("NFT #{0} is not listed")]
    ListingInactive(u64),

    #[error("faucet cooldown active, next claim in {0}")]
    CooldownActive(Countdown),

    #[error("no data yet for {0}")]
    NoData(&'static str),
}

impl From<SessionError> for FlowError {
    fn from(_: SessionError) -> Self {
        FlowError::NotConnected
    }
}

impl From<PairError> for FlowError {
    fn from(e: PairError) -> Self {
        match e {
            PairError::SameToken => FlowError::SameToken,
            PairError::UnknownId(id) => FlowError::InvalidAmount(format!("unknown pair id {}", id)),
        }
    }
}

impl FlowContext {
    pub fn new(
        config: Arc<DappConfig>,
        registry: TokenRegistry,
        reads: ReadLayer,
        session: Session,
    ) -> Self {
        Self {
            config,
            registry,
            reads,
            session,
        }
    }

    pub(crate) fn owner(&self) -> Result<Address, FlowError> {
        Ok(self.session.require_address()?)
    }

    /// Fetch an amount read, mapping "no data yet" to `NoData(what)`.
    pub(crate) async fn amount(&self, key: &ReadKey, what: &'static str) -> Result<U256, FlowError> {
        self.reads
            .fetch_amount(key)
            .await
            .ok_or(FlowError::NoData(what))
    }

    /// Fail with `InsufficientBalance` unless `owner` holds `required` of `token`.
    pub(crate) async fn require_balance(
        &self,
        token: &Token,
        owner: Address,
        required: U256,
    ) -> Result<(), FlowError> {
        let key = ReadKey::TokenBalance {
            token: token.address,
            owner,
        };
        let available = self.amount(&key, "token balance").await?;
        if available < required {
            return Err(FlowError::InsufficientBalance {
                symbol: token.symbol.clone(),
                required,
                available,
            });
        }
        Ok(())
    }
}

pub(crate) fn require_positive(amount: U256, what: &str) -> Result<(), FlowError> {
    if amount.is_zero() {
        return Err(FlowError::InvalidAmount(format!("{} must be greater than zero", what)));
    }
    Ok(())
}
