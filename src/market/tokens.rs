//! Token registry for the three DEX tokens.

use alloy::primitives::Address;
use serde::Serialize;
use thiserror::Error;

use crate::config::TokenConfig;

/// Position of a token in the DEX layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenSlot {
    A,
    B,
    C,
}

impl TokenSlot {
    pub const ALL: [TokenSlot; 3] = [TokenSlot::A, TokenSlot::B, TokenSlot::C];

    fn index(self) -> usize {
        match self {
            TokenSlot::A => 0,
            TokenSlot::B => 1,
            TokenSlot::C => 2,
        }
    }
}

/// A token known to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub slot: TokenSlot,
    pub symbol: String,
    pub name: String,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("unknown token '{0}'")]
    Unknown(String),

    #[error("token registry needs exactly 3 tokens, got {0}")]
    WrongCount(usize),
}

/// Fixed set of tokens A, B and C.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: [Token; 3],
}

impl TokenRegistry {
    /// Build a registry from configuration (validated to hold 3 tokens).
    pub fn from_config(tokens: &[TokenConfig]) -> Result<Self, TokenError> {
        let [a, b, c] = tokens else {
            return Err(TokenError::WrongCount(tokens.len()));
        };
        let make = |slot, cfg: &TokenConfig| Token {
            slot,
            symbol: cfg.symbol.clone(),
            name: cfg.name.clone(),
            address: cfg.address,
        };
        Ok(Self {
            tokens: [
                make(TokenSlot::A, a),
                make(TokenSlot::B, b),
                make(TokenSlot::C, c),
            ],
        })
    }

    pub fn get(&self, slot: TokenSlot) -> &Token {
        &self.tokens[slot.index()]
    }

    pub fn all(&self) -> &[Token] {
        &self.tokens
    }

    pub fn by_address(&self, address: Address) -> Option<&Token> {
        self.tokens.iter().find(|t| t.address == address)
    }

    /// Look up a token by symbol (case-insensitive) or hex address.
    pub fn lookup(&self, query: &str) -> Result<&Token, TokenError> {
        if let Ok(address) = query.parse::<Address>() {
            if let Some(token) = self.by_address(address) {
                return Ok(token);
            }
        }
        self.tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(query))
            .ok_or_else(|| TokenError::Unknown(query.to_string()))
    }
}
