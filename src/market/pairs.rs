//! Trading pairs of the three-pair DEX.
//!
//! The DEX addresses pools by a `uint8` id: 1 = A/B, 2 = A/C, 3 = B/C.
//! Direction does not change the pool; `tokenIn` tells the contract which
//! side is being sold.

use serde::Serialize;
use thiserror::Error;

use crate::market::tokens::TokenSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Pair {
    AB,
    AC,
    BC,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairError {
    #[error("cannot trade a token against itself")]
    SameToken,

    #[error("unknown pair id {0}")]
    UnknownId(u8),
}

impl Pair {
    pub const ALL: [Pair; 3] = [Pair::AB, Pair::AC, Pair::BC];

    /// The pool id the DEX contract expects.
    pub fn id(self) -> u8 {
        match self {
            Pair::AB => 1,
            Pair::AC => 2,
            Pair::BC => 3,
        }
    }

    pub fn from_id(id: u8) -> Result<Self, PairError> {
        match id {
            1 => Ok(Pair::AB),
            2 => Ok(Pair::AC),
            3 => Ok(Pair::BC),
            other => Err(PairError::UnknownId(other)),
        }
    }

    /// Pool for a token pair, in either direction.
    pub fn resolve(token_in: TokenSlot, token_out: TokenSlot) -> Result<Self, PairError> {
        use TokenSlot::{A, B, C};
        match (token_in, token_out) {
            (A, B) | (B, A) => Ok(Pair::AB),
            (A, C) | (C, A) => Ok(Pair::AC),
            (B, C) | (C, B) => Ok(Pair::BC),
            _ => Err(PairError::SameToken),
        }
    }

    /// Tokens in the order the pool stores its reserves.
    pub fn slots(self) -> (TokenSlot, TokenSlot) {
        match self {
            Pair::AB => (TokenSlot::A, TokenSlot::B),
            Pair::AC => (TokenSlot::A, TokenSlot::C),
            Pair::BC => (TokenSlot::B, TokenSlot::C),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Pair::AB => "AB",
            Pair::AC => "AC",
            Pair::BC => "BC",
        }
    }
}
