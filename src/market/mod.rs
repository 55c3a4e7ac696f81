//! Static market layout: the three tokens and the pools between them.

pub mod pairs;
pub mod tokens;

pub use pairs::{Pair, PairError};
pub use tokens::{Token, TokenError, TokenRegistry, TokenSlot};
