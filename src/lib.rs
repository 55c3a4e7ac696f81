//! Headless client for the Kasplex testnet dApp contracts.
//!
//! Reads on-chain state, derives display values and drives the
//! approve-then-act transaction sequence for swaps, liquidity, NFT trades
//! and faucet claims.

// Chain access
pub mod blockchain;
pub mod contracts;
pub mod reads;
pub mod session;

// Client logic
pub mod display;
pub mod flows;
pub mod market;
pub mod sequencer;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::DappConfig;
pub use lifecycle::{App, Shutdown};
pub use sequencer::{SequenceOutcome, SequenceRequest, SequenceStage, Sequencer};
