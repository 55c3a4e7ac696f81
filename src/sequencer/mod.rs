//! Approve-then-act sequencing.
//!
//! Each flow that spends ERC20 tokens owns one `Sequencer`. A run checks
//! the allowance, approves only when it falls short, waits for the
//! approval receipt, then submits the dependent action and re-issues the
//! reads it invalidates.

pub mod engine;
pub mod types;

pub use engine::Sequencer;
pub use types::{
    ApprovalRequirement, SequenceError, SequenceOutcome, SequenceRequest, SequenceStage,
};
