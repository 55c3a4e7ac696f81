//! Sequencer types and errors.

use alloy::primitives::{Address, TxHash, U256};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::blockchain::BlockchainError;
use crate::contracts::ContractCall;
use crate::reads::ReadKey;

/// Stage of an approve-then-act sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceStage {
    #[default]
    Idle,
    /// Approval submitted, waiting for its receipt.
    Approving,
    /// Approval confirmed, waiting for the allowance to show up.
    Approved,
    /// Action submitted, waiting for its receipt.
    Acting,
    /// Action confirmed; returns to idle after the reset delay.
    Success,
}

impl SequenceStage {
    /// Whether the action control should be disabled.
    pub fn is_processing(self) -> bool {
        !matches!(self, SequenceStage::Idle | SequenceStage::Success)
    }
}

impl std::fmt::Display for SequenceStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SequenceStage::Idle => "idle",
            SequenceStage::Approving => "approving",
            SequenceStage::Approved => "approved",
            SequenceStage::Acting => "acting",
            SequenceStage::Success => "success",
        };
        f.write_str(label)
    }
}

/// `token` must allow `spender` to pull at least `amount` from the owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRequirement {
    pub token: Address,
    pub spender: Address,
    pub amount: U256,
}

/// One logical user action.
#[derive(Debug, Clone)]
pub struct SequenceRequest {
    /// Flow label ("swap", "add_liquidity", ...), used in logs and metrics.
    pub flow: &'static str,
    /// Allowances that must be in place before the action.
    pub approvals: Vec<ApprovalRequirement>,
    /// The dependent call.
    pub action: ContractCall,
    /// Reads the action changes; re-issued after success.
    pub invalidates: Vec<ReadKey>,
}

/// Result of a completed sequence.
#[derive(Debug, Clone, Serialize)]
pub struct SequenceOutcome {
    pub id: Uuid,
    pub flow: &'static str,
    /// Approval transactions, in submission order.
    pub approval_txs: Vec<TxHash>,
    pub action_tx: TxHash,
    pub block_number: u64,
    /// Dependent reads that came back after the refresh.
    pub refreshed_reads: usize,
}

/// Why a sequence went back to idle without finishing.
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("wallet not connected")]
    NotConnected,

    #[error("another transaction sequence is in progress")]
    Busy,

    #[error("{function} submission failed: {source}")]
    Submission {
        function: &'static str,
        #[source]
        source: BlockchainError,
    },

    #[error("{function} receipt failed: {source}")]
    Receipt {
        function: &'static str,
        #[source]
        source: BlockchainError,
    },

    #[error("{function} reverted: {reason}")]
    Reverted {
        function: &'static str,
        reason: String,
    },
}

impl SequenceError {
    /// Label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SequenceError::NotConnected => "not_connected",
            SequenceError::Busy => "busy",
            SequenceError::Submission { .. } => "submission",
            SequenceError::Receipt { .. } => "receipt",
            SequenceError::Reverted { .. } => "reverted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_stages() {
        assert!(!SequenceStage::Idle.is_processing());
        assert!(SequenceStage::Approving.is_processing());
        assert!(SequenceStage::Approved.is_processing());
        assert!(SequenceStage::Acting.is_processing());
        assert!(!SequenceStage::Success.is_processing());
    }

    #[test]
    fn test_error_messages_carry_function() {
        let err = SequenceError::Submission {
            function: "approve",
            source: BlockchainError::Rpc("user rejected".into()),
        };
        assert_eq!(err.to_string(), "approve submission failed: RPC error: user rejected");
        assert_eq!(err.kind(), "submission");
    }
}
