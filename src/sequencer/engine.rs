//! Approve-then-act transaction sequencer.
//!
//! # State Machine
//! ```text
//!            allowance short                 receipt ok
//!   Idle ───────────────────▶ Approving ───────────────▶ Approved
//!    │                                                      │ allowance visible
//!    │ allowance sufficient                                 ▼ (or poll timeout)
//!    └─────────────────────────────────────────────────▶ Acting
//!                                                           │ receipt ok
//!                                                           ▼
//!   Idle ◀──────────── reset delay ──────────────────── Success
//!
//!   any submission / receipt error ──▶ Idle (no retry)
//! ```

use alloy::primitives::{Address, TxHash, U256};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::ConfirmationStatus;
use crate::config::{ApprovalPolicy, SequencerConfig};
use crate::contracts::ContractCall;
use crate::observability::metrics;
use crate::reads::{ReadKey, ReadLayer};
use crate::resilience::backoff::calculate_backoff;
use crate::sequencer::types::{
    ApprovalRequirement, SequenceError, SequenceOutcome, SequenceRequest, SequenceStage,
};
use crate::session::Session;

/// Drives one flow's approve-then-act sequences.
///
/// Cloning yields a handle to the same state machine.
#[derive(Clone)]
pub struct Sequencer {
    reads: ReadLayer,
    session: Session,
    config: SequencerConfig,
    stage: Arc<watch::Sender<SequenceStage>>,
    in_flight: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
}

/// Holds the in-flight flag for one run.
///
/// `release` clears the flag once the run has settled its stage. Dropping an
/// unreleased guard means the run was cancelled mid-sequence, so the stage is
/// put back to idle before the flag clears.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    stage: &'a watch::Sender<SequenceStage>,
    released: bool,
}

impl InFlightGuard<'_> {
    fn release(&mut self) {
        if !self.released {
            self.flag.store(false, Ordering::SeqCst);
            self.released = true;
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            let previous = self.stage.send_replace(SequenceStage::Idle);
            tracing::warn!(stage = %previous, "Sequence cancelled, stage reset to idle");
            self.release();
        }
    }
}

impl Sequencer {
    pub fn new(reads: ReadLayer, session: Session, config: SequencerConfig) -> Self {
        let (stage, _) = watch::channel(SequenceStage::Idle);
        Self {
            reads,
            session,
            config,
            stage: Arc::new(stage),
            in_flight: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current stage.
    pub fn stage(&self) -> SequenceStage {
        *self.stage.borrow()
    }

    /// Observe stage transitions.
    pub fn subscribe(&self) -> watch::Receiver<SequenceStage> {
        self.stage.subscribe()
    }

    /// Whether a sequence has started and not yet reached success or failed.
    pub fn is_processing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn set_stage(&self, stage: SequenceStage) {
        let previous = self.stage.send_replace(stage);
        if previous != stage {
            tracing::info!(from = %previous, to = %stage, "Sequence stage changed");
        }
    }

    /// Run a request to completion.
    ///
    /// Returns after the action receipt is confirmed, dependent reads are
    /// re-issued and the reset delay has passed. On error the stage is
    /// already back to idle and nothing further has been submitted.
    pub async fn run(&self, request: SequenceRequest) -> Result<SequenceOutcome, SequenceError> {
        let owner = self
            .session
            .require_address()
            .map_err(|_| SequenceError::NotConnected)?;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!(flow = request.flow, "Rejected submission while a sequence is in progress");
            return Err(SequenceError::Busy);
        }
        let mut guard = InFlightGuard {
            flag: self.in_flight.as_ref(),
            stage: self.stage.as_ref(),
            released: false,
        };
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let id = Uuid::new_v4();
        let flow = request.flow;
        let span = tracing::info_span!("sequence", id = %id, flow = flow, owner = %owner);

        let result = self
            .drive(id, owner, request, &mut guard)
            .instrument(span.clone())
            .await;

        match result {
            Ok(outcome) => {
                metrics::record_sequence_outcome(flow, "success");
                let hold = Duration::from_millis(self.config.success_reset_ms);
                tokio::time::sleep(hold).await;
                // Checked under the stage lock: a newer run bumps the
                // generation before it writes any stage.
                let reset = self.stage.send_if_modified(|stage| {
                    let current = self.generation.load(Ordering::SeqCst) == generation;
                    if current && *stage != SequenceStage::Idle {
                        *stage = SequenceStage::Idle;
                        true
                    } else {
                        false
                    }
                });
                if reset {
                    span.in_scope(|| {
                        tracing::info!(
                            from = %SequenceStage::Success,
                            to = %SequenceStage::Idle,
                            "Sequence stage changed"
                        )
                    });
                }
                Ok(outcome)
            }
            Err(e) => {
                span.in_scope(|| {
                    self.set_stage(SequenceStage::Idle);
                    tracing::warn!(error = %e, "Sequence aborted");
                });
                guard.release();
                metrics::record_sequence_outcome(flow, e.kind());
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        id: Uuid,
        owner: Address,
        request: SequenceRequest,
        guard: &mut InFlightGuard<'_>,
    ) -> Result<SequenceOutcome, SequenceError> {
        let mut approval_txs = Vec::new();

        for requirement in &request.approvals {
            let allowance_key = ReadKey::Allowance {
                token: requirement.token,
                owner,
                spender: requirement.spender,
            };
            let current = self.current_allowance(&allowance_key).await;
            if current >= requirement.amount {
                tracing::debug!(
                    token = %requirement.token,
                    allowance = %current,
                    required = %requirement.amount,
                    "Allowance sufficient, skipping approval"
                );
                continue;
            }

            self.set_stage(SequenceStage::Approving);
            let call = ContractCall::approve(
                requirement.token,
                requirement.spender,
                self.approval_amount(requirement),
            );
            let tx_hash = self.submit_and_confirm(&call).await?.0;
            approval_txs.push(tx_hash);

            self.set_stage(SequenceStage::Approved);
            self.await_allowance(&allowance_key, requirement.amount).await;
        }

        self.set_stage(SequenceStage::Acting);
        let (action_tx, block_number) = self.submit_and_confirm(&request.action).await?;

        self.set_stage(SequenceStage::Success);
        guard.release();

        let refreshed_reads = self.reads.refresh(&request.invalidates).await;

        tracing::info!(
            action_tx = %action_tx,
            block_number = block_number,
            approvals = approval_txs.len(),
            refreshed_reads = refreshed_reads,
            "Sequence complete"
        );

        Ok(SequenceOutcome {
            id,
            flow: request.flow,
            approval_txs,
            action_tx,
            block_number,
            refreshed_reads,
        })
    }

    fn approval_amount(&self, requirement: &ApprovalRequirement) -> U256 {
        match self.config.approval_policy {
            ApprovalPolicy::Unlimited => U256::MAX,
            ApprovalPolicy::Exact => requirement.amount,
        }
    }

    /// Allowance from a fresh read; an unreadable allowance counts as zero.
    async fn current_allowance(&self, key: &ReadKey) -> U256 {
        self.reads.fetch_amount(key).await.unwrap_or(U256::ZERO)
    }

    /// Poll the allowance until it covers `required` or the poll budget runs out.
    ///
    /// The approval receipt is already confirmed, so running out of budget
    /// only means the node has not caught up; the action proceeds either way.
    async fn await_allowance(&self, key: &ReadKey, required: U256) {
        let deadline = Instant::now() + Duration::from_millis(self.config.allowance_poll_timeout_ms);
        let mut attempt = 0u32;

        loop {
            if self.current_allowance(key).await >= required {
                tracing::debug!(attempts = attempt + 1, "Approved allowance visible");
                return;
            }
            attempt += 1;
            let delay = calculate_backoff(
                attempt,
                self.config.allowance_poll_base_ms,
                self.config.allowance_poll_max_ms,
            );
            if Instant::now() + delay > deadline {
                tracing::warn!(
                    attempts = attempt,
                    "Allowance not yet visible after approval receipt, proceeding"
                );
                return;
            }
            tokio::time::sleep(delay).await;
        }
    }

    async fn submit_and_confirm(
        &self,
        call: &ContractCall,
    ) -> Result<(TxHash, u64), SequenceError> {
        let function = call.function;
        let gateway = self.reads.gateway();

        let tx_hash = gateway
            .submit(call)
            .await
            .map_err(|source| SequenceError::Submission { function, source })?;
        metrics::record_tx_submitted(function);
        tracing::info!(tx_hash = %tx_hash, function = function, "Transaction submitted");

        let status = gateway
            .wait_for_receipt(tx_hash)
            .await
            .map_err(|source| SequenceError::Receipt { function, source })?;

        match status {
            ConfirmationStatus::Confirmed { block_number } => {
                tracing::info!(tx_hash = %tx_hash, block_number = block_number, "Receipt confirmed");
                Ok((tx_hash, block_number))
            }
            ConfirmationStatus::Failed(reason) => Err(SequenceError::Reverted { function, reason }),
            other => Err(SequenceError::Reverted {
                function,
                reason: format!("unexpected receipt status {:?}", other),
            }),
        }
    }
}

impl std::fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("stage", &self.stage())
            .field("in_flight", &self.is_processing())
            .finish()
    }
}
