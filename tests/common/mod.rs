//! Shared utilities for integration tests: a scripted in-memory chain.
#![allow(dead_code)]

use alloy::primitives::{Address, TxHash, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use kasplex_dapp::blockchain::{
    BlockchainClient, BlockchainError, BlockchainResult, ConfirmationStatus, Wallet,
};
use kasplex_dapp::config::{ApprovalPolicy, DappConfig, SequencerConfig};
use kasplex_dapp::contracts::abi::IERC20;
use kasplex_dapp::contracts::{ChainGateway, ContractCall};
use kasplex_dapp::flows::FlowContext;
use kasplex_dapp::market::TokenRegistry;
use kasplex_dapp::reads::{ReadKey, ReadLayer, ReadValue};
use kasplex_dapp::session::Session;
use kasplex_dapp::{App, Sequencer};

/// Anvil's first dev key.
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub fn tokens(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18))
}

/// What the mock saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Read(ReadKey),
    Submit(&'static str),
    Receipt(&'static str),
}

#[derive(Default)]
struct ChainState {
    values: HashMap<ReadKey, ReadValue>,
    allowances: HashMap<(Address, Address, Address), U256>,
    failing_reads: HashSet<&'static str>,
    failing_submits: HashSet<&'static str>,
    failing_receipts: HashSet<&'static str>,
    reverting: HashSet<&'static str>,
    /// Approvals confirm but never show up in allowance reads.
    ignore_approvals: bool,
    /// Delay before a confirmed approval shows up in allowance reads.
    allowance_lag_ms: u64,
    pending: HashMap<TxHash, ContractCall>,
    submitted: Vec<ContractCall>,
    events: Vec<Event>,
    next_tx: u64,
    block: u64,
}

/// In-memory `ChainGateway` with scripted answers.
#[derive(Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<ChainState>>,
    receipt_gate: Arc<Mutex<Option<Arc<Notify>>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: ReadKey, value: ReadValue) {
        self.state.lock().unwrap().values.insert(key, value);
    }

    pub fn set_amount(&self, key: ReadKey, amount: U256) {
        self.set(key, ReadValue::Amount(amount));
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.state
            .lock()
            .unwrap()
            .allowances
            .insert((token, owner, spender), amount);
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn fail_reads(&self, kind: &'static str) {
        self.state.lock().unwrap().failing_reads.insert(kind);
    }

    pub fn fail_submit(&self, function: &'static str) {
        self.state.lock().unwrap().failing_submits.insert(function);
    }

    pub fn fail_receipt(&self, function: &'static str) {
        self.state.lock().unwrap().failing_receipts.insert(function);
    }

    pub fn revert(&self, function: &'static str) {
        self.state.lock().unwrap().reverting.insert(function);
    }

    pub fn ignore_approvals(&self) {
        self.state.lock().unwrap().ignore_approvals = true;
    }

    pub fn allowance_lag(&self, ms: u64) {
        self.state.lock().unwrap().allowance_lag_ms = ms;
    }

    /// Hold every receipt until the returned handle is notified.
    pub fn gate_receipts(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.receipt_gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn submitted(&self) -> Vec<&'static str> {
        self.state
            .lock()
            .unwrap()
            .submitted
            .iter()
            .map(|c| c.function)
            .collect()
    }

    pub fn submitted_calls(&self) -> Vec<ContractCall> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn clear_events(&self) {
        self.state.lock().unwrap().events.clear();
    }
}

#[async_trait]
impl ChainGateway for MockGateway {
    async fn read(&self, key: &ReadKey) -> BlockchainResult<ReadValue> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Read(key.clone()));

        if state.failing_reads.contains(key.kind()) {
            return Err(BlockchainError::Rpc("connection refused".into()));
        }

        if let ReadKey::Allowance {
            token,
            owner,
            spender,
        } = key
        {
            let current = state
                .allowances
                .get(&(*token, *owner, *spender))
                .copied()
                .unwrap_or_default();
            return Ok(ReadValue::Amount(current));
        }

        state
            .values
            .get(key)
            .cloned()
            .ok_or_else(|| BlockchainError::Rpc(format!("no value scripted for {:?}", key)))
    }

    async fn submit(&self, call: &ContractCall) -> BlockchainResult<TxHash> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Submit(call.function));

        if state.failing_submits.contains(call.function) {
            return Err(BlockchainError::Rpc("user rejected the request".into()));
        }

        state.next_tx += 1;
        let tx_hash = TxHash::with_last_byte(state.next_tx as u8);
        state.pending.insert(tx_hash, call.clone());
        state.submitted.push(call.clone());
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> BlockchainResult<ConfirmationStatus> {
        let gate = self.receipt_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state.lock().unwrap();
        let call = state
            .pending
            .remove(&tx_hash)
            .ok_or_else(|| BlockchainError::Rpc("unknown transaction".into()))?;
        state.events.push(Event::Receipt(call.function));

        if state.failing_receipts.contains(call.function) {
            return Err(BlockchainError::ConfirmationTimeout {
                tx_hash,
                timeout_secs: 1,
            });
        }
        if state.reverting.contains(call.function) {
            return Ok(ConfirmationStatus::Failed("Transaction reverted".into()));
        }

        if call.function == "approve" && !state.ignore_approvals {
            let approve = IERC20::approveCall::abi_decode(&call.data)
                .map_err(|e| BlockchainError::Rpc(e.to_string()))?;
            let owner = Wallet::from_private_key(TEST_PRIVATE_KEY, 167012)?.address();
            let key = (call.target, owner, approve.spender);
            let lag = state.allowance_lag_ms;
            if lag > 0 {
                // A node that has not caught up with the receipt yet.
                let delayed = Arc::clone(&self.state);
                tokio::spawn(async move {
                    tokio::time::sleep(std::time::Duration::from_millis(lag)).await;
                    delayed.lock().unwrap().allowances.insert(key, approve.amount);
                });
            } else {
                state.allowances.insert(key, approve.amount);
            }
        }

        state.block += 1;
        Ok(ConfirmationStatus::Confirmed {
            block_number: state.block,
        })
    }
}

/// Sequencer settings with millisecond-scale delays.
pub fn fast_sequencer_config() -> SequencerConfig {
    SequencerConfig {
        approval_policy: ApprovalPolicy::Unlimited,
        allowance_poll_timeout_ms: 200,
        allowance_poll_base_ms: 2,
        allowance_poll_max_ms: 10,
        receipt_timeout_secs: 1,
        receipt_poll_interval_ms: 1,
        success_reset_ms: 0,
    }
}

pub struct Harness {
    pub chain: MockGateway,
    pub session: Session,
    pub owner: Address,
    pub ctx: FlowContext,
    pub config: Arc<DappConfig>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(DappConfig::default())
    }

    pub fn with_config(mut config: DappConfig) -> Self {
        config.sequencer = fast_sequencer_config();
        let config = Arc::new(config);
        let chain = MockGateway::new();
        let wallet = Wallet::from_private_key(TEST_PRIVATE_KEY, config.network.chain_id).unwrap();
        let owner = wallet.address();
        let session = Session::connected(wallet);
        let registry = TokenRegistry::from_config(&config.contracts.tokens).unwrap();
        let reads = ReadLayer::new(Arc::new(chain.clone()));
        let ctx = FlowContext::new(config.clone(), registry, reads, session.clone());
        Self {
            chain,
            session,
            owner,
            ctx,
            config,
        }
    }

    pub fn sequencer(&self) -> Sequencer {
        self.sequencer_with(fast_sequencer_config())
    }

    pub fn sequencer_with(&self, config: SequencerConfig) -> Sequencer {
        Sequencer::new(self.ctx.reads.clone(), self.session.clone(), config)
    }

    /// An `App` wired around the mock chain. The RPC client points at a
    /// closed port and is never used by the flows.
    pub async fn app(&self) -> App {
        let mut network = self.config.network.clone();
        network.rpc_url = "http://127.0.0.1:1".to_string();
        network.rpc_timeout_secs = 1;
        let client = BlockchainClient::new(network).await.unwrap();
        App::assemble(
            self.config.clone(),
            client,
            self.session.clone(),
            self.ctx.registry.clone(),
            Arc::new(self.chain.clone()),
        )
    }

    pub fn token(&self, index: usize) -> Address {
        self.config.contracts.tokens[index].address
    }

    pub fn set_balance(&self, token: Address, owner: Address, amount: U256) {
        self.chain
            .set_amount(ReadKey::TokenBalance { token, owner }, amount);
    }
}
