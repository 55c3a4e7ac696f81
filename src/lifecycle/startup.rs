//! Startup orchestration.
//!
//! Builds the object graph every command runs against. Fail fast on bad
//! configuration or token layout; a missing private key only leaves the
//! session disconnected.

use std::sync::Arc;
use thiserror::Error;

use crate::blockchain::{BlockchainClient, BlockchainError, Wallet};
use crate::config::{DappConfig, SequencerConfig};
use crate::contracts::{ChainGateway, RpcGateway};
use crate::flows::{faucet, FlowContext};
use crate::market::{TokenError, TokenRegistry};
use crate::reads::ReadLayer;
use crate::sequencer::Sequencer;
use crate::session::Session;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Blockchain(#[from] BlockchainError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Wired-up client.
#[derive(Debug, Clone)]
pub struct App {
    pub config: Arc<DappConfig>,
    pub client: BlockchainClient,
    pub session: Session,
    pub reads: ReadLayer,
    pub flows: FlowContext,
}

impl App {
    /// Connect to the RPC and wire the read layer. With `connect_wallet`,
    /// the wallet is loaded from the environment if present.
    pub async fn bootstrap(config: DappConfig, connect_wallet: bool) -> Result<Self, StartupError> {
        let config = Arc::new(config);
        let registry = TokenRegistry::from_config(&config.contracts.tokens)?;
        let client = BlockchainClient::new(config.network.clone()).await?;

        let session = Session::new();
        if connect_wallet {
            match Wallet::from_env(config.network.chain_id) {
                Ok(wallet) => session.connect(wallet),
                Err(e) => tracing::warn!(error = %e, "No wallet loaded, running read-only"),
            }
        }

        let gateway: Arc<dyn ChainGateway> = Arc::new(RpcGateway::new(
            client.clone(),
            config.contracts.clone(),
            session.clone(),
            &config.sequencer,
        ));
        let app = Self::assemble(config, client, session, registry, gateway);
        for mismatch in faucet::registry_mismatches(&app.flows).await {
            tracing::warn!(
                slot = ?mismatch.slot,
                configured = %mismatch.configured,
                on_chain = %mismatch.on_chain,
                "Configured token differs from the faucet's token"
            );
        }
        Ok(app)
    }

    /// Wire an app around an existing gateway.
    pub fn assemble(
        config: Arc<DappConfig>,
        client: BlockchainClient,
        session: Session,
        registry: TokenRegistry,
        gateway: Arc<dyn ChainGateway>,
    ) -> Self {
        let reads = ReadLayer::new(gateway);
        let flows = FlowContext::new(config.clone(), registry, reads.clone(), session.clone());
        Self {
            config,
            client,
            session,
            reads,
            flows,
        }
    }

    /// A fresh sequencer sharing this app's reads and session, tuned by `tune`
    /// on top of the configured sequencer settings.
    pub fn sequencer(&self, tune: impl FnOnce(&mut SequencerConfig)) -> Sequencer {
        let mut config = self.config.sequencer.clone();
        tune(&mut config);
        Sequencer::new(self.reads.clone(), self.session.clone(), config)
    }

    /// Drop the wallet and every cached read scoped to it.
    pub fn disconnect(&self) {
        if let Some(owner) = self.session.disconnect() {
            self.reads.forget_owner(owner);
        }
    }
}
