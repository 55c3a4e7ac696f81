//! Chain gateway: the seam between client logic and the RPC node.
//!
//! # Responsibilities
//! - Translate a `ReadKey` into the matching view call and decode it
//! - Sign and broadcast a `ContractCall` with the session wallet
//! - Wait for receipts
//!
//! Everything above this layer (read cache, sequencer, flows) talks to
//! `dyn ChainGateway`, so it can run against an in-memory chain in tests.

use alloy::primitives::{Address, TxHash, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::time::Duration;

use crate::blockchain::{
    BlockchainClient, BlockchainError, BlockchainResult, ConfirmationStatus, TxBuilder,
};
use crate::config::{ContractsConfig, SequencerConfig};
use crate::contracts::abi::{IERC20, IFaucet, IMarketplace, INft, ITripleSwap};
use crate::contracts::calls::ContractCall;
use crate::market::{Pair, TokenSlot};
use crate::reads::{Listing, ReadKey, ReadValue};
use crate::session::Session;

/// Reads, writes and receipts against the chain.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Execute the view call named by `key`.
    async fn read(&self, key: &ReadKey) -> BlockchainResult<ReadValue>;

    /// Sign and broadcast a state-changing call.
    async fn submit(&self, call: &ContractCall) -> BlockchainResult<TxHash>;

    /// Block until the transaction is confirmed, reverted or timed out.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> BlockchainResult<ConfirmationStatus>;
}

/// `ChainGateway` backed by a JSON-RPC node and the session wallet.
#[derive(Debug, Clone)]
pub struct RpcGateway {
    client: BlockchainClient,
    contracts: ContractsConfig,
    session: Session,
    receipt_timeout_secs: u64,
    receipt_poll_interval: Duration,
}

impl RpcGateway {
    pub fn new(
        client: BlockchainClient,
        contracts: ContractsConfig,
        session: Session,
        sequencer: &SequencerConfig,
    ) -> Self {
        Self {
            client,
            contracts,
            session,
            receipt_timeout_secs: sequencer.receipt_timeout_secs,
            receipt_poll_interval: Duration::from_millis(sequencer.receipt_poll_interval_ms),
        }
    }

    fn tx_builder(&self) -> BlockchainResult<TxBuilder> {
        let wallet = self
            .session
            .wallet()
            .map_err(|e| BlockchainError::NotAvailable(e.to_string()))?;
        Ok(TxBuilder::new(
            self.client.clone(),
            (*wallet).clone(),
            self.receipt_poll_interval,
        ))
    }

    async fn view<C>(&self, to: Address, call: C) -> BlockchainResult<C::Return>
    where
        C: SolCall + Send,
    {
        let data = call.abi_encode();
        let output = self.client.call(to, data.into()).await?;
        C::abi_decode_returns(&output).map_err(|e| BlockchainError::Decode {
            function: C::SIGNATURE,
            reason: e.to_string(),
        })
    }

    async fn reserves(&self, pair: Pair) -> BlockchainResult<ReadValue> {
        let dex = self.contracts.dex;
        let (reserve0, reserve1) = match pair {
            Pair::AB => {
                let r = self.view(dex, ITripleSwap::getReservesABCall {}).await?;
                (r._0, r._1)
            }
            Pair::AC => {
                let r = self.view(dex, ITripleSwap::getReservesACCall {}).await?;
                (r._0, r._1)
            }
            Pair::BC => {
                let r = self.view(dex, ITripleSwap::getReservesBCCall {}).await?;
                (r._0, r._1)
            }
        };
        Ok(ReadValue::Reserves { reserve0, reserve1 })
    }

    async fn faucet_token(&self, slot: TokenSlot) -> BlockchainResult<Address> {
        let faucet = self.contracts.faucet;
        match slot {
            TokenSlot::A => self.view(faucet, IFaucet::tokenACall {}).await,
            TokenSlot::B => self.view(faucet, IFaucet::tokenBCall {}).await,
            TokenSlot::C => self.view(faucet, IFaucet::tokenCCall {}).await,
        }
    }
}

#[async_trait]
impl ChainGateway for RpcGateway {
    async fn read(&self, key: &ReadKey) -> BlockchainResult<ReadValue> {
        let contracts = &self.contracts;
        let value = match key {
            ReadKey::NativeBalance(owner) => ReadValue::Amount(self.client.get_balance(*owner).await?),
            ReadKey::TokenBalance { token, owner } => ReadValue::Amount(
                self.view(*token, IERC20::balanceOfCall { account: *owner })
                    .await?,
            ),
            ReadKey::Allowance {
                token,
                owner,
                spender,
            } => ReadValue::Amount(
                self.view(
                    *token,
                    IERC20::allowanceCall {
                        owner: *owner,
                        spender: *spender,
                    },
                )
                .await?,
            ),
            ReadKey::Reserves(pair) => self.reserves(*pair).await?,
            ReadKey::SwapPreview {
                pair,
                token_in,
                amount_in,
            } => ReadValue::Amount(
                self.view(
                    contracts.dex,
                    ITripleSwap::previewSwapCall {
                        pair: pair.id(),
                        tokenIn: *token_in,
                        amountIn: *amount_in,
                    },
                )
                .await?,
            ),
            ReadKey::Listing(token_id) => {
                let r = self
                    .view(
                        contracts.marketplace,
                        IMarketplace::getListingCall {
                            tokenId: U256::from(*token_id),
                        },
                    )
                    .await?;
                ReadValue::Listing(Listing {
                    seller: r.seller,
                    price: r.price,
                    active: r.active,
                })
            }
            ReadKey::PriceInToken { token_id, token } => ReadValue::Amount(
                self.view(
                    contracts.marketplace,
                    IMarketplace::calculatePriceInTokenCall {
                        tokenId: U256::from(*token_id),
                        paymentToken: *token,
                    },
                )
                .await?,
            ),
            ReadKey::NftOwner(token_id) => ReadValue::Address(
                self.view(
                    contracts.nft,
                    INft::ownerOfCall {
                        tokenId: U256::from(*token_id),
                    },
                )
                .await?,
            ),
            ReadKey::NftBalance(owner) => ReadValue::Amount(
                self.view(contracts.nft, INft::balanceOfCall { owner: *owner })
                    .await?,
            ),
            ReadKey::LastClaim(user) => ReadValue::Amount(
                self.view(contracts.faucet, IFaucet::lastClaimTimeCall { user: *user })
                    .await?,
            ),
            ReadKey::ClaimInterval => ReadValue::Amount(
                self.view(contracts.faucet, IFaucet::CLAIM_INTERVALCall {})
                    .await?,
            ),
            ReadKey::ClaimAmount => ReadValue::Amount(
                self.view(contracts.faucet, IFaucet::CLAIM_AMOUNTCall {})
                    .await?,
            ),
            ReadKey::FaucetToken(slot) => ReadValue::Address(self.faucet_token(*slot).await?),
        };
        Ok(value)
    }

    async fn submit(&self, call: &ContractCall) -> BlockchainResult<TxHash> {
        let builder = self.tx_builder()?;
        tracing::debug!(
            target_contract = %call.target,
            function = call.function,
            "Submitting contract call"
        );
        builder.send_call(call.target, call.data.clone()).await
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> BlockchainResult<ConfirmationStatus> {
        self.tx_builder()?
            .wait_for_confirmation(tx_hash, self.receipt_timeout_secs)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;

    async fn offline_gateway(session: Session) -> RpcGateway {
        let network = NetworkConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            rpc_timeout_secs: 1,
            ..NetworkConfig::default()
        };
        let client = BlockchainClient::new(network).await.unwrap();
        RpcGateway::new(
            client,
            ContractsConfig::default(),
            session,
            &SequencerConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_submit_requires_connected_wallet() {
        let gateway = offline_gateway(Session::new()).await;
        let call = ContractCall::claim(Address::ZERO);
        let err = gateway.submit(&call).await.unwrap_err();
        assert!(matches!(err, BlockchainError::NotAvailable(_)));
    }

    #[tokio::test]
    async fn test_read_failure_is_rpc_error() {
        let gateway = offline_gateway(Session::new()).await;
        let err = gateway.read(&ReadKey::ClaimInterval).await.unwrap_err();
        assert!(matches!(err, BlockchainError::Rpc(_)));
    }
}
