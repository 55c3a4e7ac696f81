//! Transaction building, signing, and confirmation monitoring.
//!
//! # Responsibilities
//! - Build contract-call transactions with gas estimation
//! - Sign and broadcast transactions
//! - Monitor confirmations

use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::rpc::types::TransactionRequest;
use std::time::Duration;
use tokio::time::{interval, timeout};

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ConfirmationStatus};
use crate::blockchain::wallet::Wallet;

/// Transaction builder for contract calls.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    client: BlockchainClient,
    wallet: Wallet,
    poll_interval: Duration,
}

impl TxBuilder {
    /// Create a new transaction builder.
    pub fn new(client: BlockchainClient, wallet: Wallet, poll_interval: Duration) -> Self {
        Self {
            client,
            wallet,
            poll_interval,
        }
    }

    /// Build a contract-call transaction with gas estimation.
    ///
    /// # Arguments
    /// * `to` - Contract address
    /// * `data` - ABI-encoded call data
    pub async fn build(&self, to: Address, data: Bytes) -> BlockchainResult<TransactionRequest> {
        let from = self.wallet.address();

        // Sync nonce from chain before every write; the sequencer never
        // has two writes in flight for one wallet.
        let chain_nonce = self.client.get_transaction_count(from).await?;
        self.wallet.set_nonce(chain_nonce);

        let gas_price = self.client.get_gas_price().await?;
        let gas_price_gwei = gas_price / 1_000_000_000;

        let config = self.client.config();
        if gas_price_gwei > config.max_gas_price_gwei as u128 {
            return Err(BlockchainError::GasPriceTooHigh {
                current_gwei: gas_price_gwei as u64,
                max_gwei: config.max_gas_price_gwei,
            });
        }

        let adjusted_gas_price = (gas_price as f64 * config.gas_price_multiplier) as u128;

        let probe = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(data.clone());
        let estimated = self.client.estimate_gas(&probe).await?;
        let gas_limit = (estimated as f64 * config.gas_limit_multiplier) as u64;

        let nonce = self.wallet.get_and_increment_nonce();

        let tx = probe
            .with_nonce(nonce)
            .with_gas_price(adjusted_gas_price)
            .with_chain_id(self.wallet.chain_id())
            .with_gas_limit(gas_limit);

        Ok(tx)
    }

    /// Sign a built transaction and broadcast it.
    pub async fn sign_and_send(&self, tx: TransactionRequest) -> BlockchainResult<TxHash> {
        let envelope = tx
            .build(&self.wallet.network_wallet())
            .await
            .map_err(|e| BlockchainError::Wallet(format!("Signing failed: {}", e)))?;

        let tx_hash = self
            .client
            .send_raw_transaction(&envelope.encoded_2718())
            .await?;

        tracing::info!(tx_hash = %tx_hash, from = %self.wallet.address(), "Transaction broadcast");
        Ok(tx_hash)
    }

    /// Build, sign and broadcast a contract call.
    pub async fn send_call(&self, to: Address, data: Bytes) -> BlockchainResult<TxHash> {
        let tx = self.build(to, data).await?;
        self.sign_and_send(tx).await
    }

    /// Wait for a transaction to be confirmed.
    ///
    /// # Arguments
    /// * `tx_hash` - Transaction hash to monitor
    /// * `timeout_secs` - Maximum time to wait for confirmation
    pub async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        timeout_secs: u64,
    ) -> BlockchainResult<ConfirmationStatus> {
        let required_confirmations = self.client.confirmation_blocks();
        let timeout_duration = Duration::from_secs(timeout_secs);

        let result = timeout(timeout_duration, async {
            let mut ticker = interval(self.poll_interval);

            loop {
                ticker.tick().await;

                let receipt = match self.client.get_transaction_receipt(tx_hash).await? {
                    Some(r) => r,
                    None => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                };

                if !receipt.status() {
                    return Ok(ConfirmationStatus::Failed(format!(
                        "Transaction {} reverted",
                        tx_hash
                    )));
                }

                let current_block = self.client.get_block_number().await?;
                let tx_block = receipt.block_number.unwrap_or(current_block);
                // The inclusion block counts as the first confirmation.
                let confirmations = current_block.saturating_sub(tx_block) as u32 + 1;

                if confirmations >= required_confirmations {
                    return Ok(ConfirmationStatus::Confirmed {
                        block_number: tx_block,
                    });
                }

                tracing::debug!(
                    tx_hash = %tx_hash,
                    confirmations = confirmations,
                    required = required_confirmations,
                    "Waiting for confirmations"
                );
            }
        })
        .await;

        match result {
            Ok(status) => status,
            Err(_) => Err(BlockchainError::ConfirmationTimeout {
                tx_hash,
                timeout_secs,
            }),
        }
    }

    /// Get the wallet address.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::NetworkConfig;

    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    async fn unreachable_builder() -> TxBuilder {
        let config = NetworkConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            rpc_timeout_secs: 1,
            ..NetworkConfig::default()
        };
        let client = BlockchainClient::new(config).await.unwrap();
        let wallet = Wallet::from_private_key(TEST_KEY, 167_012).unwrap();
        TxBuilder::new(client, wallet, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_build_surfaces_rpc_failure() {
        let builder = unreachable_builder().await;
        let result = builder.build(Address::ZERO, Bytes::new()).await;
        assert!(matches!(result, Err(BlockchainError::Rpc(_))));
    }

    #[tokio::test]
    async fn test_wait_for_confirmation_propagates_rpc_error() {
        let builder = unreachable_builder().await;
        let result = builder.wait_for_confirmation(TxHash::ZERO, 5).await;
        assert!(result.is_err());
    }
}
