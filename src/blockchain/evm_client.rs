// src/blockchain/evm_client.rs

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers_core::abi::Token;
use ethers_core::types::{
    transaction::eip2718::TypedTransaction, Address, TransactionRequest, H256, U64,
};
use ethers_providers::{Http, Middleware, MiddlewareError, Provider};
use ethers_signers::{LocalWallet, Signer};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::{
    blockchain::{
        client::{ChainProvider, ReadClient, WriteClient},
        contracts::ContractCall,
        models::{tx_hash_hex, ChainError, TxReceipt, TxStatus},
        networks::{self, Network},
    },
    config::Config,
};

/// [`ChainProvider`] backed by ethers HTTP providers.
///
/// Holds only immutable settings; every client it hands out owns a freshly
/// built provider.
#[derive(Debug, Clone)]
pub struct EvmChainProvider {
    rpc_overrides: HashMap<String, String>,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl EvmChainProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            rpc_overrides: config.chain_rpc_urls.clone(),
            receipt_timeout: config.receipt_timeout,
            poll_interval: config.receipt_poll_interval,
        }
    }

    /// RPC endpoint for a network: the configured override or the public default.
    pub fn rpc_url(&self, network: &Network) -> &str {
        self.rpc_overrides
            .get(network.name)
            .map(String::as_str)
            .unwrap_or(network.rpc_url)
    }

    fn provider(&self, network: &Network) -> Result<Provider<Http>, ChainError> {
        Provider::<Http>::try_from(self.rpc_url(network))
            .map_err(|e| ChainError::Provider(format!("{}: {}", network.name, e)))
    }
}

impl ChainProvider for EvmChainProvider {
    fn read_client(&self, network: &str) -> Result<Box<dyn ReadClient>, ChainError> {
        let network = networks::resolve(network)?;
        let provider = self.provider(network)?;
        Ok(Box::new(EvmReadClient::new(
            network,
            provider,
            self.receipt_timeout,
            self.poll_interval,
        )))
    }

    fn write_client(
        &self,
        private_key: &SecretString,
        network: &str,
    ) -> Result<Box<dyn WriteClient>, ChainError> {
        let network = networks::resolve(network)?;
        let provider = self.provider(network)?;
        Ok(Box::new(EvmWriteClient::new(provider, private_key, network.chain_id)?))
    }
}

/// Read client over any ethers middleware.
pub struct EvmReadClient<M> {
    network: &'static Network,
    provider: Arc<M>,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl<M: Middleware> EvmReadClient<M> {
    pub fn new(
        network: &'static Network,
        provider: M,
        receipt_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            network,
            provider: Arc::new(provider),
            receipt_timeout,
            poll_interval,
        }
    }
}

fn call_request(call: &ContractCall) -> Result<TransactionRequest, ChainError> {
    let mut request = TransactionRequest::new()
        .to(call.address)
        .data(call.calldata()?);
    if let Some(value) = call.value {
        request = request.value(value);
    }
    Ok(request)
}

// Prefer the node's error message ("execution reverted: ...") over the
// transport wrapper's Display.
fn revert_reason<E: MiddlewareError>(err: &E) -> String {
    match err.as_error_response() {
        Some(rpc) => rpc.message.clone(),
        None => err.to_string(),
    }
}

#[async_trait]
impl<M> ReadClient for EvmReadClient<M>
where
    M: Middleware + 'static,
{
    fn network(&self) -> &'static Network {
        self.network
    }

    async fn read(&self, call: &ContractCall) -> Result<Vec<Token>, ChainError> {
        let tx: TypedTransaction = call_request(call)?.into();
        let raw = self
            .provider
            .call(&tx, None)
            .await
            .map_err(|e| ChainError::Rpc {
                function: call.function.to_string(),
                message: e.to_string(),
            })?;
        call.decode_output(&raw)
    }

    async fn simulate(&self, from: Address, call: &ContractCall) -> Result<(), ChainError> {
        let tx: TypedTransaction = call_request(call)?.from(from).into();
        self.provider
            .call(&tx, None)
            .await
            .map(|_| ())
            .map_err(|e| ChainError::Reverted {
                function: call.function.to_string(),
                reason: revert_reason(&e),
            })
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TxReceipt, ChainError> {
        let hash_hex = tx_hash_hex(&tx_hash);
        let poll = async {
            loop {
                match self.provider.get_transaction_receipt(tx_hash).await {
                    Ok(Some(receipt)) => return Ok(receipt),
                    Ok(None) => {
                        debug!("Receipt for {} not available yet", hash_hex);
                        tokio::time::sleep(self.poll_interval).await;
                    }
                    Err(e) => {
                        return Err(ChainError::Receipt {
                            tx_hash: hash_hex.clone(),
                            message: e.to_string(),
                        })
                    }
                }
            }
        };

        let receipt = tokio::time::timeout(self.receipt_timeout, poll)
            .await
            .map_err(|_| ChainError::ReceiptTimeout {
                tx_hash: hash_hex.clone(),
                waited_secs: self.receipt_timeout.as_secs(),
            })??;

        let status = if receipt.status == Some(U64::from(1u64)) {
            TxStatus::Success
        } else {
            TxStatus::Failed
        };
        Ok(TxReceipt {
            transaction_hash: tx_hash,
            status,
            block_number: receipt.block_number.map(|b| b.as_u64()),
            gas_used: receipt.gas_used,
        })
    }
}

/// Write client signing with a local key through `SignerMiddleware`.
pub struct EvmWriteClient<M: Middleware> {
    client: SignerMiddleware<M, LocalWallet>,
}

impl<M: Middleware> EvmWriteClient<M> {
    pub fn new(provider: M, private_key: &SecretString, chain_id: u64) -> Result<Self, ChainError> {
        let wallet = LocalWallet::from_str(private_key.expose_secret().trim())
            .map_err(|e| ChainError::InvalidKey(e.to_string()))?
            .with_chain_id(chain_id);
        Ok(Self {
            client: SignerMiddleware::new(provider, wallet),
        })
    }
}

#[async_trait]
impl<M> WriteClient for EvmWriteClient<M>
where
    M: Middleware + 'static,
{
    fn address(&self) -> Address {
        self.client.address()
    }

    async fn write(&self, call: &ContractCall) -> Result<H256, ChainError> {
        let request = call_request(call)?;
        let pending = self
            .client
            .send_transaction(request, None)
            .await
            .map_err(|e| ChainError::Submission {
                function: call.function.to_string(),
                message: e.to_string(),
            })?;
        Ok(pending.tx_hash())
    }
}
