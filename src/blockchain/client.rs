//! Chain client abstraction used by the staking tools.
//!
//! Handlers never talk to a JSON-RPC endpoint directly. They ask a
//! [`ChainProvider`] for a client bound to one network (and, for writes, one
//! signing key) and drop it when the invocation ends; clients are not pooled.

use async_trait::async_trait;
use ethers_core::abi::Token;
use ethers_core::types::{Address, H256};
use secrecy::SecretString;

use crate::blockchain::{
    contracts::ContractCall,
    models::{ChainError, TxReceipt},
    networks::Network,
};

/// Read side of a chain: view calls, simulations and receipt polling.
#[async_trait]
pub trait ReadClient: Send + Sync {
    fn network(&self) -> &'static Network;

    /// Executes a view call and returns the decoded outputs.
    async fn read(&self, call: &ContractCall) -> Result<Vec<Token>, ChainError>;

    /// Runs a state-changing call against current state without sending it.
    /// Fails with [`ChainError::Reverted`] when the call would revert.
    async fn simulate(&self, from: Address, call: &ContractCall) -> Result<(), ChainError>;

    /// Waits until the transaction is mined.
    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TxReceipt, ChainError>;
}

/// Signing side of a chain, bound to one key.
#[async_trait]
pub trait WriteClient: Send + Sync {
    /// Address derived from the signing key.
    fn address(&self) -> Address;

    /// Signs and submits the call, returning the transaction hash.
    async fn write(&self, call: &ContractCall) -> Result<H256, ChainError>;
}

/// Builds per-invocation clients.
pub trait ChainProvider: Send + Sync {
    fn read_client(&self, network: &str) -> Result<Box<dyn ReadClient>, ChainError>;

    fn write_client(
        &self,
        private_key: &SecretString,
        network: &str,
    ) -> Result<Box<dyn WriteClient>, ChainError>;
}
