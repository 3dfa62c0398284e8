// src/blockchain/models.rs
use ethers_core::types::{H256, U256};
use serde::Serialize;
use thiserror::Error;

// --- Error types for chain operations ---

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("unsupported network: {0}")]
    UnsupportedNetwork(String),
    #[error("invalid private key: {0}")]
    InvalidKey(String),
    #[error("failed to create provider: {0}")]
    Provider(String),
    #[error("ABI error in {function}: {message}")]
    Abi { function: String, message: String },
    #[error("call to {function} failed: {message}")]
    Rpc { function: String, message: String },
    /// The simulation of a state-changing call reverted; nothing was sent.
    #[error("simulation of {function} reverted: {reason}")]
    Reverted { function: String, reason: String },
    /// The signed transaction could not be submitted.
    #[error("failed to submit {function} transaction: {message}")]
    Submission { function: String, message: String },
    #[error("failed to fetch receipt for {tx_hash}: {message}")]
    Receipt { tx_hash: String, message: String },
    #[error("transaction {tx_hash} was not mined within {waited_secs}s")]
    ReceiptTimeout { tx_hash: String, waited_secs: u64 },
}

impl ChainError {
    /// Stable snake_case code used in response envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            ChainError::UnsupportedNetwork(_) => "unsupported_network",
            ChainError::InvalidKey(_) => "invalid_key",
            ChainError::Provider(_) => "provider",
            ChainError::Abi { .. } => "abi",
            ChainError::Rpc { .. } => "rpc",
            ChainError::Reverted { .. } => "simulation_reverted",
            ChainError::Submission { .. } => "transaction_failed",
            ChainError::Receipt { .. } => "receipt",
            ChainError::ReceiptTimeout { .. } => "receipt_timeout",
        }
    }
}

// --- Transaction Models ---

/// Outcome of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Failed,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Success => "success",
            TxStatus::Failed => "failed",
        }
    }
}

/// The parts of a transaction receipt the staking tools report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: H256,
    pub status: TxStatus,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
}

impl TxReceipt {
    pub fn succeeded(&self) -> bool {
        self.status == TxStatus::Success
    }

    /// Block number as a decimal string, empty when the node omitted it.
    pub fn block_number_string(&self) -> String {
        self.block_number.map(|b| b.to_string()).unwrap_or_default()
    }

    pub fn gas_used_string(&self) -> String {
        self.gas_used.map(|g| g.to_string()).unwrap_or_else(|| "0".to_string())
    }
}

/// 0x-prefixed full hex form of a transaction hash.
pub fn tx_hash_hex(hash: &H256) -> String {
    format!("0x{}", hex::encode(hash.as_bytes()))
}
