//! Building blocks shared by the staking, Lido and farming handlers.

use std::future::Future;

use ethers_core::abi::Token;
use ethers_core::types::{Address, H256, U256};
use ethers_core::utils::to_checksum;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::blockchain::{
    client::{ReadClient, WriteClient},
    contracts::{address_at, uint_at, ContractCall, ContractKind},
    models::{tx_hash_hex, TxReceipt},
};
use crate::config::DEFAULT_NETWORK;
use crate::mcp::{
    error::ToolError,
    schema::{ParamKind, ParameterSpec},
};

// --- Parameters shared by most tools ---

pub fn network_param() -> ParameterSpec {
    ParameterSpec::optional(
        "network",
        ParamKind::String,
        "Network name or chain id (e.g. 'ethereum', 'arbitrum', 'bsc', '1')",
    )
    .with_default(json!(DEFAULT_NETWORK))
}

pub fn private_key_param() -> ParameterSpec {
    ParameterSpec::optional(
        "privateKey",
        ParamKind::String,
        "Private key (0x-prefixed hex) used to sign. Defaults to the server's PRIVATE_KEY",
    )
}

pub fn checksum(address: &Address) -> String {
    to_checksum(address, None)
}

// --- Degraded reads ---

/// Reads a `uint256`, degrading to zero when the call or decoding fails.
pub async fn read_uint_or_zero(reader: &dyn ReadClient, call: ContractCall) -> U256 {
    match reader.read(&call).await.and_then(|t| uint_at(&t, 0, call.function)) {
        Ok(value) => value,
        Err(e) => {
            debug!("{} unavailable on {:?}, using 0: {}", call.function, call.address, e);
            U256::zero()
        }
    }
}

/// Reads an `address`, degrading to `None` when the call or decoding fails.
pub async fn read_address_or_none(reader: &dyn ReadClient, call: ContractCall) -> Option<Address> {
    match reader.read(&call).await.and_then(|t| address_at(&t, 0, call.function)) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("{} unavailable on {:?}: {}", call.function, call.address, e);
            None
        }
    }
}

/// Reads a `uint256` that the tool cannot do without.
pub async fn read_uint(reader: &dyn ReadClient, call: ContractCall) -> Result<U256, ToolError> {
    let tokens = reader.read(&call).await?;
    Ok(uint_at(&tokens, 0, call.function)?)
}

// --- Transactions ---

/// Simulates the call as the signer and, if it would succeed, submits it.
pub async fn submit(
    reader: &dyn ReadClient,
    writer: &dyn WriteClient,
    call: &ContractCall,
) -> Result<H256, ToolError> {
    reader.simulate(writer.address(), call).await?;
    let hash = writer.write(call).await?;
    info!("Submitted {} to {:?}: {}", call.function, call.address, tx_hash_hex(&hash));
    Ok(hash)
}

/// Simulate, submit, then wait for the receipt.
///
/// A transaction that is mined but reverts is returned as a receipt with
/// `TxStatus::Failed`, not as an error.
pub async fn submit_and_confirm(
    reader: &dyn ReadClient,
    writer: &dyn WriteClient,
    call: &ContractCall,
) -> Result<TxReceipt, ToolError> {
    let hash = submit(reader, writer, call).await?;
    confirm(reader, hash).await
}

pub async fn confirm(reader: &dyn ReadClient, hash: H256) -> Result<TxReceipt, ToolError> {
    let receipt = reader.wait_for_receipt(hash).await?;
    if !receipt.succeeded() {
        warn!("Transaction {} was mined but reverted", tx_hash_hex(&hash));
    }
    Ok(receipt)
}

/// ERC-20 `approve(spender, amount)` on `token`, waiting for it to be mined.
/// A reverted approval aborts the calling flow.
pub async fn approve(
    reader: &dyn ReadClient,
    writer: &dyn WriteClient,
    token: Address,
    spender: Address,
    amount: U256,
) -> Result<TxReceipt, ToolError> {
    let call = ContractCall::new(ContractKind::Erc20, token, "approve")
        .arg(Token::Address(spender))
        .arg(Token::Uint(amount));
    let receipt = submit_and_confirm(reader, writer, &call).await?;
    if !receipt.succeeded() {
        return Err(ToolError::ApprovalReverted(receipt.transaction_hash));
    }
    Ok(receipt)
}

// --- Fallback ---

/// Which of the two attempts produced the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempted<T> {
    pub function: &'static str,
    pub value: T,
}

/// Runs `primary`; if it fails, runs `fallback` exactly once.
///
/// The primary error is dropped when the fallback succeeds. When both fail,
/// the error names the fallback as the final attempt and wraps its error.
pub async fn with_fallback<T, P, F, FFut>(
    primary_name: &'static str,
    primary: P,
    fallback_name: &'static str,
    fallback: F,
) -> Result<Attempted<T>, ToolError>
where
    P: Future<Output = Result<T, ToolError>>,
    F: FnOnce() -> FFut,
    FFut: Future<Output = Result<T, ToolError>>,
{
    match primary.await {
        Ok(value) => Ok(Attempted {
            function: primary_name,
            value,
        }),
        Err(primary_err) => {
            debug!("{} failed, trying {}: {}", primary_name, fallback_name, primary_err);
            match fallback().await {
                Ok(value) => Ok(Attempted {
                    function: fallback_name,
                    value,
                }),
                Err(fallback_err) => Err(ToolError::FallbackExhausted {
                    primary: primary_name,
                    fallback: fallback_name,
                    source: Box::new(fallback_err),
                }),
            }
        }
    }
}
