//! Lido liquid staking: stETH deposits, wstETH wrapping and protocol stats.

use async_trait::async_trait;
use ethers_core::abi::Token;
use ethers_core::types::{Address, U256, U512};
use serde_json::{json, Value};
use tracing::info;

use crate::blockchain::{
    contracts::{liquid_staking_address, liquid_staking_tokens, ContractCall, ContractKind},
    models::tx_hash_hex,
};
use crate::config::DEFAULT_LIDO_REFERRAL;
use crate::mcp::{
    error::ToolError,
    registry::{ToolContext, ToolDefinition, ToolHandler},
    schema::{ArgumentError, ParamKind, ParameterSpec, ToolArgs},
};
use crate::tools::common::{
    approve, checksum, network_param, private_key_param, read_uint, read_uint_or_zero,
    submit_and_confirm,
};
use crate::utils::format_ether;

/// Lido deposits and stats are mainnet only.
const LIDO_NETWORKS: &[&str] = &["ethereum"];

fn lido_network_param() -> ParameterSpec {
    ParameterSpec::optional(
        "network",
        ParamKind::Enum(LIDO_NETWORKS),
        "Network (Lido only on Ethereum mainnet)",
    )
    .with_default(json!("ethereum"))
}

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "stake_eth_lido",
            "Stake ETH with Lido to receive stETH (liquid staking)",
            "staking ETH via Lido",
            vec![
                lido_network_param(),
                ParameterSpec::required("amount", ParamKind::DecimalAmount, "Amount of ETH to stake"),
                private_key_param(),
                ParameterSpec::optional("referral", ParamKind::Address, "Referral address (optional)"),
            ],
            StakeEthLido,
        ),
        ToolDefinition::new(
            "wrap_steth",
            "Wrap stETH to wstETH (non-rebasing wrapped staked ETH)",
            "wrapping stETH",
            vec![
                network_param(),
                ParameterSpec::required("amount", ParamKind::DecimalAmount, "Amount of stETH to wrap"),
                private_key_param(),
            ],
            WrapStEth,
        ),
        ToolDefinition::new(
            "unwrap_wsteth",
            "Unwrap wstETH back to stETH",
            "unwrapping wstETH",
            vec![
                network_param(),
                ParameterSpec::required("amount", ParamKind::DecimalAmount, "Amount of wstETH to unwrap"),
                private_key_param(),
            ],
            UnwrapWstEth,
        ),
        ToolDefinition::new(
            "get_lido_stats",
            "Get Lido staking statistics and APR",
            "getting Lido stats",
            vec![lido_network_param()],
            GetLidoStats,
        ),
        ToolDefinition::new(
            "get_liquid_staking_info",
            "Get liquid staking token addresses and info for a network",
            "getting liquid staking info",
            vec![network_param()],
            GetLiquidStakingInfo,
        ),
    ]
}

fn require_token(chain_id: u64, symbol: &str, missing: &str) -> Result<Address, ToolError> {
    liquid_staking_address(chain_id, symbol).ok_or_else(|| ToolError::Unavailable(missing.to_string()))
}

fn ether_amount(args: &ToolArgs) -> Result<U256, ArgumentError> {
    args.units("amount", 18)
}

struct StakeEthLido;

#[async_trait]
impl ToolHandler for StakeEthLido {
    async fn call(&self, ctx: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let network = args.str("network")?;
        let amount = ether_amount(&args)?;
        let referral = match args.opt_address("referral")? {
            Some(referral) => referral,
            None => DEFAULT_LIDO_REFERRAL
                .parse()
                .map_err(|_| ArgumentError::new("referral", "default referral is not an address"))?,
        };
        let key = ctx.signing_key(&args)?;

        let reader = ctx.provider.read_client(network)?;
        let writer = ctx.provider.write_client(&key, network)?;
        let (reader, writer) = (reader.as_ref(), writer.as_ref());
        let steth = require_token(
            reader.network().chain_id,
            "stETH",
            "Lido stETH not available on this network",
        )?;
        let account = writer.address();

        let balance_of = ContractCall::new(ContractKind::LidoStEth, steth, "balanceOf")
            .arg(Token::Address(account));
        let before = read_uint(reader, balance_of.clone()).await?;

        info!("Submitting {} wei to Lido from {:?}", amount, account);
        let deposit = ContractCall::new(ContractKind::LidoStEth, steth, "submit")
            .arg(Token::Address(referral))
            .value(amount);
        let receipt = submit_and_confirm(reader, writer, &deposit).await?;

        let after = read_uint_or_zero(reader, balance_of).await;
        let received = after.saturating_sub(before);

        Ok(json!({
            "network": network,
            "action": "stake_eth_lido",
            "ethStaked": format_ether(amount),
            "stETHReceived": format_ether(received),
            "referral": checksum(&referral),
            "transactionHash": tx_hash_hex(&receipt.transaction_hash),
            "status": receipt.status.as_str(),
            "gasUsed": receipt.gas_used_string(),
            "stETHAddress": checksum(&steth),
            "note": "stETH is a rebasing token - your balance will increase daily with staking rewards",
        }))
    }
}

struct WrapStEth;

#[async_trait]
impl ToolHandler for WrapStEth {
    async fn call(&self, ctx: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let network = args.str("network")?;
        let amount = ether_amount(&args)?;
        let key = ctx.signing_key(&args)?;

        let reader = ctx.provider.read_client(network)?;
        let writer = ctx.provider.write_client(&key, network)?;
        let (reader, writer) = (reader.as_ref(), writer.as_ref());
        let chain_id = reader.network().chain_id;
        let wsteth = require_token(chain_id, "wstETH", "wstETH not available on this network")?;

        // Bridged wstETH has no stETH next to it, so there is nothing to approve.
        let approval = match liquid_staking_address(chain_id, "stETH") {
            Some(steth) => Some(approve(reader, writer, steth, wsteth, amount).await?),
            None => None,
        };

        info!("Wrapping {} wei stETH on {}", amount, network);
        let wrap = ContractCall::new(ContractKind::WstEth, wsteth, "wrap").arg(Token::Uint(amount));
        let receipt = submit_and_confirm(reader, writer, &wrap).await?;

        // The wrap is already mined here, so a failed quote must not hide the hash.
        let expected = read_uint_or_zero(
            reader,
            ContractCall::new(ContractKind::WstEth, wsteth, "getWstETHByStETH")
                .arg(Token::Uint(amount)),
        )
        .await;

        Ok(json!({
            "network": network,
            "action": "wrap_steth",
            "stETHWrapped": format_ether(amount),
            "expectedWstETH": format_ether(expected),
            "approvalTransactionHash": approval.map(|r| tx_hash_hex(&r.transaction_hash)),
            "transactionHash": tx_hash_hex(&receipt.transaction_hash),
            "status": receipt.status.as_str(),
            "gasUsed": receipt.gas_used_string(),
            "wstETHAddress": checksum(&wsteth),
            "note": "wstETH is a non-rebasing token - better for DeFi and L2s",
        }))
    }
}

struct UnwrapWstEth;

#[async_trait]
impl ToolHandler for UnwrapWstEth {
    async fn call(&self, ctx: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let network = args.str("network")?;
        let amount = ether_amount(&args)?;
        let key = ctx.signing_key(&args)?;

        let reader = ctx.provider.read_client(network)?;
        let writer = ctx.provider.write_client(&key, network)?;
        let (reader, writer) = (reader.as_ref(), writer.as_ref());
        let wsteth = require_token(
            reader.network().chain_id,
            "wstETH",
            "wstETH not available on this network",
        )?;

        let expected = read_uint(
            reader,
            ContractCall::new(ContractKind::WstEth, wsteth, "getStETHByWstETH")
                .arg(Token::Uint(amount)),
        )
        .await?;

        info!("Unwrapping {} wei wstETH on {}", amount, network);
        let unwrap = ContractCall::new(ContractKind::WstEth, wsteth, "unwrap").arg(Token::Uint(amount));
        let receipt = submit_and_confirm(reader, writer, &unwrap).await?;

        Ok(json!({
            "network": network,
            "action": "unwrap_wsteth",
            "wstETHUnwrapped": format_ether(amount),
            "expectedStETH": format_ether(expected),
            "transactionHash": tx_hash_hex(&receipt.transaction_hash),
            "status": receipt.status.as_str(),
            "gasUsed": receipt.gas_used_string(),
        }))
    }
}

struct GetLidoStats;

#[async_trait]
impl ToolHandler for GetLidoStats {
    async fn call(&self, ctx: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let network = args.str("network")?;
        let reader = ctx.provider.read_client(network)?;
        let reader = reader.as_ref();
        let chain_id = reader.network().chain_id;
        let steth = require_token(chain_id, "stETH", "Lido not available on this network")?;
        let wsteth = liquid_staking_address(chain_id, "wstETH");

        let steth_call = |function| ContractCall::new(ContractKind::LidoStEth, steth, function);
        let (pooled, shares, steth_per_token) = tokio::try_join!(
            read_uint(reader, steth_call("getTotalPooledEther")),
            read_uint(reader, steth_call("getTotalShares")),
            async {
                match wsteth {
                    Some(wsteth) => {
                        read_uint(
                            reader,
                            ContractCall::new(ContractKind::WstEth, wsteth, "stEthPerToken"),
                        )
                        .await
                    }
                    None => Ok(U256::zero()),
                }
            },
        )?;

        Ok(json!({
            "network": network,
            "lido": {
                "totalPooledEther": format_ether(pooled),
                "totalShares": shares.to_string(),
                "sharePrice": format_ether(share_price(pooled, shares)),
                "stEthPerWstETH": format_ether(steth_per_token),
            },
            "contracts": {
                "stETH": checksum(&steth),
                "wstETH": wsteth.as_ref().map(checksum),
            },
            "note": "Current Lido APR is approximately 3-5% (varies based on network conditions)",
        }))
    }
}

/// Pooled ether per share scaled by 1e18, zero when there are no shares.
pub fn share_price(pooled: U256, shares: U256) -> U256 {
    if shares.is_zero() {
        return U256::zero();
    }
    let price = pooled.full_mul(U256::exp10(18)) / U512::from(shares);
    U256::try_from(price).unwrap_or(U256::MAX)
}

struct GetLiquidStakingInfo;

#[async_trait]
impl ToolHandler for GetLiquidStakingInfo {
    async fn call(&self, ctx: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let network = args.str("network")?;
        let chain_id = ctx.provider.read_client(network)?.network().chain_id;

        let tokens: Vec<Value> = liquid_staking_tokens(chain_id)
            .iter()
            .map(|(name, address)| json!({ "name": name, "address": address }))
            .collect();
        let note = if tokens.is_empty() {
            "No liquid staking tokens configured for this network"
        } else {
            "Use stake_eth_lido to stake ETH and receive stETH"
        };

        Ok(json!({
            "network": network,
            "chainId": chain_id,
            "liquidStakingTokens": tokens,
            "protocols": [
                { "name": "Lido", "tokens": ["stETH", "wstETH"], "description": "Largest liquid staking protocol" },
                { "name": "Rocket Pool", "tokens": ["rETH"], "description": "Decentralized liquid staking" }
            ],
            "note": note,
        }))
    }
}
