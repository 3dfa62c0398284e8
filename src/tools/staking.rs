//! Generic `StakingRewards`-style staking tools.

use async_trait::async_trait;
use ethers_core::abi::Token;
use ethers_core::types::{U256, U512};
use serde_json::{json, Value};
use tracing::info;

use crate::blockchain::{
    contracts::{staking_protocols, ContractCall, ContractKind},
    models::tx_hash_hex,
};
use crate::config::{APR_PRECISION, DEFAULT_TOKEN_DECIMALS, SECONDS_PER_YEAR, SHARE_PERCENT_PRECISION};
use crate::mcp::{
    error::ToolError,
    registry::{ToolContext, ToolDefinition, ToolHandler},
    schema::{ArgumentError, ParamKind, ParameterSpec, ToolArgs},
};
use crate::tools::common::{
    checksum, confirm, network_param, private_key_param, read_address_or_none, read_uint_or_zero,
    submit, submit_and_confirm, with_fallback,
};
use crate::utils::{format_units, percent, percent_wide};

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "get_staking_position",
            "Get staking position and rewards for an address",
            "getting staking position",
            vec![
                network_param(),
                ParameterSpec::required("stakingContract", ParamKind::Address, "Staking contract address"),
                ParameterSpec::required("userAddress", ParamKind::Address, "User address to check"),
                ParameterSpec::optional(
                    "decimals",
                    ParamKind::Integer,
                    "Decimals of the staked and reward tokens, used for display",
                )
                .with_default(json!(DEFAULT_TOKEN_DECIMALS)),
            ],
            GetStakingPosition,
        ),
        ToolDefinition::new(
            "stake_tokens",
            "Stake tokens in a staking contract",
            "staking tokens",
            vec![
                network_param(),
                ParameterSpec::required("stakingContract", ParamKind::Address, "Staking contract address"),
                ParameterSpec::required("amount", ParamKind::WeiAmount, "Amount to stake (in wei)"),
                private_key_param(),
            ],
            StakeTokens,
        ),
        ToolDefinition::new(
            "unstake_tokens",
            "Unstake/withdraw tokens from a staking contract",
            "unstaking tokens",
            vec![
                network_param(),
                ParameterSpec::required("stakingContract", ParamKind::Address, "Staking contract address"),
                ParameterSpec::required("amount", ParamKind::WeiAmount, "Amount to unstake (in wei)"),
                private_key_param(),
            ],
            UnstakeTokens,
        ),
        ToolDefinition::new(
            "claim_staking_rewards",
            "Claim pending staking rewards",
            "claiming rewards",
            vec![
                network_param(),
                ParameterSpec::required("stakingContract", ParamKind::Address, "Staking contract address"),
                private_key_param(),
            ],
            ClaimStakingRewards,
        ),
        ToolDefinition::new(
            "get_staking_apr",
            "Calculate estimated APR for a staking contract",
            "calculating staking APR",
            vec![
                network_param(),
                ParameterSpec::required("stakingContract", ParamKind::Address, "Staking contract address"),
            ],
            GetStakingApr,
        ),
        ToolDefinition::new(
            "get_staking_protocols",
            "Get list of popular staking protocols on a network",
            "getting staking protocols",
            vec![network_param()],
            GetStakingProtocols,
        ),
    ]
}

struct GetStakingPosition;

#[async_trait]
impl ToolHandler for GetStakingPosition {
    async fn call(&self, ctx: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let network = args.str("network")?;
        let contract = args.address("stakingContract")?;
        let user = args.address("userAddress")?;
        let decimals = display_decimals(&args)?;

        let reader = ctx.provider.read_client(network)?;
        let reader = reader.as_ref();
        info!("Reading staking position of {:?} in {:?} on {}", user, contract, network);

        let call = |function| ContractCall::new(ContractKind::Staking, contract, function);
        let (staked, pending, total, staking_token, rewards_token) = tokio::join!(
            read_uint_or_zero(reader, call("balanceOf").arg(Token::Address(user))),
            read_uint_or_zero(reader, call("earned").arg(Token::Address(user))),
            read_uint_or_zero(reader, call("totalSupply")),
            read_address_or_none(reader, call("stakingToken")),
            read_address_or_none(reader, call("rewardsToken")),
        );

        Ok(json!({
            "network": network,
            "stakingContract": checksum(&contract),
            "userAddress": checksum(&user),
            "position": {
                "stakedBalance": staked.to_string(),
                "stakedFormatted": format_units(staked, decimals),
                "pendingRewards": pending.to_string(),
                "rewardsFormatted": format_units(pending, decimals),
            },
            "pool": {
                "totalStaked": total.to_string(),
                "totalStakedFormatted": format_units(total, decimals),
                "userSharePercent": percent(staked, total, SHARE_PERCENT_PRECISION),
            },
            "tokens": {
                "stakingToken": staking_token.as_ref().map(checksum),
                "rewardsToken": rewards_token.as_ref().map(checksum),
            }
        }))
    }
}

fn display_decimals(args: &ToolArgs) -> Result<u32, ArgumentError> {
    let decimals = args.opt_u64("decimals").unwrap_or(u64::from(DEFAULT_TOKEN_DECIMALS));
    u32::try_from(decimals).map_err(|_| ArgumentError::new("decimals", "out of range"))
}

struct StakeTokens;

#[async_trait]
impl ToolHandler for StakeTokens {
    async fn call(&self, ctx: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let network = args.str("network")?;
        let contract = args.address("stakingContract")?;
        let amount = args.wei("amount")?;
        let key = ctx.signing_key(&args)?;

        let reader = ctx.provider.read_client(network)?;
        let writer = ctx.provider.write_client(&key, network)?;
        info!("Staking {} wei in {:?} on {}", amount, contract, network);

        let stake = ContractCall::new(ContractKind::Staking, contract, "stake").arg(Token::Uint(amount));
        let receipt = submit_and_confirm(reader.as_ref(), writer.as_ref(), &stake).await?;

        Ok(json!({
            "network": network,
            "action": "stake",
            "stakingContract": checksum(&contract),
            "amount": amount.to_string(),
            "amountFormatted": format_units(amount, DEFAULT_TOKEN_DECIMALS),
            "transactionHash": tx_hash_hex(&receipt.transaction_hash),
            "status": receipt.status.as_str(),
            "blockNumber": receipt.block_number_string(),
        }))
    }
}

struct UnstakeTokens;

#[async_trait]
impl ToolHandler for UnstakeTokens {
    async fn call(&self, ctx: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let network = args.str("network")?;
        let contract = args.address("stakingContract")?;
        let amount = args.wei("amount")?;
        let key = ctx.signing_key(&args)?;

        let reader = ctx.provider.read_client(network)?;
        let writer = ctx.provider.write_client(&key, network)?;
        let (reader, writer) = (reader.as_ref(), writer.as_ref());
        info!("Unstaking {} wei from {:?} on {}", amount, contract, network);

        let unstake =
            ContractCall::new(ContractKind::Staking, contract, "unstake").arg(Token::Uint(amount));
        let withdraw = ContractCall::new(ContractKind::Staking, contract, "withdraw");
        let withdraw = &withdraw;
        let sent = with_fallback(
            "unstake",
            submit(reader, writer, &unstake),
            "withdraw",
            move || submit(reader, writer, withdraw),
        )
        .await?;
        let receipt = confirm(reader, sent.value).await?;

        Ok(json!({
            "network": network,
            "action": "unstake",
            "method": sent.function,
            "stakingContract": checksum(&contract),
            "amount": amount.to_string(),
            "transactionHash": tx_hash_hex(&receipt.transaction_hash),
            "status": receipt.status.as_str(),
            "blockNumber": receipt.block_number_string(),
        }))
    }
}

struct ClaimStakingRewards;

#[async_trait]
impl ToolHandler for ClaimStakingRewards {
    async fn call(&self, ctx: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let network = args.str("network")?;
        let contract = args.address("stakingContract")?;
        let key = ctx.signing_key(&args)?;

        let reader = ctx.provider.read_client(network)?;
        let writer = ctx.provider.write_client(&key, network)?;
        let (reader, writer) = (reader.as_ref(), writer.as_ref());

        let earned = ContractCall::new(ContractKind::Staking, contract, "earned")
            .arg(Token::Address(writer.address()));
        let pending = read_uint_or_zero(reader, earned).await;
        if pending.is_zero() {
            info!("Nothing to claim from {:?} for {:?}", contract, writer.address());
            return Ok(json!({
                "network": network,
                "action": "claim_rewards",
                "stakingContract": checksum(&contract),
                "pendingRewards": "0",
                "message": "No pending rewards to claim",
            }));
        }

        info!("Claiming {} reward units from {:?} on {}", pending, contract, network);
        let claim = ContractCall::new(ContractKind::Staking, contract, "claimRewards");
        let get_reward = ContractCall::new(ContractKind::Staking, contract, "getReward");
        let get_reward = &get_reward;
        let sent = with_fallback(
            "claimRewards",
            submit(reader, writer, &claim),
            "getReward",
            move || submit(reader, writer, get_reward),
        )
        .await?;
        let receipt = confirm(reader, sent.value).await?;

        Ok(json!({
            "network": network,
            "action": "claim_rewards",
            "method": sent.function,
            "stakingContract": checksum(&contract),
            "rewardsClaimed": pending.to_string(),
            "rewardsFormatted": format_units(pending, DEFAULT_TOKEN_DECIMALS),
            "transactionHash": tx_hash_hex(&receipt.transaction_hash),
            "status": receipt.status.as_str(),
        }))
    }
}

struct GetStakingApr;

#[async_trait]
impl ToolHandler for GetStakingApr {
    async fn call(&self, ctx: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let network = args.str("network")?;
        let contract = args.address("stakingContract")?;

        let reader = ctx.provider.read_client(network)?;
        let reader = reader.as_ref();
        let call = |function| ContractCall::new(ContractKind::Staking, contract, function);
        let (reward_rate, total_staked) = tokio::join!(
            read_uint_or_zero(reader, call("rewardRate")),
            read_uint_or_zero(reader, call("totalSupply")),
        );

        Ok(json!({
            "network": network,
            "stakingContract": checksum(&contract),
            "rewardRate": reward_rate.to_string(),
            "rewardRatePerSecond": format_units(reward_rate, DEFAULT_TOKEN_DECIMALS),
            "totalStaked": total_staked.to_string(),
            "estimatedAPR": format!("{}%", estimated_apr(reward_rate, total_staked)),
            "note": "APR is estimated and assumes 1:1 token value ratio",
        }))
    }
}

/// `rewardRate * SECONDS_PER_YEAR / totalStaked * 100`, or `"0"` when either
/// input is zero.
pub fn estimated_apr(reward_rate: U256, total_staked: U256) -> String {
    if reward_rate.is_zero() || total_staked.is_zero() {
        return "0".to_string();
    }
    let yearly_rewards = reward_rate.full_mul(U256::from(SECONDS_PER_YEAR));
    percent_wide(yearly_rewards, U512::from(total_staked), APR_PRECISION)
}

struct GetStakingProtocols;

#[async_trait]
impl ToolHandler for GetStakingProtocols {
    async fn call(&self, ctx: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let network = args.str("network")?;
        let chain_id = ctx.provider.read_client(network)?.network().chain_id;

        let protocols: Vec<Value> = staking_protocols(chain_id)
            .iter()
            .map(|(name, address)| json!({ "name": name, "address": address }))
            .collect();
        let note = if protocols.is_empty() {
            "No pre-configured protocols for this network"
        } else {
            "Use get_staking_position to check your positions"
        };

        Ok(json!({
            "network": network,
            "chainId": chain_id,
            "protocols": protocols,
            "note": note,
        }))
    }
}
