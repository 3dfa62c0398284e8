//! MasterChef-style LP farming tools.

use async_trait::async_trait;
use ethers_core::abi::Token;
use ethers_core::types::U256;
use serde_json::{json, Value};
use tracing::info;

use crate::blockchain::{
    contracts::{address_at, uint_at, ContractCall, ContractKind},
    models::tx_hash_hex,
};
use crate::mcp::{
    error::ToolError,
    registry::{ToolContext, ToolDefinition, ToolHandler},
    schema::{ParamKind, ParameterSpec, ToolArgs},
};
use crate::tools::common::{
    approve, checksum, network_param, private_key_param, read_uint_or_zero, submit_and_confirm,
};
use crate::utils::format_ether;

fn farm_params(amount_description: &'static str) -> Vec<ParameterSpec> {
    vec![
        network_param(),
        ParameterSpec::required("farmContract", ParamKind::Address, "Farm contract address (MasterChef style)"),
        ParameterSpec::required("poolId", ParamKind::Integer, "Pool ID"),
        ParameterSpec::required("amount", ParamKind::DecimalAmount, amount_description),
        private_key_param(),
    ]
}

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "stake_lp_tokens",
            "Stake LP tokens in a MasterChef-style farming contract",
            "staking LP tokens",
            farm_params("Amount of LP tokens to stake"),
            StakeLpTokens,
        ),
        ToolDefinition::new(
            "withdraw_lp_tokens",
            "Withdraw LP tokens from a MasterChef-style farming contract",
            "withdrawing LP tokens",
            farm_params("Amount of LP tokens to withdraw"),
            WithdrawLpTokens,
        ),
        ToolDefinition::new(
            "get_farming_position",
            "Get LP farming position and pending rewards",
            "getting farming position",
            vec![
                network_param(),
                ParameterSpec::required("farmContract", ParamKind::Address, "Farm contract address"),
                ParameterSpec::required("poolId", ParamKind::Integer, "Pool ID"),
                ParameterSpec::required("userAddress", ParamKind::Address, "User address to check"),
            ],
            GetFarmingPosition,
        ),
    ]
}

struct StakeLpTokens;

#[async_trait]
impl ToolHandler for StakeLpTokens {
    async fn call(&self, ctx: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let network = args.str("network")?;
        let farm = args.address("farmContract")?;
        let pool_id = args.u64("poolId")?;
        let amount = args.units("amount", 18)?;
        let key = ctx.signing_key(&args)?;

        let reader = ctx.provider.read_client(network)?;
        let writer = ctx.provider.write_client(&key, network)?;
        let (reader, writer) = (reader.as_ref(), writer.as_ref());

        let pool_info = ContractCall::new(ContractKind::MasterChef, farm, "poolInfo")
            .arg(Token::Uint(U256::from(pool_id)));
        let lp_token = address_at(&reader.read(&pool_info).await?, 0, "poolInfo")?;

        let approval = approve(reader, writer, lp_token, farm, amount).await?;

        info!("Depositing {} wei of {:?} into pool {} of {:?}", amount, lp_token, pool_id, farm);
        let deposit = ContractCall::new(ContractKind::MasterChef, farm, "deposit")
            .arg(Token::Uint(U256::from(pool_id)))
            .arg(Token::Uint(amount));
        let receipt = submit_and_confirm(reader, writer, &deposit).await?;

        Ok(json!({
            "network": network,
            "action": "stake_lp_tokens",
            "farmContract": checksum(&farm),
            "poolId": pool_id,
            "lpToken": checksum(&lp_token),
            "amountStaked": format_ether(amount),
            "approvalTransactionHash": tx_hash_hex(&approval.transaction_hash),
            "transactionHash": tx_hash_hex(&receipt.transaction_hash),
            "status": receipt.status.as_str(),
            "gasUsed": receipt.gas_used_string(),
        }))
    }
}

struct WithdrawLpTokens;

#[async_trait]
impl ToolHandler for WithdrawLpTokens {
    async fn call(&self, ctx: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let network = args.str("network")?;
        let farm = args.address("farmContract")?;
        let pool_id = args.u64("poolId")?;
        let amount = args.units("amount", 18)?;
        let key = ctx.signing_key(&args)?;

        let reader = ctx.provider.read_client(network)?;
        let writer = ctx.provider.write_client(&key, network)?;

        info!("Withdrawing {} wei from pool {} of {:?}", amount, pool_id, farm);
        let withdraw = ContractCall::new(ContractKind::MasterChef, farm, "withdraw")
            .arg(Token::Uint(U256::from(pool_id)))
            .arg(Token::Uint(amount));
        let receipt = submit_and_confirm(reader.as_ref(), writer.as_ref(), &withdraw).await?;

        Ok(json!({
            "network": network,
            "action": "withdraw_lp_tokens",
            "farmContract": checksum(&farm),
            "poolId": pool_id,
            "amountWithdrawn": format_ether(amount),
            "transactionHash": tx_hash_hex(&receipt.transaction_hash),
            "status": receipt.status.as_str(),
            "gasUsed": receipt.gas_used_string(),
            "note": "Pending rewards are automatically claimed on withdraw",
        }))
    }
}

struct GetFarmingPosition;

#[async_trait]
impl ToolHandler for GetFarmingPosition {
    async fn call(&self, ctx: &ToolContext, args: ToolArgs) -> Result<Value, ToolError> {
        let network = args.str("network")?;
        let farm = args.address("farmContract")?;
        let pool_id = args.u64("poolId")?;
        let user = args.address("userAddress")?;

        let reader = ctx.provider.read_client(network)?;
        let reader = reader.as_ref();
        let pid = Token::Uint(U256::from(pool_id));

        let user_info = ContractCall::new(ContractKind::MasterChef, farm, "userInfo")
            .arg(pid.clone())
            .arg(Token::Address(user));
        let pool_info = ContractCall::new(ContractKind::MasterChef, farm, "poolInfo").arg(pid.clone());
        // Farms name this differently (pendingSushi, pendingCake, ...), so it may be missing.
        let pending_reward = ContractCall::new(ContractKind::MasterChef, farm, "pendingReward")
            .arg(pid)
            .arg(Token::Address(user));

        let (user_info, pool_info, pending) = tokio::join!(
            reader.read(&user_info),
            reader.read(&pool_info),
            read_uint_or_zero(reader, pending_reward),
        );
        let user_info = user_info?;
        let pool_info = pool_info?;
        let staked = uint_at(&user_info, 0, "userInfo")?;
        let reward_debt = uint_at(&user_info, 1, "userInfo")?;
        let lp_token = address_at(&pool_info, 0, "poolInfo")?;
        let alloc_point = uint_at(&pool_info, 1, "poolInfo")?;

        Ok(json!({
            "network": network,
            "farmContract": checksum(&farm),
            "poolId": pool_id,
            "userAddress": checksum(&user),
            "position": {
                "stakedAmount": format_ether(staked),
                "stakedAmountRaw": staked.to_string(),
                "rewardDebt": reward_debt.to_string(),
                "pendingRewards": format_ether(pending),
                "pendingRewardsRaw": pending.to_string(),
            },
            "pool": {
                "lpToken": checksum(&lp_token),
                "allocPoint": alloc_point.to_string(),
            }
        }))
    }
}
