mod common;

use common::*;
use ethers::abi::Token;
use ethers::types::U256;
use serde_json::json;

fn position_args() -> serde_json::Value {
    json!({ "stakingContract": STAKING_CONTRACT, "userAddress": USER })
}

#[tokio::test]
async fn position_combines_reads_and_share() {
    let chain = MockChain::new();
    chain
        .on_read_uint("balanceOf", ether(5))
        .on_read_uint("earned", U256::from(1_500_000_000_000_000_000u64))
        .on_read_uint("totalSupply", ether(1000))
        .on_read("stakingToken", vec![Token::Address(addr(LP_TOKEN))]);
    let state = app_state(&chain);

    let envelope = call(&state, "get_staking_position", position_args()).await;
    let data = data(&envelope);

    assert_eq!(data["network"], "ethereum");
    assert_eq!(data["position"]["stakedBalance"], "5000000000000000000");
    assert_eq!(data["position"]["stakedFormatted"], "5");
    assert_eq!(data["position"]["rewardsFormatted"], "1.5");
    assert_eq!(data["pool"]["totalStakedFormatted"], "1000");
    assert_eq!(data["pool"]["userSharePercent"], "0.5000");
    assert_eq!(data["tokens"]["stakingToken"], LP_TOKEN);
    assert!(data["tokens"]["rewardsToken"].is_null());
}

#[tokio::test]
async fn position_degrades_each_failed_read() {
    let chain = MockChain::new();
    chain
        .on_read_uint("balanceOf", ether(1))
        .fail_read("earned")
        .fail_read("rewardsToken");
    let state = app_state(&chain);

    let envelope = call(&state, "get_staking_position", position_args()).await;
    let data = data(&envelope);

    assert_eq!(data["position"]["stakedBalance"], "1000000000000000000");
    assert_eq!(data["position"]["pendingRewards"], "0");
    assert_eq!(data["pool"]["totalStaked"], "0");
    // Empty pool: no division
    assert_eq!(data["pool"]["userSharePercent"], "0");
    assert!(data["tokens"]["stakingToken"].is_null());
    assert!(data["tokens"]["rewardsToken"].is_null());
    // Every read was still attempted
    assert_eq!(chain.network_calls(), 5);
}

#[tokio::test]
async fn position_share_edges() {
    let chain = MockChain::new();
    chain
        .on_read_uint("balanceOf", ether(10))
        .on_read_uint("totalSupply", ether(10));
    let state = app_state(&chain);
    let envelope = call(&state, "get_staking_position", position_args()).await;
    assert_eq!(data(&envelope)["pool"]["userSharePercent"], "100.0000");

    let chain = MockChain::new();
    chain
        .on_read_uint("balanceOf", U256::zero())
        .on_read_uint("totalSupply", ether(10));
    let state = app_state(&chain);
    let envelope = call(&state, "get_staking_position", position_args()).await;
    assert_eq!(data(&envelope)["pool"]["userSharePercent"], "0.0000");
}

#[tokio::test]
async fn position_reads_are_idempotent() {
    let chain = MockChain::new();
    chain
        .on_read_uint("balanceOf", ether(3))
        .on_read_uint("totalSupply", ether(7));
    let state = app_state(&chain);

    let first = call(&state, "get_staking_position", position_args()).await;
    let second = call(&state, "get_staking_position", position_args()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn position_honours_token_decimals() {
    let chain = MockChain::new();
    chain.on_read_uint("balanceOf", U256::from(1_500_000u64));
    let state = app_state(&chain);

    let mut args = position_args();
    args["decimals"] = json!(6);
    let envelope = call(&state, "get_staking_position", args).await;
    assert_eq!(data(&envelope)["position"]["stakedFormatted"], "1.5");
}

#[tokio::test]
async fn stake_simulates_then_sends_then_waits() {
    let chain = MockChain::new();
    let state = app_state(&chain);

    let envelope = call(
        &state,
        "stake_tokens",
        json!({ "stakingContract": STAKING_CONTRACT, "amount": "2500000000000000000" }),
    )
    .await;
    let data = data(&envelope);

    assert_eq!(data["action"], "stake");
    assert_eq!(data["amount"], "2500000000000000000");
    assert_eq!(data["amountFormatted"], "2.5");
    assert_eq!(data["status"], "success");
    assert_eq!(data["blockNumber"], "19000000");

    let log = chain.log();
    assert_eq!(log[0], Interaction::Simulate("stake"));
    assert_eq!(log[1], Interaction::Write("stake"));
    assert!(matches!(log[2], Interaction::Receipt(_)));
    assert_eq!(log.len(), 3);
}

#[tokio::test]
async fn stake_zero_is_simulated_and_revert_reason_surfaces() {
    let chain = MockChain::new();
    chain.revert_simulation("stake", "execution reverted: Cannot stake 0");
    let state = app_state(&chain);

    let envelope = call(
        &state,
        "stake_tokens",
        json!({ "stakingContract": STAKING_CONTRACT, "amount": "0" }),
    )
    .await;

    assert_eq!(error_kind(&envelope), "simulation_reverted");
    let error = envelope.error.as_ref().unwrap();
    assert!(error.message.contains("Cannot stake 0"));
    assert_eq!(error.context, "staking tokens");
    assert_eq!(chain.count(&Interaction::Simulate("stake")), 1);
    assert!(chain.writes().is_empty());
}

#[tokio::test]
async fn stake_zero_goes_through_when_contract_allows_it() {
    let chain = MockChain::new();
    let state = app_state(&chain);

    let envelope = call(
        &state,
        "stake_tokens",
        json!({ "stakingContract": STAKING_CONTRACT, "amount": "0" }),
    )
    .await;
    assert_eq!(data(&envelope)["status"], "success");
    assert_eq!(chain.writes(), vec!["stake"]);
}

#[tokio::test]
async fn mined_but_reverted_stake_is_reported_not_thrown() {
    let chain = MockChain::new();
    chain.revert_on_chain("stake");
    let state = app_state(&chain);

    let envelope = call(
        &state,
        "stake_tokens",
        json!({ "stakingContract": STAKING_CONTRACT, "amount": "1" }),
    )
    .await;
    assert!(envelope.success);
    assert_eq!(data(&envelope)["status"], "failed");
}

#[tokio::test]
async fn stake_submission_failure_is_transaction_failed() {
    let chain = MockChain::new();
    chain.fail_write("stake");
    let state = app_state(&chain);

    let envelope = call(
        &state,
        "stake_tokens",
        json!({ "stakingContract": STAKING_CONTRACT, "amount": "1" }),
    )
    .await;
    assert_eq!(error_kind(&envelope), "transaction_failed");
}

#[tokio::test]
async fn unstake_uses_primary_when_it_works() {
    let chain = MockChain::new();
    let state = app_state(&chain);

    let envelope = call(
        &state,
        "unstake_tokens",
        json!({ "stakingContract": STAKING_CONTRACT, "amount": "1000" }),
    )
    .await;
    let data = data(&envelope);
    assert_eq!(data["method"], "unstake");
    assert_eq!(chain.writes(), vec!["unstake"]);
    assert_eq!(chain.count(&Interaction::Simulate("withdraw")), 0);
}

#[tokio::test]
async fn unstake_falls_back_to_withdraw_once() {
    let chain = MockChain::new();
    chain.revert_simulation("unstake", "execution reverted");
    let state = app_state(&chain);

    let envelope = call(
        &state,
        "unstake_tokens",
        json!({ "stakingContract": STAKING_CONTRACT, "amount": "1000" }),
    )
    .await;
    let data = data(&envelope);
    assert_eq!(data["method"], "withdraw");
    assert_eq!(data["status"], "success");
    assert_eq!(chain.count(&Interaction::Simulate("unstake")), 1);
    assert_eq!(chain.count(&Interaction::Simulate("withdraw")), 1);
    assert_eq!(chain.writes(), vec!["withdraw"]);
}

#[tokio::test]
async fn unstake_reports_final_attempt_when_both_fail() {
    let chain = MockChain::new();
    chain
        .revert_simulation("unstake", "execution reverted")
        .fail_write("withdraw");
    let state = app_state(&chain);

    let envelope = call(
        &state,
        "unstake_tokens",
        json!({ "stakingContract": STAKING_CONTRACT, "amount": "1000" }),
    )
    .await;

    assert_eq!(error_kind(&envelope), "fallback_exhausted");
    let error = envelope.error.as_ref().unwrap();
    assert!(error.message.starts_with("withdraw failed"));
    assert_eq!(error.context, "unstaking tokens");
    // Exactly one attempt each, no third try
    assert_eq!(chain.count(&Interaction::Simulate("unstake")), 1);
    assert_eq!(chain.writes(), vec!["withdraw"]);
}

#[tokio::test]
async fn claim_without_rewards_sends_nothing() {
    let chain = MockChain::new();
    chain.fail_read("earned");
    let state = app_state(&chain);

    let envelope = call(
        &state,
        "claim_staking_rewards",
        json!({ "stakingContract": STAKING_CONTRACT }),
    )
    .await;
    let data = data(&envelope);
    assert_eq!(data["pendingRewards"], "0");
    assert_eq!(data["message"], "No pending rewards to claim");
    assert!(chain.writes().is_empty());
}

#[tokio::test]
async fn claim_falls_back_to_get_reward() {
    let chain = MockChain::new();
    chain
        .on_read_uint("earned", ether(2))
        .revert_simulation("claimRewards", "execution reverted");
    let state = app_state(&chain);

    let envelope = call(
        &state,
        "claim_staking_rewards",
        json!({ "stakingContract": STAKING_CONTRACT }),
    )
    .await;
    let data = data(&envelope);
    assert_eq!(data["method"], "getReward");
    assert_eq!(data["rewardsClaimed"], "2000000000000000000");
    assert_eq!(data["rewardsFormatted"], "2");
    assert_eq!(chain.writes(), vec!["getReward"]);
}

#[tokio::test]
async fn apr_from_reward_rate_and_stake() {
    let chain = MockChain::new();
    chain
        .on_read_uint("rewardRate", U256::from(317_097_919_837u64))
        .on_read_uint("totalSupply", ether(1000));
    let state = app_state(&chain);

    let envelope = call(&state, "get_staking_apr", json!({ "stakingContract": STAKING_CONTRACT })).await;
    let data = data(&envelope);
    assert_eq!(data["estimatedAPR"], "1.00%");
    assert_eq!(data["rewardRate"], "317097919837");
    assert_eq!(data["note"], "APR is estimated and assumes 1:1 token value ratio");
}

#[tokio::test]
async fn apr_guards_empty_pool() {
    let chain = MockChain::new();
    chain
        .on_read_uint("rewardRate", ether(1))
        .on_read_uint("totalSupply", U256::zero());
    let state = app_state(&chain);

    let envelope = call(&state, "get_staking_apr", json!({ "stakingContract": STAKING_CONTRACT })).await;
    assert_eq!(data(&envelope)["estimatedAPR"], "0%");

    // Both reads failing degrades to the same guarded result
    let chain = MockChain::new();
    let state = app_state(&chain);
    let envelope = call(&state, "get_staking_apr", json!({ "stakingContract": STAKING_CONTRACT })).await;
    assert_eq!(data(&envelope)["estimatedAPR"], "0%");
}

#[tokio::test]
async fn protocols_come_from_static_table() {
    let chain = MockChain::new();
    let state = app_state(&chain);

    let mainnet = call(&state, "get_staking_protocols", json!({})).await;
    let listed = data(&mainnet);
    assert_eq!(listed["chainId"], 1);
    assert_eq!(listed["protocols"].as_array().unwrap().len(), 2);
    assert_eq!(listed["protocols"][0]["name"], "Lido stETH");
    assert_eq!(listed["note"], "Use get_staking_position to check your positions");

    let base = call(&state, "get_staking_protocols", json!({ "network": "base" })).await;
    let empty = data(&base);
    assert_eq!(empty["chainId"], 8453);
    assert!(empty["protocols"].as_array().unwrap().is_empty());
    assert_eq!(empty["note"], "No pre-configured protocols for this network");

    assert_eq!(chain.network_calls(), 0);
}

#[tokio::test]
async fn malformed_arguments_make_no_network_calls() {
    let chain = MockChain::new();
    let state = app_state(&chain);

    let envelope = call(
        &state,
        "stake_tokens",
        json!({ "amount": "1.5", "network": 1 }),
    )
    .await;

    assert_eq!(error_kind(&envelope), "validation");
    let message = &envelope.error.as_ref().unwrap().message;
    assert!(message.contains("'stakingContract' is required"));
    assert!(message.contains("'amount' must be"));
    assert!(message.contains("'network' must be"));
    assert_eq!(chain.network_calls(), 0);
    assert_eq!(chain.clients_built(), 0);
}

#[tokio::test]
async fn unsupported_network_is_reported() {
    let chain = MockChain::new();
    let state = app_state(&chain);

    let envelope = call(
        &state,
        "get_staking_apr",
        json!({ "stakingContract": STAKING_CONTRACT, "network": "dogechain" }),
    )
    .await;
    assert_eq!(error_kind(&envelope), "unsupported_network");
    assert_eq!(envelope.error.as_ref().unwrap().context, "calculating staking APR");
    assert_eq!(chain.network_calls(), 0);
}

#[tokio::test]
async fn signing_without_any_key_fails_before_clients_exist() {
    let chain = MockChain::new();
    let state = app_state_without_key(&chain);

    let envelope = call(
        &state,
        "stake_tokens",
        json!({ "stakingContract": STAKING_CONTRACT, "amount": "1" }),
    )
    .await;
    assert_eq!(error_kind(&envelope), "validation");
    assert!(envelope.error.as_ref().unwrap().message.contains("privateKey"));
    assert_eq!(chain.clients_built(), 0);
}

#[tokio::test]
async fn explicit_private_key_is_used_and_checked() {
    let chain = MockChain::new();
    let state = app_state_without_key(&chain);

    let envelope = call(
        &state,
        "stake_tokens",
        json!({ "stakingContract": STAKING_CONTRACT, "amount": "1", "privateKey": TEST_KEY }),
    )
    .await;
    assert!(envelope.success);

    let envelope = call(
        &state,
        "stake_tokens",
        json!({ "stakingContract": STAKING_CONTRACT, "amount": "1", "privateKey": "0x1234" }),
    )
    .await;
    assert_eq!(error_kind(&envelope), "invalid_key");
}
