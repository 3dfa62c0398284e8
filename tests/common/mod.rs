// Shared test fixtures: a scripted in-memory chain and app state builders.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, H256, U256};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use staking_mcp_server::{
    blockchain::{
        client::{ChainProvider, ReadClient, WriteClient},
        contracts::ContractCall,
        models::{ChainError, TxReceipt, TxStatus},
        networks::{self, Network},
    },
    config::Config,
    mcp::{envelope, ResponseEnvelope},
    AppState,
};

/// Anvil account #0.
pub const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ACCOUNT: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

pub const STAKING_CONTRACT: &str = "0x1111111111111111111111111111111111111111";
pub const USER: &str = "0x2222222222222222222222222222222222222222";
pub const FARM_CONTRACT: &str = "0x3333333333333333333333333333333333333333";
pub const LP_TOKEN: &str = "0x4444444444444444444444444444444444444444";

pub fn addr(s: &str) -> Address {
    s.parse().unwrap()
}

pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

pub fn uint(v: U256) -> Vec<Token> {
    vec![Token::Uint(v)]
}

/// One interaction with the chain, recorded in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Read(&'static str),
    Simulate(&'static str),
    Write(&'static str),
    Receipt(H256),
}

#[derive(Default)]
struct MockState {
    reads: HashMap<&'static str, VecDeque<Result<Vec<Token>, ChainError>>>,
    reverting_simulations: HashMap<&'static str, String>,
    failing_writes: HashSet<&'static str>,
    reverted_receipts: HashSet<&'static str>,
    sent: HashMap<H256, &'static str>,
    log: Vec<Interaction>,
    clients_built: usize,
    next_hash: u64,
}

/// Scripted chain keyed by function name.
///
/// Reads return their scripted results in order and keep repeating the last
/// one; unscripted reads fail like a missing function would. Simulations,
/// writes and receipts succeed unless told otherwise.
#[derive(Clone, Default)]
pub struct MockChain {
    state: Arc<Mutex<MockState>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_read(&self, function: &'static str, tokens: Vec<Token>) -> &Self {
        self.push_read(function, Ok(tokens))
    }

    pub fn on_read_uint(&self, function: &'static str, value: U256) -> &Self {
        self.on_read(function, uint(value))
    }

    pub fn fail_read(&self, function: &'static str) -> &Self {
        self.push_read(
            function,
            Err(ChainError::Rpc {
                function: function.to_string(),
                message: "execution reverted".to_string(),
            }),
        )
    }

    fn push_read(&self, function: &'static str, result: Result<Vec<Token>, ChainError>) -> &Self {
        self.state
            .lock()
            .unwrap()
            .reads
            .entry(function)
            .or_default()
            .push_back(result);
        self
    }

    pub fn revert_simulation(&self, function: &'static str, reason: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .reverting_simulations
            .insert(function, reason.to_string());
        self
    }

    pub fn fail_write(&self, function: &'static str) -> &Self {
        self.state.lock().unwrap().failing_writes.insert(function);
        self
    }

    /// Transactions calling `function` are mined with a failed status.
    pub fn revert_on_chain(&self, function: &'static str) -> &Self {
        self.state.lock().unwrap().reverted_receipts.insert(function);
        self
    }

    pub fn log(&self) -> Vec<Interaction> {
        self.state.lock().unwrap().log.clone()
    }

    /// Reads, simulations, writes and receipt polls so far.
    pub fn network_calls(&self) -> usize {
        self.state.lock().unwrap().log.len()
    }

    pub fn clients_built(&self) -> usize {
        self.state.lock().unwrap().clients_built
    }

    pub fn count(&self, interaction: &Interaction) -> usize {
        self.log().iter().filter(|i| *i == interaction).count()
    }

    pub fn writes(&self) -> Vec<&'static str> {
        self.log()
            .into_iter()
            .filter_map(|i| match i {
                Interaction::Write(f) => Some(f),
                _ => None,
            })
            .collect()
    }
}

impl ChainProvider for MockChain {
    fn read_client(&self, network: &str) -> Result<Box<dyn ReadClient>, ChainError> {
        let network = networks::resolve(network)?;
        self.state.lock().unwrap().clients_built += 1;
        Ok(Box::new(MockReader {
            network,
            state: self.state.clone(),
        }))
    }

    fn write_client(
        &self,
        private_key: &SecretString,
        network: &str,
    ) -> Result<Box<dyn WriteClient>, ChainError> {
        networks::resolve(network)?;
        let wallet = LocalWallet::from_str(private_key.expose_secret())
            .map_err(|e| ChainError::InvalidKey(e.to_string()))?;
        self.state.lock().unwrap().clients_built += 1;
        Ok(Box::new(MockWriter {
            address: wallet.address(),
            state: self.state.clone(),
        }))
    }
}

struct MockReader {
    network: &'static Network,
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl ReadClient for MockReader {
    fn network(&self) -> &'static Network {
        self.network
    }

    async fn read(&self, call: &ContractCall) -> Result<Vec<Token>, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Interaction::Read(call.function));
        let queue = state.reads.get_mut(call.function);
        match queue {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(ChainError::Rpc {
                function: call.function.to_string(),
                message: "function not found".to_string(),
            }),
        }
    }

    async fn simulate(&self, _from: Address, call: &ContractCall) -> Result<(), ChainError> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Interaction::Simulate(call.function));
        match state.reverting_simulations.get(call.function) {
            Some(reason) => Err(ChainError::Reverted {
                function: call.function.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TxReceipt, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Interaction::Receipt(tx_hash));
        let function = state.sent.get(&tx_hash).copied().unwrap_or_default();
        let status = if state.reverted_receipts.contains(function) {
            TxStatus::Failed
        } else {
            TxStatus::Success
        };
        Ok(TxReceipt {
            transaction_hash: tx_hash,
            status,
            block_number: Some(19_000_000),
            gas_used: Some(U256::from(85_000u64)),
        })
    }
}

struct MockWriter {
    address: Address,
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl WriteClient for MockWriter {
    fn address(&self) -> Address {
        self.address
    }

    async fn write(&self, call: &ContractCall) -> Result<H256, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.log.push(Interaction::Write(call.function));
        if state.failing_writes.contains(call.function) {
            return Err(ChainError::Submission {
                function: call.function.to_string(),
                message: "nonce too low".to_string(),
            });
        }
        state.next_hash += 1;
        let hash = H256::from_low_u64_be(state.next_hash);
        state.sent.insert(hash, call.function);
        Ok(hash)
    }
}

/// App state over `chain` with the test key configured as the default signer.
pub fn app_state(chain: &MockChain) -> AppState {
    let config = Config {
        default_private_key: Some(SecretString::new(TEST_KEY.to_string())),
        ..Config::default()
    };
    AppState::new(config, Arc::new(chain.clone())).unwrap()
}

/// App state without a default signing key.
pub fn app_state_without_key(chain: &MockChain) -> AppState {
    AppState::new(Config::default(), Arc::new(chain.clone())).unwrap()
}

pub async fn call(state: &AppState, tool: &str, args: Value) -> ResponseEnvelope {
    envelope::invoke(&state.registry, &state.context, tool, &args).await
}

pub fn data(envelope: &ResponseEnvelope) -> &Value {
    assert!(envelope.success, "expected success, got {:?}", envelope.error);
    envelope.data.as_ref().unwrap()
}

pub fn error_kind(envelope: &ResponseEnvelope) -> &str {
    assert!(!envelope.success, "expected failure, got {:?}", envelope.data);
    &envelope.error.as_ref().unwrap().kind
}
