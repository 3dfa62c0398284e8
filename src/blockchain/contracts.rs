//! Contract interfaces and well-known addresses used by the staking tools.
//!
//! Staking contracts of the same category rarely share one canonical
//! interface, so each family gets its own [`ContractKind`] with a minimal
//! human-readable ABI. Handlers pick the kind and a function name; encoding and
//! decoding happen in the chain client.

use ethers_core::abi::{parse_abi, Abi, Function, Token};
use ethers_core::types::{Address, U256};
use lazy_static::lazy_static;

use crate::blockchain::models::ChainError;

/// Families of contracts the tools talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractKind {
    /// Synthetix `StakingRewards`-style single-asset staking.
    Staking,
    /// Lido stETH.
    LidoStEth,
    /// Lido wrapped stETH.
    WstEth,
    /// MasterChef-style LP farm.
    MasterChef,
    Erc20,
}

lazy_static! {
    static ref STAKING_ABI: Result<Abi, String> = parse(&[
        "function stake(uint256 amount)",
        "function unstake(uint256 amount)",
        "function withdraw()",
        "function claimRewards()",
        "function getReward()",
        "function earned(address account) view returns (uint256)",
        "function balanceOf(address account) view returns (uint256)",
        "function totalSupply() view returns (uint256)",
        "function rewardRate() view returns (uint256)",
        "function rewardPerToken() view returns (uint256)",
        "function stakingToken() view returns (address)",
        "function rewardsToken() view returns (address)",
    ]);
    static ref LIDO_STETH_ABI: Result<Abi, String> = parse(&[
        "function submit(address _referral) payable returns (uint256)",
        "function balanceOf(address account) view returns (uint256)",
        "function getPooledEthByShares(uint256 _sharesAmount) view returns (uint256)",
        "function getSharesByPooledEth(uint256 _ethAmount) view returns (uint256)",
        "function getTotalPooledEther() view returns (uint256)",
        "function getTotalShares() view returns (uint256)",
    ]);
    static ref WSTETH_ABI: Result<Abi, String> = parse(&[
        "function wrap(uint256 _stETHAmount) returns (uint256)",
        "function unwrap(uint256 _wstETHAmount) returns (uint256)",
        "function getStETHByWstETH(uint256 _wstETHAmount) view returns (uint256)",
        "function getWstETHByStETH(uint256 _stETHAmount) view returns (uint256)",
        "function stEthPerToken() view returns (uint256)",
        "function tokensPerStEth() view returns (uint256)",
    ]);
    static ref MASTERCHEF_ABI: Result<Abi, String> = parse(&[
        "function deposit(uint256 _pid, uint256 _amount)",
        "function withdraw(uint256 _pid, uint256 _amount)",
        "function pendingReward(uint256 _pid, address _user) view returns (uint256)",
        "function userInfo(uint256 _pid, address _user) view returns (uint256 amount, uint256 rewardDebt)",
        "function poolInfo(uint256 _pid) view returns (address lpToken, uint256 allocPoint, uint256 lastRewardBlock, uint256 accRewardPerShare)",
        "function poolLength() view returns (uint256)",
        "function totalAllocPoint() view returns (uint256)",
    ]);
    static ref ERC20_ABI: Result<Abi, String> = parse(&[
        "function approve(address spender, uint256 amount) returns (bool)",
        "function balanceOf(address account) view returns (uint256)",
        "function decimals() view returns (uint8)",
    ]);
}

fn parse(signatures: &[&str]) -> Result<Abi, String> {
    parse_abi(signatures).map_err(|e| e.to_string())
}

impl ContractKind {
    pub fn name(&self) -> &'static str {
        match self {
            ContractKind::Staking => "staking",
            ContractKind::LidoStEth => "lido-steth",
            ContractKind::WstEth => "wsteth",
            ContractKind::MasterChef => "masterchef",
            ContractKind::Erc20 => "erc20",
        }
    }

    pub fn abi(&self) -> Result<&'static Abi, ChainError> {
        let abi: &'static Result<Abi, String> = match self {
            ContractKind::Staking => &STAKING_ABI,
            ContractKind::LidoStEth => &LIDO_STETH_ABI,
            ContractKind::WstEth => &WSTETH_ABI,
            ContractKind::MasterChef => &MASTERCHEF_ABI,
            ContractKind::Erc20 => &ERC20_ABI,
        };
        abi.as_ref().map_err(|e| ChainError::Abi {
            function: self.name().to_string(),
            message: e.clone(),
        })
    }

    /// Looks up a function of this interface by name.
    pub fn function(&self, name: &str) -> Result<&'static Function, ChainError> {
        self.abi()?.function(name).map_err(|e| ChainError::Abi {
            function: name.to_string(),
            message: e.to_string(),
        })
    }
}

/// One contract function invocation, independent of how it is executed
/// (read, simulation or signed transaction).
#[derive(Debug, Clone, PartialEq)]
pub struct ContractCall {
    pub kind: ContractKind,
    pub address: Address,
    pub function: &'static str,
    pub args: Vec<Token>,
    /// Native value attached to payable calls.
    pub value: Option<U256>,
}

impl ContractCall {
    pub fn new(kind: ContractKind, address: Address, function: &'static str) -> Self {
        Self {
            kind,
            address,
            function,
            args: Vec::new(),
            value: None,
        }
    }

    pub fn arg(mut self, token: Token) -> Self {
        self.args.push(token);
        self
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }

    /// ABI-encoded calldata (selector followed by arguments).
    pub fn calldata(&self) -> Result<Vec<u8>, ChainError> {
        self.kind
            .function(self.function)?
            .encode_input(&self.args)
            .map_err(|e| ChainError::Abi {
                function: self.function.to_string(),
                message: e.to_string(),
            })
    }

    /// Decodes raw return data with this call's output types.
    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<Token>, ChainError> {
        self.kind
            .function(self.function)?
            .decode_output(data)
            .map_err(|e| ChainError::Abi {
                function: self.function.to_string(),
                message: e.to_string(),
            })
    }
}

// --- Output decoding ---

pub fn uint_at(tokens: &[Token], index: usize, function: &str) -> Result<U256, ChainError> {
    tokens
        .get(index)
        .cloned()
        .and_then(Token::into_uint)
        .ok_or_else(|| unexpected_output(function, index, "uint256"))
}

pub fn address_at(tokens: &[Token], index: usize, function: &str) -> Result<Address, ChainError> {
    tokens
        .get(index)
        .cloned()
        .and_then(Token::into_address)
        .ok_or_else(|| unexpected_output(function, index, "address"))
}

fn unexpected_output(function: &str, index: usize, expected: &str) -> ChainError {
    ChainError::Abi {
        function: function.to_string(),
        message: format!("expected {} at output {}", expected, index),
    }
}

// --- Well-known addresses ---

/// Liquid staking tokens per chain id.
pub fn liquid_staking_tokens(chain_id: u64) -> &'static [(&'static str, &'static str)] {
    match chain_id {
        1 => &[
            ("stETH", "0xae7ab96520DE3A18E5e111B5EaAb095312D7fE84"),
            ("wstETH", "0x7f39C581F595B53c5cb19bD0b3f8dA6c935E2Ca0"),
            ("rETH", "0xae78736Cd615f374D3085123A210448E74Fc6393"),
        ],
        42_161 => &[("wstETH", "0x5979D7b546E38E414F7E9822514be443A4800529")],
        10 => &[("wstETH", "0x1F32b1c2345538c0c6f582fCB022739c4A194Ebb")],
        _ => &[],
    }
}

/// Address of a liquid staking token on a chain, if deployed there.
pub fn liquid_staking_address(chain_id: u64, symbol: &str) -> Option<Address> {
    liquid_staking_tokens(chain_id)
        .iter()
        .find(|(name, _)| *name == symbol)
        .and_then(|(_, address)| address.parse().ok())
}

/// Popular staking protocols per chain id.
pub fn staking_protocols(chain_id: u64) -> &'static [(&'static str, &'static str)] {
    match chain_id {
        1 => &[
            ("Lido stETH", "0xae7ab96520DE3A18E5e111B5EaAb095312D7fE84"),
            ("Rocket Pool", "0x9559Aaa82d9649C7A7b220E7c461d2E74c9a3593"),
        ],
        56 => &[("PancakeSwap", "0x45c54210128a065de780C4B0Df3d16664f7f859e")],
        42_161 => &[("GMX Staking", "0xd2D1162512F927a7e282Ef43a362659E4F2a728F")],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::networks::NETWORKS;

    #[test]
    fn every_interface_parses() {
        for kind in [
            ContractKind::Staking,
            ContractKind::LidoStEth,
            ContractKind::WstEth,
            ContractKind::MasterChef,
            ContractKind::Erc20,
        ] {
            assert!(kind.abi().is_ok(), "{} ABI failed to parse", kind.name());
        }
    }

    #[test]
    fn overloaded_names_resolve_per_kind() {
        assert!(ContractKind::Staking.function("withdraw").unwrap().inputs.is_empty());
        assert_eq!(ContractKind::MasterChef.function("withdraw").unwrap().inputs.len(), 2);
        assert!(ContractKind::WstEth.function("stake").is_err());
    }

    #[test]
    fn calldata_starts_with_selector() {
        let call = ContractCall::new(ContractKind::Staking, Address::zero(), "stake")
            .arg(Token::Uint(U256::from(1u64)));
        let data = call.calldata().unwrap();
        // keccak256("stake(uint256)")[..4]
        assert_eq!(hex::encode(&data[..4]), "a694fc3a");
        assert_eq!(data.len(), 4 + 32);
    }

    #[test]
    fn pool_info_decodes_tuple_output() {
        let lp: Address = "0x0000000000000000000000000000000000000abc".parse().unwrap();
        let raw = ethers_core::abi::encode(&[
            Token::Address(lp),
            Token::Uint(U256::from(40u64)),
            Token::Uint(U256::from(7u64)),
            Token::Uint(U256::from(9u64)),
        ]);
        let call = ContractCall::new(ContractKind::MasterChef, Address::zero(), "poolInfo");
        let tokens = call.decode_output(&raw).unwrap();
        assert_eq!(address_at(&tokens, 0, "poolInfo").unwrap(), lp);
        assert_eq!(uint_at(&tokens, 1, "poolInfo").unwrap(), U256::from(40u64));
        assert!(uint_at(&tokens, 4, "poolInfo").is_err());
    }

    #[test]
    fn static_addresses_are_valid() {
        for network in NETWORKS {
            for (name, address) in liquid_staking_tokens(network.chain_id)
                .iter()
                .chain(staking_protocols(network.chain_id))
            {
                assert!(address.parse::<Address>().is_ok(), "{} has a bad address", name);
            }
        }
        assert!(liquid_staking_address(1, "stETH").is_some());
        assert!(liquid_staking_address(42_161, "stETH").is_none());
    }
}
