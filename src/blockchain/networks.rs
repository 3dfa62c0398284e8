// src/blockchain/networks.rs

use crate::blockchain::models::ChainError;

/// Static metadata for one supported EVM network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Network {
    pub name: &'static str,
    pub chain_id: u64,
    /// Public endpoint used when no override is configured.
    pub rpc_url: &'static str,
}

pub const NETWORKS: &[Network] = &[
    Network {
        name: "ethereum",
        chain_id: 1,
        rpc_url: "https://eth.llamarpc.com",
    },
    Network {
        name: "sepolia",
        chain_id: 11_155_111,
        rpc_url: "https://rpc.sepolia.org",
    },
    Network {
        name: "arbitrum",
        chain_id: 42_161,
        rpc_url: "https://arb1.arbitrum.io/rpc",
    },
    Network {
        name: "optimism",
        chain_id: 10,
        rpc_url: "https://mainnet.optimism.io",
    },
    Network {
        name: "base",
        chain_id: 8_453,
        rpc_url: "https://mainnet.base.org",
    },
    Network {
        name: "polygon",
        chain_id: 137,
        rpc_url: "https://polygon-rpc.com",
    },
    Network {
        name: "bsc",
        chain_id: 56,
        rpc_url: "https://bsc-dataseed.binance.org",
    },
];

// Normalize common network aliases users might pass via MCP
pub fn normalize_network(input: &str) -> String {
    // Normalize case and separators first
    let mut s = input.trim().to_lowercase();
    s = s.replace([' ', '_'], "-");
    while s.contains("--") {
        s = s.replace("--", "-");
    }

    let canonical = match s.as_str() {
        "mainnet" | "main" | "eth" | "ethereum-mainnet" => "ethereum",
        "arb" | "arbitrum-one" | "arb1" => "arbitrum",
        "op" | "optimism-mainnet" => "optimism",
        "base-mainnet" => "base",
        "matic" | "polygon-pos" => "polygon",
        "bnb" | "binance" | "bsc-mainnet" | "bnb-smart-chain" => "bsc",
        "sepolia-testnet" | "eth-sepolia" => "sepolia",
        _ => return by_chain_id_str(&s).map(|n| n.name.to_string()).unwrap_or(s),
    };
    canonical.to_string()
}

fn by_chain_id_str(s: &str) -> Option<&'static Network> {
    s.parse::<u64>().ok().and_then(by_chain_id)
}

/// Looks a network up by numeric chain id.
pub fn by_chain_id(chain_id: u64) -> Option<&'static Network> {
    NETWORKS.iter().find(|n| n.chain_id == chain_id)
}

/// Resolves a caller-supplied identifier (name, alias or chain id).
pub fn resolve(identifier: &str) -> Result<&'static Network, ChainError> {
    let name = normalize_network(identifier);
    NETWORKS
        .iter()
        .find(|n| n.name == name)
        .ok_or_else(|| ChainError::UnsupportedNetwork(identifier.to_string()))
}

/// Canonical names of every supported network.
pub fn supported_networks() -> Vec<&'static str> {
    NETWORKS.iter().map(|n| n.name).collect()
}
