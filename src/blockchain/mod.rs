// src/blockchain/mod.rs

pub mod client;
pub mod contracts;
pub mod evm_client;
pub mod models;
pub mod networks;

pub use client::{ChainProvider, ReadClient, WriteClient};
pub use evm_client::EvmChainProvider;

