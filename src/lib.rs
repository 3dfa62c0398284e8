// src/lib.rs

use std::sync::Arc;

pub mod api;
pub mod blockchain;
pub mod config;
pub mod mcp;
pub mod tools;
pub mod utils;

use blockchain::client::ChainProvider;
use config::Config;
use mcp::{error::ToolError, registry::ToolContext, registry::ToolRegistry};

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Registered tools; frozen once the state is built
    pub registry: Arc<ToolRegistry>,
    /// Chain provider and default signing key handed to every tool call
    pub context: Arc<ToolContext>,
}

impl AppState {
    /// Builds the state with every staking tool registered.
    ///
    /// The configured private key moves into the tool context.
    pub fn new(mut config: Config, provider: Arc<dyn ChainProvider>) -> Result<Self, ToolError> {
        let registry = tools::staking_registry()?;
        let context =
            ToolContext::new(provider).with_default_private_key(config.default_private_key.take());
        Ok(Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            context: Arc::new(context),
        })
    }
}
