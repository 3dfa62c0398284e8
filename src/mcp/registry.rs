//! The tool registry: name → definition table, built once at startup and then
//! shared read-only.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::debug;

use crate::blockchain::client::ChainProvider;
use crate::mcp::{
    error::ToolError,
    schema::{self, ArgumentError, ParameterSpec, ToolArgs},
};

/// Everything a handler may use besides its arguments.
pub struct ToolContext {
    pub provider: Arc<dyn ChainProvider>,
    /// Signing key used when a call does not carry `privateKey`.
    pub default_private_key: Option<SecretString>,
}

impl ToolContext {
    pub fn new(provider: Arc<dyn ChainProvider>) -> Self {
        Self {
            provider,
            default_private_key: None,
        }
    }

    pub fn with_default_private_key(mut self, key: Option<SecretString>) -> Self {
        self.default_private_key = key;
        self
    }

    /// The key a signing tool should use: the `privateKey` argument, else the
    /// configured default.
    pub fn signing_key(&self, args: &ToolArgs) -> Result<SecretString, ArgumentError> {
        if let Some(key) = args.opt_str("privateKey") {
            return Ok(SecretString::new(key.to_string()));
        }
        self.default_private_key
            .as_ref()
            .map(|key| SecretString::new(key.expose_secret().clone()))
            .ok_or_else(|| {
                ArgumentError::new(
                    "privateKey",
                    "no private key supplied and PRIVATE_KEY is not configured",
                )
            })
    }
}

/// Business logic of one tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, ctx: &ToolContext, args: ToolArgs) -> Result<Value, ToolError>;
}

/// A registered tool.
#[derive(Clone)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParameterSpec>,
    /// What the tool is doing, used as error context ("staking tokens").
    pub operation: &'static str,
    pub handler: Arc<dyn ToolHandler>,
}

impl ToolDefinition {
    pub fn new(
        name: &'static str,
        description: &'static str,
        operation: &'static str,
        params: Vec<ParameterSpec>,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        Self {
            name,
            description,
            params,
            operation,
            handler: Arc::new(handler),
        }
    }

    /// MCP `tools/list` entry.
    pub fn descriptor(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": schema::json_schema(&self.params),
        })
    }
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("operation", &self.operation)
            .field("params", &self.params.len())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: ToolDefinition) -> Result<(), ToolError> {
        if self.tools.contains_key(definition.name) {
            return Err(ToolError::DuplicateTool(definition.name.to_string()));
        }
        debug!("Registered tool {}", definition.name);
        self.tools.insert(definition.name, definition);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions in name order.
    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values()
    }

    /// Validates `args` and runs the handler.
    ///
    /// Handler errors are returned as-is; turning them into envelopes is the
    /// caller's job (see [`crate::mcp::envelope::invoke`]).
    pub async fn invoke(
        &self,
        ctx: &ToolContext,
        name: &str,
        args: &Value,
    ) -> Result<Value, ToolError> {
        let definition = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let args = schema::validate(&definition.params, args)?;
        debug!("Invoking {} with {:?}", name, args);
        definition.handler.call(ctx, args).await
    }
}
