// src/mcp/envelope.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::mcp::{
    error::ToolError,
    registry::{ToolContext, ToolRegistry},
};

/// Uniform outcome of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EnvelopeError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub message: String,
    /// The operation that was being attempted, e.g. "staking tokens".
    pub context: String,
    /// Stable error code, e.g. `validation` or `simulation_reverted`.
    pub kind: String,
}

impl ResponseEnvelope {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(err: &ToolError, context: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(EnvelopeError {
                message: err.to_string(),
                context: context.to_string(),
                kind: err.kind().to_string(),
            }),
        }
    }

    /// Human-readable one-line summary, used as MCP text content.
    pub fn summary(&self) -> String {
        match &self.error {
            Some(e) => format!("Error {}: {}", e.context, e.message),
            None => "ok".to_string(),
        }
    }
}

/// Invokes a tool and always produces exactly one envelope.
pub async fn invoke(
    registry: &ToolRegistry,
    ctx: &ToolContext,
    name: &str,
    args: &Value,
) -> ResponseEnvelope {
    info!("Tool call: {}", name);
    let context = match registry.get(name) {
        Some(definition) => definition.operation.to_string(),
        None => format!("invoking tool '{}'", name),
    };

    match registry.invoke(ctx, name, args).await {
        Ok(data) => ResponseEnvelope::ok(data),
        Err(err) => {
            warn!("Tool {} failed while {}: {}", name, context, err);
            ResponseEnvelope::failure(&err, &context)
        }
    }
}
