// src/mcp/error.rs

use ethers_core::types::H256;
use thiserror::Error;

use crate::blockchain::models::{tx_hash_hex, ChainError};
use crate::mcp::schema::{ArgumentError, ValidationError};

/// Errors raised by the registry and the tool handlers.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    /// The requested contract or protocol is not deployed on the network.
    #[error("{0}")]
    Unavailable(String),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("approval transaction {} reverted", tx_hash_hex(.0))]
    ApprovalReverted(H256),
    /// Both the primary function and its single fallback failed.
    #[error("{fallback} failed after {primary} failed: {source}")]
    FallbackExhausted {
        primary: &'static str,
        fallback: &'static str,
        #[source]
        source: Box<ToolError>,
    },
}

impl ToolError {
    /// Stable snake_case code used in response envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::DuplicateTool(_) => "duplicate_tool",
            ToolError::UnknownTool(_) => "unknown_tool",
            ToolError::Validation(_) | ToolError::Argument(_) => "validation",
            ToolError::Unavailable(_) => "unavailable",
            ToolError::Chain(e) => e.kind(),
            ToolError::ApprovalReverted(_) => "approval_reverted",
            ToolError::FallbackExhausted { .. } => "fallback_exhausted",
        }
    }
}
