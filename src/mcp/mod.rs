// MCP surface: tool registry, argument validation, envelopes and JSON-RPC dispatch
pub mod envelope;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod registry;
pub mod schema;
pub mod stdio;

pub use envelope::ResponseEnvelope;
pub use error::ToolError;
pub use registry::{ToolContext, ToolDefinition, ToolHandler, ToolRegistry};
