// Staking tool handlers and their registration
pub mod common;
pub mod farming;
pub mod lido;
pub mod staking;

use crate::mcp::{error::ToolError, registry::ToolRegistry};

/// Registers all staking, Lido and farming tools.
pub fn register_staking_tools(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    staking::definitions()
        .into_iter()
        .chain(lido::definitions())
        .chain(farming::definitions())
        .try_for_each(|definition| registry.register(definition))
}

/// A registry holding exactly the staking tools.
pub fn staking_registry() -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    register_staking_tools(&mut registry)?;
    Ok(registry)
}
