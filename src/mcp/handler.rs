//! # MCP Handler Module
//!
//! Dispatches MCP JSON-RPC requests for the staking server.
//!
//! ## Supported Methods
//! - `initialize` - server info and capabilities
//! - `ping`
//! - `tools/list` - every registered tool with its input schema
//! - `tools/call` - run a tool; the result always carries a response envelope
//!
//! Tool names may also be used directly as the method; such requests are
//! rewritten into `tools/call`.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{
    mcp::{
        envelope,
        protocol::{error_codes, tool_result, Request, Response, ToolCallParams, PROTOCOL_VERSION, SERVER_NAME},
    },
    AppState,
};

/// This is the main dispatcher for all incoming MCP requests.
pub async fn handle_mcp_request(req: Request, state: AppState) -> Option<Response> {
    info!("Handling MCP request for method: {}", req.method);

    if req.is_notification() {
        debug!("Ignoring notification {}", req.method);
        return None;
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(&req),
        "ping" => Response::success(req.id, json!({})),
        "tools/list" => handle_tools_list(&req, &state),
        "tools/call" => handle_tool_call(req, &state).await,
        // Convenience: call a tool directly by its name
        method if state.registry.contains(method) => {
            let wrapped = Request {
                jsonrpc: req.jsonrpc.clone(),
                id: req.id.clone(),
                method: "tools/call".to_string(),
                params: Some(json!({
                    "name": method,
                    "arguments": req.params.clone().unwrap_or_else(|| json!({}))
                })),
            };
            handle_tool_call(wrapped, &state).await
        }
        _ => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

fn handle_initialize(req: &Request) -> Response {
    Response::success(
        req.id.clone(),
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": { "listChanged": false } },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        }),
    )
}

fn handle_tools_list(req: &Request, state: &AppState) -> Response {
    let tools: Vec<Value> = state
        .registry
        .definitions()
        .map(|definition| definition.descriptor())
        .collect();
    Response::success(req.id.clone(), json!({ "tools": tools }))
}

/// Handles a 'tools/call' request by running the tool through the registry.
async fn handle_tool_call(req: Request, state: &AppState) -> Response {
    let params: ToolCallParams = match req.params.clone().map(serde_json::from_value) {
        Some(Ok(params)) => params,
        Some(Err(e)) => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                format!("Invalid tools/call params: {}", e),
            )
        }
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'params' object".into(),
            )
        }
    };

    let args = params.arguments.unwrap_or_else(|| json!({}));
    let envelope = envelope::invoke(&state.registry, &state.context, &params.name, &args).await;
    Response::success(req.id, tool_result(&envelope))
}
