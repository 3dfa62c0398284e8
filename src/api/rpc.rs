use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    mcp::{handler::handle_mcp_request, protocol::Request},
    AppState,
};

// Forward JSON-RPC requests over HTTP to the MCP handler
pub async fn rpc_handler(State(state): State<AppState>, Json(req): Json<Request>) -> Response {
    match handle_mcp_request(req, state).await {
        Some(resp) => (StatusCode::OK, Json(resp)).into_response(),
        // Notifications get no JSON-RPC reply
        None => StatusCode::ACCEPTED.into_response(),
    }
}
