use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::{
    mcp::envelope::{self, ResponseEnvelope},
    AppState,
};

// The handler function for the GET /tools endpoint.
pub async fn list_tools_handler(State(state): State<AppState>) -> impl IntoResponse {
    let tools: Vec<Value> = state
        .registry
        .definitions()
        .map(|definition| definition.descriptor())
        .collect();
    Json(json!({ "tools": tools }))
}

// The handler function for the POST /tools/{name} endpoint.
pub async fn call_tool_handler(
    Path(name): Path<String>,
    State(state): State<AppState>,
    Json(args): Json<Value>,
) -> impl IntoResponse {
    info!("HTTP tool call: {}", name);
    let envelope = envelope::invoke(&state.registry, &state.context, &name, &args).await;
    (status_for(&envelope), Json(envelope))
}

/// HTTP status for an envelope. Failures that happened on chain are still
/// reported in the body; the status only separates caller mistakes.
fn status_for(envelope: &ResponseEnvelope) -> StatusCode {
    match envelope.error.as_ref().map(|e| e.kind.as_str()) {
        None => StatusCode::OK,
        Some("unknown_tool") => StatusCode::NOT_FOUND,
        Some("validation") | Some("unsupported_network") | Some("invalid_key") => {
            StatusCode::BAD_REQUEST
        }
        Some(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}
