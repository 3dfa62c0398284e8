use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::{blockchain::networks::supported_networks, mcp::protocol::SERVER_NAME, AppState};

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "tools": state.registry.len(),
        "networks": supported_networks(),
        "signingKeyConfigured": state.context.default_private_key.is_some(),
    }))
}
