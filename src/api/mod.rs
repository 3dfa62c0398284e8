//! # API Module
//!
//! HTTP surface of the staking MCP server.
//!
//! ## Available Endpoints
//! - `GET /api/health` - liveness and a summary of what is loaded
//! - `GET /api/tools` - registered tools with their input schemas
//! - `POST /api/tools/:name` - run one tool; the body is its arguments and
//!   the reply is its response envelope
//! - `POST /api/rpc` - MCP JSON-RPC over HTTP

pub mod health;
pub mod rpc;
pub mod tools;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

/// Builds the full HTTP application with every route nested under `/api`.
pub fn create_router(state: AppState) -> Router {
    let api_router = Router::new()
        .route("/health", get(health::health_handler))
        .route("/tools", get(tools::list_tools_handler))
        .route("/tools/:name", post(tools::call_tool_handler))
        // JSON-RPC endpoint for MCP clients that speak HTTP
        .route("/rpc", post(rpc::rpc_handler));

    Router::new()
        .nest("/api", api_router)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
