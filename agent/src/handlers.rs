//! HTTP request handlers for the agent server

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::Json as ResponseJson,
};
use orchestrator::NodeStatus;
use std::sync::Arc;
use tracing::{error, info};

use crate::middleware::ApiKeyAuth;
use crate::types::*;
use crate::AppState;

// === Lifecycle handlers ===

pub async fn start_node(
    _auth: ApiKeyAuth,
    State(state): State<Arc<AppState>>,
    Json(request): Json<NodeRequest>,
) -> Result<ResponseJson<ApiResponse<NodeStatus>>, StatusCode> {
    let node = state.node(&request.node_id).ok_or(StatusCode::NOT_FOUND)?;

    info!("Start requested for node {}", request.node_id);
    match node.start().await {
        Ok(()) => Ok(ResponseJson(ApiResponse::success_with_data(
            node.status().await,
        ))),
        Err(e) => {
            error!("Failed to start node {}: {}", request.node_id, e);
            Ok(ResponseJson(ApiResponse::error(e.to_string())))
        }
    }
}

pub async fn stop_node(
    _auth: ApiKeyAuth,
    State(state): State<Arc<AppState>>,
    Json(request): Json<NodeRequest>,
) -> Result<ResponseJson<ApiResponse<NodeStatus>>, StatusCode> {
    let node = state.node(&request.node_id).ok_or(StatusCode::NOT_FOUND)?;

    info!("Stop requested for node {}", request.node_id);
    match node.stop().await {
        Ok(()) => Ok(ResponseJson(ApiResponse::success_with_data(
            node.status().await,
        ))),
        Err(e) => {
            error!("Failed to stop node {}: {}", request.node_id, e);
            Ok(ResponseJson(ApiResponse::error(e.to_string())))
        }
    }
}

// === Query handlers ===

pub async fn get_node_status(
    _auth: ApiKeyAuth,
    State(state): State<Arc<AppState>>,
    Json(request): Json<NodeRequest>,
) -> Result<ResponseJson<ApiResponse<NodeStatus>>, StatusCode> {
    let node = state.node(&request.node_id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(ResponseJson(ApiResponse::success_with_data(
        node.status().await,
    )))
}

pub async fn get_node_config(
    _auth: ApiKeyAuth,
    State(state): State<Arc<AppState>>,
    Json(request): Json<NodeRequest>,
) -> Result<ResponseJson<ApiResponse<NodeConfigResponse>>, StatusCode> {
    let node = state.node(&request.node_id).ok_or(StatusCode::NOT_FOUND)?;
    match node.redacted_config() {
        Ok(config) => Ok(ResponseJson(ApiResponse::success_with_data(
            NodeConfigResponse {
                node_id: request.node_id,
                config,
            },
        ))),
        Err(e) => Ok(ResponseJson(ApiResponse::error(e.to_string()))),
    }
}

pub async fn list_nodes(
    _auth: ApiKeyAuth,
    State(state): State<Arc<AppState>>,
) -> Result<ResponseJson<ApiResponse<Vec<NodeStatus>>>, StatusCode> {
    let mut statuses = Vec::with_capacity(state.nodes.len());
    for node in state.nodes.values() {
        statuses.push(node.status().await);
    }
    Ok(ResponseJson(ApiResponse::success_with_data(statuses)))
}
