//! HTTP agent exposing node lifecycle operations for one host.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod types;

use axum::{routing::post, Router};
use futures::future::join_all;
use orchestrator::NodeController;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub struct AppState {
    pub api_key: String,
    pub nodes: BTreeMap<String, Arc<NodeController>>,
}

impl AppState {
    pub fn new(api_key: String, nodes: BTreeMap<String, Arc<NodeController>>) -> Self {
        Self { api_key, nodes }
    }

    pub fn node(&self, node_id: &str) -> Option<&Arc<NodeController>> {
        self.nodes.get(node_id)
    }

    /// Start every local node concurrently. Failures are logged; the agent
    /// keeps serving.
    pub async fn start_all(&self) {
        let starts = self
            .nodes
            .values()
            .filter(|node| !node.is_remote())
            .map(|node| async move {
                if let Err(e) = node.start().await {
                    error!("Auto-start of node {} failed: {}", node.id(), e);
                }
            });
        join_all(starts).await;
    }

    /// Stop every node concurrently.
    pub async fn stop_all(&self) {
        let stops = self.nodes.values().map(|node| async move {
            if let Err(e) = node.stop().await {
                error!("Failed to stop node {}: {}", node.id(), e);
            }
        });
        join_all(stops).await;
        info!("All nodes stopped");
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/node/start", post(handlers::start_node))
        .route("/node/stop", post(handlers::stop_node))
        .route("/node/status", post(handlers::get_node_status))
        .route("/node/config", post(handlers::get_node_config))
        .route("/nodes/list", post(handlers::list_nodes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Log every event of `node` under its id for as long as the node lives.
pub async fn spawn_event_logger(node: Arc<NodeController>) -> JoinHandle<()> {
    let mut events = node.subscribe().await;
    let node_id = node.id().to_string();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                orchestrator::NodeEvent::Output(chunk) => {
                    info!(node = %node_id, "{}", chunk.trim_end())
                }
                orchestrator::NodeEvent::Error(chunk) => {
                    warn!(node = %node_id, "{}", chunk.trim_end())
                }
                orchestrator::NodeEvent::Close(code) => {
                    info!(node = %node_id, "Container exited with code {}", code)
                }
            }
        }
    })
}
