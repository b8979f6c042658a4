//! Shared setup for agent route tests

#![allow(dead_code)]

use agent::{build_router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use orchestrator::profiles::{BITCOIN, FUSE};
use orchestrator::{ContainerRuntime, Docker, NodeConfig, NodeController};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

pub const API_KEY: &str = "test-key";
pub const BTC_RPC_PASSWORD: &str = "hunter2-secret";

/// Router with one remote Fuse node, one remote Bitcoin node and one local
/// Fuse node whose runtime binary does not exist.
pub fn test_router(storage: &Path) -> Router {
    let runtime: Arc<dyn ContainerRuntime> = Arc::new(Docker::with_binary("/nonexistent/runtime"));
    let mut nodes = BTreeMap::new();

    let remote_fuse = NodeConfig {
        id: Some("fuse-remote".to_string()),
        remote: true,
        remote_domain: Some("rpc.fuse.io".to_string()),
        remote_protocol: Some("https".to_string()),
        ..Default::default()
    };
    let remote_btc = NodeConfig {
        id: Some("btc-remote".to_string()),
        remote: true,
        remote_domain: Some("btc.example.org".to_string()),
        rpc_username: Some("operator".to_string()),
        rpc_password: Some(BTC_RPC_PASSWORD.to_string()),
        ..Default::default()
    };
    let local_fuse = NodeConfig {
        id: Some("fuse-local".to_string()),
        data_dir: Some(storage.join("data")),
        wallet_dir: Some(storage.join("keystore")),
        config_path: Some(storage.join("config.toml")),
        ..Default::default()
    };

    for (profile, config) in [
        (&FUSE, remote_fuse),
        (&BITCOIN, remote_btc),
        (&FUSE, local_fuse),
    ] {
        let node = NodeController::new(profile, &config, runtime.clone()).unwrap();
        nodes.insert(node.id().to_string(), Arc::new(node));
    }

    build_router(Arc::new(AppState::new(API_KEY.to_string(), nodes)))
}

pub async fn post(router: &Router, uri: &str, body: Value, api_key: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(key) = api_key {
        request = request.header("authorization", format!("Bearer {}", key));
    }
    let request = request.body(Body::from(body.to_string())).unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
