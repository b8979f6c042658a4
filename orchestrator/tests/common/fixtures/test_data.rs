//! Node configs used across tests

use orchestrator::profiles::{ChainProfile, FUSE};
use orchestrator::{NodeConfig, NodeController};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::FakeRuntime;

pub const FUSE_IMAGE: &str = "fusenet/node:2.0.1";

/// Local Fuse node whose storage lives under `root`
pub fn fuse_config(root: &Path, id: &str) -> NodeConfig {
    NodeConfig {
        id: Some(id.to_string()),
        data_dir: Some(root.join("data")),
        wallet_dir: Some(root.join("keystore")),
        config_path: Some(root.join("config.toml")),
        ..Default::default()
    }
}

pub fn remote_config(id: &str, domain: &str) -> NodeConfig {
    NodeConfig {
        id: Some(id.to_string()),
        remote: true,
        remote_domain: Some(domain.to_string()),
        ..Default::default()
    }
}

pub fn controller(
    profile: &'static ChainProfile,
    config: &NodeConfig,
    runtime: &Arc<FakeRuntime>,
) -> NodeController {
    NodeController::new(profile, config, runtime.clone())
        .expect("config should resolve")
        .with_stop_grace(Duration::from_secs(1))
}

pub fn fuse_controller(root: &Path, id: &str, runtime: &Arc<FakeRuntime>) -> NodeController {
    controller(&FUSE, &fuse_config(root, id), runtime)
}
