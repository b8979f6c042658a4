pub mod manager;

use anyhow::{anyhow, Context, Result};
use orchestrator::{profiles, ContainerRuntime, NodeConfig, NodeController};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub use manager::ConfigManager;

pub const DEFAULT_CONFIG_DIR: &str = "config";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_runtime_binary")]
    pub runtime_binary: String,
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_seconds: u64,
    /// Start every local node when the agent boots
    #[serde(default)]
    pub auto_start: bool,
    // Populated from the node config files
    #[serde(skip)]
    pub nodes: BTreeMap<String, NodeConfig>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8745
}

fn default_runtime_binary() -> String {
    orchestrator::constants::runtime::DEFAULT_BINARY.to_string()
}

fn default_stop_timeout() -> u64 {
    orchestrator::constants::lifecycle::DEFAULT_STOP_GRACE.as_secs()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfigFile {
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeConfig>,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build one controller per configured node, all sharing `runtime`.
    pub fn build_nodes(
        &self,
        runtime: Arc<dyn ContainerRuntime>,
    ) -> Result<BTreeMap<String, Arc<NodeController>>> {
        let mut nodes = BTreeMap::new();
        for (node_id, node_config) in &self.nodes {
            let chain = node_config
                .chain
                .as_deref()
                .ok_or_else(|| anyhow!("Node {} has no chain", node_id))?;
            let profile = profiles::find(chain)
                .ok_or_else(|| anyhow!("Node {}: unknown chain '{}'", node_id, chain))?;

            let controller = NodeController::new(profile, node_config, runtime.clone())
                .with_context(|| format!("Invalid configuration for node {}", node_id))?
                .with_stop_grace(Duration::from_secs(self.stop_timeout_seconds));
            nodes.insert(node_id.clone(), Arc::new(controller));
        }
        Ok(nodes)
    }
}
