use super::{Config, NodeConfigFile};
use anyhow::{anyhow, Result};
use glob::glob;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_dir: String) -> Result<Self> {
        let config = Self::load_configuration(&config_dir).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    async fn load_configuration(config_dir: &str) -> Result<Config> {
        let main_config_path = format!("{}/main.toml", config_dir);
        let main_config_content = fs::read_to_string(&main_config_path)
            .await
            .map_err(|e| anyhow!("Failed to read main config {}: {}", main_config_path, e))?;

        let mut config: Config = toml::from_str(&main_config_content)
            .map_err(|e| anyhow!("Failed to parse main config: {}", e))?;

        let pattern = format!("{}/*.toml", config_dir);
        let mut all_nodes = BTreeMap::new();

        for entry in glob(&pattern).map_err(|e| anyhow!("Glob pattern error: {}", e))? {
            let path = entry.map_err(|e| anyhow!("Glob entry error: {}", e))?;
            let filename = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| anyhow!("Invalid filename"))?;

            // Skip main.toml as it's already loaded
            if filename == "main.toml" {
                continue;
            }

            debug!("Loading node config: {}", path.display());

            let content = fs::read_to_string(&path)
                .await
                .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;

            let node_file: NodeConfigFile = toml::from_str(&content)
                .map_err(|e| anyhow!("Failed to parse {}: {}", path.display(), e))?;

            for (node_id, mut node_config) in node_file.nodes {
                // The table key names the node and its container
                match &node_config.id {
                    Some(id) if id != &node_id => {
                        return Err(anyhow!(
                            "Node {} in {} declares a different id '{}'",
                            node_id,
                            path.display(),
                            id
                        ));
                    }
                    _ => node_config.id = Some(node_id.clone()),
                }

                if all_nodes.contains_key(&node_id) {
                    return Err(anyhow!(
                        "Node {} in {} is already defined in another file",
                        node_id,
                        path.display()
                    ));
                }
                all_nodes.insert(node_id, node_config);
            }
        }

        config.nodes = all_nodes;

        info!("Loaded {} nodes from {}", config.nodes.len(), config_dir);

        Ok(config)
    }
}
