//! Resolved node description: identity, ports, resources and storage.
//!
//! Everything here is produced once by `NodeConfig::resolve` and is not
//! mutated afterwards.

use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use crate::catalog::{NetworkType, NodeClient, NodeType};
use crate::template::{Placeholder, TemplateValues};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeIdentity {
    /// Also the container name
    pub id: String,
    pub chain: &'static str,
    pub client: NodeClient,
    pub network: NetworkType,
    pub node_type: NodeType,
    pub version: String,
    pub client_version: String,
    /// Empty for remote nodes
    pub docker_image: String,
}

/// Host ports the node listens on; mapped 1:1 into the container.
///
/// Two local nodes on the same docker network must not share a port. That is
/// the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortAssignment {
    pub peer_port: u16,
    pub rpc_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_username: Option<String>,
    #[serde(skip)]
    pub rpc_password: Option<String>,
}

impl PortAssignment {
    pub fn template_values(&self) -> TemplateValues {
        let mut values = TemplateValues::new()
            .with_port(Placeholder::PeerPort, self.peer_port)
            .with_port(Placeholder::RpcPort, self.rpc_port);
        if let Some(username) = &self.rpc_username {
            values = values.with_value(Placeholder::RpcUsername, username.clone());
        }
        if let Some(password) = &self.rpc_password {
            values = values.with_value(Placeholder::RpcPassword, password.clone());
        }
        values
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceLimits {
    pub cpus: f64,
    pub memory_mb: u64,
    pub docker_network: String,
}

/// Host-side paths as configured; unset entries get temp paths on first start
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StorageLayout {
    pub data_dir: Option<PathBuf>,
    pub wallet_dir: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
}

impl StorageLayout {
    /// Fill every unset path with a fresh `<tmp>/<uuid>` path.
    pub fn materialize(&self) -> HostPaths {
        HostPaths {
            data_dir: self.data_dir.clone().unwrap_or_else(temp_path),
            wallet_dir: self.wallet_dir.clone().unwrap_or_else(temp_path),
            config_path: self.config_path.clone().unwrap_or_else(temp_path),
        }
    }
}

fn temp_path() -> PathBuf {
    std::env::temp_dir().join(Uuid::new_v4().to_string())
}

/// Concrete host paths mounted into the container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostPaths {
    pub data_dir: PathBuf,
    pub wallet_dir: PathBuf,
    pub config_path: PathBuf,
}

/// Externally reachable node; nothing is run locally
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteEndpoint {
    pub domain: String,
    pub protocol: String,
}

impl RemoteEndpoint {
    pub fn url(&self, rpc_port: u16) -> String {
        format!("{}://{}:{}", self.protocol, self.domain, rpc_port)
    }
}

/// Output of config resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNode {
    pub identity: NodeIdentity,
    pub ports: PortAssignment,
    pub limits: ResourceLimits,
    pub storage: StorageLayout,
    pub remote: Option<RemoteEndpoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialize_keeps_configured_paths() {
        let layout = StorageLayout {
            data_dir: Some(PathBuf::from("/srv/node/data")),
            wallet_dir: None,
            config_path: None,
        };

        let paths = layout.materialize();
        assert_eq!(paths.data_dir, PathBuf::from("/srv/node/data"));
        assert!(paths.wallet_dir.starts_with(std::env::temp_dir()));
        assert!(paths.config_path.starts_with(std::env::temp_dir()));
        assert_ne!(paths.wallet_dir, paths.config_path);
    }

    #[test]
    fn test_template_values_skip_missing_credentials() {
        let ports = PortAssignment {
            peer_port: 30300,
            rpc_port: 8545,
            rpc_username: None,
            rpc_password: None,
        };

        let values = ports.template_values();
        assert_eq!(values.get(Placeholder::PeerPort), Some("30300"));
        assert_eq!(values.get(Placeholder::RpcPort), Some("8545"));
        assert_eq!(values.get(Placeholder::RpcUsername), None);
    }

    #[test]
    fn test_remote_url() {
        let remote = RemoteEndpoint {
            domain: "rpc.example.org".to_string(),
            protocol: "https".to_string(),
        };
        assert_eq!(remote.url(8545), "https://rpc.example.org:8545");
    }
}
