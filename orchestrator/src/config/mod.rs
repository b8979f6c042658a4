//! Per-node configuration as supplied by the caller.
//!
//! Every field is optional apart from what the chain profile cannot default.
//! `resolve` validates the values against a chain profile and produces the
//! immutable node description; unknown keys are rejected at parse time.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

use crate::catalog::{NetworkType, NodeClient, NodeType};
use crate::constants::{remote, runtime};
use crate::errors::{ConfigError, OrchestratorError, Result};
use crate::node::model::{
    NodeIdentity, PortAssignment, RemoteEndpoint, ResolvedNode, ResourceLimits, StorageLayout,
};
use crate::profiles::ChainProfile;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// Chain profile ticker; checked against the profile when set
    pub chain: Option<String>,
    pub id: Option<String>,
    pub client: Option<NodeClient>,
    pub network: Option<NetworkType>,
    /// Keep full history instead of pruning
    #[serde(default)]
    pub archival: bool,
    pub version: Option<String>,
    pub client_version: Option<String>,
    pub docker_image: Option<String>,
    pub peer_port: Option<u16>,
    pub rpc_port: Option<u16>,
    pub rpc_username: Option<String>,
    pub rpc_password: Option<String>,
    pub docker_cpus: Option<f64>,
    pub docker_mem: Option<u64>,
    pub docker_network: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub wallet_dir: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    #[serde(default)]
    pub remote: bool,
    pub remote_domain: Option<String>,
    pub remote_protocol: Option<String>,
}

impl NodeConfig {
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            reason: e.to_string(),
        })
    }

    pub fn resolve(&self, profile: &'static ChainProfile) -> Result<ResolvedNode> {
        if let Some(chain) = &self.chain {
            if chain != profile.ticker {
                return Err(invalid(
                    "chain",
                    format!("'{}' does not match profile '{}'", chain, profile.ticker),
                ));
            }
        }

        let id = match &self.id {
            Some(id) => {
                validate_container_name(id)?;
                id.clone()
            }
            None => Uuid::new_v4().to_string(),
        };

        let client = match self.client {
            Some(client) if profile.client(client).is_none() => {
                return Err(unsupported(profile, "client", client.to_string()))
            }
            Some(client) => client,
            None => profile
                .default_client()
                .ok_or_else(|| missing("client"))?,
        };

        let network = match self.network {
            Some(network) if !profile.supports_network(network) => {
                return Err(unsupported(profile, "network", network.to_string()))
            }
            Some(network) => network,
            None => profile
                .default_network()
                .ok_or_else(|| missing("network"))?,
        };

        let node_type = if self.archival {
            NodeType::Archival
        } else {
            NodeType::Full
        };
        if !profile.node_types.contains(&node_type) {
            return Err(unsupported(profile, "node_type", node_type.to_string()));
        }

        let ports = self.resolve_ports(profile, network)?;
        let limits = self.resolve_limits(profile)?;
        let remote = self.resolve_remote()?;

        let versions = profile.versions(client, network);
        let version = self
            .version
            .clone()
            .or_else(|| versions.first().map(|v| v.version.to_string()))
            .unwrap_or_default();
        let record = versions.iter().find(|v| v.version == version);

        // Remote nodes never run locally, so an unknown version is not fatal for them.
        if remote.is_none() && record.is_none() {
            return Err(OrchestratorError::UnknownVersion {
                chain: profile.ticker.to_string(),
                client: client.to_string(),
                network: network.to_string(),
                version,
            });
        }

        let client_version = self
            .client_version
            .clone()
            .or_else(|| record.map(|r| r.client_version.to_string()))
            .unwrap_or_default();

        let docker_image = if remote.is_some() {
            String::new()
        } else {
            self.docker_image
                .clone()
                .or_else(|| record.map(|r| r.image.to_string()))
                .unwrap_or_default()
        };

        let identity = NodeIdentity {
            id,
            chain: profile.ticker,
            client,
            network,
            node_type,
            version,
            client_version,
            docker_image,
        };
        debug!(
            "Resolved {} node {} ({} {} on {})",
            profile.name, identity.id, identity.client, identity.version, identity.network
        );

        Ok(ResolvedNode {
            identity,
            ports,
            limits,
            storage: StorageLayout {
                data_dir: self.data_dir.clone(),
                wallet_dir: self.wallet_dir.clone(),
                config_path: self.config_path.clone(),
            },
            remote,
        })
    }

    fn resolve_ports(&self, profile: &ChainProfile, network: NetworkType) -> Result<PortAssignment> {
        let defaults = profile.default_ports(network);
        let rpc_port = self
            .rpc_port
            .or(defaults.map(|d| d.rpc))
            .ok_or_else(|| missing("rpc_port"))?;
        let peer_port = self
            .peer_port
            .or(defaults.map(|d| d.peer))
            .ok_or_else(|| missing("peer_port"))?;

        if rpc_port == 0 {
            return Err(invalid("rpc_port", "must be a positive port number"));
        }
        if peer_port == 0 {
            return Err(invalid("peer_port", "must be a positive port number"));
        }

        let (mut rpc_username, mut rpc_password) =
            (self.rpc_username.clone(), self.rpc_password.clone());
        if profile.rpc_credentials && self.config_path.is_some() && !self.remote {
            // An existing config file is never rewritten; it must keep
            // matching the credentials this node reports
            if rpc_username.is_none() {
                return Err(missing("rpc_username"));
            }
            if rpc_password.is_none() {
                return Err(missing("rpc_password"));
            }
        }
        if profile.rpc_credentials {
            rpc_username.get_or_insert_with(|| {
                format!("rpc-{}", &Uuid::new_v4().simple().to_string()[..8])
            });
            rpc_password.get_or_insert_with(|| Uuid::new_v4().simple().to_string());
        }

        Ok(PortAssignment {
            peer_port,
            rpc_port,
            rpc_username,
            rpc_password,
        })
    }

    fn resolve_limits(&self, profile: &ChainProfile) -> Result<ResourceLimits> {
        let cpus = self.docker_cpus.unwrap_or(profile.default_cpus);
        if !cpus.is_finite() || cpus <= 0.0 {
            return Err(invalid("docker_cpus", "must be greater than zero"));
        }

        let memory_mb = self.docker_mem.unwrap_or(profile.default_mem_mb);
        if memory_mb == 0 {
            return Err(invalid("docker_mem", "must be greater than zero"));
        }

        let docker_network = self
            .docker_network
            .clone()
            .unwrap_or_else(|| runtime::DEFAULT_NETWORK.to_string());
        if docker_network.trim().is_empty() {
            return Err(invalid("docker_network", "must not be empty"));
        }

        Ok(ResourceLimits {
            cpus,
            memory_mb,
            docker_network,
        })
    }

    fn resolve_remote(&self) -> Result<Option<RemoteEndpoint>> {
        if !self.remote {
            return Ok(None);
        }

        let domain = self
            .remote_domain
            .clone()
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| missing("remote_domain"))?;
        let protocol = self
            .remote_protocol
            .clone()
            .unwrap_or_else(|| remote::DEFAULT_PROTOCOL.to_string());
        if protocol != "http" && protocol != "https" {
            return Err(invalid(
                "remote_protocol",
                format!("'{}' is not http or https", protocol),
            ));
        }

        Ok(Some(RemoteEndpoint { domain, protocol }))
    }
}

/// Container names must match `[a-zA-Z0-9][a-zA-Z0-9_.-]*`
fn validate_container_name(id: &str) -> Result<()> {
    let mut chars = id.chars();
    let valid = match chars.next() {
        Some(first) => {
            first.is_ascii_alphanumeric()
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(invalid("id", format!("'{}' is not a valid container name", id)))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> OrchestratorError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
    .into()
}

fn missing(field: &str) -> OrchestratorError {
    ConfigError::MissingRequired {
        field: field.to_string(),
    }
    .into()
}

fn unsupported(profile: &ChainProfile, field: &str, value: String) -> OrchestratorError {
    ConfigError::Unsupported {
        field: field.to_string(),
        value,
        chain: profile.name.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::{BITCOIN, ETHEREUM, FUSE};

    #[test]
    fn test_defaults_come_from_profile() {
        let resolved = NodeConfig::default().resolve(&FUSE).unwrap();

        assert_eq!(resolved.identity.chain, "fuse");
        assert_eq!(resolved.identity.client, NodeClient::OpenEthereum);
        assert_eq!(resolved.identity.network, NetworkType::Mainnet);
        assert_eq!(resolved.identity.version, "2.0.1");
        assert_eq!(resolved.identity.client_version, "3.2.6");
        assert_eq!(resolved.identity.docker_image, "fusenet/node:2.0.1");
        assert_eq!(resolved.ports.peer_port, 30300);
        assert_eq!(resolved.ports.rpc_port, 8545);
        assert_eq!(resolved.limits.cpus, 6.0);
        assert_eq!(resolved.limits.memory_mb, 8192);
        assert_eq!(resolved.limits.docker_network, "cryptonodes");
        assert!(resolved.remote.is_none());
        assert!(Uuid::parse_str(&resolved.identity.id).is_ok());
    }

    #[test]
    fn test_default_version_is_deterministic() {
        let first = NodeConfig::default().resolve(&ETHEREUM).unwrap();
        let again = NodeConfig {
            version: Some(first.identity.version.clone()),
            ..Default::default()
        }
        .resolve(&ETHEREUM)
        .unwrap();

        assert_eq!(first.identity.version, again.identity.version);
        assert_eq!(first.identity.docker_image, again.identity.docker_image);
    }

    #[test]
    fn test_explicit_version_and_overrides() {
        let config = NodeConfig {
            id: Some("fuse-archive".to_string()),
            version: Some("2.5.13".to_string()),
            peer_port: Some(30400),
            docker_cpus: Some(2.5),
            docker_image: Some("registry.local/fuse:patched".to_string()),
            ..Default::default()
        };

        let resolved = config.resolve(&FUSE).unwrap();
        assert_eq!(resolved.identity.id, "fuse-archive");
        assert_eq!(resolved.identity.client_version, "2.5.13");
        assert_eq!(resolved.identity.docker_image, "registry.local/fuse:patched");
        assert_eq!(resolved.ports.peer_port, 30400);
        assert_eq!(resolved.ports.rpc_port, 8545);
        assert_eq!(resolved.limits.cpus, 2.5);
    }

    #[test]
    fn test_unknown_version_fails_before_io() {
        let config = NodeConfig {
            version: Some("9.9.9".to_string()),
            ..Default::default()
        };

        match config.resolve(&FUSE) {
            Err(OrchestratorError::UnknownVersion { version, .. }) => assert_eq!(version, "9.9.9"),
            other => panic!("expected UnknownVersion, got {:?}", other),
        }
    }

    #[test]
    fn test_version_from_other_network_is_rejected() {
        // 1.9.25 only ships for mainnet
        let config = NodeConfig {
            network: Some(NetworkType::Testnet),
            version: Some("1.9.25".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve(&ETHEREUM),
            Err(OrchestratorError::UnknownVersion { .. })
        ));
    }

    #[test]
    fn test_unsupported_network_and_client() {
        let testnet = NodeConfig {
            network: Some(NetworkType::Testnet),
            ..Default::default()
        };
        assert!(matches!(
            testnet.resolve(&FUSE),
            Err(OrchestratorError::Config(ConfigError::Unsupported { .. }))
        ));

        let geth = NodeConfig {
            client: Some(NodeClient::Geth),
            ..Default::default()
        };
        assert!(matches!(
            geth.resolve(&FUSE),
            Err(OrchestratorError::Config(ConfigError::Unsupported { .. }))
        ));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let cases = [
            NodeConfig {
                rpc_port: Some(0),
                ..Default::default()
            },
            NodeConfig {
                docker_cpus: Some(0.0),
                ..Default::default()
            },
            NodeConfig {
                docker_mem: Some(0),
                ..Default::default()
            },
            NodeConfig {
                id: Some("-leading-dash".to_string()),
                ..Default::default()
            },
            NodeConfig {
                chain: Some("eth".to_string()),
                ..Default::default()
            },
        ];

        for config in cases {
            assert!(
                matches!(
                    config.resolve(&FUSE),
                    Err(OrchestratorError::Config(ConfigError::InvalidValue { .. }))
                ),
                "{:?} should be rejected",
                config
            );
        }
    }

    #[test]
    fn test_remote_node_resolves_without_image() {
        let config = NodeConfig {
            remote: true,
            remote_domain: Some("fuse.example.org".to_string()),
            remote_protocol: Some("https".to_string()),
            ..Default::default()
        };

        let resolved = config.resolve(&FUSE).unwrap();
        assert_eq!(resolved.identity.docker_image, "");
        assert_eq!(resolved.remote.unwrap().url(8545), "https://fuse.example.org:8545");
    }

    #[test]
    fn test_remote_requires_domain() {
        let config = NodeConfig {
            remote: true,
            ..Default::default()
        };
        assert!(matches!(
            config.resolve(&FUSE),
            Err(OrchestratorError::Config(ConfigError::MissingRequired { .. }))
        ));
    }

    #[test]
    fn test_bitcoin_credentials_are_generated_once() {
        let resolved = NodeConfig::default().resolve(&BITCOIN).unwrap();
        let username = resolved.ports.rpc_username.clone().unwrap();
        assert!(username.starts_with("rpc-"));
        assert_eq!(resolved.ports.rpc_password.as_ref().unwrap().len(), 32);

        let explicit = NodeConfig {
            rpc_username: Some("alice".to_string()),
            rpc_password: Some("hunter2".to_string()),
            ..Default::default()
        }
        .resolve(&BITCOIN)
        .unwrap();
        assert_eq!(explicit.ports.rpc_username.as_deref(), Some("alice"));
        assert_eq!(explicit.ports.rpc_password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_bitcoin_with_persistent_config_needs_explicit_credentials() {
        let persistent = NodeConfig {
            config_path: Some(PathBuf::from("/srv/btc/bitcoin.conf")),
            ..Default::default()
        };
        match persistent.resolve(&BITCOIN) {
            Err(OrchestratorError::Config(ConfigError::MissingRequired { field })) => {
                assert_eq!(field, "rpc_username")
            }
            other => panic!("expected missing rpc_username, got {:?}", other),
        }

        let half = NodeConfig {
            rpc_username: Some("alice".to_string()),
            ..persistent.clone()
        };
        assert!(matches!(
            half.resolve(&BITCOIN),
            Err(OrchestratorError::Config(ConfigError::MissingRequired { ref field })) if field == "rpc_password"
        ));

        // Resolving twice yields the credentials the config file was written with
        let full = NodeConfig {
            rpc_username: Some("alice".to_string()),
            rpc_password: Some("hunter2".to_string()),
            ..persistent
        };
        let first = full.resolve(&BITCOIN).unwrap();
        let second = full.resolve(&BITCOIN).unwrap();
        assert_eq!(first.ports, second.ports);

        // Chains without credentials are unaffected
        let fuse = NodeConfig {
            config_path: Some(PathBuf::from("/srv/fuse/config.toml")),
            ..Default::default()
        };
        assert!(fuse.resolve(&FUSE).is_ok());
    }

    #[test]
    fn test_archival_requires_profile_support() {
        let archival = NodeConfig {
            archival: true,
            ..Default::default()
        };

        let resolved = archival.resolve(&ETHEREUM).unwrap();
        assert_eq!(resolved.identity.node_type, NodeType::Archival);
        assert_eq!(
            NodeConfig::default().resolve(&ETHEREUM).unwrap().identity.node_type,
            NodeType::Full
        );
        assert!(matches!(
            archival.resolve(&FUSE),
            Err(OrchestratorError::Config(ConfigError::Unsupported { ref field, .. })) if field == "node_type"
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_fields() {
        let parsed = NodeConfig::from_toml_str(
            r#"
chain = "fuse"
network = "mainnet"
rpc_port = 9545
"#,
        )
        .unwrap();
        assert_eq!(parsed.rpc_port, Some(9545));
        assert_eq!(parsed.network, Some(NetworkType::Mainnet));

        let err = NodeConfig::from_toml_str("chain = \"fuse\"\ndocker_memory = 10\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
