//! Chain profiles: the static data that makes one chain differ from another.
//!
//! A profile bundles the version catalog of every supported client, the
//! config template, default ports and default resources. The controller is
//! the same for every chain; only the profile changes.

mod bitcoin;
mod ethereum;
mod fuse;
mod xdai;

pub use bitcoin::BITCOIN;
pub use ethereum::ETHEREUM;
pub use fuse::FUSE;
pub use xdai::XDAI;

use crate::catalog::{filter_by_network, NetworkType, NodeClient, NodeType, VersionRecord};
use crate::errors::{ConfigError, Result};
use crate::node::model::PortAssignment;
use crate::template;

static PROFILES: [&ChainProfile; 4] = [&BITCOIN, &ETHEREUM, &FUSE, &XDAI];

pub fn all() -> &'static [&'static ChainProfile] {
    &PROFILES
}

pub fn find(ticker: &str) -> Option<&'static ChainProfile> {
    PROFILES.iter().copied().find(|p| p.ticker == ticker)
}

#[derive(Debug)]
pub struct ClientProfile {
    pub client: NodeClient,
    pub versions: &'static [VersionRecord],
    pub config_template: &'static str,
    /// Replaces the image's default entrypoint when it is unsuitable
    pub entrypoint: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultPorts {
    pub network: NetworkType,
    pub rpc: u16,
    pub peer: u16,
}

#[derive(Debug)]
pub struct ChainProfile {
    pub ticker: &'static str,
    pub name: &'static str,
    /// First entry is the default client
    pub clients: &'static [ClientProfile],
    /// First entry is the default network
    pub networks: &'static [NetworkType],
    pub node_types: &'static [NodeType],
    pub default_ports: &'static [DefaultPorts],
    pub default_cpus: f64,
    pub default_mem_mb: u64,
    /// Config template needs RPC credentials; they are generated when unset
    pub rpc_credentials: bool,
}

impl ChainProfile {
    pub fn client(&self, client: NodeClient) -> Option<&'static ClientProfile> {
        self.clients.iter().find(|c| c.client == client)
    }

    pub fn default_client(&self) -> Option<NodeClient> {
        self.clients.first().map(|c| c.client)
    }

    pub fn default_network(&self) -> Option<NetworkType> {
        self.networks.first().copied()
    }

    pub fn supports_network(&self, network: NetworkType) -> bool {
        self.networks.contains(&network)
    }

    /// Versions of `client` that run on `network`, in declaration order.
    /// Unknown clients yield an empty list.
    pub fn versions(&self, client: NodeClient, network: NetworkType) -> Vec<VersionRecord> {
        self.client(client)
            .map(|c| filter_by_network(c.versions, network))
            .unwrap_or_default()
    }

    pub fn default_ports(&self, network: NetworkType) -> Option<DefaultPorts> {
        self.default_ports
            .iter()
            .find(|p| p.network == network)
            .copied()
    }

    /// Render the client's config template with the given ports.
    pub fn generate_config(&self, client: NodeClient, ports: &PortAssignment) -> Result<String> {
        let profile = self.client(client).ok_or_else(|| ConfigError::Unsupported {
            field: "client".to_string(),
            value: client.to_string(),
            chain: self.name.to_string(),
        })?;
        Ok(template::render(
            profile.config_template,
            &ports.template_values(),
        )?)
    }
}
