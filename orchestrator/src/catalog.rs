//! Version catalog: which client builds exist, which image runs them and
//! which chain networks each build supports.
//!
//! Lookups are pure. Records keep their declaration order so that "first
//! entry" is a stable default across calls.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::runtime_args::RuntimeContext;

/// Chain network a node connects to (not the container network)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    Testnet,
}

/// Full-node implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeClient {
    OpenEthereum,
    Geth,
    BitcoinCore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Full,
    Archival,
}

impl NetworkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Mainnet => "mainnet",
            NetworkType::Testnet => "testnet",
        }
    }
}

impl NodeClient {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeClient::OpenEthereum => "open-ethereum",
            NodeClient::Geth => "geth",
            NodeClient::BitcoinCore => "bitcoin-core",
        }
    }
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Full => "full",
            NodeType::Archival => "archival",
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for NodeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(NetworkType::Mainnet),
            "testnet" => Ok(NetworkType::Testnet),
            other => Err(format!("unknown network '{}'", other)),
        }
    }
}

impl FromStr for NodeClient {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open-ethereum" => Ok(NodeClient::OpenEthereum),
            "geth" => Ok(NodeClient::Geth),
            "bitcoin-core" => Ok(NodeClient::BitcoinCore),
            other => Err(format!("unknown client '{}'", other)),
        }
    }
}

/// Produces the suffix appended to the image reference (flags the client
/// binary expects after the image tag).
pub type RuntimeArgsFn = fn(&VersionRecord, &RuntimeContext<'_>) -> String;

/// Catalog entry binding a client version to its image and in-container layout
#[derive(Clone, Copy, Serialize)]
pub struct VersionRecord {
    pub version: &'static str,
    pub client_version: &'static str,
    pub image: &'static str,
    pub data_dir: &'static str,
    pub wallet_dir: &'static str,
    pub config_path: &'static str,
    pub networks: &'static [NetworkType],
    /// On-disk format incompatible with earlier versions
    pub breaking: bool,
    #[serde(skip)]
    pub runtime_args: RuntimeArgsFn,
}

impl VersionRecord {
    pub fn supports(&self, network: NetworkType) -> bool {
        self.networks.contains(&network)
    }

    pub fn generate_runtime_args(&self, ctx: &RuntimeContext<'_>) -> String {
        (self.runtime_args)(self, ctx)
    }
}

impl fmt::Debug for VersionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionRecord")
            .field("version", &self.version)
            .field("client_version", &self.client_version)
            .field("image", &self.image)
            .field("data_dir", &self.data_dir)
            .field("wallet_dir", &self.wallet_dir)
            .field("config_path", &self.config_path)
            .field("networks", &self.networks)
            .field("breaking", &self.breaking)
            .finish_non_exhaustive()
    }
}

// Function pointers are not compared: two records describing the same build
// are equal even if they were declared in different places.
impl PartialEq for VersionRecord {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.client_version == other.client_version
            && self.image == other.image
            && self.data_dir == other.data_dir
            && self.wallet_dir == other.wallet_dir
            && self.config_path == other.config_path
            && self.networks == other.networks
            && self.breaking == other.breaking
    }
}

impl Eq for VersionRecord {}

/// Keep the records that support `network`, in declaration order.
pub fn filter_by_network(records: &[VersionRecord], network: NetworkType) -> Vec<VersionRecord> {
    records
        .iter()
        .filter(|record| record.supports(network))
        .copied()
        .collect()
}

/// Runtime args for clients that take everything from their config file
pub fn config_flag_args(record: &VersionRecord, _ctx: &RuntimeContext<'_>) -> String {
    format!(" --config={}", record.config_path)
}
