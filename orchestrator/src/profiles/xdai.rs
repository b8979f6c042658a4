use super::{ChainProfile, ClientProfile, DefaultPorts};
use crate::catalog::{config_flag_args, NetworkType, NodeClient, NodeType, VersionRecord};

const CONFIG: &str = r#"
[parity]
chain = "xdai"
base_path = "/root/data"
keys_path = "/root/keystore"

[rpc]
port = {{RPC_PORT}}
interface = "all"
cors = ["all"]
hosts = ["all"]
apis = ["web3", "eth", "net", "parity"]

[websockets]
disable = true

[network]
port = {{PEER_PORT}}
"#;

const OPEN_ETHEREUM_VERSIONS: &[VersionRecord] = &[VersionRecord {
    version: "3.3.5",
    client_version: "3.3.5",
    image: "openethereum/openethereum:v3.3.5",
    data_dir: "/root/data",
    wallet_dir: "/root/keystore",
    config_path: "/root/config.toml",
    networks: &[NetworkType::Mainnet],
    breaking: false,
    runtime_args: config_flag_args,
}];

pub static XDAI: ChainProfile = ChainProfile {
    ticker: "xdai",
    name: "xDai",
    clients: &[ClientProfile {
        client: NodeClient::OpenEthereum,
        versions: OPEN_ETHEREUM_VERSIONS,
        config_template: CONFIG,
        entrypoint: None,
    }],
    networks: &[NetworkType::Mainnet],
    node_types: &[NodeType::Full, NodeType::Archival],
    default_ports: &[DefaultPorts {
        network: NetworkType::Mainnet,
        rpc: 8545,
        peer: 30303,
    }],
    default_cpus: 4.0,
    default_mem_mb: 4096,
    rpc_credentials: false,
};
