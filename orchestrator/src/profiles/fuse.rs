use super::{ChainProfile, ClientProfile, DefaultPorts};
use crate::catalog::{config_flag_args, NetworkType, NodeClient, NodeType, VersionRecord};

const CONFIG: &str = r#"
[parity]
chain = "/home/parity/.local/share/io.parity.ethereum/spec.json"
db_path = "/root/data"
keys_path = "/root/keystore"

[rpc]
cors = ["all"]
port = {{RPC_PORT}}
interface = "all"
hosts = ["all"]
apis = ["web3", "eth", "net", "parity", "traces", "rpc", "secretstore"]

[websockets]
disable = true

[network]
port = {{PEER_PORT}}
reserved_peers="/home/parity/.local/share/io.parity.ethereum/bootnodes.txt"
"#;

const OPEN_ETHEREUM_VERSIONS: &[VersionRecord] = &[
    VersionRecord {
        version: "2.0.1",
        client_version: "3.2.6",
        image: "fusenet/node:2.0.1",
        data_dir: "/root/data",
        wallet_dir: "/root/keystore",
        config_path: "/root/config.toml",
        networks: &[NetworkType::Mainnet],
        breaking: false,
        runtime_args: config_flag_args,
    },
    VersionRecord {
        version: "2.5.13",
        client_version: "2.5.13",
        image: "fusenet/node:1.0.0",
        data_dir: "/root/data",
        wallet_dir: "/root/keystore",
        config_path: "/root/config.toml",
        networks: &[NetworkType::Mainnet],
        breaking: false,
        runtime_args: config_flag_args,
    },
];

pub static FUSE: ChainProfile = ChainProfile {
    ticker: "fuse",
    name: "Fuse",
    clients: &[ClientProfile {
        client: NodeClient::OpenEthereum,
        versions: OPEN_ETHEREUM_VERSIONS,
        config_template: CONFIG,
        entrypoint: Some("/usr/local/bin/parity"),
    }],
    networks: &[NetworkType::Mainnet],
    node_types: &[NodeType::Full],
    default_ports: &[DefaultPorts {
        network: NetworkType::Mainnet,
        rpc: 8545,
        peer: 30300,
    }],
    default_cpus: 6.0,
    default_mem_mb: 8192,
    rpc_credentials: false,
};
