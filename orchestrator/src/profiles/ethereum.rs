use super::{ChainProfile, ClientProfile, DefaultPorts};
use crate::catalog::{config_flag_args, NetworkType, NodeClient, NodeType, VersionRecord};
use crate::runtime_args::RuntimeContext;

const GETH_CONFIG: &str = r#"
[Eth]
SyncMode = "snap"

[Node]
DataDir = "/root/data"
KeyStoreDir = "/root/keystore"
HTTPHost = "0.0.0.0"
HTTPPort = {{RPC_PORT}}
HTTPVirtualHosts = ["*"]
HTTPModules = ["net", "web3", "eth"]

[Node.P2P]
MaxPeers = 50
ListenAddr = ":{{PEER_PORT}}"
"#;

const OPEN_ETHEREUM_CONFIG: &str = r#"
[parity]
base_path = "/root/data"
keys_path = "/root/keystore"

[rpc]
port = {{RPC_PORT}}
interface = "all"
cors = ["all"]
hosts = ["all"]
apis = ["web3", "eth", "net", "parity"]

[network]
port = {{PEER_PORT}}
"#;

/// Geth picks the test network from a flag rather than from its config file.
fn geth_args(record: &VersionRecord, ctx: &RuntimeContext<'_>) -> String {
    let mut args = format!(" --config={}", record.config_path);
    if ctx.identity.network == NetworkType::Testnet {
        args.push_str(" --goerli");
    }
    args
}

const GETH_VERSIONS: &[VersionRecord] = &[
    VersionRecord {
        version: "1.10.26",
        client_version: "1.10.26",
        image: "ethereum/client-go:v1.10.26",
        data_dir: "/root/data",
        wallet_dir: "/root/keystore",
        config_path: "/root/config.toml",
        networks: &[NetworkType::Mainnet, NetworkType::Testnet],
        breaking: false,
        runtime_args: geth_args,
    },
    VersionRecord {
        version: "1.9.25",
        client_version: "1.9.25",
        image: "ethereum/client-go:v1.9.25",
        data_dir: "/root/data",
        wallet_dir: "/root/keystore",
        config_path: "/root/config.toml",
        networks: &[NetworkType::Mainnet],
        breaking: true,
        runtime_args: geth_args,
    },
];

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

pub static ETHEREUM: ChainProfile = ChainProfile {
    ticker: "eth",
    name: "Ethereum",
    clients: &[
        ClientProfile {
            client: NodeClient::Geth,
            versions: GETH_VERSIONS,
            config_template: GETH_CONFIG,
            entrypoint: None,
        },
        ClientProfile {
            client: NodeClient::OpenEthereum,
            versions: OPEN_ETHEREUM_VERSIONS,
            config_template: OPEN_ETHEREUM_CONFIG,
            entrypoint: None,
        },
    ],
    networks: &[NetworkType::Mainnet, NetworkType::Testnet],
    node_types: &[NodeType::Full, NodeType::Archival],
    default_ports: &[
        DefaultPorts {
            network: NetworkType::Mainnet,
            rpc: 8545,
            peer: 30303,
        },
        DefaultPorts {
            network: NetworkType::Testnet,
            rpc: 18545,
            peer: 30304,
        },
    ],
    default_cpus: 4.0,
    default_mem_mb: 8192,
    rpc_credentials: false,
};
