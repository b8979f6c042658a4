use super::{ChainProfile, ClientProfile, DefaultPorts};
use crate::catalog::{NetworkType, NodeClient, NodeType, VersionRecord};
use crate::runtime_args::RuntimeContext;

// Network specific options are only honoured inside their section, so the
// ports are repeated for both.
const CONFIG: &str = r#"
server=1
txindex=1
rpcuser={{RPC_USERNAME}}
rpcpassword={{RPC_PASSWORD}}
rpcallowip=0.0.0.0/0

[main]
port={{PEER_PORT}}
rpcport={{RPC_PORT}}
rpcbind=0.0.0.0

[test]
port={{PEER_PORT}}
rpcport={{RPC_PORT}}
rpcbind=0.0.0.0
"#;

fn bitcoind_args(record: &VersionRecord, ctx: &RuntimeContext<'_>) -> String {
    let mut args = format!(" -conf={} -datadir={}", record.config_path, record.data_dir);
    if ctx.identity.network == NetworkType::Testnet {
        args.push_str(" -testnet");
    }
    args
}

const BITCOIN_CORE_VERSIONS: &[VersionRecord] = &[
    VersionRecord {
        version: "22.0",
        client_version: "22.0",
        image: "ruimarinho/bitcoin-core:22.0",
        data_dir: "/root/data",
        wallet_dir: "/root/wallets",
        config_path: "/root/bitcoin.conf",
        networks: &[NetworkType::Mainnet, NetworkType::Testnet],
        breaking: false,
        runtime_args: bitcoind_args,
    },
    VersionRecord {
        version: "0.21.1",
        client_version: "0.21.1",
        image: "ruimarinho/bitcoin-core:0.21.1",
        data_dir: "/root/data",
        wallet_dir: "/root/wallets",
        config_path: "/root/bitcoin.conf",
        networks: &[NetworkType::Mainnet, NetworkType::Testnet],
        breaking: false,
        runtime_args: bitcoind_args,
    },
];

pub static BITCOIN: ChainProfile = ChainProfile {
    ticker: "btc",
    name: "Bitcoin",
    clients: &[ClientProfile {
        client: NodeClient::BitcoinCore,
        versions: BITCOIN_CORE_VERSIONS,
        config_template: CONFIG,
        entrypoint: Some("bitcoind"),
    }],
    networks: &[NetworkType::Mainnet, NetworkType::Testnet],
    node_types: &[NodeType::Full],
    default_ports: &[
        DefaultPorts {
            network: NetworkType::Mainnet,
            rpc: 8332,
            peer: 8333,
        },
        DefaultPorts {
            network: NetworkType::Testnet,
            rpc: 18332,
            peer: 18333,
        },
    ],
    default_cpus: 4.0,
    default_mem_mb: 4096,
    rpc_credentials: true,
};
