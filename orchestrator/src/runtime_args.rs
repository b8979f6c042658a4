//! Container runtime argument construction.
//!
//! The order of the produced arguments is fixed so that a node always yields
//! the same command line for the same inputs.

use crate::catalog::VersionRecord;
use crate::node::model::{HostPaths, NodeIdentity, PortAssignment, ResourceLimits};

/// What a version's runtime-args generator may look at
#[derive(Debug, Clone, Copy)]
pub struct RuntimeContext<'a> {
    pub identity: &'a NodeIdentity,
    pub ports: &'a PortAssignment,
}

/// Everything needed to build the `run` arguments of one node
#[derive(Debug, Clone, Copy)]
pub struct RuntimeSpec<'a> {
    pub identity: &'a NodeIdentity,
    pub ports: &'a PortAssignment,
    pub limits: &'a ResourceLimits,
    pub host: &'a HostPaths,
    pub record: &'a VersionRecord,
    pub entrypoint: Option<&'a str>,
}

pub fn build_args(spec: &RuntimeSpec<'_>) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        "--rm".to_string(),
        "--memory".to_string(),
        format!("{}MB", spec.limits.memory_mb),
        "--cpus".to_string(),
        spec.limits.cpus.to_string(),
        "--name".to_string(),
        spec.identity.id.clone(),
        "--network".to_string(),
        spec.limits.docker_network.clone(),
        "-p".to_string(),
        format!("{}:{}", spec.ports.rpc_port, spec.ports.rpc_port),
        "-p".to_string(),
        format!("{}:{}", spec.ports.peer_port, spec.ports.peer_port),
    ];

    if let Some(entrypoint) = spec.entrypoint {
        args.push("--entrypoint".to_string());
        args.push(entrypoint.to_string());
    }

    let mounts = [
        (&spec.host.data_dir, spec.record.data_dir),
        (&spec.host.wallet_dir, spec.record.wallet_dir),
        (&spec.host.config_path, spec.record.config_path),
    ];
    for (host, container) in mounts {
        args.push("-v".to_string());
        args.push(format!("{}:{}", host.display(), container));
    }

    args
}

/// Image to run followed by any flags the version appends after the tag
pub fn image_reference(
    identity: &NodeIdentity,
    ports: &PortAssignment,
    record: &VersionRecord,
) -> String {
    let ctx = RuntimeContext { identity, ports };
    format!("{}{}", identity.docker_image, record.generate_runtime_args(&ctx))
}
