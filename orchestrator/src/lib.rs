pub mod catalog;
pub mod config;
pub mod constants;
pub mod docker;
pub mod errors;
pub mod node;
pub mod profiles;
pub mod runtime_args;
pub mod template;

// Re-export commonly used types
pub use catalog::{NetworkType, NodeClient, NodeType, VersionRecord};
pub use config::NodeConfig;
pub use docker::{ContainerHandle, ContainerRuntime, Docker, NodeEvent};
pub use errors::{OrchestratorError, Result};
pub use node::{LifecycleState, NodeController, NodeStatus, StartPhase};
pub use profiles::ChainProfile;
