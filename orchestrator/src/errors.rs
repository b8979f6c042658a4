//! Error types for the node orchestrator
//!
//! Resolution and validation failures are raised before any I/O happens.
//! Runtime failures (pull, network, run, stop) carry the runtime's own message.
//! A node that exits with a non-zero code is not an error: it is reported as a
//! `NodeEvent::Close` carrying the exit code.

use std::fmt;

pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Main error type for the orchestrator
#[derive(Debug)]
pub enum OrchestratorError {
    /// No catalog entry matches the requested client, network and version
    UnknownVersion {
        chain: String,
        client: String,
        network: String,
        version: String,
    },

    /// Invalid node configuration
    Config(ConfigError),

    /// Config template could not be rendered
    Template(TemplateError),

    /// Image pull failed (registry unreachable, missing tag)
    Pull { image: String, reason: String },

    /// Bridge network creation failed for a reason other than "already exists"
    Network { name: String, reason: String },

    /// The runtime failed to spawn the container
    Run { container: String, reason: String },

    /// The container did not terminate within its grace period and the force kill
    StopTimeout { container: String, grace_secs: u64 },

    /// `start()` was called while the node is starting, running or stopping
    AlreadyRunning { node_id: String, state: String },

    /// `stop()` arrived while `start()` was still pulling or ensuring the network
    StartCancelled { node_id: String },

    /// Filesystem staging failed
    Io { path: String, reason: String },
}

/// Node configuration error variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid configuration value
    InvalidValue { field: String, reason: String },

    /// Missing required configuration
    MissingRequired { field: String },

    /// Value not supported by the selected chain profile
    Unsupported {
        field: String,
        value: String,
        chain: String,
    },

    /// No chain profile with this ticker
    UnknownChain { chain: String },

    /// Configuration parsing error
    ParseError { reason: String },
}

/// Config template error variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// `{{NAME}}` where NAME is not a known placeholder
    UnknownPlaceholder { name: String },

    /// Known placeholder with no value supplied
    MissingValue { placeholder: String },

    /// `{{` without a closing `}}`
    Unterminated { offset: usize },
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorError::UnknownVersion {
                chain,
                client,
                network,
                version,
            } => {
                if version.is_empty() {
                    write!(
                        f,
                        "No {} version available for client '{}' on network '{}'",
                        chain, client, network
                    )
                } else {
                    write!(
                        f,
                        "Unknown {} version '{}' for client '{}' on network '{}'",
                        chain, version, client, network
                    )
                }
            }
            OrchestratorError::Config(e) => write!(f, "Configuration error: {}", e),
            OrchestratorError::Template(e) => write!(f, "Template error: {}", e),
            OrchestratorError::Pull { image, reason } => {
                write!(f, "Failed to pull image '{}': {}", image, reason)
            }
            OrchestratorError::Network { name, reason } => {
                write!(f, "Failed to create network '{}': {}", name, reason)
            }
            OrchestratorError::Run { container, reason } => {
                write!(f, "Failed to run container '{}': {}", container, reason)
            }
            OrchestratorError::StopTimeout {
                container,
                grace_secs,
            } => {
                write!(
                    f,
                    "Container '{}' did not exit within {}s grace period and force kill",
                    container, grace_secs
                )
            }
            OrchestratorError::AlreadyRunning { node_id, state } => {
                write!(f, "Node '{}' is already {}", node_id, state)
            }
            OrchestratorError::StartCancelled { node_id } => {
                write!(f, "Start of node '{}' cancelled by stop request", node_id)
            }
            OrchestratorError::Io { path, reason } => {
                write!(f, "I/O error on '{}': {}", path, reason)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigError::MissingRequired { field } => {
                write!(f, "Missing required field: {}", field)
            }
            ConfigError::Unsupported {
                field,
                value,
                chain,
            } => {
                write!(f, "{} '{}' is not supported by {}", field, value, chain)
            }
            ConfigError::UnknownChain { chain } => {
                write!(f, "Unknown chain '{}'", chain)
            }
            ConfigError::ParseError { reason } => {
                write!(f, "Failed to parse node config: {}", reason)
            }
        }
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::UnknownPlaceholder { name } => {
                write!(f, "Unknown placeholder '{{{{{}}}}}'", name)
            }
            TemplateError::MissingValue { placeholder } => {
                write!(f, "No value supplied for placeholder '{}'", placeholder)
            }
            TemplateError::Unterminated { offset } => {
                write!(f, "Unterminated placeholder at byte {}", offset)
            }
        }
    }
}

impl std::error::Error for OrchestratorError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for TemplateError {}

impl From<ConfigError> for OrchestratorError {
    fn from(err: ConfigError) -> Self {
        OrchestratorError::Config(err)
    }
}

impl From<TemplateError> for OrchestratorError {
    fn from(err: TemplateError) -> Self {
        OrchestratorError::Template(err)
    }
}

impl OrchestratorError {
    pub(crate) fn io(path: impl fmt::Display, err: std::io::Error) -> Self {
        OrchestratorError::Io {
            path: path.to_string(),
            reason: err.to_string(),
        }
    }
}
