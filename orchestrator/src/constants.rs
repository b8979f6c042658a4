//! Crate-wide defaults for the container runtime and node lifecycle
//!
//! Grouped by concern so the runtime, lifecycle and filesystem defaults each
//! have a single source of truth.

use std::time::Duration;

/// Container runtime defaults
pub mod runtime {
    use super::Duration;

    /// Executable invoked for pull/network/create/start/stop/kill
    pub const DEFAULT_BINARY: &str = "docker";

    /// Bridge network every locally managed node attaches to unless overridden
    pub const DEFAULT_NETWORK: &str = "cryptonodes";

    /// Marker the runtime prints when `network create` hits an existing network
    pub const NETWORK_EXISTS_MARKER: &str = "already exists";

    /// Extra time allowed on top of the grace period for the runtime to report the exit
    pub const STOP_MARGIN: Duration = Duration::from_secs(5);

    /// Time allowed for the close event after a force kill
    pub const KILL_WAIT: Duration = Duration::from_secs(10);

    /// Read buffer for container stdout/stderr chunks
    pub const READ_CHUNK_BYTES: usize = 8192;
}

/// Node lifecycle defaults
pub mod lifecycle {
    use super::Duration;

    /// Grace period between the termination signal and the force kill
    pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(30);

    /// Close code for a start that failed or was cancelled before any
    /// container exit was observed
    pub const FAILED_START_EXIT_CODE: i32 = -1;
}

/// Remote endpoint defaults
pub mod remote {
    pub const DEFAULT_PROTOCOL: &str = "http";
}
