//! Container runtime integration.
//!
//! `ContainerRuntime` is the only seam through which the orchestrator
//! performs external I/O: pulling images, ensuring the bridge network,
//! running a container and stopping it. `Docker` implements it by invoking
//! the runtime CLI.

mod cli;

pub use cli::Docker;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Notify};

use crate::errors::Result;

/// Event published for a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum NodeEvent {
    /// A chunk of container stdout (or pull progress); may end mid-line
    Output(String),
    /// A chunk of container stderr; may end mid-line
    Error(String),
    /// Final exit code; nothing follows it for the same container
    Close(i32),
}

pub type EventSender = mpsc::UnboundedSender<NodeEvent>;

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Pull `image`, forwarding progress lines as `NodeEvent::Output`.
    /// Not retried.
    async fn pull(&self, image: &str, progress: &EventSender) -> Result<()>;

    /// Create the bridge network `name`; an existing network is success.
    async fn ensure_network(&self, name: &str) -> Result<()>;

    /// Spawn the container and return once it is running. Output, error and
    /// a single close event are delivered on `events` afterwards.
    async fn run(
        &self,
        container: &str,
        image_ref: &str,
        args: &[String],
        events: EventSender,
    ) -> Result<ContainerHandle>;

    /// Terminate gracefully, force-kill after `grace`. Stopping an exited
    /// container succeeds immediately.
    async fn stop(&self, handle: &ContainerHandle, grace: Duration) -> Result<()>;
}

/// Reference to one running container
#[derive(Debug, Clone)]
pub struct ContainerHandle {
    name: String,
    exit: watch::Receiver<Option<i32>>,
    kill: Arc<Notify>,
}

/// Runtime side of a `ContainerHandle`: records the exit and receives force
/// kill requests.
#[derive(Debug)]
pub struct ExitNotifier {
    exit: watch::Sender<Option<i32>>,
    kill: Arc<Notify>,
}

impl ContainerHandle {
    pub fn new(name: impl Into<String>) -> (Self, ExitNotifier) {
        let (exit_tx, exit_rx) = watch::channel(None);
        let kill = Arc::new(Notify::new());
        (
            Self {
                name: name.into(),
                exit: exit_rx,
                kill: kill.clone(),
            },
            ExitNotifier {
                exit: exit_tx,
                kill,
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exit_code(&self) -> Option<i32> {
        *self.exit.borrow()
    }

    /// Wait for the container to exit and return its code.
    pub async fn wait(&self) -> i32 {
        let mut exit = self.exit.clone();
        let code = match exit.wait_for(|code| code.is_some()).await {
            Ok(code) => (*code).unwrap_or(-1),
            // Notifier dropped without an exit code
            Err(_) => self.exit_code().unwrap_or(-1),
        };
        code
    }

    /// Ask the runtime to kill the process backing this container.
    pub fn force_kill(&self) {
        self.kill.notify_one();
    }
}

impl ExitNotifier {
    pub fn notify(&self, code: i32) {
        self.exit.send_replace(Some(code));
    }

    pub async fn kill_requested(&self) {
        self.kill.notified().await
    }
}
