//! Node lifecycle controller.
//!
//! A `NodeController` owns one resolved node and drives it through
//! `Idle -> Starting -> Running -> Stopping -> Stopped`, with `Failed` when a
//! start step errors. All container I/O goes through `ContainerRuntime`.

pub mod model;
mod storage;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::catalog::VersionRecord;
use crate::config::NodeConfig;
use crate::constants::lifecycle::{DEFAULT_STOP_GRACE, FAILED_START_EXIT_CODE};
use crate::docker::{ContainerHandle, ContainerRuntime, Docker, EventSender, NodeEvent};
use crate::errors::{OrchestratorError, Result};
use crate::profiles::ChainProfile;
use crate::runtime_args::{build_args, image_reference, RuntimeSpec};
use model::{
    HostPaths, NodeIdentity, PortAssignment, RemoteEndpoint, ResourceLimits, StorageLayout,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPhase {
    Preparing,
    Pulling,
    EnsuringNetwork,
    Spawning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "phase", rename_all = "snake_case")]
pub enum LifecycleState {
    Idle,
    Starting(StartPhase),
    Running,
    Stopping,
    Stopped,
    Failed,
}

impl LifecycleState {
    /// A start in this state is rejected
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            LifecycleState::Starting(_) | LifecycleState::Running | LifecycleState::Stopping
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Idle => write!(f, "idle"),
            LifecycleState::Starting(phase) => write!(f, "starting ({:?})", phase),
            LifecycleState::Running => write!(f, "running"),
            LifecycleState::Stopping => write!(f, "stopping"),
            LifecycleState::Stopped => write!(f, "stopped"),
            LifecycleState::Failed => write!(f, "failed"),
        }
    }
}

/// Snapshot returned by `NodeController::status`
#[derive(Debug, Clone, Serialize)]
pub struct NodeStatus {
    #[serde(flatten)]
    pub identity: NodeIdentity,
    pub chain_name: &'static str,
    pub state: LifecycleState,
    pub ports: PortAssignment,
    pub limits: ResourceLimits,
    pub endpoint: String,
    pub remote: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub uptime_seconds: Option<i64>,
    pub last_exit_code: Option<i32>,
}

const REDACTED: &str = "********";

struct Lifecycle {
    state: LifecycleState,
    handle: Option<ContainerHandle>,
    // Resolves to whether Close was delivered
    forwarder: Option<JoinHandle<bool>>,
    // Materialized once so restarts reuse the same directories
    host_paths: Option<HostPaths>,
    stop_requested: bool,
    started_at: Option<DateTime<Utc>>,
    last_exit_code: Option<i32>,
}

struct Shared {
    lifecycle: Mutex<Lifecycle>,
    subscribers: Mutex<Vec<EventSender>>,
}

impl Shared {
    async fn publish(&self, event: &NodeEvent) {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

pub struct NodeController {
    profile: &'static ChainProfile,
    identity: NodeIdentity,
    ports: PortAssignment,
    limits: ResourceLimits,
    storage: StorageLayout,
    remote: Option<RemoteEndpoint>,
    runtime: Arc<dyn ContainerRuntime>,
    stop_grace: Duration,
    shared: Arc<Shared>,
}

impl NodeController {
    /// Resolve `config` against `profile`. Fails on invalid input before any
    /// side effect.
    pub fn new(
        profile: &'static ChainProfile,
        config: &NodeConfig,
        runtime: Arc<dyn ContainerRuntime>,
    ) -> Result<Self> {
        let resolved = config.resolve(profile)?;
        Ok(Self {
            profile,
            identity: resolved.identity,
            ports: resolved.ports,
            limits: resolved.limits,
            storage: resolved.storage,
            remote: resolved.remote,
            runtime,
            stop_grace: DEFAULT_STOP_GRACE,
            shared: Arc::new(Shared {
                lifecycle: Mutex::new(Lifecycle {
                    state: LifecycleState::Idle,
                    handle: None,
                    forwarder: None,
                    host_paths: None,
                    stop_requested: false,
                    started_at: None,
                    last_exit_code: None,
                }),
                subscribers: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn with_docker(profile: &'static ChainProfile, config: &NodeConfig) -> Result<Self> {
        Self::new(profile, config, Arc::new(Docker::new()))
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn id(&self) -> &str {
        &self.identity.id
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    pub fn profile(&self) -> &'static ChainProfile {
        self.profile
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// RPC URL: the remote endpoint, or the mapped local port.
    pub fn endpoint(&self) -> String {
        match &self.remote {
            Some(remote) => remote.url(self.ports.rpc_port),
            None => format!("http://localhost:{}", self.ports.rpc_port),
        }
    }

    /// Versions available for this node's client and network
    pub fn versions(&self) -> Vec<VersionRecord> {
        self.profile.versions(self.identity.client, self.identity.network)
    }

    pub fn version_record(&self) -> Result<VersionRecord> {
        self.versions()
            .into_iter()
            .find(|record| record.version == self.identity.version)
            .ok_or_else(|| OrchestratorError::UnknownVersion {
                chain: self.identity.chain.to_string(),
                client: self.identity.client.to_string(),
                network: self.identity.network.to_string(),
                version: self.identity.version.clone(),
            })
    }

    /// Render the client config for this node's ports.
    pub fn generate_config(&self) -> Result<String> {
        self.profile.generate_config(self.identity.client, &self.ports)
    }

    /// Same as `generate_config` with the RPC password masked, for display.
    pub fn redacted_config(&self) -> Result<String> {
        let mut ports = self.ports.clone();
        if ports.rpc_password.is_some() {
            ports.rpc_password = Some(REDACTED.to_string());
        }
        self.profile.generate_config(self.identity.client, &ports)
    }

    /// Receive every event published from now on. Events are dropped for
    /// receivers that have gone away.
    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<NodeEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared.subscribers.lock().await.push(tx);
        rx
    }

    pub async fn state(&self) -> LifecycleState {
        self.shared.lifecycle.lock().await.state
    }

    pub async fn status(&self) -> NodeStatus {
        let lifecycle = self.shared.lifecycle.lock().await;
        let uptime_seconds = match (lifecycle.state, lifecycle.started_at) {
            (LifecycleState::Running | LifecycleState::Stopping, Some(started)) => {
                Some((Utc::now() - started).num_seconds())
            }
            _ => None,
        };
        NodeStatus {
            identity: self.identity.clone(),
            chain_name: self.profile.name,
            state: lifecycle.state,
            ports: self.ports.clone(),
            limits: self.limits.clone(),
            endpoint: self.endpoint(),
            remote: self.is_remote(),
            started_at: lifecycle.started_at,
            uptime_seconds,
            last_exit_code: lifecycle.last_exit_code,
        }
    }

    /// Prepare storage, pull the image, ensure the network and spawn the
    /// container. Returns once the container is running; output and the
    /// final close event arrive through `subscribe`.
    #[instrument(skip(self), fields(node = %self.identity.id))]
    pub async fn start(&self) -> Result<()> {
        if let Some(remote) = &self.remote {
            info!(
                "Remote node at {}, nothing to start",
                remote.url(self.ports.rpc_port)
            );
            return Ok(());
        }

        {
            let mut lifecycle = self.shared.lifecycle.lock().await;
            if lifecycle.state.is_active() {
                return Err(OrchestratorError::AlreadyRunning {
                    node_id: self.identity.id.clone(),
                    state: lifecycle.state.to_string(),
                });
            }
            lifecycle.state = LifecycleState::Starting(StartPhase::Preparing);
            lifecycle.stop_requested = false;
            lifecycle.last_exit_code = None;
            lifecycle.started_at = None;
            lifecycle.handle = None;
            lifecycle.forwarder = None;
        }

        match self.launch().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.abandon_start(&e).await;
                Err(e)
            }
        }
    }

    /// Settle the state after a failed or cancelled start and make sure
    /// subscribers still see exactly one close event for the attempt.
    async fn abandon_start(&self, e: &OrchestratorError) {
        let (forwarder, container_alive) = {
            let mut lifecycle = self.shared.lifecycle.lock().await;
            let alive = lifecycle
                .handle
                .as_ref()
                .is_some_and(|handle| handle.exit_code().is_none());
            if alive {
                // The container outlived a failed cancel; its forwarder
                // delivers Close when it exits
                (None, true)
            } else {
                (lifecycle.forwarder.take(), false)
            }
        };

        // Every sender is gone here, so the forwarder drains and ends
        let closed = match forwarder {
            Some(forwarder) => forwarder.await.unwrap_or_else(|err| {
                warn!("Event forwarder ended abnormally: {}", err);
                false
            }),
            None => false,
        };

        let mut lifecycle = self.shared.lifecycle.lock().await;
        if container_alive {
            error!("Failed to cancel start, container still running: {}", e);
            lifecycle.state = LifecycleState::Running;
            lifecycle.started_at.get_or_insert_with(Utc::now);
            return;
        }

        if let OrchestratorError::StartCancelled { .. } = e {
            info!("Start cancelled by stop request");
            lifecycle.state = LifecycleState::Stopped;
        } else {
            error!("Failed to start node: {}", e);
            lifecycle.state = LifecycleState::Failed;
        }

        if !closed {
            lifecycle.last_exit_code = Some(FAILED_START_EXIT_CODE);
            // Published under the lifecycle lock so a new start cannot
            // interleave its events before this close
            self.shared
                .publish(&NodeEvent::Close(FAILED_START_EXIT_CODE))
                .await;
        }
    }

    async fn launch(&self) -> Result<()> {
        let record = self.version_record()?;
        let entrypoint = self
            .profile
            .client(self.identity.client)
            .and_then(|client| client.entrypoint);

        let host = self.host_paths().await;
        storage::prepare(&host, || self.generate_config()).await?;

        let args = build_args(&RuntimeSpec {
            identity: &self.identity,
            ports: &self.ports,
            limits: &self.limits,
            host: &host,
            record: &record,
            entrypoint,
        });
        let image_ref = image_reference(&self.identity, &self.ports, &record);

        // Forward from the start so pull progress reaches subscribers
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let forwarder = tokio::spawn(forward_events(
            self.shared.clone(),
            self.identity.id.clone(),
            events_rx,
        ));
        self.shared.lifecycle.lock().await.forwarder = Some(forwarder);

        self.set_phase(StartPhase::Pulling).await;
        self.runtime
            .pull(&self.identity.docker_image, &events_tx)
            .await?;

        self.set_phase(StartPhase::EnsuringNetwork).await;
        self.runtime
            .ensure_network(&self.limits.docker_network)
            .await?;

        {
            let mut lifecycle = self.shared.lifecycle.lock().await;
            if lifecycle.stop_requested {
                return Err(self.cancelled());
            }
            lifecycle.state = LifecycleState::Starting(StartPhase::Spawning);
        }

        debug!("Running container with args {:?} {}", args, image_ref);
        let handle = self
            .runtime
            .run(&self.identity.id, &image_ref, &args, events_tx)
            .await?;

        let cancel = {
            let mut lifecycle = self.shared.lifecycle.lock().await;
            lifecycle.handle = Some(handle.clone());
            if lifecycle.stop_requested {
                lifecycle.state = LifecycleState::Stopping;
                true
            } else {
                // A container that already exited was moved to Stopped by the
                // forwarder
                if lifecycle.state == LifecycleState::Starting(StartPhase::Spawning) {
                    lifecycle.state = LifecycleState::Running;
                    lifecycle.started_at = Some(Utc::now());
                }
                false
            }
        };

        if cancel {
            self.runtime.stop(&handle, self.stop_grace).await?;
            return Err(self.cancelled());
        }

        info!(
            "Node {} running with image {}",
            self.identity.id, self.identity.docker_image
        );
        Ok(())
    }

    /// Stop the container, waiting up to the grace period before a force
    /// kill. A node that is not running is left alone; a node that is still
    /// starting aborts before its container is spawned.
    #[instrument(skip(self), fields(node = %self.identity.id))]
    pub async fn stop(&self) -> Result<()> {
        if self.remote.is_some() {
            return Ok(());
        }

        let (handle, forwarder) = {
            let mut lifecycle = self.shared.lifecycle.lock().await;
            match lifecycle.state {
                LifecycleState::Idle | LifecycleState::Stopped | LifecycleState::Failed => {
                    debug!("Node is {}, nothing to stop", lifecycle.state);
                    return Ok(());
                }
                LifecycleState::Starting(phase) => {
                    info!("Stop requested while starting ({:?})", phase);
                    lifecycle.stop_requested = true;
                    return Ok(());
                }
                LifecycleState::Running | LifecycleState::Stopping => {}
            }
            let Some(handle) = lifecycle.handle.clone() else {
                lifecycle.state = LifecycleState::Stopped;
                return Ok(());
            };
            lifecycle.state = LifecycleState::Stopping;
            (handle, lifecycle.forwarder.take())
        };

        info!("Stopping container {}", handle.name());
        match self.runtime.stop(&handle, self.stop_grace).await {
            Ok(()) => {
                // Close has been sent; let the forwarder deliver it
                if let Some(forwarder) = forwarder {
                    if let Err(e) = forwarder.await {
                        warn!("Event forwarder ended abnormally: {}", e);
                    }
                }
                let mut lifecycle = self.shared.lifecycle.lock().await;
                if lifecycle.state == LifecycleState::Stopping {
                    lifecycle.state = LifecycleState::Stopped;
                }
                info!("Node stopped");
                Ok(())
            }
            Err(e) => {
                let mut lifecycle = self.shared.lifecycle.lock().await;
                if lifecycle.forwarder.is_none() {
                    lifecycle.forwarder = forwarder;
                }
                lifecycle.state = if handle.exit_code().is_some() {
                    LifecycleState::Stopped
                } else {
                    LifecycleState::Running
                };
                error!("Failed to stop node: {}", e);
                Err(e)
            }
        }
    }

    async fn host_paths(&self) -> HostPaths {
        let mut lifecycle = self.shared.lifecycle.lock().await;
        lifecycle
            .host_paths
            .get_or_insert_with(|| self.storage.materialize())
            .clone()
    }

    async fn set_phase(&self, phase: StartPhase) {
        self.shared.lifecycle.lock().await.state = LifecycleState::Starting(phase);
    }

    fn cancelled(&self) -> OrchestratorError {
        OrchestratorError::StartCancelled {
            node_id: self.identity.id.clone(),
        }
    }
}

async fn forward_events(
    shared: Arc<Shared>,
    node_id: String,
    mut events: mpsc::UnboundedReceiver<NodeEvent>,
) -> bool {
    while let Some(event) = events.recv().await {
        let NodeEvent::Close(code) = event else {
            shared.publish(&event).await;
            continue;
        };

        // Held through the publish so nothing from a later start precedes it
        let mut lifecycle = shared.lifecycle.lock().await;
        lifecycle.last_exit_code = Some(code);
        if matches!(
            lifecycle.state,
            LifecycleState::Running
                | LifecycleState::Stopping
                | LifecycleState::Starting(StartPhase::Spawning)
        ) {
            lifecycle.state = LifecycleState::Stopped;
        }
        if code == 0 {
            info!("Node {} exited", node_id);
        } else {
            warn!("Node {} exited with code {}", node_id, code);
        }
        shared.publish(&event).await;
        return true;
    }
    false
}
