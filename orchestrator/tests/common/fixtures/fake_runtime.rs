//! Container runtime double
//!
//! Records every call, emits scripted output when a container starts and
//! reports a configurable exit code when it is stopped. No process is ever
//! spawned.

use async_trait::async_trait;
use orchestrator::docker::{ContainerHandle, ContainerRuntime, EventSender, ExitNotifier};
use orchestrator::{NodeEvent, OrchestratorError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeCall {
    Pull(String),
    EnsureNetwork(String),
    Run {
        container: String,
        image_ref: String,
        args: Vec<String>,
    },
    Stop(String),
}

struct Running {
    notifier: ExitNotifier,
    events: EventSender,
}

pub struct FakeRuntime {
    calls: Mutex<Vec<RuntimeCall>>,
    output: Mutex<Vec<NodeEvent>>,
    pull_failure: Mutex<Option<String>>,
    pull_gate: Mutex<Option<Arc<Notify>>>,
    pull_started: Arc<Notify>,
    run_gate: Mutex<Option<Arc<Notify>>>,
    run_started: Arc<Notify>,
    stop_code: Mutex<i32>,
    stop_failure: Mutex<bool>,
    running: Mutex<HashMap<String, Running>>,
}

impl FakeRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            output: Mutex::new(Vec::new()),
            pull_failure: Mutex::new(None),
            pull_gate: Mutex::new(None),
            pull_started: Arc::new(Notify::new()),
            run_gate: Mutex::new(None),
            run_started: Arc::new(Notify::new()),
            stop_code: Mutex::new(0),
            stop_failure: Mutex::new(false),
            running: Mutex::new(HashMap::new()),
        })
    }

    /// Events emitted as soon as a container is spawned
    pub fn set_output(&self, events: Vec<NodeEvent>) {
        *self.output.lock().unwrap() = events;
    }

    pub fn set_pull_failure(&self, reason: Option<&str>) {
        *self.pull_failure.lock().unwrap() = reason.map(str::to_string);
    }

    pub fn set_stop_code(&self, code: i32) {
        *self.stop_code.lock().unwrap() = code;
    }

    /// Make `stop` give up without the container exiting.
    pub fn set_stop_failure(&self, fail: bool) {
        *self.stop_failure.lock().unwrap() = fail;
    }

    /// Block every pull until the returned notify is triggered.
    pub fn hold_pulls(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.pull_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Resolves once a pull has begun
    pub async fn pull_started(&self) {
        self.pull_started.notified().await
    }

    /// Block every run until the returned notify is triggered.
    pub fn hold_runs(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.run_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Resolves once a run has begun
    pub async fn run_started(&self) {
        self.run_started.notified().await
    }

    /// Pretend something outside the orchestrator already owns `name`.
    pub fn occupy(&self, name: &str) -> ContainerHandle {
        let (handle, notifier) = ContainerHandle::new(name);
        let (events, _) = tokio::sync::mpsc::unbounded_channel();
        self.running
            .lock()
            .unwrap()
            .insert(name.to_string(), Running { notifier, events });
        handle
    }

    /// Make the container exit on its own with `code`.
    pub fn exit(&self, name: &str, code: i32) {
        if let Some(running) = self.running.lock().unwrap().remove(name) {
            finish(running, code);
        }
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn run_calls(&self) -> Vec<RuntimeCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, RuntimeCall::Run { .. }))
            .collect()
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.running.lock().unwrap().contains_key(name)
    }

    fn record(&self, call: RuntimeCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn finish(running: Running, code: i32) {
    let _ = running.events.send(NodeEvent::Close(code));
    // Anything after close must never reach subscribers
    let _ = running
        .events
        .send(NodeEvent::Output("late output".to_string()));
    running.notifier.notify(code);
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn pull(&self, image: &str, progress: &EventSender) -> Result<()> {
        self.record(RuntimeCall::Pull(image.to_string()));
        let _ = progress.send(NodeEvent::Output(format!("Pulling {}", image)));

        let gate = self.pull_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            self.pull_started.notify_one();
            gate.notified().await;
        }

        let failure = self.pull_failure.lock().unwrap().clone();
        match failure {
            Some(reason) => Err(OrchestratorError::Pull {
                image: image.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    async fn ensure_network(&self, name: &str) -> Result<()> {
        self.record(RuntimeCall::EnsureNetwork(name.to_string()));
        Ok(())
    }

    async fn run(
        &self,
        container: &str,
        image_ref: &str,
        args: &[String],
        events: EventSender,
    ) -> Result<ContainerHandle> {
        self.record(RuntimeCall::Run {
            container: container.to_string(),
            image_ref: image_ref.to_string(),
            args: args.to_vec(),
        });

        let gate = self.run_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            self.run_started.notify_one();
            gate.notified().await;
        }

        let mut running = self.running.lock().unwrap();
        if running.contains_key(container) {
            return Err(OrchestratorError::Run {
                container: container.to_string(),
                reason: format!("container name \"/{}\" is already in use", container),
            });
        }

        for event in self.output.lock().unwrap().iter() {
            let _ = events.send(event.clone());
        }
        let (handle, notifier) = ContainerHandle::new(container);
        running.insert(container.to_string(), Running { notifier, events });
        Ok(handle)
    }

    async fn stop(&self, handle: &ContainerHandle, grace: Duration) -> Result<()> {
        self.record(RuntimeCall::Stop(handle.name().to_string()));
        if handle.exit_code().is_some() {
            return Ok(());
        }
        if *self.stop_failure.lock().unwrap() {
            return Err(OrchestratorError::StopTimeout {
                container: handle.name().to_string(),
                grace_secs: grace.as_secs(),
            });
        }
        let code = *self.stop_code.lock().unwrap();
        let running = self.running.lock().unwrap().remove(handle.name());
        if let Some(running) = running {
            finish(running, code);
        }
        Ok(())
    }
}
