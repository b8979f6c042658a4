use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command as AsyncCommand};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::{ContainerHandle, ContainerRuntime, EventSender, ExitNotifier, NodeEvent};
use crate::constants::runtime;
use crate::errors::{OrchestratorError, Result};

/// `ContainerRuntime` backed by the docker-compatible CLI
#[derive(Debug, Clone)]
pub struct Docker {
    binary: String,
    /// Passed before every subcommand (e.g. `--context remote`)
    base_args: Vec<String>,
}

impl Default for Docker {
    fn default() -> Self {
        Self::new()
    }
}

impl Docker {
    pub fn new() -> Self {
        Self::with_binary(runtime::DEFAULT_BINARY)
    }

    /// Use another docker-compatible executable (e.g. `podman`)
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            base_args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn command(&self) -> AsyncCommand {
        let mut command = AsyncCommand::new(&self.binary);
        command.args(&self.base_args);
        command
    }

    /// Remove a container that was created but never started.
    async fn remove(&self, name: &str) {
        if let Err(e) = self.command().arg("rm").arg("-f").arg(name).output().await {
            warn!("Failed to spawn {} rm for {}: {}", self.binary, name, e);
        }
    }
}

#[async_trait]
impl ContainerRuntime for Docker {
    async fn pull(&self, image: &str, progress: &EventSender) -> Result<()> {
        info!("Pulling image {}", image);

        let pull_error = |reason: String| OrchestratorError::Pull {
            image: image.to_string(),
            reason,
        };

        let mut child = self
            .command()
            .arg("pull")
            .arg(image)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| pull_error(format!("failed to spawn {}: {}", self.binary, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| pull_error("stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| pull_error("stderr not captured".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut collected = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut collected).await;
            collected
        });

        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| pull_error(format!("failed to read progress: {}", e)))?
        {
            debug!("pull {}: {}", image, line);
            let _ = progress.send(NodeEvent::Output(line));
        }

        let status = child
            .wait()
            .await
            .map_err(|e| pull_error(format!("failed to wait for pull: {}", e)))?;
        let stderr = stderr_task.await.unwrap_or_default();

        if !status.success() {
            let reason = if stderr.trim().is_empty() {
                format!("exit code {}", exit_code(status))
            } else {
                stderr.trim().to_string()
            };
            error!("Pull of {} failed: {}", image, reason);
            return Err(pull_error(reason));
        }

        info!("Image {} is up to date", image);
        Ok(())
    }

    async fn ensure_network(&self, name: &str) -> Result<()> {
        let network_error = |reason: String| OrchestratorError::Network {
            name: name.to_string(),
            reason,
        };

        let output = self
            .command()
            .arg("network")
            .arg("create")
            .arg(name)
            .output()
            .await
            .map_err(|e| network_error(format!("failed to spawn {}: {}", self.binary, e)))?;

        if output.status.success() {
            info!("Created docker network {}", name);
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains(runtime::NETWORK_EXISTS_MARKER) {
            debug!("Docker network {} already exists", name);
            return Ok(());
        }

        Err(network_error(stderr.trim().to_string()))
    }

    async fn run(
        &self,
        container: &str,
        image_ref: &str,
        args: &[String],
        events: EventSender,
    ) -> Result<ContainerHandle> {
        let run_error = |reason: String| OrchestratorError::Run {
            container: container.to_string(),
            reason,
        };

        // The image reference may carry flags for the client binary after the tag.
        let mut image_parts = image_ref.split_whitespace();
        let image = image_parts
            .next()
            .ok_or_else(|| run_error("empty image reference".to_string()))?;

        debug!("{} create {} {}", self.binary, args.join(" "), image_ref);

        // Rejections by the daemon surface here, before anything is attached
        let created = self
            .command()
            .arg("create")
            .args(args)
            .arg(image)
            .args(image_parts)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| run_error(format!("failed to spawn {}: {}", self.binary, e)))?;

        if !created.status.success() {
            let stderr = String::from_utf8_lossy(&created.stderr);
            let reason = if stderr.trim().is_empty() {
                format!("exit code {}", exit_code(created.status))
            } else {
                stderr.trim().to_string()
            };
            error!("Creating container {} failed: {}", container, reason);
            return Err(run_error(reason));
        }
        debug!(
            "Created container {} ({})",
            container,
            String::from_utf8_lossy(&created.stdout).trim()
        );

        let mut start = self.command();
        start.arg("start").arg("-a");
        if args.iter().any(|arg| arg == "-i") {
            start.arg("-i");
        }
        let spawned = start
            .arg(container)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                self.remove(container).await;
                return Err(run_error(format!("failed to spawn {}: {}", self.binary, e)));
            }
        };

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| run_error("stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| run_error("stderr not captured".to_string()))?;

        let (handle, notifier) = ContainerHandle::new(container);
        let stdout_task = tokio::spawn(forward_chunks(stdout, events.clone(), NodeEvent::Output));
        let stderr_task = tokio::spawn(forward_chunks(stderr, events.clone(), NodeEvent::Error));
        tokio::spawn(supervise(
            child,
            container.to_string(),
            stdout_task,
            stderr_task,
            events,
            notifier,
        ));

        info!("Container {} started from {}", container, image);
        Ok(handle)
    }

    async fn stop(&self, handle: &ContainerHandle, grace: Duration) -> Result<()> {
        let name = handle.name();
        if let Some(code) = handle.exit_code() {
            debug!("Container {} already exited with code {}", name, code);
            return Ok(());
        }

        info!("Stopping container {} ({}s grace period)", name, grace.as_secs());
        match self
            .command()
            .arg("stop")
            .arg("-t")
            .arg(grace.as_secs().to_string())
            .arg(name)
            .output()
            .await
        {
            Ok(output) if !output.status.success() => {
                warn!(
                    "{} stop {} failed: {}",
                    self.binary,
                    name,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            Err(e) => warn!("Failed to spawn {} stop for {}: {}", self.binary, name, e),
            Ok(_) => {}
        }

        if timeout(grace + runtime::STOP_MARGIN, handle.wait()).await.is_ok() {
            return Ok(());
        }

        warn!("Container {} still running after grace period, killing it", name);
        if let Err(e) = self.command().arg("kill").arg(name).output().await {
            warn!("Failed to spawn {} kill for {}: {}", self.binary, name, e);
        }
        handle.force_kill();

        match timeout(runtime::KILL_WAIT, handle.wait()).await {
            Ok(code) => {
                info!("Container {} killed (exit code {})", name, code);
                Ok(())
            }
            Err(_) => Err(OrchestratorError::StopTimeout {
                container: name.to_string(),
                grace_secs: grace.as_secs(),
            }),
        }
    }
}

/// Forward raw chunks from a pipe as events, one event per read.
async fn forward_chunks<R>(mut reader: R, events: EventSender, wrap: fn(String) -> NodeEvent)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; runtime::READ_CHUNK_BYTES];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                // Keep draining even with no listener
                let _ = events.send(wrap(chunk));
            }
            Err(e) => {
                warn!("Failed to read container output: {}", e);
                break;
            }
        }
    }
}

/// Owns the runtime client process until it exits, then publishes the single
/// close event after both pipes are drained.
async fn supervise(
    mut child: Child,
    container: String,
    stdout_task: JoinHandle<()>,
    stderr_task: JoinHandle<()>,
    events: EventSender,
    notifier: ExitNotifier,
) {
    // Holding stdin open keeps `-i` containers attached.
    let _stdin = child.stdin.take();

    let exited = tokio::select! {
        status = child.wait() => Some(status),
        _ = notifier.kill_requested() => None,
    };
    let status = match exited {
        Some(status) => status,
        None => {
            warn!("Killing runtime client for container {}", container);
            if let Err(e) = child.start_kill() {
                warn!("Failed to kill runtime client for {}: {}", container, e);
            }
            child.wait().await
        }
    };

    let _ = futures::future::join(stdout_task, stderr_task).await;

    let code = match status {
        Ok(status) => exit_code(status),
        Err(e) => {
            error!("Failed to wait for container {}: {}", container, e);
            -1
        }
    };

    if code == 0 {
        info!("Container {} exited cleanly", container);
    } else {
        warn!("Container {} exited with code {}", container, code);
    }

    let _ = events.send(NodeEvent::Close(code));
    notifier.notify(code);
}

/// Exit code, or `128 + signal` when the process was killed by a signal
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
