//! Process-backed managed node.
//!
//! Launches a server binary as a child process and declares it ready once
//! its port accepts TCP connections.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Result, TopologyError};
use crate::node::ManagedNode;

/// Configuration for a process-backed node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessNodeConfig {
    /// Server binary to launch.
    pub binary: PathBuf,

    /// Arguments passed to the binary.
    #[serde(default)]
    pub args: Vec<String>,

    /// Host the server listens on.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the server listens on.
    pub port: u16,

    /// Time allowed for the port to start accepting connections.
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,

    /// Delay between readiness probes.
    #[serde(default = "default_probe_interval_ms")]
    pub probe_interval_ms: u64,

    /// Time allowed for a graceful shutdown before the process is killed.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_startup_timeout_ms() -> u64 {
    30_000
}

fn default_probe_interval_ms() -> u64 {
    250
}

fn default_shutdown_grace_ms() -> u64 {
    10_000
}

impl ProcessNodeConfig {
    /// Creates a new configuration builder.
    pub fn builder(binary: impl Into<PathBuf>, port: u16) -> ProcessNodeConfigBuilder {
        ProcessNodeConfigBuilder::new(binary, port)
    }

    /// Returns the startup timeout.
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    /// Returns the readiness probe interval.
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// Returns the graceful shutdown window.
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Builder for `ProcessNodeConfig`.
#[derive(Debug)]
pub struct ProcessNodeConfigBuilder {
    config: ProcessNodeConfig,
}

impl ProcessNodeConfigBuilder {
    /// Creates a new builder with default timings.
    pub fn new(binary: impl Into<PathBuf>, port: u16) -> Self {
        Self {
            config: ProcessNodeConfig {
                binary: binary.into(),
                args: Vec::new(),
                host: default_host(),
                port,
                startup_timeout_ms: default_startup_timeout_ms(),
                probe_interval_ms: default_probe_interval_ms(),
                shutdown_grace_ms: default_shutdown_grace_ms(),
            },
        }
    }

    /// Sets the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Adds an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.config.args.push(arg.into());
        self
    }

    /// Adds several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the startup timeout.
    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.config.startup_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the readiness probe interval.
    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.config.probe_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the graceful shutdown window.
    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.config.shutdown_grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ProcessNodeConfig {
        self.config
    }
}

/// A server node running as a child process of the harness.
pub struct ProcessNode {
    config: ProcessNodeConfig,
    child: Mutex<Option<Child>>,
    ready: AtomicBool,
}

impl ProcessNode {
    /// Creates a stopped node.
    pub fn new(config: ProcessNodeConfig) -> Self {
        Self {
            config,
            child: Mutex::new(None),
            ready: AtomicBool::new(false),
        }
    }

    /// Returns the node configuration.
    pub fn config(&self) -> &ProcessNodeConfig {
        &self.config
    }

    fn label(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Polls the port until it accepts a connection while the child is
    /// still running.
    ///
    /// A successful connect is confirmed one probe interval later, so a
    /// foreign process already bound to the port cannot mask a child that
    /// failed to bind and exited.
    async fn wait_for_port(&self, child: &mut Child) -> Result<()> {
        let deadline = tokio::time::Instant::now().checked_add(self.config.startup_timeout());
        let mut accepted = false;

        loop {
            if let Some(status) = child.try_wait()? {
                let reason = if accepted {
                    format!(
                        "process exited after port {} accepted connections ({}); \
                         the port is likely held by another process",
                        self.config.port, status
                    )
                } else {
                    format!("process exited before becoming ready ({})", status)
                };
                return Err(TopologyError::process_start_failed(self.label(), reason));
            }

            if accepted {
                return Ok(());
            }

            match TcpStream::connect((self.config.host.as_str(), self.config.port)).await {
                Ok(_) => accepted = true,
                Err(e) => debug!(node = %self.label(), error = %e, "Port not accepting yet"),
            }

            let expired = deadline.is_some_and(|d| tokio::time::Instant::now() >= d);
            if !accepted && expired {
                return Err(TopologyError::process_start_failed(
                    self.label(),
                    format!(
                        "port did not accept connections within {}ms",
                        self.config.startup_timeout_ms
                    ),
                ));
            }

            tokio::time::sleep(self.config.probe_interval()).await;
        }
    }

    /// Sends SIGTERM and waits for the grace period, then kills.
    async fn terminate(&self, child: &mut Child) -> Result<()> {
        if let Some(pid) = child.id() {
            let signalled = Command::new("kill")
                .arg("-TERM")
                .arg(pid.to_string())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .map(|s| s.success())
                .unwrap_or(false);

            if signalled {
                match tokio::time::timeout(self.config.shutdown_grace(), child.wait()).await {
                    Ok(Ok(status)) => {
                        debug!(node = %self.label(), status = %status, "Process exited");
                        return Ok(());
                    }
                    Ok(Err(e)) => {
                        return Err(TopologyError::process_stop_failed(self.label(), e.to_string()))
                    }
                    Err(_) => {
                        warn!(node = %self.label(), "Graceful shutdown timed out, killing process");
                    }
                }
            }
        }

        child
            .kill()
            .await
            .map_err(|e| TopologyError::process_stop_failed(self.label(), e.to_string()))
    }
}

#[async_trait]
impl ManagedNode for ProcessNode {
    async fn start(&self) -> Result<()> {
        let mut slot = self.child.lock().await;

        if slot.is_some() && self.is_ready() {
            debug!(node = %self.label(), "Node already running");
            return Ok(());
        }

        info!(
            node = %self.label(),
            binary = %self.config.binary.display(),
            "Starting node"
        );

        let mut child = Command::new(&self.config.binary)
            .args(&self.config.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TopologyError::process_start_failed(self.label(), e.to_string()))?;

        if let Err(e) = self.wait_for_port(&mut child).await {
            let _ = child.kill().await;
            return Err(e);
        }

        *slot = Some(child);
        self.ready.store(true, Ordering::SeqCst);

        info!(node = %self.label(), "Node ready");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let mut slot = self.child.lock().await;

        let Some(mut child) = slot.take() else {
            self.ready.store(false, Ordering::SeqCst);
            return Ok(());
        };

        info!(node = %self.label(), "Stopping node");

        let result = self.terminate(&mut child).await;
        self.ready.store(false, Ordering::SeqCst);

        if result.is_ok() {
            info!(node = %self.label(), "Node stopped");
        }
        result
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn host(&self) -> &str {
        &self.config.host
    }

    fn port(&self) -> u16 {
        self.config.port
    }
}

impl std::fmt::Debug for ProcessNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessNode")
            .field("config", &self.config)
            .field("ready", &self.is_ready())
            .finish()
    }
}
