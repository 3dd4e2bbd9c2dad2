//! Shell-based admin command client.
//!
//! Runs each administrative command through the engine's shell binary
//! (`mongosh --quiet --eval ...`). One command means one child process, so
//! the "connection" is released when the child exits or is killed.

use async_trait::async_trait;
use quorumkit_core::{
    CommandResult, ConfigurationDocument, Credentials, ReplicaSetStatus, ServerAddress, ShardList,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::admin::AdminCommandClient;
use crate::error::{Result, TopologyError};

/// Configuration for the shell admin client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellAdminConfig {
    /// Shell binary used to run commands.
    pub shell_binary: PathBuf,

    /// Name of the initiation command the configuration document is passed to.
    pub initiate_command: String,

    /// Name of the status command used for replica set stability polling.
    pub status_command: String,

    /// Name of the router command listing registered shards.
    pub shard_list_command: String,

    /// Database credentials are checked against.
    pub auth_database: String,

    /// Delay between stability polls in milliseconds.
    pub poll_interval_ms: u64,

    /// Upper bound for a single shell invocation in milliseconds.
    pub command_timeout_ms: u64,
}

impl Default for ShellAdminConfig {
    fn default() -> Self {
        Self {
            shell_binary: PathBuf::from("mongosh"),
            initiate_command: "replSetInitiate".to_string(),
            status_command: "replSetGetStatus".to_string(),
            shard_list_command: "listShards".to_string(),
            auth_database: "admin".to_string(),
            poll_interval_ms: 1_000,
            command_timeout_ms: 30_000,
        }
    }
}

impl ShellAdminConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ShellAdminConfigBuilder {
        ShellAdminConfigBuilder::default()
    }

    /// Returns the poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the per-command timeout.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}

/// Builder for `ShellAdminConfig`.
#[derive(Debug, Default)]
pub struct ShellAdminConfigBuilder {
    config: ShellAdminConfig,
}

impl ShellAdminConfigBuilder {
    /// Sets the shell binary.
    pub fn shell_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.shell_binary = path.into();
        self
    }

    /// Sets the initiation command name.
    pub fn initiate_command(mut self, name: impl Into<String>) -> Self {
        self.config.initiate_command = name.into();
        self
    }

    /// Sets the status command name.
    pub fn status_command(mut self, name: impl Into<String>) -> Self {
        self.config.status_command = name.into();
        self
    }

    /// Sets the shard listing command name.
    pub fn shard_list_command(mut self, name: impl Into<String>) -> Self {
        self.config.shard_list_command = name.into();
        self
    }

    /// Sets the authentication database.
    pub fn auth_database(mut self, db: impl Into<String>) -> Self {
        self.config.auth_database = db.into();
        self
    }

    /// Sets the poll interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the per-command timeout.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ShellAdminConfig {
        self.config
    }
}

/// Admin client that drives the engine through its shell binary.
#[derive(Debug, Clone, Default)]
pub struct ShellAdminClient {
    config: ShellAdminConfig,
}

impl ShellAdminClient {
    /// Creates a client with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client with the given configuration.
    pub fn with_config(config: ShellAdminConfig) -> Self {
        Self { config }
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ShellAdminConfig {
        &self.config
    }

    /// Builds the shell arguments for one command against one node.
    fn command_args(
        &self,
        target: &ServerAddress,
        script: &str,
        credentials: Option<&Credentials>,
    ) -> Vec<String> {
        let mut args = vec![
            "--quiet".to_string(),
            format!("mongodb://{}/admin?directConnection=true", target),
        ];

        if let Some(creds) = credentials {
            args.extend([
                "--username".to_string(),
                creds.username().to_string(),
                "--password".to_string(),
                creds.password().to_string(),
                "--authenticationDatabase".to_string(),
                self.config.auth_database.clone(),
            ]);
        }

        args.extend(["--eval".to_string(), script.to_string()]);
        args
    }

    /// Wraps one admin command so that an engine-side failure is printed as
    /// an `ok: 0` reply instead of failing the shell.
    ///
    /// Errors without a server error code (network, server selection) are
    /// rethrown and surface as a non-zero exit.
    fn admin_command_script(command: &str, argument: &str) -> String {
        format!(
            "try {{ print(JSON.stringify(db.adminCommand({{ {command}: {argument} }}))) }} \
             catch (e) {{ if (e.code === undefined) {{ throw e; }} \
             print(JSON.stringify({{ ok: 0, errmsg: e.message, code: e.code, codeName: e.codeName }})) }}"
        )
    }

    fn initiate_script(&self, config: &ConfigurationDocument) -> String {
        Self::admin_command_script(&self.config.initiate_command, &config.to_string())
    }

    fn status_script(&self) -> String {
        Self::admin_command_script(&self.config.status_command, "1")
    }

    fn shard_list_script(&self) -> String {
        Self::admin_command_script(&self.config.shard_list_command, "1")
    }

    /// Runs one script and returns the last non-empty stdout line.
    async fn run_eval(
        &self,
        target: &ServerAddress,
        script: &str,
        credentials: Option<&Credentials>,
    ) -> Result<String> {
        debug!(target = %target, script = %script, "Executing admin command");

        let mut cmd = Command::new(&self.config.shell_binary);
        cmd.args(self.command_args(target, script, credentials))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.config.command_timeout(), cmd.output()).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(TopologyError::configuration(format!(
                    "admin shell {} not found",
                    self.config.shell_binary.display()
                )));
            }
            Ok(Err(e)) => return Err(TopologyError::transport(target.to_string(), e.to_string())),
            Err(_) => {
                return Err(TopologyError::transport(
                    target.to_string(),
                    format!("command timed out after {}ms", self.config.command_timeout_ms),
                ));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match stderr.trim() {
                "" => format!("shell exited with {}", output.status),
                msg => msg.to_string(),
            };
            return Err(TopologyError::transport(target.to_string(), reason));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    /// Asks each seed in turn for the status until one answers, and returns
    /// its healthy member count.
    async fn fetch_healthy_members(
        &self,
        seeds: &[ServerAddress],
        credentials: Option<&Credentials>,
    ) -> Result<usize> {
        let mut last_error = None;

        for seed in seeds {
            let reply = match self.run_eval(seed, &self.status_script(), credentials).await {
                Ok(reply) => reply,
                Err(e) if e.is_retryable() => {
                    last_error = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            match ReplicaSetStatus::from_json(&reply) {
                Ok(status) => return Ok(status.healthy_members()),
                Err(e) => last_error = Some(TopologyError::transport(seed.to_string(), e.to_string())),
            }
        }

        Err(last_error.unwrap_or_else(|| TopologyError::configuration("empty seed list")))
    }

    /// Returns the number of shards registered with `router`.
    async fn fetch_registered_shards(
        &self,
        router: &ServerAddress,
        credentials: Option<&Credentials>,
    ) -> Result<usize> {
        let reply = self
            .run_eval(router, &self.shard_list_script(), credentials)
            .await?;

        ShardList::from_json(&reply)
            .map(|list| list.registered())
            .map_err(|e| TopologyError::transport(router.to_string(), e.to_string()))
    }

    /// Repeats `fetch` until the reported count equals `expected`.
    ///
    /// Retryable errors count as "not yet stable".
    async fn poll_until<F, Fut>(
        &self,
        subject: &str,
        expected: usize,
        mut fetch: F,
    ) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<usize>>,
    {
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;

            match fetch().await {
                Ok(count) if count == expected => {
                    info!(subject, count, attempts = attempt, "Topology is stable");
                    return Ok(());
                }
                Ok(count) => {
                    debug!(subject, count, expected, "Topology not yet stable");
                }
                Err(e) if e.is_retryable() => {
                    warn!(subject, attempt, error = %e, "Status poll failed, retrying");
                }
                Err(e) => return Err(e),
            }

            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }
}

#[async_trait]
impl AdminCommandClient for ShellAdminClient {
    async fn initiate(
        &self,
        target: &ServerAddress,
        config: &ConfigurationDocument,
        credentials: Option<&Credentials>,
    ) -> Result<CommandResult> {
        let reply = self
            .run_eval(target, &self.initiate_script(config), credentials)
            .await?;

        let value: serde_json::Value = serde_json::from_str(&reply)?;
        Ok(CommandResult::new(value))
    }

    async fn poll_stability(
        &self,
        seeds: &[ServerAddress],
        expected_ready: usize,
        credentials: Option<&Credentials>,
    ) -> Result<()> {
        if expected_ready == 0 {
            return Ok(());
        }
        if seeds.is_empty() {
            return Err(TopologyError::configuration(
                "no ready nodes to poll for stability",
            ));
        }

        info!(
            seeds = %ServerAddress::join_seed_list(seeds),
            expected = expected_ready,
            "Waiting for replica set to become stable"
        );

        self.poll_until("healthy members", expected_ready, || {
            self.fetch_healthy_members(seeds, credentials)
        })
        .await
    }

    async fn poll_shard_registration(
        &self,
        router: &ServerAddress,
        expected_shards: usize,
        credentials: Option<&Credentials>,
    ) -> Result<()> {
        if expected_shards == 0 {
            return Ok(());
        }

        info!(
            router = %router,
            expected = expected_shards,
            "Waiting for shards to register with the router"
        );

        self.poll_until("registered shards", expected_shards, || {
            self.fetch_registered_shards(router, credentials)
        })
        .await
    }

    fn name(&self) -> &str {
        "shell"
    }
}
