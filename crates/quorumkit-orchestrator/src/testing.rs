//! Spy implementations of the collaborator contracts for unit tests.

use async_trait::async_trait;
use quorumkit_core::{CommandResult, ConfigurationDocument, Credentials, ServerAddress};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::admin::AdminCommandClient;
use crate::error::{Result, TopologyError};
use crate::node::ManagedNode;

/// A node that records how often it was started and stopped.
#[derive(Debug)]
pub struct SpyNode {
    host: String,
    port: u16,
    ready: AtomicBool,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    fail_start: AtomicBool,
    fail_stop: AtomicBool,
}

impl SpyNode {
    pub fn with_host(host: &str, port: u16, ready: bool) -> Arc<Self> {
        Arc::new(Self {
            host: host.to_string(),
            port,
            ready: AtomicBool::new(ready),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            fail_start: AtomicBool::new(false),
            fail_stop: AtomicBool::new(false),
        })
    }

    pub fn stopped(port: u16) -> Arc<Self> {
        Self::with_host("localhost", port, false)
    }

    pub fn running(port: u16) -> Arc<Self> {
        Self::with_host("localhost", port, true)
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn fail_start(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }

    pub fn fail_stop(&self) {
        self.fail_stop.store(true, Ordering::SeqCst);
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManagedNode for SpyNode {
    async fn start(&self) -> Result<()> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(TopologyError::process_start_failed(
                self.address().to_string(),
                "spy refused to start",
            ));
        }
        self.set_ready(true);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(TopologyError::process_stop_failed(
                self.address().to_string(),
                "spy refused to stop",
            ));
        }
        self.set_ready(false);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }
}

/// Arguments of one `initiate` call.
#[derive(Debug, Clone)]
pub struct InitiateCall {
    pub target: ServerAddress,
    pub config: ConfigurationDocument,
    pub credentials: Option<Credentials>,
}

/// Arguments of one `poll_stability` call.
#[derive(Debug, Clone)]
pub struct PollCall {
    pub seeds: Vec<ServerAddress>,
    pub expected_ready: usize,
    pub credentials: Option<Credentials>,
}

/// Arguments of one `poll_shard_registration` call.
#[derive(Debug, Clone)]
pub struct ShardPollCall {
    pub router: ServerAddress,
    pub expected_shards: usize,
    pub credentials: Option<Credentials>,
}

/// An admin client that records its calls and answers immediately.
#[derive(Debug, Default)]
pub struct SpyAdminClient {
    initiate_calls: Mutex<Vec<InitiateCall>>,
    poll_calls: Mutex<Vec<PollCall>>,
    shard_poll_calls: Mutex<Vec<ShardPollCall>>,
    initiate_reply: Mutex<Option<CommandResult>>,
    unreachable: AtomicBool,
    never_stable: AtomicBool,
}

impl SpyAdminClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes `initiate` fail with a transport error.
    pub fn unreachable(&self) {
        self.unreachable.store(true, Ordering::SeqCst);
    }

    /// Makes `initiate` answer with `reply` instead of `{"ok": 1}`.
    pub fn answer_initiate_with(&self, reply: CommandResult) {
        *self.initiate_reply.lock().unwrap() = Some(reply);
    }

    /// Makes both stability polls wait forever.
    pub fn never_stable(&self) {
        self.never_stable.store(true, Ordering::SeqCst);
    }

    pub fn initiate_calls(&self) -> Vec<InitiateCall> {
        self.initiate_calls.lock().unwrap().clone()
    }

    pub fn poll_calls(&self) -> Vec<PollCall> {
        self.poll_calls.lock().unwrap().clone()
    }

    pub fn shard_poll_calls(&self) -> Vec<ShardPollCall> {
        self.shard_poll_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdminCommandClient for SpyAdminClient {
    async fn initiate(
        &self,
        target: &ServerAddress,
        config: &ConfigurationDocument,
        credentials: Option<&Credentials>,
    ) -> Result<CommandResult> {
        self.initiate_calls.lock().unwrap().push(InitiateCall {
            target: target.clone(),
            config: config.clone(),
            credentials: credentials.cloned(),
        });

        if self.unreachable.load(Ordering::SeqCst) {
            return Err(TopologyError::transport(target.to_string(), "connection refused"));
        }
        let reply = self.initiate_reply.lock().unwrap().clone();
        Ok(reply.unwrap_or_else(|| CommandResult::new(json!({"ok": 1}))))
    }

    async fn poll_stability(
        &self,
        seeds: &[ServerAddress],
        expected_ready: usize,
        credentials: Option<&Credentials>,
    ) -> Result<()> {
        self.poll_calls.lock().unwrap().push(PollCall {
            seeds: seeds.to_vec(),
            expected_ready,
            credentials: credentials.cloned(),
        });

        if self.never_stable.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn poll_shard_registration(
        &self,
        router: &ServerAddress,
        expected_shards: usize,
        credentials: Option<&Credentials>,
    ) -> Result<()> {
        self.shard_poll_calls.lock().unwrap().push(ShardPollCall {
            router: router.clone(),
            expected_shards,
            credentials: credentials.cloned(),
        });

        if self.never_stable.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "spy"
    }
}
