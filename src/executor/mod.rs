//! Executors — the boundary where a confirmed action becomes a real mutation.
//!
//! Each action kind maps to one `ActionExecutor`. The batch pipeline and the
//! approval workflow both go through the same `ExecutorSet`, so a kind is
//! always executed the same way regardless of entry point.
//!
//! Executors report success or failure only. Idempotency and persistence
//! belong to the backend behind them; nothing here retries.

pub mod command;
pub mod dry_run;

pub use command::{CommandExecutor, CommandProbe};
pub use dry_run::DryRunExecutor;

use crate::registry::ActionKind;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Performs one action against the backend.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Execute the action. Returns a short human-readable message on success.
    async fn execute(&self, kind: ActionKind, payload: &Value) -> Result<String>;
}

/// Checks that the backend is reachable before a batch starts.
#[async_trait]
pub trait BackendProbe: Send + Sync {
    async fn check(&self) -> Result<()>;
}

/// Registered executors, keyed by action kind.
#[derive(Clone, Default)]
pub struct ExecutorSet {
    executors: HashMap<ActionKind, Arc<dyn ActionExecutor>>,
    /// Used for kinds without a dedicated executor (e.g. dry runs)
    fallback: Option<Arc<dyn ActionExecutor>>,
    probe: Option<Arc<dyn BackendProbe>>,
    step_timeout: Option<Duration>,
}

impl ExecutorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the executor for one kind, replacing any previous one.
    pub fn register(mut self, kind: ActionKind, executor: Arc<dyn ActionExecutor>) -> Self {
        self.executors.insert(kind, executor);
        self
    }

    pub fn with_fallback(mut self, executor: Arc<dyn ActionExecutor>) -> Self {
        self.fallback = Some(executor);
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn BackendProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Fail any single execution that takes longer than `timeout`.
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    pub fn has_executor(&self, kind: ActionKind) -> bool {
        self.executors.contains_key(&kind) || self.fallback.is_some()
    }

    /// Run the backend probe, if one is configured.
    pub async fn preflight(&self) -> Result<()> {
        match self.probe {
            Some(ref probe) => probe.check().await,
            None => Ok(()),
        }
    }

    /// Execute one action. A missing executor or a timeout is an ordinary
    /// failure, indistinguishable to callers from a backend error.
    pub async fn execute(&self, kind: ActionKind, payload: &Value) -> Result<String> {
        let executor = self
            .executors
            .get(&kind)
            .or(self.fallback.as_ref())
            .ok_or_else(|| anyhow!("no executor configured for {}", kind))?;

        match self.step_timeout {
            Some(limit) => tokio::time::timeout(limit, executor.execute(kind, payload))
                .await
                .map_err(|_| anyhow!("{} timed out after {}s", kind, limit.as_secs_f64()))?,
            None => executor.execute(kind, payload).await,
        }
    }
}

impl std::fmt::Debug for ExecutorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.executors.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("ExecutorSet")
            .field("kinds", &kinds)
            .field("fallback", &self.fallback.is_some())
            .field("probe", &self.probe.is_some())
            .field("step_timeout", &self.step_timeout)
            .finish()
    }
}
