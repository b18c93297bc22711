//! Runtime configuration: registry overrides, phrases, executors, state paths.

pub mod linter;
pub mod parser;

use crate::executor::{CommandExecutor, CommandProbe, DryRunExecutor, ExecutorSet};
use crate::registry::defaults::{DEFAULT_BATCH_PHRASE, DEFAULT_MIN_REASON_LEN};
use crate::registry::{ActionKind, ActionRegistry, ActionSpec};
use crate::utils::paths;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Parsed `.changegate.yaml`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Registry name (e.g. "prod-admin-v1")
    pub registry: String,
    pub description: Option<String>,
    /// Default operator identity
    pub operator: Option<String>,
    /// Literal that confirms a whole batch
    pub batch_phrase: String,
    pub min_reason_len: usize,
    pub step_timeout: Option<Duration>,
    /// Where the queue, approvals and logs live (default ~/.changegate)
    pub state_dir: Option<PathBuf>,
    /// Status snapshot read by `changegate status`
    pub status_snapshot: Option<PathBuf>,
    /// Health-check command run before every batch
    pub preflight: Option<String>,
    /// Entries that replace built-in registry entries
    pub actions: Vec<ActionSpec>,
    /// Shell command per action kind
    pub executors: BTreeMap<ActionKind, String>,
    /// Directory the config was loaded from; relative paths resolve here
    pub base_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry: "default".to_string(),
            description: None,
            operator: None,
            batch_phrase: DEFAULT_BATCH_PHRASE.to_string(),
            min_reason_len: DEFAULT_MIN_REASON_LEN,
            step_timeout: None,
            state_dir: None,
            status_snapshot: None,
            preflight: None,
            actions: Vec::new(),
            executors: BTreeMap::new(),
            base_dir: None,
        }
    }
}

impl Config {
    /// Built-in registry with this config's overrides applied.
    pub fn action_registry(&self) -> Result<ActionRegistry> {
        Ok(ActionRegistry::builtin()?.with_overrides(self.actions.iter().cloned()))
    }

    /// Executors for every configured kind. With `dry_run`, every kind goes
    /// to the dry-run executor and nothing is executed.
    pub fn executor_set(&self, dry_run: bool) -> ExecutorSet {
        let mut set = ExecutorSet::new();
        if dry_run {
            return set.with_fallback(Arc::new(DryRunExecutor));
        }

        for (kind, command) in &self.executors {
            let mut executor = CommandExecutor::new(command.clone());
            if let Some(ref dir) = self.base_dir {
                executor = executor.in_dir(dir);
            }
            set = set.register(*kind, Arc::new(executor));
        }
        if let Some(ref command) = self.preflight {
            set = set.with_probe(Arc::new(CommandProbe::new(command.clone())));
        }
        if let Some(timeout) = self.step_timeout {
            set = set.with_step_timeout(timeout);
        }
        set
    }

    /// Resolve the state directory.
    pub fn state_dir(&self) -> Result<PathBuf> {
        match self.state_dir {
            Some(ref dir) => Ok(self.resolve(dir)),
            None => paths::default_state_dir(),
        }
    }

    pub fn status_snapshot_path(&self) -> Option<PathBuf> {
        self.status_snapshot.as_ref().map(|p| self.resolve(p))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        let expanded = paths::expand_home(path);
        match self.base_dir {
            Some(ref base) if expanded.is_relative() => base.join(expanded),
            _ => expanded,
        }
    }
}
