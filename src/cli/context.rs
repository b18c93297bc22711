//! Shared setup for every CLI command: config discovery, operator identity,
//! state paths, and construction of the engine components.

use crate::approval::{ApprovalStore, ApprovalWorkflow, JsonFileApprovalStore};
use crate::audit::{AuditEvent, AuditLogger};
use crate::config::{parser, Config};
use crate::pipeline::BatchPipeline;
use crate::registry::ActionRegistry;
use crate::staging::StagedQueue;
use crate::utils::paths::{self, APPROVALS_FILE, LOGS_DIR, QUEUE_FILE};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Global options every command accepts.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub operator: Option<String>,
    pub state_dir: Option<PathBuf>,
}

/// Everything a command needs, resolved once.
pub struct Workspace {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub registry: Arc<ActionRegistry>,
    pub state_dir: PathBuf,
    pub operator: String,
}

impl Workspace {
    /// Resolve config, operator and state directory.
    ///
    /// Config: `--config`, else `.changegate.yaml` walking up from the
    /// working directory, else built-in defaults.
    /// Operator: `--operator`/`CHANGEGATE_OPERATOR`, else `operator:` in the
    /// config, else `$USER`.
    pub fn load(options: &GlobalOptions) -> Result<Self> {
        let config_path = match options.config {
            Some(ref path) => Some(path.clone()),
            None => {
                let cwd = std::env::current_dir().context("Failed to get current directory")?;
                paths::find_config_walking_up(&cwd)
            }
        };

        let config = match config_path {
            Some(ref path) => parser::parse_config_file(path)?,
            None => Config::default(),
        };

        let registry = Arc::new(config.action_registry()?);

        let state_dir = match options.state_dir {
            Some(ref dir) => paths::expand_home(dir),
            None => config.state_dir()?,
        };

        let operator = options
            .operator
            .clone()
            .or_else(|| config.operator.clone())
            .or_else(|| std::env::var("USER").ok())
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());
        let Some(operator) = operator else {
            bail!("No operator identity — pass --operator or set CHANGEGATE_OPERATOR");
        };

        Ok(Self {
            config,
            config_path,
            registry,
            state_dir,
            operator,
        })
    }

    pub fn queue_path(&self) -> PathBuf {
        self.state_dir.join(QUEUE_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.state_dir.join(LOGS_DIR)
    }

    pub fn load_queue(&self) -> Result<StagedQueue> {
        StagedQueue::load(self.queue_path())
    }

    pub fn save_queue(&self, queue: &StagedQueue) -> Result<()> {
        queue.save(self.queue_path())
    }

    pub fn approval_store(&self) -> Arc<dyn ApprovalStore> {
        Arc::new(JsonFileApprovalStore::new(self.state_dir.join(APPROVALS_FILE)))
    }

    pub fn pipeline(&self, dry_run: bool) -> BatchPipeline {
        BatchPipeline::new(
            self.registry.clone(),
            Arc::new(self.config.executor_set(dry_run)),
        )
        .with_batch_phrase(self.config.batch_phrase.clone())
        .with_min_reason_len(self.config.min_reason_len)
    }

    pub fn workflow(&self) -> ApprovalWorkflow {
        ApprovalWorkflow::new(
            self.registry.clone(),
            Arc::new(self.config.executor_set(false)),
            self.approval_store(),
            self.operator.clone(),
        )
        .with_min_reason_len(self.config.min_reason_len)
    }

    pub fn logger(&self) -> Result<AuditLogger> {
        AuditLogger::open_daily(self.log_dir(), &self.operator)
    }

    pub fn config_display(&self) -> String {
        match self.config_path {
            Some(ref path) => path.display().to_string(),
            None => "(built-in defaults)".to_string(),
        }
    }
}

/// Write an audit event. Failures are logged, never propagated.
pub fn audit(logger: &mut Option<AuditLogger>, event: AuditEvent, reason: Option<&str>) {
    if let Some(logger) = logger.as_mut() {
        if let Err(e) = logger.record(event, reason) {
            tracing::error!("Failed to write audit log: {:#}", e);
        }
    }
}

/// Open the audit logger, degrading to no logging on failure.
pub fn open_logger(workspace: &Workspace) -> Option<AuditLogger> {
    match workspace.logger() {
        Ok(logger) => Some(logger),
        Err(e) => {
            tracing::error!("Audit log unavailable: {:#}", e);
            None
        }
    }
}

/// Resolve a possibly relative path against the working directory.
pub fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
