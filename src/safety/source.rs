//! Status sources — point-in-time reads of each subsystem.
//!
//! The surrounding UI polls these; nothing is pushed. `collect_inputs`
//! gathers one read of each into a `SafetyInputs` for the evaluator.

use crate::safety::types::*;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn runtime_config(&self) -> Result<RuntimeConfig>;
    async fn irt_status(&self) -> Result<IrtStatus>;
    async fn rank_status(&self) -> Result<RankStatus>;
    async fn graph_health(&self) -> Result<GraphHealth>;
}

/// Read every status once.
pub async fn collect_inputs(source: &dyn StatusSource) -> Result<SafetyInputs> {
    Ok(SafetyInputs {
        runtime_config: source
            .runtime_config()
            .await
            .context("Failed to read runtime config")?,
        irt_status: source.irt_status().await.context("Failed to read IRT status")?,
        rank_status: source
            .rank_status()
            .await
            .context("Failed to read ranking status")?,
        graph_health: source
            .graph_health()
            .await
            .context("Failed to read graph health")?,
    })
}

/// Reads all four statuses from one JSON snapshot file, re-read on every call.
#[derive(Debug, Clone)]
pub struct SnapshotFileSource {
    path: PathBuf,
}

impl SnapshotFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read(&self) -> Result<SafetyInputs> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read status snapshot: {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse status snapshot: {}", self.path.display()))
    }
}

#[async_trait]
impl StatusSource for SnapshotFileSource {
    async fn runtime_config(&self) -> Result<RuntimeConfig> {
        Ok(self.read()?.runtime_config)
    }

    async fn irt_status(&self) -> Result<IrtStatus> {
        Ok(self.read()?.irt_status)
    }

    async fn rank_status(&self) -> Result<RankStatus> {
        Ok(self.read()?.rank_status)
    }

    async fn graph_health(&self) -> Result<GraphHealth> {
        Ok(self.read()?.graph_health)
    }
}

/// Fixed inputs, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticSource(pub SafetyInputs);

#[async_trait]
impl StatusSource for StaticSource {
    async fn runtime_config(&self) -> Result<RuntimeConfig> {
        Ok(self.0.runtime_config.clone())
    }

    async fn irt_status(&self) -> Result<IrtStatus> {
        Ok(self.0.irt_status.clone())
    }

    async fn rank_status(&self) -> Result<RankStatus> {
        Ok(self.0.rank_status.clone())
    }

    async fn graph_health(&self) -> Result<GraphHealth> {
        Ok(self.0.graph_health.clone())
    }
}
