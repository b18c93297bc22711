//! Executor that performs nothing — used by `--dry-run` to walk a batch
//! through the pipeline without touching production.

use crate::executor::ActionExecutor;
use crate::registry::ActionKind;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

pub struct DryRunExecutor;

#[async_trait]
impl ActionExecutor for DryRunExecutor {
    async fn execute(&self, kind: ActionKind, payload: &Value) -> Result<String> {
        tracing::info!("Dry run: {} payload={}", kind, payload);
        Ok(format!("dry run: {} not executed", kind))
    }
}
