//! Types produced by a batch apply run.

use crate::registry::ActionKind;
use crate::staging::StagedAction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-action status within one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Success | StepStatus::Failed | StepStatus::Skipped
        )
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepStatus::Pending => write!(f, "pending"),
            StepStatus::Running => write!(f, "running"),
            StepStatus::Success => write!(f, "success"),
            StepStatus::Failed => write!(f, "failed"),
            StepStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Progress update for one action, streamed to the caller as the run advances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyProgress {
    pub action_id: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApplyProgress {
    pub fn running(action_id: &str) -> Self {
        Self {
            action_id: action_id.to_string(),
            status: StepStatus::Running,
            message: None,
            error: None,
        }
    }

    pub fn success(action_id: &str, message: impl Into<String>) -> Self {
        Self {
            action_id: action_id.to_string(),
            status: StepStatus::Success,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failed(action_id: &str, error: impl Into<String>) -> Self {
        Self {
            action_id: action_id.to_string(),
            status: StepStatus::Failed,
            message: None,
            error: Some(error.into()),
        }
    }

    pub fn skipped(action_id: &str, message: impl Into<String>) -> Self {
        Self {
            action_id: action_id.to_string(),
            status: StepStatus::Skipped,
            message: Some(message.into()),
            error: None,
        }
    }
}

/// Advisory text telling the operator how to undo one applied action.
/// Never executed by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackSuggestion {
    pub action_id: String,
    pub kind: ActionKind,
    pub suggestion: String,
}

/// What the operator supplies to apply the staged queue.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Written justification, checked against the minimum length
    pub reason: String,
    /// Must match the batch-level confirmation literal
    pub confirmation_phrase: String,
    /// Identifier the run will carry, known before the first step
    pub run_id: String,
}

impl BatchRequest {
    pub fn new(reason: impl Into<String>, confirmation_phrase: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            confirmation_phrase: confirmation_phrase.into(),
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// The three-way breakdown of a batch run.
///
/// Partial failure is never collapsed into pass/fail: operators need to
/// know exactly which production mutations took effect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    /// Identifier for this run (shared by its audit entries)
    pub run_id: String,
    pub succeeded: Vec<StagedAction>,
    pub failed: Vec<StagedAction>,
    pub skipped: Vec<StagedAction>,
    pub rollback_suggestions: Vec<RollbackSuggestion>,
    /// Final (terminal) progress entry for every action, in queue order
    pub progress: Vec<ApplyProgress>,
}

impl BatchResult {
    pub fn is_full_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.skipped.len()
    }

    /// Error recorded for a failed action.
    pub fn error_for(&self, action_id: &str) -> Option<&str> {
        self.progress
            .iter()
            .find(|p| p.action_id == action_id && p.status == StepStatus::Failed)
            .and_then(|p| p.error.as_deref())
    }

    pub fn one_line(&self) -> String {
        format!(
            "{} actions | {} succeeded | {} failed | {} skipped",
            self.total(),
            self.succeeded.len(),
            self.failed.len(),
            self.skipped.len()
        )
    }
}
