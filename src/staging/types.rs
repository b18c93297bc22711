//! Types for staged (proposed, not yet executed) actions.

use crate::registry::types::{ActionKind, RiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An operator-proposed mutation held client-side pending review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedAction {
    /// Unique id, generated when the action is staged
    pub id: String,

    /// Which registry action this is
    pub kind: ActionKind,

    /// Opaque payload handed to the executor unchanged
    #[serde(default)]
    pub payload: Value,

    /// Risk tier copied from the registry at stage time
    pub risk: RiskLevel,

    /// One-line human-readable description of the change
    pub diff_summary: String,

    pub created_at: DateTime<Utc>,
}

impl StagedAction {
    /// First 8 characters of the id, for terminal display.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(8) {
            Some((end, _)) => &self.id[..end],
            None => self.id.as_str(),
        }
    }

    /// One-liner for logs and terminal output.
    pub fn describe(&self) -> String {
        format!("[{}] {} ({}): {}", self.short_id(), self.kind, self.risk, self.diff_summary)
    }
}
