//! Types for the change audit log.
//!
//! Every change-control event is logged: staging, removal, each batch step,
//! every approval request and decision. Operators reconstruct "what actually
//! changed in production" from this log.

use crate::approval::ApprovalStatus;
use crate::pipeline::StepStatus;
use crate::registry::{ActionKind, RiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// An action was added to the staged queue
    Staged {
        action_id: String,
        kind: ActionKind,
        risk: RiskLevel,
        diff_summary: String,
    },
    /// An action was removed from the queue without running
    Removed { action_id: String, kind: ActionKind },
    /// The whole queue was cleared
    Cleared { count: usize },
    /// A batch apply was refused before any step ran
    BatchRejected { error: String },
    /// Terminal outcome of one action in a batch run
    BatchStep {
        run_id: String,
        action_id: String,
        kind: ActionKind,
        status: StepStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// A single action was submitted for two-person approval
    ApprovalRequested { request_id: String, kind: ActionKind },
    /// A request was approved or rejected
    ApprovalDecided {
        request_id: String,
        kind: ActionKind,
        status: ApprovalStatus,
    },
    /// Approval was attempted but the executor failed; still pending
    ApprovalFailed {
        request_id: String,
        kind: ActionKind,
        error: String,
    },
}

impl AuditEvent {
    /// Short event name, used for filtering.
    pub fn name(&self) -> &'static str {
        match self {
            AuditEvent::Staged { .. } => "staged",
            AuditEvent::Removed { .. } => "removed",
            AuditEvent::Cleared { .. } => "cleared",
            AuditEvent::BatchRejected { .. } => "batch_rejected",
            AuditEvent::BatchStep { .. } => "batch_step",
            AuditEvent::ApprovalRequested { .. } => "approval_requested",
            AuditEvent::ApprovalDecided { .. } => "approval_decided",
            AuditEvent::ApprovalFailed { .. } => "approval_failed",
        }
    }

    /// The action kind this event concerns, if any.
    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            AuditEvent::Staged { kind, .. }
            | AuditEvent::Removed { kind, .. }
            | AuditEvent::BatchStep { kind, .. }
            | AuditEvent::ApprovalRequested { kind, .. }
            | AuditEvent::ApprovalDecided { kind, .. }
            | AuditEvent::ApprovalFailed { kind, .. } => Some(*kind),
            AuditEvent::Cleared { .. } | AuditEvent::BatchRejected { .. } => None,
        }
    }
}

/// A single entry in the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,

    /// Log session (one file per UTC day)
    pub session_id: String,

    /// Operator who triggered the event
    pub operator: String,

    pub event: AuditEvent,

    /// Operator's written justification, where one was given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AuditEntry {
    pub fn new(session_id: &str, operator: &str, event: AuditEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            session_id: session_id.to_string(),
            operator: operator.to_string(),
            event,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Summary statistics for one session's log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub total_events: usize,
    pub staged: usize,
    pub applied: usize,
    pub failed: usize,
    pub skipped: usize,
    pub approvals_requested: usize,
    pub approved: usize,
    pub rejected: usize,
    pub operators: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl SessionSummary {
    /// Format as a human-readable one-liner for terminal output.
    pub fn one_line(&self) -> String {
        format!(
            "{} events | {} staged | {} applied | {} failed | {} skipped | {} approved | {} rejected",
            self.total_events,
            self.staged,
            self.applied,
            self.failed,
            self.skipped,
            self.approved,
            self.rejected
        )
    }
}

/// Filter criteria for querying audit logs.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub operator: Option<String>,
    /// Event name as returned by `AuditEvent::name`
    pub event: Option<String>,
    pub kind: Option<ActionKind>,
    pub limit: Option<usize>,
}
