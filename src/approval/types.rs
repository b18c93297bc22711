//! Types for the two-person approval flow.

use crate::error::{ChangeError, Result};
use crate::registry::ActionKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Lifecycle of an approval request. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalStatus::Pending => write!(f, "pending"),
            ApprovalStatus::Approved => write!(f, "approved"),
            ApprovalStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// The decision a second operator records on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// A single high-risk action waiting for a second operator's sign-off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub request_id: String,

    pub kind: ActionKind,

    #[serde(default)]
    pub payload: Value,

    /// Requester's written justification
    pub reason: String,

    /// Phrase the requester typed (already validated locally)
    pub confirmation_phrase: String,

    pub status: ApprovalStatus,

    pub requested_by: String,

    pub requested_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
}

impl ApprovalRequest {
    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }

    pub fn short_id(&self) -> &str {
        match self.request_id.char_indices().nth(8) {
            Some((end, _)) => &self.request_id[..end],
            None => self.request_id.as_str(),
        }
    }

    /// Record a decision. Only pending requests can be decided, exactly
    /// once, and never approved by the operator who requested them.
    pub fn record_decision(&mut self, decision: Decision, operator: &str) -> Result<()> {
        if !self.is_pending() {
            return Err(ChangeError::AlreadyDecided {
                request_id: self.request_id.clone(),
                status: self.status,
            });
        }

        match decision {
            Decision::Approve => {
                if self.requested_by == operator {
                    return Err(ChangeError::SelfApproval {
                        operator: operator.to_string(),
                    });
                }
                self.status = ApprovalStatus::Approved;
                self.approved_by = Some(operator.to_string());
            }
            Decision::Reject => {
                self.status = ApprovalStatus::Rejected;
                self.rejected_by = Some(operator.to_string());
            }
        }
        self.decided_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(requested_by: &str) -> ApprovalRequest {
        ApprovalRequest {
            request_id: "req-1".to_string(),
            kind: ActionKind::ActivateIrt,
            payload: Value::Null,
            reason: "calibration finished on all items".to_string(),
            confirmation_phrase: "ACTIVATE IRT".to_string(),
            status: ApprovalStatus::Pending,
            requested_by: requested_by.to_string(),
            requested_at: Utc::now(),
            approved_by: None,
            rejected_by: None,
            decided_at: None,
        }
    }

    #[test]
    fn test_approve_once() {
        let mut req = pending("alice");
        req.record_decision(Decision::Approve, "bob").unwrap();
        assert_eq!(req.status, ApprovalStatus::Approved);
        assert_eq!(req.approved_by.as_deref(), Some("bob"));
        assert!(req.decided_at.is_some());

        let err = req.record_decision(Decision::Reject, "carol").unwrap_err();
        assert!(matches!(err, ChangeError::AlreadyDecided { .. }));
        assert_eq!(req.status, ApprovalStatus::Approved);
    }

    #[test]
    fn test_self_approval_refused() {
        let mut req = pending("alice");
        let err = req.record_decision(Decision::Approve, "alice").unwrap_err();
        assert!(matches!(err, ChangeError::SelfApproval { .. }));
        assert!(req.is_pending());
    }

    #[test]
    fn test_short_id_respects_char_boundaries() {
        let mut req = pending("alice");
        req.request_id = "ééééééééé-1".to_string();
        assert_eq!(req.short_id(), "éééééééé");

        req.request_id = "ab12".to_string();
        assert_eq!(req.short_id(), "ab12");
    }

    #[test]
    fn test_rejection_is_terminal() {
        let mut req = pending("alice");
        req.record_decision(Decision::Reject, "alice").unwrap();
        assert_eq!(req.status, ApprovalStatus::Rejected);
        assert!(req.record_decision(Decision::Approve, "bob").is_err());
    }
}
