//! Two-person approval workflow for single high-risk actions.
//!
//! ```text
//!   request ──► PENDING ──approve──► APPROVED   (executor ran and succeeded)
//!                  │
//!                  └──reject───► REJECTED
//! ```
//!
//! Requests are validated locally (reason length, confirmation phrase)
//! before the store is contacted. Approval executes the action through the
//! same `ExecutorSet` the batch pipeline uses; the request is only marked
//! approved once the executor succeeds.

use crate::approval::store::ApprovalStore;
use crate::approval::types::{ApprovalRequest, ApprovalStatus, Decision};
use crate::error::{ChangeError, Result};
use crate::executor::ExecutorSet;
use crate::pipeline::check_reason;
use crate::registry::defaults::DEFAULT_MIN_REASON_LEN;
use crate::registry::{ActionKind, ActionRegistry};
use crate::utils::phrase::phrase_matches;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

/// The approval workflow as seen by one operator.
pub struct ApprovalWorkflow {
    registry: Arc<ActionRegistry>,
    executors: Arc<ExecutorSet>,
    store: Arc<dyn ApprovalStore>,
    /// Who is acting: the requester on `request`, the decider otherwise
    operator: String,
    min_reason_len: usize,
}

impl ApprovalWorkflow {
    pub fn new(
        registry: Arc<ActionRegistry>,
        executors: Arc<ExecutorSet>,
        store: Arc<dyn ApprovalStore>,
        operator: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            executors,
            store,
            operator: operator.into(),
            min_reason_len: DEFAULT_MIN_REASON_LEN,
        }
    }

    pub fn with_min_reason_len(mut self, min: usize) -> Self {
        self.min_reason_len = min;
        self
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Submit a new pending request for a second operator to decide.
    pub async fn request(
        &self,
        kind: ActionKind,
        payload: Value,
        reason: &str,
        confirmation_phrase: &str,
    ) -> Result<ApprovalRequest> {
        let requirements = self.registry.requirements(kind, &payload)?;
        check_reason(reason, self.min_reason_len)?;
        if !phrase_matches(confirmation_phrase, &requirements.required_phrase) {
            return Err(ChangeError::PhraseMismatch {
                expected: requirements.required_phrase,
            });
        }

        let request = ApprovalRequest {
            request_id: uuid::Uuid::new_v4().to_string(),
            kind,
            payload,
            reason: reason.trim().to_string(),
            confirmation_phrase: confirmation_phrase.trim().to_string(),
            status: ApprovalStatus::Pending,
            requested_by: self.operator.clone(),
            requested_at: Utc::now(),
            approved_by: None,
            rejected_by: None,
            decided_at: None,
        };

        let submitted = self.store.submit(request).await?;
        tracing::info!(
            "{} requested approval for {} ({})",
            self.operator,
            submitted.kind,
            submitted.short_id()
        );
        Ok(submitted)
    }

    /// Approve a pending request: check the phrase, run the executor once,
    /// and only then record the approval.
    ///
    /// An executor failure leaves the request pending and is returned as
    /// `ExecutionFailed`.
    pub async fn approve(&self, request_id: &str, confirmation_phrase: &str) -> Result<ApprovalRequest> {
        let request = self.store.get(request_id).await?;

        if !request.is_pending() {
            return Err(ChangeError::AlreadyDecided {
                request_id: request.request_id,
                status: request.status,
            });
        }
        // The store is authoritative, but never attempt a self-approval
        if request.requested_by == self.operator {
            return Err(ChangeError::SelfApproval {
                operator: self.operator.clone(),
            });
        }

        let requirements = self.registry.requirements(request.kind, &request.payload)?;
        if !phrase_matches(confirmation_phrase, &requirements.required_phrase) {
            return Err(ChangeError::PhraseMismatch {
                expected: requirements.required_phrase,
            });
        }

        if let Err(e) = self.executors.execute(request.kind, &request.payload).await {
            tracing::warn!(
                "Approval of {} by {} failed during execution: {:#}",
                request.short_id(),
                self.operator,
                e
            );
            return Err(ChangeError::ExecutionFailed {
                kind: request.kind.to_string(),
                message: format!("{:#}", e),
            });
        }

        let approved = self
            .store
            .decide(&request.request_id, Decision::Approve, &self.operator)
            .await?;
        tracing::info!("{} approved {} ({})", self.operator, approved.kind, approved.short_id());
        Ok(approved)
    }

    /// Reject a pending request. Nothing is executed.
    pub async fn reject(&self, request_id: &str) -> Result<ApprovalRequest> {
        let rejected = self
            .store
            .decide(request_id, Decision::Reject, &self.operator)
            .await?;
        tracing::info!("{} rejected {} ({})", self.operator, rejected.kind, rejected.short_id());
        Ok(rejected)
    }

    /// Requests still waiting for a decision, oldest first.
    pub async fn pending(&self) -> Result<Vec<ApprovalRequest>> {
        Ok(self
            .store
            .list()
            .await?
            .into_iter()
            .filter(ApprovalRequest::is_pending)
            .collect())
    }

    /// Every request, decided or not.
    pub async fn history(&self) -> Result<Vec<ApprovalRequest>> {
        self.store.list().await
    }
}
