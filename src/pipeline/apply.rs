//! Batch apply — executes the staged queue in order.
//!
//! The run is a plain loop with one piece of state: whether an earlier step
//! failed. Steps execute strictly one at a time in queue order; concurrent
//! writes to shared runtime configuration would make "last writer wins"
//! ordering undefined.
//!
//! 1. Check preconditions (batch phrase, reason, non-empty queue)
//! 2. Probe the backend; an unreachable backend aborts before any step
//! 3. For each action: emit `running`, execute, record success/failure
//! 4. After the first failure, report every remaining action `skipped`
//!    without invoking its executor (when `skip_on_failure` is on)
//! 5. Derive rollback suggestions for what succeeded
//! 6. Drop succeeded actions from the queue; failed/skipped stay staged

use crate::error::{ChangeError, Result};
use crate::executor::ExecutorSet;
use crate::pipeline::types::*;
use crate::registry::defaults::{DEFAULT_BATCH_PHRASE, DEFAULT_MIN_REASON_LEN};
use crate::registry::ActionRegistry;
use crate::staging::StagedQueue;
use crate::utils::phrase::phrase_matches;
use std::collections::HashSet;
use std::sync::Arc;

/// Applies a staged queue against the registered executors.
#[derive(Debug, Clone)]
pub struct BatchPipeline {
    registry: Arc<ActionRegistry>,
    executors: Arc<ExecutorSet>,
    batch_phrase: String,
    min_reason_len: usize,
    skip_on_failure: bool,
}

impl BatchPipeline {
    pub fn new(registry: Arc<ActionRegistry>, executors: Arc<ExecutorSet>) -> Self {
        Self {
            registry,
            executors,
            batch_phrase: DEFAULT_BATCH_PHRASE.to_string(),
            min_reason_len: DEFAULT_MIN_REASON_LEN,
            skip_on_failure: true,
        }
    }

    pub fn with_batch_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.batch_phrase = phrase.into();
        self
    }

    pub fn with_min_reason_len(mut self, min: usize) -> Self {
        self.min_reason_len = min;
        self
    }

    /// Abort-on-first-failure (the default) or best-effort.
    pub fn with_skip_on_failure(mut self, skip: bool) -> Self {
        self.skip_on_failure = skip;
        self
    }

    pub fn batch_phrase(&self) -> &str {
        &self.batch_phrase
    }

    /// Local precondition check. Touches nothing.
    pub fn validate(&self, queue: &StagedQueue, request: &BatchRequest) -> Result<()> {
        if !phrase_matches(&request.confirmation_phrase, &self.batch_phrase) {
            return Err(ChangeError::PhraseMismatch {
                expected: self.batch_phrase.clone(),
            });
        }
        check_reason(&request.reason, self.min_reason_len)?;
        if !queue.has_changes() {
            return Err(ChangeError::EmptyQueue);
        }
        Ok(())
    }

    /// Apply every staged action in order.
    ///
    /// `on_progress` is called synchronously with a `running` entry before
    /// each step and with the terminal entry after it. Step failures are
    /// captured in the result, never returned as `Err`; only precondition
    /// and preflight failures are.
    pub async fn apply<F>(
        &self,
        queue: &mut StagedQueue,
        request: &BatchRequest,
        mut on_progress: F,
    ) -> Result<BatchResult>
    where
        F: FnMut(&ApplyProgress),
    {
        self.validate(queue, request)?;

        self.executors.preflight().await.map_err(|e| {
            tracing::error!("Batch aborted before any step: {:#}", e);
            ChangeError::BackendUnavailable(format!("{:#}", e))
        })?;

        let actions = queue.list().to_vec();
        let mut result = BatchResult {
            run_id: request.run_id.clone(),
            ..Default::default()
        };
        let mut aborted = false;

        tracing::info!(
            "Applying {} staged action(s), run {}",
            actions.len(),
            result.run_id
        );

        for action in actions {
            if aborted {
                let entry = ApplyProgress::skipped(&action.id, "skipped: an earlier action failed");
                tracing::warn!("Skipped {}", action.describe());
                on_progress(&entry);
                result.progress.push(entry);
                result.skipped.push(action);
                continue;
            }

            on_progress(&ApplyProgress::running(&action.id));

            let entry = match self.executors.execute(action.kind, &action.payload).await {
                Ok(message) => {
                    tracing::info!("Applied {}", action.describe());
                    let entry = ApplyProgress::success(&action.id, message);
                    result.succeeded.push(action);
                    entry
                }
                Err(e) => {
                    let error = format!("{:#}", e);
                    tracing::warn!("Failed {}: {}", action.describe(), error);
                    let entry = ApplyProgress::failed(&action.id, error);
                    result.failed.push(action);
                    if self.skip_on_failure {
                        aborted = true;
                    }
                    entry
                }
            };
            on_progress(&entry);
            result.progress.push(entry);
        }

        result.rollback_suggestions = result
            .succeeded
            .iter()
            .map(|action| RollbackSuggestion {
                action_id: action.id.clone(),
                kind: action.kind,
                suggestion: self.registry.rollback_hint(action.kind, &action.payload),
            })
            .collect();

        let remaining: HashSet<String> = result
            .failed
            .iter()
            .chain(result.skipped.iter())
            .map(|a| a.id.clone())
            .collect();
        queue.retain_ids(&remaining);

        tracing::info!("Batch {} finished: {}", result.run_id, result.one_line());
        Ok(result)
    }
}

/// Reject justifications shorter than `min` characters (after trimming).
pub fn check_reason(reason: &str, min: usize) -> Result<()> {
    let actual = reason.trim().chars().count();
    if actual < min {
        return Err(ChangeError::ReasonTooShort { min, actual });
    }
    Ok(())
}
