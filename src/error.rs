//! Error taxonomy for the change-control engine.
//!
//! Local validation errors never reach an executor or the approval store.
//! Batch-step failures are not errors at all. They are captured into
//! `ApplyProgress` and reported through the partitioned `BatchResult`.

use crate::approval::types::ApprovalStatus;

/// Errors surfaced by the registry, queue, approval workflow and pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ChangeError {
    /// The action type is not a known kind, or has no registry entry.
    #[error("unknown action type '{0}'")]
    UnknownActionType(String),

    /// The payload is missing a field the registry entry needs.
    #[error("invalid payload for {kind}: {reason}")]
    InvalidPayload { kind: String, reason: String },

    /// The typed confirmation phrase does not match the required one.
    #[error("confirmation phrase does not match — type \"{expected}\" exactly")]
    PhraseMismatch { expected: String },

    /// The justification is shorter than the configured minimum.
    #[error("reason must be at least {min} characters (got {actual})")]
    ReasonTooShort { min: usize, actual: usize },

    /// Nothing is staged.
    #[error("no staged changes to apply")]
    EmptyQueue,

    /// `remove` was called with an id that is not in the queue.
    #[error("no staged action with id '{0}'")]
    UnknownStagedAction(String),

    /// No approval request with this id exists.
    #[error("no approval request with id '{0}'")]
    UnknownRequest(String),

    /// The request already left the pending state.
    #[error("request {request_id} is already {status}")]
    AlreadyDecided {
        request_id: String,
        status: ApprovalStatus,
    },

    /// The operator tried to approve their own request.
    #[error("{operator} cannot approve their own request — a second operator must sign off")]
    SelfApproval { operator: String },

    /// A single action's executor failed; nothing was marked as done.
    #[error("{kind} failed: {message}")]
    ExecutionFailed { kind: String, message: String },

    /// The backend was unreachable before any batch step started.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The approval store could not be read or written.
    #[error("approval store error: {0}")]
    Store(String),
}

impl ChangeError {
    /// Whether this error was raised by local validation, before any
    /// executor or store call.
    pub fn is_local_validation(&self) -> bool {
        matches!(
            self,
            ChangeError::UnknownActionType(_)
                | ChangeError::InvalidPayload { .. }
                | ChangeError::PhraseMismatch { .. }
                | ChangeError::ReasonTooShort { .. }
                | ChangeError::EmptyQueue
        )
    }
}

pub type Result<T> = std::result::Result<T, ChangeError>;
