use thiserror::Error;

use crate::requisition::{RequisitionId, Status};
use crate::storage::StorageError;

/// Failure taxonomy of the lifecycle engine.
///
/// `Forbidden`, `InvalidTransition`, and `ValidationFailed` are
/// deterministic for a given actor and state and must not be retried.
/// `Conflict` and `Transient` are safe to retry after reloading.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("requisition {id} not found")]
    NotFound { id: String },

    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    /// Carries the legal target set so callers can present "what you may
    /// do instead".
    #[error("cannot change status from {from} to {to}, allowed targets: {allowed:?}")]
    InvalidTransition {
        from: Status,
        to: Status,
        allowed: Vec<Status>,
    },

    #[error("validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("conflicting update on {id}: expected status {expected}, found {found}")]
    Conflict {
        id: String,
        expected: Status,
        found: Status,
    },

    #[error("transient storage failure: {reason}")]
    Transient { reason: String },
}

impl EngineError {
    /// Whether the caller may retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Conflict { .. } | EngineError::Transient { .. }
        )
    }

    /// Maps a storage failure for `id` onto the engine taxonomy.
    pub(crate) fn from_storage(id: &RequisitionId, err: StorageError) -> Self {
        match err {
            StorageError::NotFound => EngineError::NotFound {
                id: id.to_string(),
            },
            StorageError::Conflict { expected, found } => EngineError::Conflict {
                id: id.to_string(),
                expected,
                found,
            },
            StorageError::Transient(reason) | StorageError::Backend(reason) => {
                EngineError::Transient { reason }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(EngineError::Conflict {
            id: "SP-2025-000001".to_string(),
            expected: Status::Draft,
            found: Status::Cancelled,
        }
        .is_retryable());
        assert!(EngineError::Transient {
            reason: "timeout".to_string()
        }
        .is_retryable());

        assert!(!EngineError::Forbidden {
            reason: "nope".to_string()
        }
        .is_retryable());
        assert!(!EngineError::InvalidTransition {
            from: Status::Draft,
            to: Status::Purchased,
            allowed: vec![Status::SubmittedToAdmin],
        }
        .is_retryable());
        assert!(!EngineError::ValidationFailed {
            reason: "empty".to_string()
        }
        .is_retryable());
        assert!(!EngineError::NotFound {
            id: "SP-2025-000001".to_string()
        }
        .is_retryable());
    }
}
