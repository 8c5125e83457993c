//! Runtime error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the runtime host itself.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// No workflow instance is registered under the given id.
    #[error("Workflow instance not found: {0}")]
    InstanceNotFound(String),

    /// The instance already reached a terminal state and no longer
    /// accepts signals.
    #[error("Workflow instance {0} has already terminated")]
    InstanceTerminated(String),

    /// An instance with this id is already running.
    #[error("Workflow instance {0} already exists")]
    DuplicateInstance(String),

    /// The instance's event channel closed while the workflow was
    /// still waiting on it.
    #[error("Workflow event channel closed unexpectedly")]
    ChannelClosed,

    /// The workflow finished with an error of its own.
    #[error("Workflow failed: {0}")]
    WorkflowFailed(String),

    /// Replayed workflow code made a decision the recorded history
    /// does not contain.
    #[error("Replay diverged from recorded history: {0}")]
    NonDeterminism(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors returned by activity handlers to the runtime.
#[derive(Debug, Error)]
pub enum ActivityError {
    /// The external provider rejected the request or was unreachable.
    /// Retried up to the configured policy.
    #[error("Provider error: {0}")]
    Provider(String),

    /// The request can never succeed as given; retrying is pointless.
    #[error("{0}")]
    NonRetryable(String),

    /// No handler is registered under the requested activity name.
    #[error("Activity not registered: {0}")]
    NotRegistered(String),

    /// The activity input could not be deserialized.
    #[error("Invalid activity input: {0}")]
    BadInput(#[from] serde_json::Error),
}

impl ActivityError {
    /// Returns true if the runtime should retry this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ActivityError::Provider(_))
    }
}

/// Terminal failure of an activity invocation, reported to the
/// workflow after the retry budget is exhausted.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Activity '{name}' failed after {attempts} attempt(s): {detail}")]
pub struct ActivityFailure {
    /// The activity name.
    pub name: String,
    /// How many attempts were made.
    pub attempts: u32,
    /// The last error detail from the provider.
    pub detail: String,
}

/// Errors a workflow run can finish with.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A signal payload did not deserialize into the expected type.
    #[error("Malformed signal payload: {0}")]
    MalformedSignal(serde_json::Error),

    /// The runtime failed underneath the workflow.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_errors_are_retryable() {
        assert!(ActivityError::Provider("card declined".into()).is_retryable());
        assert!(!ActivityError::NonRetryable("bad request".into()).is_retryable());
        assert!(!ActivityError::NotRegistered("Charge".into()).is_retryable());
    }

    #[test]
    fn test_activity_failure_display() {
        let failure = ActivityFailure {
            name: "Charge".into(),
            attempts: 3,
            detail: "card declined".into(),
        };
        assert_eq!(
            failure.to_string(),
            "Activity 'Charge' failed after 3 attempt(s): card declined"
        );
    }
}
