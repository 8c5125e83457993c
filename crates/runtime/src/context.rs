//! The capability interface between workflow code and its host.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ActivityFailure, RuntimeError, WorkflowError};
use crate::event::{TimerGeneration, WorkflowEvent};

/// Capabilities the host grants to a running workflow instance.
///
/// Workflow code must stay deterministic given the same event
/// sequence: no wall-clock reads, no unseeded randomness, no I/O
/// except through [`call_activity`](WorkflowContext::call_activity).
/// Keeping the surface this narrow is what lets the same code run
/// against the live host and against a recorded history in replay.
#[async_trait]
pub trait WorkflowContext: Send {
    /// The instance id this context belongs to.
    fn instance_id(&self) -> &str;

    /// Suspends until the next event (signal, timer fire, or
    /// cancellation) is available. Events arrive one at a time, in
    /// delivery order.
    async fn next_event(&mut self) -> Result<WorkflowEvent, RuntimeError>;

    /// Arms the instance's durable timer for `delay` from now,
    /// superseding any previously armed deadline. Returns the new
    /// generation; fires carrying an older generation are stale.
    async fn arm_timer(&mut self, delay: Duration) -> Result<TimerGeneration, RuntimeError>;

    /// Invokes a registered activity and suspends until it durably
    /// succeeds or exhausts its retry policy. The input is an
    /// immutable snapshot; the activity never sees later mutations.
    async fn call_activity(
        &mut self,
        name: &str,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ActivityFailure>;

    /// Publishes a snapshot of workflow state for external queries.
    /// Purely observational; replay ignores it.
    fn publish_state(&mut self, state: serde_json::Value);
}

/// A workflow definition, instantiated once per instance id.
#[async_trait]
pub trait Workflow: Send + Sync + 'static {
    /// Runs the workflow to its terminal state, returning the
    /// serialized outcome.
    async fn run(&self, ctx: &mut dyn WorkflowContext) -> Result<serde_json::Value, WorkflowError>;
}
