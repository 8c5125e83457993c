//! Deterministic re-execution over a recorded history.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;

use crate::context::WorkflowContext;
use crate::error::{ActivityFailure, RuntimeError};
use crate::event::{HistoryEvent, TimerGeneration, WorkflowEvent};

/// An activity invocation observed during replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCall {
    /// The activity name.
    pub name: String,
    /// The exact input the workflow passed.
    pub input: serde_json::Value,
}

/// [`WorkflowContext`] that feeds a recorded history back to workflow
/// code instead of touching the outside world.
///
/// This is how the substrate reconstructs an instance after a crash:
/// the workflow runs again from the top, every decision input comes
/// from the journal, and no activity executes a second time. It also
/// backs the replay-idempotence tests: running the same history twice
/// must reach the same terminal state and invoke the same activities
/// with the same inputs, or the workflow is not deterministic.
pub struct ReplayContext {
    instance_id: String,
    events: VecDeque<HistoryEvent>,
    activity_calls: Vec<ActivityCall>,
    divergence: Option<String>,
}

impl ReplayContext {
    /// Creates a replay context over a captured history.
    pub fn new(instance_id: impl Into<String>, history: Vec<HistoryEvent>) -> Self {
        Self {
            instance_id: instance_id.into(),
            events: history.into(),
            activity_calls: Vec::new(),
            divergence: None,
        }
    }

    /// The activity invocations the replayed code made, in order.
    pub fn activity_calls(&self) -> &[ActivityCall] {
        &self.activity_calls
    }

    /// Returns the first detected divergence between the replayed
    /// code's decisions and the recorded history, if any.
    pub fn divergence(&self) -> Option<&str> {
        self.divergence.as_deref()
    }

    /// Returns true if the whole history was consumed without
    /// divergence.
    pub fn is_clean(&self) -> bool {
        self.divergence.is_none() && self.events.is_empty()
    }

    fn diverged<T>(&mut self, detail: String) -> Result<T, RuntimeError> {
        if self.divergence.is_none() {
            self.divergence = Some(detail.clone());
        }
        Err(RuntimeError::NonDeterminism(detail))
    }
}

#[async_trait]
impl WorkflowContext for ReplayContext {
    fn instance_id(&self) -> &str {
        &self.instance_id
    }

    async fn next_event(&mut self) -> Result<WorkflowEvent, RuntimeError> {
        match self.events.pop_front() {
            Some(HistoryEvent::SignalReceived { payload }) => Ok(WorkflowEvent::Signal(payload)),
            Some(HistoryEvent::TimerFired { generation }) => {
                Ok(WorkflowEvent::TimerFired(generation))
            }
            Some(HistoryEvent::CancellationRequested) => Ok(WorkflowEvent::CancellationRequested),
            Some(other) => self.diverged(format!(
                "workflow awaited an event but history records {other:?}"
            )),
            None => Err(RuntimeError::ChannelClosed),
        }
    }

    async fn arm_timer(&mut self, delay: Duration) -> Result<TimerGeneration, RuntimeError> {
        match self.events.pop_front() {
            Some(HistoryEvent::TimerArmed {
                generation,
                delay_ms,
            }) => {
                if delay_ms != delay.as_millis() as u64 {
                    return self.diverged(format!(
                        "workflow armed a {}ms timer but history records {delay_ms}ms",
                        delay.as_millis()
                    ));
                }
                Ok(generation)
            }
            Some(other) => self.diverged(format!(
                "workflow armed a timer but history records {other:?}"
            )),
            None => Err(RuntimeError::ChannelClosed),
        }
    }

    async fn call_activity(
        &mut self,
        name: &str,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ActivityFailure> {
        self.activity_calls.push(ActivityCall {
            name: name.to_string(),
            input: input.clone(),
        });

        match self.events.pop_front() {
            Some(HistoryEvent::ActivityCompleted {
                name: recorded_name,
                input: recorded_input,
                result,
                ..
            }) if recorded_name == name && recorded_input == input => Ok(result),
            Some(HistoryEvent::ActivityFailed {
                name: recorded_name,
                input: recorded_input,
                error,
                attempts,
            }) if recorded_name == name && recorded_input == input => Err(ActivityFailure {
                name: recorded_name,
                attempts,
                detail: error,
            }),
            other => {
                let detail = format!(
                    "workflow invoked activity '{name}' but history records {other:?}"
                );
                if self.divergence.is_none() {
                    self.divergence = Some(detail.clone());
                }
                Err(ActivityFailure {
                    name: name.to_string(),
                    attempts: 0,
                    detail,
                })
            }
        }
    }

    fn publish_state(&mut self, _state: serde_json::Value) {
        // Observational only; replay does not re-publish.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_history() -> Vec<HistoryEvent> {
        let g1 = TimerGeneration::default().next();
        vec![
            HistoryEvent::TimerArmed {
                generation: g1,
                delay_ms: 600_000,
            },
            HistoryEvent::SignalReceived {
                payload: serde_json::json!({"type": "Checkout"}),
            },
            HistoryEvent::ActivityCompleted {
                name: "Charge".into(),
                input: serde_json::json!({"amount": 1998}),
                result: serde_json::Value::Null,
                attempts: 1,
            },
        ]
    }

    #[tokio::test]
    async fn test_replay_feeds_recorded_events() {
        let mut ctx = ReplayContext::new("wf-1", sample_history());

        let generation = ctx.arm_timer(Duration::from_secs(600)).await.unwrap();
        assert_eq!(generation.value(), 1);

        let event = ctx.next_event().await.unwrap();
        assert!(matches!(event, WorkflowEvent::Signal(_)));

        let result = ctx
            .call_activity("Charge", serde_json::json!({"amount": 1998}))
            .await
            .unwrap();
        assert_eq!(result, serde_json::Value::Null);

        assert!(ctx.is_clean());
        assert_eq!(
            ctx.activity_calls(),
            &[ActivityCall {
                name: "Charge".into(),
                input: serde_json::json!({"amount": 1998}),
            }]
        );
    }

    #[tokio::test]
    async fn test_replay_detects_wrong_activity() {
        let mut ctx = ReplayContext::new("wf-1", sample_history());
        ctx.arm_timer(Duration::from_secs(600)).await.unwrap();
        ctx.next_event().await.unwrap();

        let err = ctx
            .call_activity("NotifyAbandonment", serde_json::json!("a@b.com"))
            .await
            .unwrap_err();
        assert_eq!(err.attempts, 0);
        assert!(ctx.divergence().is_some());
    }

    #[tokio::test]
    async fn test_replay_detects_wrong_timer_delay() {
        let mut ctx = ReplayContext::new("wf-1", sample_history());
        let err = ctx.arm_timer(Duration::from_secs(5)).await;
        assert!(matches!(err, Err(RuntimeError::NonDeterminism(_))));
        assert!(ctx.divergence().is_some());
    }

    #[tokio::test]
    async fn test_replay_surfaces_recorded_failure() {
        let history = vec![HistoryEvent::ActivityFailed {
            name: "Charge".into(),
            input: serde_json::Value::Null,
            error: "card declined".into(),
            attempts: 3,
        }];
        let mut ctx = ReplayContext::new("wf-1", history);

        let err = ctx
            .call_activity("Charge", serde_json::Value::Null)
            .await
            .unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(err.detail, "card declined");
        assert!(ctx.is_clean());
    }

    #[tokio::test]
    async fn test_exhausted_history_reports_channel_closed() {
        let mut ctx = ReplayContext::new("wf-1", Vec::new());
        assert!(matches!(
            ctx.next_event().await,
            Err(RuntimeError::ChannelClosed)
        ));
    }
}
