//! The cart orchestration workflow.

use std::time::Duration;

use async_trait::async_trait;
use domain::{CartState, CartStatus};
use runtime::{RuntimeError, Workflow, WorkflowContext, WorkflowError, WorkflowEvent};
use serde::{Deserialize, Serialize};

use crate::activities::{CHARGE_ACTIVITY, NOTIFY_ABANDONMENT_ACTIVITY};
use crate::signals::CartSignal;

/// Terminal result of one cart orchestration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartOutcome {
    /// The terminal status reached.
    pub status: CartStatus,
    /// The cart contents at termination.
    pub cart: CartState,
    /// Set when the terminal activity exhausted its retries. The
    /// status still stands; a failed charge never falls back to the
    /// abandonment branch, or vice versa.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_error: Option<String>,
}

/// Queryable snapshot published while the instance runs.
///
/// The terminal snapshot carries the same `activity_error` as the
/// outcome, so a checkout whose charge exhausted its retries is
/// distinguishable from a successful one by query alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub status: CartStatus,
    pub cart: CartState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_error: Option<String>,
}

/// One cart's lifecycle state machine.
///
/// Decides, race-free, between checkout and abandonment: the instance
/// processes one event at a time, so `UpdateCart`, `Checkout`, and
/// timer fires never interleave. A timer fire is honored only when it
/// carries the most recently armed generation; fires from before the
/// last reset are stale and skipped.
///
/// Exactly one of {charge, abandonment notification} is invoked per
/// instance, never both, never zero — unless the host cancels the
/// instance first, in which case neither runs and the status is
/// `Cancelled`.
#[derive(Debug, Clone)]
pub struct CartWorkflow {
    abandonment_window: Duration,
}

impl CartWorkflow {
    /// Creates a workflow with the given inactivity window.
    pub fn new(abandonment_window: Duration) -> Self {
        Self { abandonment_window }
    }

    /// Returns the inactivity window.
    pub fn abandonment_window(&self) -> Duration {
        self.abandonment_window
    }

    fn publish(
        ctx: &mut dyn WorkflowContext,
        status: CartStatus,
        cart: &CartState,
        activity_error: Option<&str>,
    ) {
        if let Ok(snapshot) = serde_json::to_value(CartSnapshot {
            status,
            cart: cart.clone(),
            activity_error: activity_error.map(String::from),
        }) {
            ctx.publish_state(snapshot);
        }
    }
}

#[async_trait]
impl Workflow for CartWorkflow {
    async fn run(&self, ctx: &mut dyn WorkflowContext) -> Result<serde_json::Value, WorkflowError> {
        metrics::counter!("cart_workflows_started_total").increment(1);

        let mut cart = CartState::new();
        let mut status = CartStatus::Open;
        let mut current = ctx.arm_timer(self.abandonment_window).await?;
        Self::publish(ctx, status, &cart, None);

        let mut activity_error = None;

        while status.is_open() {
            match ctx.next_event().await? {
                WorkflowEvent::Signal(payload) => {
                    match serde_json::from_value::<CartSignal>(payload) {
                        Ok(CartSignal::UpdateCart { items, email }) => {
                            match cart.apply_update(items, email) {
                                Ok(()) => {
                                    current = ctx.arm_timer(self.abandonment_window).await?;
                                    Self::publish(ctx, status, &cart, None);
                                }
                                Err(e) => {
                                    // Rejected at the mutation boundary; the
                                    // cart is untouched and the deadline stands.
                                    tracing::warn!(
                                        instance_id = %ctx.instance_id(),
                                        error = %e,
                                        "rejected cart update"
                                    );
                                }
                            }
                        }
                        Ok(CartSignal::Checkout) => {
                            status = CartStatus::Checked;
                            metrics::counter!("cart_checkouts_total").increment(1);
                            let input = serde_json::to_value(&cart)
                                .map_err(|e| WorkflowError::Runtime(RuntimeError::Serialization(e)))?;
                            if let Err(failure) = ctx.call_activity(CHARGE_ACTIVITY, input).await {
                                activity_error = Some(failure.to_string());
                            }
                        }
                        Err(e) => {
                            tracing::warn!(
                                instance_id = %ctx.instance_id(),
                                error = %e,
                                "ignoring malformed cart signal"
                            );
                        }
                    }
                }
                WorkflowEvent::TimerFired(generation) if generation == current => {
                    status = CartStatus::Abandoned;
                    metrics::counter!("cart_abandonments_total").increment(1);
                    let input = serde_json::Value::String(cart.email_or_empty().to_string());
                    if let Err(failure) =
                        ctx.call_activity(NOTIFY_ABANDONMENT_ACTIVITY, input).await
                    {
                        activity_error = Some(failure.to_string());
                    }
                }
                WorkflowEvent::TimerFired(stale) => {
                    tracing::debug!(
                        instance_id = %ctx.instance_id(),
                        stale_generation = %stale,
                        current_generation = %current,
                        "ignoring stale timer fire"
                    );
                }
                WorkflowEvent::CancellationRequested => {
                    status = CartStatus::Cancelled;
                    metrics::counter!("cart_cancellations_total").increment(1);
                }
            }
        }

        Self::publish(ctx, status, &cart, activity_error.as_deref());
        let outcome = CartOutcome {
            status,
            cart,
            activity_error,
        };
        tracing::info!(
            instance_id = %ctx.instance_id(),
            status = %outcome.status,
            activity_error = outcome.activity_error.as_deref().unwrap_or(""),
            "cart orchestration terminated"
        );
        serde_json::to_value(&outcome)
            .map_err(|e| WorkflowError::Runtime(RuntimeError::Serialization(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::CartItem;
    use runtime::{HistoryEvent, ReplayContext, TimerGeneration};

    const WINDOW: Duration = Duration::from_secs(600);
    const WINDOW_MS: u64 = 600_000;

    fn generations() -> (TimerGeneration, TimerGeneration) {
        let g1 = TimerGeneration::default().next();
        (g1, g1.next())
    }

    fn update_signal(email: Option<&str>) -> serde_json::Value {
        serde_json::to_value(CartSignal::UpdateCart {
            items: vec![CartItem::new("p1", 2)],
            email: email.map(String::from),
        })
        .unwrap()
    }

    async fn run_replay(history: Vec<HistoryEvent>) -> (CartOutcome, ReplayContext) {
        let mut ctx = ReplayContext::new("cart-1", history);
        let workflow = CartWorkflow::new(WINDOW);
        let value = workflow.run(&mut ctx).await.unwrap();
        (serde_json::from_value(value).unwrap(), ctx)
    }

    #[tokio::test]
    async fn test_checkout_from_history_invokes_charge_once() {
        let (g1, g2) = generations();
        let cart_input = serde_json::json!({
            "email": "a@b.com",
            "items": [{"product_id": "p1", "quantity": 2}]
        });
        let history = vec![
            HistoryEvent::TimerArmed {
                generation: g1,
                delay_ms: WINDOW_MS,
            },
            HistoryEvent::SignalReceived {
                payload: update_signal(Some("a@b.com")),
            },
            HistoryEvent::TimerArmed {
                generation: g2,
                delay_ms: WINDOW_MS,
            },
            HistoryEvent::SignalReceived {
                payload: serde_json::to_value(CartSignal::Checkout).unwrap(),
            },
            HistoryEvent::ActivityCompleted {
                name: CHARGE_ACTIVITY.into(),
                input: cart_input.clone(),
                result: serde_json::json!({"charge_id": "ch-1"}),
                attempts: 1,
            },
        ];

        let (outcome, ctx) = run_replay(history).await;
        assert_eq!(outcome.status, CartStatus::Checked);
        assert!(outcome.activity_error.is_none());
        assert!(ctx.is_clean());
        assert_eq!(ctx.activity_calls().len(), 1);
        assert_eq!(ctx.activity_calls()[0].name, CHARGE_ACTIVITY);
        assert_eq!(ctx.activity_calls()[0].input, cart_input);
    }

    #[tokio::test]
    async fn test_stale_timer_fire_is_ignored() {
        let (g1, g2) = generations();
        let history = vec![
            HistoryEvent::TimerArmed {
                generation: g1,
                delay_ms: WINDOW_MS,
            },
            HistoryEvent::SignalReceived {
                payload: update_signal(Some("a@b.com")),
            },
            HistoryEvent::TimerArmed {
                generation: g2,
                delay_ms: WINDOW_MS,
            },
            // Stale fire from before the reset; must not abandon.
            HistoryEvent::TimerFired { generation: g1 },
            HistoryEvent::TimerFired { generation: g2 },
            HistoryEvent::ActivityCompleted {
                name: NOTIFY_ABANDONMENT_ACTIVITY.into(),
                input: serde_json::json!("a@b.com"),
                result: serde_json::Value::Null,
                attempts: 1,
            },
        ];

        let (outcome, ctx) = run_replay(history).await;
        assert_eq!(outcome.status, CartStatus::Abandoned);
        assert!(ctx.is_clean());
        assert_eq!(ctx.activity_calls().len(), 1);
        assert_eq!(ctx.activity_calls()[0].name, NOTIFY_ABANDONMENT_ACTIVITY);
    }

    #[tokio::test]
    async fn test_abandonment_with_no_signals_uses_empty_email() {
        let g1 = TimerGeneration::default().next();
        let history = vec![
            HistoryEvent::TimerArmed {
                generation: g1,
                delay_ms: WINDOW_MS,
            },
            HistoryEvent::TimerFired { generation: g1 },
            HistoryEvent::ActivityCompleted {
                name: NOTIFY_ABANDONMENT_ACTIVITY.into(),
                input: serde_json::json!(""),
                result: serde_json::Value::Null,
                attempts: 1,
            },
        ];

        let (outcome, ctx) = run_replay(history).await;
        assert_eq!(outcome.status, CartStatus::Abandoned);
        assert!(outcome.cart.is_empty());
        assert!(ctx.is_clean());
    }

    #[tokio::test]
    async fn test_invalid_update_does_not_reset_timer() {
        let g1 = TimerGeneration::default().next();
        let bad_update = serde_json::to_value(CartSignal::UpdateCart {
            items: vec![CartItem::new("p1", 0)],
            email: None,
        })
        .unwrap();
        // No second TimerArmed entry: the rejected update must not re-arm.
        let history = vec![
            HistoryEvent::TimerArmed {
                generation: g1,
                delay_ms: WINDOW_MS,
            },
            HistoryEvent::SignalReceived { payload: bad_update },
            HistoryEvent::TimerFired { generation: g1 },
            HistoryEvent::ActivityCompleted {
                name: NOTIFY_ABANDONMENT_ACTIVITY.into(),
                input: serde_json::json!(""),
                result: serde_json::Value::Null,
                attempts: 1,
            },
        ];

        let (outcome, ctx) = run_replay(history).await;
        assert_eq!(outcome.status, CartStatus::Abandoned);
        assert!(outcome.cart.is_empty());
        assert!(ctx.is_clean());
    }

    #[tokio::test]
    async fn test_cancellation_invokes_no_activity() {
        let g1 = TimerGeneration::default().next();
        let history = vec![
            HistoryEvent::TimerArmed {
                generation: g1,
                delay_ms: WINDOW_MS,
            },
            HistoryEvent::SignalReceived {
                payload: update_signal(Some("a@b.com")),
            },
            HistoryEvent::TimerArmed {
                generation: g1.next(),
                delay_ms: WINDOW_MS,
            },
            HistoryEvent::CancellationRequested,
        ];

        let (outcome, ctx) = run_replay(history).await;
        assert_eq!(outcome.status, CartStatus::Cancelled);
        assert!(ctx.activity_calls().is_empty());
        assert!(ctx.is_clean());
    }

    #[tokio::test]
    async fn test_charge_failure_keeps_checked_status() {
        let (g1, _) = generations();
        let cart_input = serde_json::json!({
            "email": null,
            "items": []
        });
        let history = vec![
            HistoryEvent::TimerArmed {
                generation: g1,
                delay_ms: WINDOW_MS,
            },
            HistoryEvent::SignalReceived {
                payload: serde_json::to_value(CartSignal::Checkout).unwrap(),
            },
            HistoryEvent::ActivityFailed {
                name: CHARGE_ACTIVITY.into(),
                input: cart_input,
                error: "card declined".into(),
                attempts: 3,
            },
        ];

        let (outcome, ctx) = run_replay(history).await;
        assert_eq!(outcome.status, CartStatus::Checked);
        let error = outcome.activity_error.unwrap();
        assert!(error.contains("card declined"), "unexpected error: {error}");
        // The failed charge never falls back to the abandonment branch.
        assert_eq!(ctx.activity_calls().len(), 1);
        assert!(ctx.is_clean());
    }

    #[tokio::test]
    async fn test_replay_is_idempotent() {
        let g1 = TimerGeneration::default().next();
        let history = vec![
            HistoryEvent::TimerArmed {
                generation: g1,
                delay_ms: WINDOW_MS,
            },
            HistoryEvent::TimerFired { generation: g1 },
            HistoryEvent::ActivityCompleted {
                name: NOTIFY_ABANDONMENT_ACTIVITY.into(),
                input: serde_json::json!(""),
                result: serde_json::Value::Null,
                attempts: 1,
            },
        ];

        let (first, first_ctx) = run_replay(history.clone()).await;
        let (second, second_ctx) = run_replay(history).await;
        assert_eq!(first, second);
        assert_eq!(first_ctx.activity_calls(), second_ctx.activity_calls());
    }
}
