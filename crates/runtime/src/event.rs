//! Workflow events and the history journal.

use serde::{Deserialize, Serialize};

/// Monotonically increasing counter identifying a timer arming.
///
/// Every reset arms a fresh generation; a fire is honored only when
/// its generation matches the most recently armed one, which is how
/// stale fires from before a reset are told apart.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct TimerGeneration(u64);

impl TimerGeneration {
    /// Returns the next generation.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw counter value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TimerGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An event delivered to a suspended workflow instance.
///
/// The instance processes exactly one event at a time; this is the
/// only place the workflow blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkflowEvent {
    /// A durably delivered, instance-addressed signal payload.
    Signal(serde_json::Value),

    /// The durable timer armed with this generation fired.
    TimerFired(TimerGeneration),

    /// The hosting substrate is cancelling the instance.
    CancellationRequested,
}

/// One entry in an instance's recorded history.
///
/// The journal captures every decision input in order, so a fresh
/// re-execution over the same journal reaches the same terminal state
/// and makes the same activity invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum HistoryEvent {
    /// A signal was delivered to the instance.
    SignalReceived { payload: serde_json::Value },

    /// The workflow armed (or re-armed) its durable timer.
    TimerArmed {
        generation: TimerGeneration,
        delay_ms: u64,
    },

    /// The armed timer fired.
    TimerFired { generation: TimerGeneration },

    /// An activity invocation completed durably.
    ActivityCompleted {
        name: String,
        input: serde_json::Value,
        result: serde_json::Value,
        attempts: u32,
    },

    /// An activity invocation exhausted its retries.
    ActivityFailed {
        name: String,
        input: serde_json::Value,
        error: String,
        attempts: u32,
    },

    /// Cancellation was delivered to the instance.
    CancellationRequested,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_monotonic() {
        let g0 = TimerGeneration::default();
        let g1 = g0.next();
        let g2 = g1.next();
        assert!(g0 < g1 && g1 < g2);
        assert_eq!(g2.value(), 2);
    }

    #[test]
    fn test_history_event_serialization_roundtrip() {
        let events = vec![
            HistoryEvent::SignalReceived {
                payload: serde_json::json!({"type": "Checkout"}),
            },
            HistoryEvent::TimerArmed {
                generation: TimerGeneration::default().next(),
                delay_ms: 600_000,
            },
            HistoryEvent::TimerFired {
                generation: TimerGeneration::default().next(),
            },
            HistoryEvent::ActivityCompleted {
                name: "Charge".into(),
                input: serde_json::json!({"email": "a@b.com"}),
                result: serde_json::Value::Null,
                attempts: 1,
            },
            HistoryEvent::ActivityFailed {
                name: "NotifyAbandonment".into(),
                input: serde_json::json!("a@b.com"),
                error: "provider down".into(),
                attempts: 3,
            },
            HistoryEvent::CancellationRequested,
        ];

        for event in events {
            let json = serde_json::to_string(&event).unwrap();
            let deserialized: HistoryEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(event, deserialized);
        }
    }
}
