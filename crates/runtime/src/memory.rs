//! In-memory workflow host.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc, watch};
use tokio::time::Instant;

use crate::context::{Workflow, WorkflowContext};
use crate::error::{ActivityFailure, RuntimeError};
use crate::event::{HistoryEvent, TimerGeneration, WorkflowEvent};
use crate::registry::ActivityRegistry;
use crate::retry::RetryPolicy;

/// Messages deliverable to an instance's event channel.
enum InstanceMessage {
    Signal(serde_json::Value),
    Cancel,
}

/// A running (or finished) instance as seen from the host side.
struct InstanceHandle {
    tx: mpsc::UnboundedSender<InstanceMessage>,
    state_rx: watch::Receiver<Option<serde_json::Value>>,
    done_rx: watch::Receiver<Option<Result<serde_json::Value, String>>>,
    history: Arc<Mutex<Vec<HistoryEvent>>>,
}

/// In-process implementation of the durable-execution contract.
///
/// Hosts one task per workflow instance on a single named task queue.
/// Signals destined for one instance are delivered in send order and
/// processed one at a time; the durable timer is re-armed in place on
/// reset, and activities run with the configured retry policy. Every
/// decision input is journaled so instances can be re-executed with
/// [`ReplayContext`](crate::replay::ReplayContext).
///
/// This host keeps everything in process memory; it provides the same
/// interface a persistent substrate would, which is what the rest of
/// the system is written against. Terminated instances stay in the
/// table so their result, snapshot, and history remain queryable;
/// callers reclaim that memory with
/// [`evict_terminated`](Self::evict_terminated).
#[derive(Clone)]
pub struct InMemoryRuntime {
    task_queue: String,
    activities: Arc<ActivityRegistry>,
    retry_policy: RetryPolicy,
    instances: Arc<RwLock<HashMap<String, InstanceHandle>>>,
}

impl InMemoryRuntime {
    /// Creates a new host dispatching work through the named task
    /// queue. The queue name is shared between the instance-creation
    /// side and the executor side as a fixed configuration constant.
    pub fn new(task_queue: impl Into<String>, activities: ActivityRegistry) -> Self {
        Self {
            task_queue: task_queue.into(),
            activities: Arc::new(activities),
            retry_policy: RetryPolicy::default(),
            instances: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Replaces the activity retry policy.
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Returns the task queue name this host serves.
    pub fn task_queue(&self) -> &str {
        &self.task_queue
    }

    /// Starts a workflow instance under the given id.
    #[tracing::instrument(skip(self, workflow), fields(task_queue = %self.task_queue))]
    pub async fn start_workflow(
        &self,
        instance_id: &str,
        workflow: Arc<dyn Workflow>,
    ) -> Result<(), RuntimeError> {
        let mut instances = self.instances.write().await;
        if instances.contains_key(instance_id) {
            return Err(RuntimeError::DuplicateInstance(instance_id.to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(None);
        let (done_tx, done_rx) = watch::channel(None);
        let history = Arc::new(Mutex::new(Vec::new()));

        let mut ctx = InstanceContext {
            id: instance_id.to_string(),
            rx,
            armed: None,
            generation: TimerGeneration::default(),
            activities: Arc::clone(&self.activities),
            retry_policy: self.retry_policy.clone(),
            history: Arc::clone(&history),
            state_tx,
        };

        tokio::spawn(async move {
            tracing::info!(instance_id = %ctx.id, "workflow instance started");
            let result = workflow.run(&mut ctx).await.map_err(|e| e.to_string());
            match &result {
                Ok(_) => tracing::info!(instance_id = %ctx.id, "workflow instance finished"),
                Err(e) => {
                    tracing::error!(instance_id = %ctx.id, error = %e, "workflow instance failed");
                }
            }
            let _ = done_tx.send(Some(result));
        });

        instances.insert(
            instance_id.to_string(),
            InstanceHandle {
                tx,
                state_rx,
                done_rx,
                history,
            },
        );
        Ok(())
    }

    /// Sends a signal to an instance. Fails if the instance is unknown
    /// or has already terminated.
    pub async fn signal(
        &self,
        instance_id: &str,
        payload: serde_json::Value,
    ) -> Result<(), RuntimeError> {
        let instances = self.instances.read().await;
        let handle = instances
            .get(instance_id)
            .ok_or_else(|| RuntimeError::InstanceNotFound(instance_id.to_string()))?;
        if handle.done_rx.borrow().is_some() {
            return Err(RuntimeError::InstanceTerminated(instance_id.to_string()));
        }
        handle
            .tx
            .send(InstanceMessage::Signal(payload))
            .map_err(|_| RuntimeError::InstanceTerminated(instance_id.to_string()))
    }

    /// Requests cancellation of an instance. Once delivered, the
    /// instance stops accepting signals and must not start either
    /// terminal activity.
    pub async fn cancel(&self, instance_id: &str) -> Result<(), RuntimeError> {
        let instances = self.instances.read().await;
        let handle = instances
            .get(instance_id)
            .ok_or_else(|| RuntimeError::InstanceNotFound(instance_id.to_string()))?;
        if handle.done_rx.borrow().is_some() {
            return Err(RuntimeError::InstanceTerminated(instance_id.to_string()));
        }
        handle
            .tx
            .send(InstanceMessage::Cancel)
            .map_err(|_| RuntimeError::InstanceTerminated(instance_id.to_string()))
    }

    /// Returns the latest state snapshot the instance published.
    pub async fn query_state(
        &self,
        instance_id: &str,
    ) -> Result<Option<serde_json::Value>, RuntimeError> {
        let instances = self.instances.read().await;
        let handle = instances
            .get(instance_id)
            .ok_or_else(|| RuntimeError::InstanceNotFound(instance_id.to_string()))?;
        Ok(handle.state_rx.borrow().clone())
    }

    /// Awaits the instance's terminal result.
    pub async fn result(&self, instance_id: &str) -> Result<serde_json::Value, RuntimeError> {
        let mut done_rx = {
            let instances = self.instances.read().await;
            let handle = instances
                .get(instance_id)
                .ok_or_else(|| RuntimeError::InstanceNotFound(instance_id.to_string()))?;
            handle.done_rx.clone()
        };
        let result = done_rx
            .wait_for(|r| r.is_some())
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?
            .clone();
        match result {
            Some(Ok(value)) => Ok(value),
            Some(Err(e)) => Err(RuntimeError::WorkflowFailed(e)),
            None => Err(RuntimeError::ChannelClosed),
        }
    }

    /// Returns true if the instance has reached its terminal result.
    pub async fn is_terminated(&self, instance_id: &str) -> Result<bool, RuntimeError> {
        let instances = self.instances.read().await;
        let handle = instances
            .get(instance_id)
            .ok_or_else(|| RuntimeError::InstanceNotFound(instance_id.to_string()))?;
        Ok(handle.done_rx.borrow().is_some())
    }

    /// Drops all terminated instances, releasing their histories and
    /// published snapshots. Running instances are untouched. Returns
    /// how many were evicted; their ids become unknown to the host.
    pub async fn evict_terminated(&self) -> usize {
        let mut instances = self.instances.write().await;
        let before = instances.len();
        instances.retain(|_, handle| handle.done_rx.borrow().is_none());
        before - instances.len()
    }

    /// Returns a copy of the instance's recorded history.
    pub async fn history(&self, instance_id: &str) -> Result<Vec<HistoryEvent>, RuntimeError> {
        let instances = self.instances.read().await;
        let handle = instances
            .get(instance_id)
            .ok_or_else(|| RuntimeError::InstanceNotFound(instance_id.to_string()))?;
        let history = handle.history.lock().unwrap().clone();
        Ok(history)
    }
}

/// A durable timer as armed on the live host.
struct ArmedTimer {
    deadline: Instant,
    generation: TimerGeneration,
}

/// Live [`WorkflowContext`] backing one hosted instance.
struct InstanceContext {
    id: String,
    rx: mpsc::UnboundedReceiver<InstanceMessage>,
    armed: Option<ArmedTimer>,
    generation: TimerGeneration,
    activities: Arc<ActivityRegistry>,
    retry_policy: RetryPolicy,
    history: Arc<Mutex<Vec<HistoryEvent>>>,
    state_tx: watch::Sender<Option<serde_json::Value>>,
}

impl InstanceContext {
    fn record(&self, event: HistoryEvent) {
        self.history.lock().unwrap().push(event);
    }

    fn on_message(&mut self, message: Option<InstanceMessage>) -> Result<WorkflowEvent, RuntimeError> {
        match message {
            Some(InstanceMessage::Signal(payload)) => {
                self.record(HistoryEvent::SignalReceived {
                    payload: payload.clone(),
                });
                Ok(WorkflowEvent::Signal(payload))
            }
            Some(InstanceMessage::Cancel) => {
                self.record(HistoryEvent::CancellationRequested);
                Ok(WorkflowEvent::CancellationRequested)
            }
            None => Err(RuntimeError::ChannelClosed),
        }
    }
}

#[async_trait]
impl WorkflowContext for InstanceContext {
    fn instance_id(&self) -> &str {
        &self.id
    }

    async fn next_event(&mut self) -> Result<WorkflowEvent, RuntimeError> {
        match &self.armed {
            Some(timer) => {
                let deadline = timer.deadline;
                let generation = timer.generation;
                // A signal arriving together with the fire wins; the
                // reset it carries invalidates the armed deadline.
                tokio::select! {
                    biased;
                    message = self.rx.recv() => self.on_message(message),
                    () = tokio::time::sleep_until(deadline) => {
                        self.armed = None;
                        self.record(HistoryEvent::TimerFired { generation });
                        Ok(WorkflowEvent::TimerFired(generation))
                    }
                }
            }
            None => {
                let message = self.rx.recv().await;
                self.on_message(message)
            }
        }
    }

    async fn arm_timer(&mut self, delay: Duration) -> Result<TimerGeneration, RuntimeError> {
        self.generation = self.generation.next();
        self.armed = Some(ArmedTimer {
            deadline: Instant::now() + delay,
            generation: self.generation,
        });
        self.record(HistoryEvent::TimerArmed {
            generation: self.generation,
            delay_ms: delay.as_millis() as u64,
        });
        Ok(self.generation)
    }

    async fn call_activity(
        &mut self,
        name: &str,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, ActivityFailure> {
        let Some(handler) = self.activities.get(name) else {
            let detail = format!("activity not registered: {name}");
            tracing::error!(instance_id = %self.id, activity = name, "{detail}");
            self.record(HistoryEvent::ActivityFailed {
                name: name.to_string(),
                input,
                error: detail.clone(),
                attempts: 0,
            });
            return Err(ActivityFailure {
                name: name.to_string(),
                attempts: 0,
                detail,
            });
        };

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match handler(input.clone()).await {
                Ok(result) => {
                    self.record(HistoryEvent::ActivityCompleted {
                        name: name.to_string(),
                        input,
                        result: result.clone(),
                        attempts: attempt,
                    });
                    return Ok(result);
                }
                Err(e) if e.is_retryable() && attempt < self.retry_policy.max_attempts => {
                    let delay = self.retry_policy.backoff(attempt);
                    metrics::counter!("activity_retries_total").increment(1);
                    tracing::warn!(
                        instance_id = %self.id,
                        activity = name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "activity attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    let detail = e.to_string();
                    tracing::error!(
                        instance_id = %self.id,
                        activity = name,
                        attempts = attempt,
                        error = %detail,
                        "activity failed permanently"
                    );
                    self.record(HistoryEvent::ActivityFailed {
                        name: name.to_string(),
                        input,
                        error: detail.clone(),
                        attempts: attempt,
                    });
                    return Err(ActivityFailure {
                        name: name.to_string(),
                        attempts: attempt,
                        detail,
                    });
                }
            }
        }
    }

    fn publish_state(&mut self, state: serde_json::Value) {
        let _ = self.state_tx.send_replace(Some(state));
    }
}
