//! Durable-execution substrate contract and in-memory host.
//!
//! The real substrate hosting cart orchestrations (persistence format,
//! replay algorithm, cluster plumbing) is an external given. This crate
//! pins down the contract the orchestrator relies on:
//!
//! - deterministic re-execution of workflow code over a recorded history
//! - durable, resettable timers with stale-fire detection by generation
//! - durable signal delivery, in send order, one event at a time
//! - at-least-once activity invocation with a configurable retry policy
//!
//! [`InMemoryRuntime`] is a host implementing that contract in-process,
//! good enough to run the whole system and to exercise every timing and
//! failure scenario in tests. [`ReplayContext`] re-executes a workflow
//! against a captured [`HistoryEvent`] journal without touching any
//! external service, which is how replay idempotence is verified.

pub mod context;
pub mod error;
pub mod event;
pub mod memory;
pub mod registry;
pub mod replay;
pub mod retry;

pub use context::{Workflow, WorkflowContext};
pub use error::{ActivityError, ActivityFailure, RuntimeError, WorkflowError};
pub use event::{HistoryEvent, TimerGeneration, WorkflowEvent};
pub use memory::InMemoryRuntime;
pub use registry::ActivityRegistry;
pub use replay::{ActivityCall, ReplayContext};
pub use retry::RetryPolicy;
