//! Cart lifecycle orchestration.
//!
//! One workflow instance per cart. The instance owns the cart's state
//! exclusively, consumes `UpdateCart`/`Checkout` signals and a durable
//! abandonment timer, and drives exactly one terminal action: a payment
//! charge on checkout, or an abandonment notification when the cart
//! sits idle past its inactivity window.
//!
//! The workflow itself lives in [`workflow`]; the slow, fallible edges
//! (payment provider, email delivery) live behind the activity adapters
//! in [`activities`] and are invoked through the execution substrate
//! with its retry semantics.

pub mod activities;
pub mod signals;
pub mod workflow;

pub use activities::{
    ActivityConfig, CHARGE_ACTIVITY, CartActivities, ChargeReceipt, ChargeRequest, EmailMessage,
    InMemoryMailClient, InMemoryPaymentClient, MailClient, NOTIFY_ABANDONMENT_ACTIVITY,
    PaymentClient, ProviderError, register_cart_activities,
};
pub use signals::CartSignal;
pub use workflow::{CartOutcome, CartSnapshot, CartWorkflow};

/// The fixed task queue through which the hosting substrate dispatches
/// cart orchestrations and their activities. Shared by the
/// instance-creation side and the executor side.
pub const CART_TASK_QUEUE: &str = "CART_TASK_QUEUE";
