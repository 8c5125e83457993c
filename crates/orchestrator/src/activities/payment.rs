//! Payment provider client boundary.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use domain::Money;
use serde::{Deserialize, Serialize};

use crate::activities::ProviderError;

/// A single charge submission to the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeRequest {
    /// Amount in the smallest currency unit.
    pub amount: Money,
    /// Fixed currency code.
    pub currency: String,
    /// Human-readable, comma-joined product description.
    pub description: String,
    /// Payment source token. The demo flow uses a fixed test token; a
    /// real deployment supplies a tokenized payment method reference
    /// from the checkout flow.
    pub source_token: String,
    /// Receipt recipient, already normalized.
    pub receipt_email: String,
}

/// Provider acknowledgement of a captured charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeReceipt {
    /// The charge id assigned by the provider.
    pub charge_id: String,
}

/// Client for the external payment processor.
///
/// The real integration lives outside this repo; the orchestration
/// side only depends on this boundary.
#[async_trait]
pub trait PaymentClient: Send + Sync {
    /// Performs one charge attempt.
    async fn create_charge(&self, request: ChargeRequest) -> Result<ChargeReceipt, ProviderError>;
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    charges: Vec<ChargeRequest>,
    next_id: u32,
    fail_on_charge: bool,
}

/// In-memory payment client for tests and the demo deployment.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentClient {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentClient {
    /// Creates a new in-memory payment client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the client to reject charge attempts.
    pub fn set_fail_on_charge(&self, fail: bool) {
        self.state.write().unwrap().fail_on_charge = fail;
    }

    /// Returns the number of captured charges.
    pub fn charge_count(&self) -> usize {
        self.state.read().unwrap().charges.len()
    }

    /// Returns all captured charge requests, in submission order.
    pub fn charges(&self) -> Vec<ChargeRequest> {
        self.state.read().unwrap().charges.clone()
    }

    /// Returns the most recently captured charge request.
    pub fn last_charge(&self) -> Option<ChargeRequest> {
        self.state.read().unwrap().charges.last().cloned()
    }
}

#[async_trait]
impl PaymentClient for InMemoryPaymentClient {
    async fn create_charge(&self, request: ChargeRequest) -> Result<ChargeReceipt, ProviderError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_charge {
            return Err(ProviderError::Rejected {
                provider: "payment",
                detail: "card declined".to_string(),
            });
        }

        state.next_id += 1;
        let charge_id = format!("ch-{:04}", state.next_id);
        state.charges.push(request);
        Ok(ChargeReceipt { charge_id })
    }
}
