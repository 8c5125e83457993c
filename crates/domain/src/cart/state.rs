//! Mutable cart contents, exclusively owned by one orchestrator instance.

use serde::{Deserialize, Serialize};

use crate::cart::value_objects::CartItem;
use crate::error::DomainError;

/// The contents of one shopping cart.
///
/// Created empty when the orchestrator instance starts and mutated
/// only by signals delivered to that instance. Activity adapters
/// receive an immutable snapshot; nothing else ever mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    /// Recipient email for the receipt or abandonment notification.
    pub email: Option<String>,
    /// Ordered line items. Duplicate product ids accumulate.
    pub items: Vec<CartItem>,
}

impl CartState {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an `UpdateCart` mutation: replaces the item list and,
    /// when provided, the recipient email.
    ///
    /// Every item is validated before anything is touched; a rejected
    /// update leaves the cart exactly as it was.
    pub fn apply_update(
        &mut self,
        items: Vec<CartItem>,
        email: Option<String>,
    ) -> Result<(), DomainError> {
        for item in &items {
            item.validate()?;
        }
        self.items = items;
        if let Some(email) = email {
            self.email = Some(email);
        }
        Ok(())
    }

    /// Returns true if the cart has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the recipient email, or the empty string if unset.
    ///
    /// The abandonment notification is sent with whatever email the
    /// cart has, empty included; normalization happens in the adapter.
    pub fn email_or_empty(&self) -> &str {
        self.email.as_deref().unwrap_or("")
    }
}
