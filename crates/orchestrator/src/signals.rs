//! Signals accepted by a cart orchestrator instance.

use domain::CartItem;
use serde::{Deserialize, Serialize};

/// Cart-scoped, point-to-point signals, addressed by cart id.
///
/// Signals destined for one instance are delivered and processed in
/// the order sent; a signal received after the instance left `Open`
/// has no effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CartSignal {
    /// Replaces the cart contents and/or sets the recipient email.
    /// Resets the abandonment deadline to now + inactivity window.
    UpdateCart {
        items: Vec<CartItem>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        email: Option<String>,
    },

    /// Requests immediate finalization via the payment charge.
    Checkout,
}
