//! Cart status state machine.

use serde::{Deserialize, Serialize};

/// The status of a cart in its lifecycle.
///
/// State transitions:
/// ```text
/// Open ──┬──► Checked    (checkout signal, charge invoked)
///        ├──► Abandoned  (inactivity deadline fired, notification invoked)
///        └──► Cancelled  (host-initiated cancellation, nothing invoked)
/// ```
///
/// `Checked`, `Abandoned`, and `Cancelled` are terminal; no transition
/// leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CartStatus {
    /// Cart accepts mutations; neither terminal action has been taken.
    #[default]
    Open,

    /// Checkout was requested and the charge was invoked (terminal).
    Checked,

    /// The inactivity deadline elapsed and the abandonment notification
    /// was invoked (terminal).
    Abandoned,

    /// The hosting substrate cancelled the instance before either
    /// terminal action started (terminal).
    Cancelled,
}

impl CartStatus {
    /// Returns true if the cart still accepts signals and timer fires.
    pub fn is_open(&self) -> bool {
        matches!(self, CartStatus::Open)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        !self.is_open()
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CartStatus::Open => "Open",
            CartStatus::Checked => "Checked",
            CartStatus::Abandoned => "Abandoned",
            CartStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for CartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
