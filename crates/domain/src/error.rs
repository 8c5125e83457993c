//! Domain error types.

use thiserror::Error;

/// Errors that can occur during cart domain operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid quantity rejected at the mutation boundary.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },
}
