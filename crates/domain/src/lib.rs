//! Domain layer for the cart orchestration system.
//!
//! This crate provides the pure, side-effect-free cart model:
//! - Cart state and its status state machine
//! - Product catalog (read-only reference data)
//! - Cart pricing against the catalog
//!
//! Nothing in this crate performs I/O or reads the clock; the
//! orchestrator replays deterministically on top of it.

pub mod cart;
pub mod catalog;
pub mod error;
pub mod pricing;

pub use cart::{CartItem, CartState, CartStatus, Money, ProductId};
pub use catalog::{Catalog, Product};
pub use error::DomainError;
pub use pricing::{PricedOrder, price_cart};
