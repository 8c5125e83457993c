//! Shared types used across the cart orchestration crates.

pub mod types;

pub use types::CartId;
