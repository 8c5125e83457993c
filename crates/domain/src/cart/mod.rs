//! Cart state and related value objects.

mod state;
mod status;
mod value_objects;

pub use state::CartState;
pub use status::CartStatus;
pub use value_objects::{CartItem, Money, ProductId};
