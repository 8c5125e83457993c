//! Cart pricing against the catalog.

use serde::{Deserialize, Serialize};

use crate::cart::{CartState, Money};
use crate::catalog::Catalog;

/// A priced cart, derived on demand and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedOrder {
    /// Sum of `quantity × unit price` over all items.
    pub total: Money,
    /// Comma-joined resolved product names, in item order.
    pub description: String,
    /// How many items referenced a product missing from the catalog.
    ///
    /// A miss prices as a zero-cost, empty-name product instead of
    /// failing; callers use this count to log the undercharge risk.
    pub unknown_products: usize,
}

/// Prices a cart by resolving each item against the catalog.
///
/// Items referencing an unknown product contribute nothing to the
/// total and an empty name to the description. Duplicate product ids
/// are priced per entry, not merged.
pub fn price_cart(catalog: &Catalog, cart: &CartState) -> PricedOrder {
    let mut total = Money::zero();
    let mut description = String::new();
    let mut unknown_products = 0;

    for item in &cart.items {
        let (name, price) = match catalog.lookup(&item.product_id) {
            Some(product) => (product.name.as_str(), product.price),
            None => {
                unknown_products += 1;
                ("", Money::zero())
            }
        };
        total += price.multiply(item.quantity);
        if !description.is_empty() {
            description.push_str(", ");
        }
        description.push_str(name);
    }

    PricedOrder {
        total,
        description,
        unknown_products,
    }
}
