//! Read-only product catalog.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cart::{Money, ProductId};

/// A product in the catalog. Immutable; identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// The product identifier.
    pub id: ProductId,
    /// Human-readable product name, used in charge descriptions.
    pub name: String,
    /// Unit price.
    pub price: Money,
}

impl Product {
    /// Creates a new product.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, price: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}

/// Read-only reference data mapping product ids to names and prices.
///
/// Built once at process start and injected into whatever needs
/// pricing; shared freely since it is never mutated.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: HashMap<ProductId, Product>,
}

impl Catalog {
    /// Builds a catalog from a list of products.
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: products
                .into_iter()
                .map(|p| (p.id.clone(), p))
                .collect(),
        }
    }

    /// The fixed demo product set.
    pub fn demo() -> Self {
        Self::from_products([
            Product::new("1", "iPhone 12 Pro", Money::from_cents(99999)),
            Product::new("2", "iPhone 12", Money::from_cents(69999)),
            Product::new("3", "iPhone SE", Money::from_cents(39900)),
            Product::new("4", "iPhone 11", Money::from_cents(59900)),
            Product::new("5", "Apple Watch Series 6", Money::from_cents(39900)),
            Product::new("6", "Apple Watch SE", Money::from_cents(27900)),
        ])
    }

    /// Looks up a product by id.
    pub fn lookup(&self, product_id: &ProductId) -> Option<&Product> {
        self.products.get(product_id)
    }

    /// Returns all products in the catalog, in no particular order.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// Returns the number of products in the catalog.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Returns true if the catalog has no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
