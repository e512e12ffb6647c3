use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

pub mod store;

pub use store::CartStore;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("no cart line for product {0}")]
    NoSuchLine(Uuid),

    #[error("failed to write cart snapshot")]
    Snapshot(#[source] std::io::Error),

    #[error("failed to encode cart snapshot")]
    Encode(#[source] serde_json::Error),
}

/// One product selected for the current order. Name and price are captured
/// at the moment the product is added; later catalog edits do not reach
/// lines already in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
}

/// Point-in-time view of the cart, published to observers and serialized
/// into API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub total: i64,
}

/// The register's current order: at most one line per product, insertion
/// order preserved for display. A line's quantity is always >= 1; a line
/// driven to zero is removed, never kept.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from persisted lines, dropping any that violate the
    /// quantity invariant (a hand-edited or stale snapshot).
    pub fn from_lines(mut lines: Vec<CartLine>) -> Self {
        lines.retain(|line| line.quantity >= 1);
        Self { lines }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Add one unit of `product`. An existing line is incremented; otherwise
    /// a new line is appended with quantity 1, copying the product's current
    /// name and price. Stock is not consulted here.
    pub fn add_item(&mut self, product: &Product) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity += 1;
        } else {
            self.lines.push(CartLine {
                product_id: product.id,
                name: product.name.clone(),
                unit_price: product.base_price,
                quantity: 1,
            });
        }
    }

    /// Remove the line for `product_id`. Removing an absent line is a no-op.
    pub fn remove_item(&mut self, product_id: Uuid) {
        self.lines.retain(|line| line.product_id != product_id);
    }

    /// Set the line's quantity to an absolute value. A quantity of zero or
    /// less removes the line. Targeting a product that is not in the cart is
    /// reported, not ignored.
    pub fn update_quantity(&mut self, product_id: Uuid, quantity: i32) -> Result<(), CartError> {
        let Some(idx) = self.lines.iter().position(|l| l.product_id == product_id) else {
            return Err(CartError::NoSuchLine(product_id));
        };
        if quantity <= 0 {
            self.lines.remove(idx);
        } else {
            self.lines[idx].quantity = quantity;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of `unit_price * quantity` over all lines; zero for an empty cart.
    pub fn total(&self) -> i64 {
        self.lines
            .iter()
            .map(|line| line.unit_price * i64::from(line.quantity))
            .sum()
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
            total: self.total(),
        }
    }
}
