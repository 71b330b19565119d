//! Cart lines and the pure reducers that operate on them.
//!
//! Everything in this module is synchronous and side-effect free. The
//! stateful cart store wraps these functions with locking and change
//! notification; tests exercise them directly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductRef;
use super::image::ImageRef;
use super::money;

/// One line in the cart.
///
/// Two lines are the same line when product, size, and color all match;
/// everything else (name, price, image) is display payload carried along.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product the line points at.
    pub product_ref: ProductRef,
    /// Display name at the time the line was added.
    pub name: String,
    /// Unit price.
    pub price: Decimal,
    /// Units of this variant in the cart.
    pub quantity: u32,
    /// Selected size, if the product has sizes.
    pub size: Option<String>,
    /// Selected color, if the product has colors.
    pub color: Option<String>,
    /// Optional product image.
    pub image: Option<ImageRef>,
}

impl CartLine {
    /// Identity of this line for merging and removal.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            product_ref: self.product_ref.clone(),
            size: self.size.clone(),
            color: self.color.clone(),
        }
    }

    /// Price of the whole line (unit price times quantity).
    #[must_use]
    pub fn total(&self) -> Decimal {
        money::line_total(self.price, self.quantity)
    }
}

/// What makes a cart line distinct: product plus chosen variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    /// Product the line points at.
    pub product_ref: ProductRef,
    /// Selected size.
    pub size: Option<String>,
    /// Selected color.
    pub color: Option<String>,
}

/// An immutable view of the cart handed to subscribers.
///
/// Aggregates are computed from the lines on demand, so they can never
/// drift out of sync with the line data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartSnapshot {
    /// Current cart lines, in insertion order.
    pub lines: Vec<CartLine>,
}

impl CartSnapshot {
    /// Snapshot over the given lines.
    #[must_use]
    pub const fn new(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// True when the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        total_quantity(&self.lines)
    }

    /// Sum of line totals over all lines.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        total_amount(&self.lines)
    }
}

/// Sum of quantities over `lines`. Zero-quantity lines contribute nothing.
#[must_use]
pub fn total_quantity(lines: &[CartLine]) -> u64 {
    lines
        .iter()
        .fold(0_u64, |acc, line| acc.saturating_add(u64::from(line.quantity)))
}

/// Sum of line totals over `lines`.
#[must_use]
pub fn total_amount(lines: &[CartLine]) -> Decimal {
    lines
        .iter()
        .fold(Decimal::ZERO, |acc, line| acc.saturating_add(line.total()))
}

/// Merge `incoming` into `lines`.
///
/// A line with the same key has its quantity bumped; a new key is appended.
/// An incoming quantity of zero changes nothing. Returns whether the lines
/// were modified.
pub fn merge_line(lines: &mut Vec<CartLine>, incoming: CartLine) -> bool {
    if incoming.quantity == 0 {
        return false;
    }
    let key = incoming.key();
    if let Some(existing) = lines.iter_mut().find(|line| line.key() == key) {
        existing.quantity = existing.quantity.saturating_add(incoming.quantity);
    } else {
        lines.push(incoming);
    }
    true
}

/// Set the quantity of the line with `key`.
///
/// Zero removes the line entirely; there is no such thing as a kept line
/// with quantity zero after a mutation. Returns whether the lines were
/// modified (setting an absent key, or re-setting the current quantity,
/// is a no-op).
pub fn set_line_quantity(lines: &mut Vec<CartLine>, key: &LineKey, quantity: u32) -> bool {
    if quantity == 0 {
        return remove_line(lines, key);
    }
    match lines.iter_mut().find(|line| line.key() == *key) {
        Some(line) if line.quantity == quantity => false,
        Some(line) => {
            line.quantity = quantity;
            true
        }
        None => false,
    }
}

/// Remove the line with `key`. Returns whether a line was removed.
pub fn remove_line(lines: &mut Vec<CartLine>, key: &LineKey) -> bool {
    let before = lines.len();
    lines.retain(|line| line.key() != *key);
    lines.len() != before
}
