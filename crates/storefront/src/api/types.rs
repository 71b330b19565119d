//! Wire types for the backend REST API.
//!
//! These mirror the JSON the backend actually sends, quirks included, and
//! convert into the domain types from `tamarind_core` at the boundary. The
//! category endpoint speaks snake_case; the order and cart endpoints speak
//! camelCase. Cart rows are parsed leniently: a malformed row degrades
//! instead of failing the whole response.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tamarind_core::{
    Category, CategoryId, CategoryName, CategoryPage, CartLine, ImageRef, OrderDetail, OrderId,
    ProductRef,
};
use tracing::warn;
use uuid::Uuid;

// =============================================================================
// Categories
// =============================================================================

/// `GET /api/category` response envelope.
#[derive(Debug, Deserialize)]
pub struct CategoryPageWire {
    #[serde(default)]
    pub rows: Vec<CategoryRowWire>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub pages_count: u32,
    #[serde(default)]
    pub current_page: u32,
}

/// One category row as the backend sends it.
#[derive(Debug, Deserialize)]
pub struct CategoryRowWire {
    pub id: i64,
    /// Either a bare string or an object with a `name` field.
    #[serde(default)]
    pub name: Option<CategoryName>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl From<CategoryRowWire> for Category {
    fn from(row: CategoryRowWire) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: CategoryName::normalize(row.name),
            description: row.description,
            image: row.image.map(ImageRef::new),
        }
    }
}

impl From<CategoryPageWire> for CategoryPage {
    fn from(page: CategoryPageWire) -> Self {
        Self {
            categories: page.rows.into_iter().map(Category::from).collect(),
            total_count: page.count,
            pages_count: page.pages_count,
            current_page: page.current_page,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// `GET /api/cart` response envelope.
#[derive(Debug, Deserialize)]
pub struct CartEnvelope {
    #[serde(default)]
    pub items: Vec<CartItemWire>,
}

/// One cart row as the backend sends it.
///
/// Every field except `productId` is tolerated missing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemWire {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub quantity: Option<u32>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl CartItemWire {
    /// Convert to a domain line, or `None` for a row with no product.
    ///
    /// Missing quantity counts as zero rather than erroring out.
    #[must_use]
    pub fn into_line(self) -> Option<CartLine> {
        let Some(product_id) = self.product_id else {
            warn!("dropping cart row without a product id");
            return None;
        };
        Some(CartLine {
            product_ref: ProductRef::new(product_id),
            name: self.name.unwrap_or_default(),
            price: self.price.unwrap_or_default(),
            quantity: self.quantity.unwrap_or(0),
            size: self.size,
            color: self.color,
            image: self.image.map(ImageRef::new),
        })
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Envelope the order endpoints wrap their payloads in.
#[derive(Debug, Deserialize)]
pub struct OrderEnvelope {
    pub data: OrderWire,
}

/// An order as the backend sends it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderWire {
    pub order_id: String,
    pub total_amount: Decimal,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<OrderWire> for OrderDetail {
    fn from(order: OrderWire) -> Self {
        Self {
            order_id: OrderId::new(order.order_id),
            total_amount: order.total_amount,
            status: order.status,
            placed_at: order.created_at,
        }
    }
}

/// `POST /api/orders` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemWire>,
    /// Client-minted key so a retried submission cannot double-create.
    pub idempotency_key: Uuid,
}

impl CreateOrderRequest {
    /// Build a request from the current cart lines with a fresh key.
    #[must_use]
    pub fn from_lines(lines: &[CartLine]) -> Self {
        Self {
            items: lines.iter().map(OrderItemWire::from).collect(),
            idempotency_key: Uuid::new_v4(),
        }
    }
}

/// One order line in a creation request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemWire {
    pub product_id: String,
    pub quantity: u32,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl From<&CartLine> for OrderItemWire {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_ref.as_str().to_owned(),
            quantity: line.quantity,
            price: line.price,
            size: line.size.clone(),
            color: line.color.clone(),
        }
    }
}
