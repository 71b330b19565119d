//! Order lookup command.
//!
//! # Usage
//!
//! ```bash
//! tamarind order ORD123
//! ```

use tamarind_core::OrderId;
use tamarind_storefront::api::{ApiError, OrderGateway};
use tamarind_storefront::state::AppState;

/// Fetch and print one order.
///
/// # Errors
///
/// [`ApiError::NotFound`] for an unknown ID, or whatever else the backend
/// call surfaces.
pub async fn show(state: &AppState, order_id: &str) -> Result<(), ApiError> {
    let detail = state.client().fetch_order(&OrderId::new(order_id)).await?;

    tracing::info!("Order {}", detail.order_id);
    tracing::info!("  Total: {}", detail.amount_display());
    if let Some(status) = &detail.status {
        tracing::info!("  Status: {status}");
    }
    if let Some(placed_at) = detail.placed_at {
        tracing::info!("  Placed: {placed_at}");
    }
    Ok(())
}
