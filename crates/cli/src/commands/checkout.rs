//! Checkout command: order creation through the success page.
//!
//! # Usage
//!
//! ```bash
//! tamarind checkout --payment-id pay_789
//! ```
//!
//! Runs the whole handoff in one invocation: create the order from the
//! cart, open payment, confirm it with the given payment reference, and
//! render the success page from a fresh order fetch. The `--payment-id`
//! stands in for the reference a real payment provider would call back
//! with.

use tamarind_core::PaymentId;
use tamarind_storefront::checkout::{CheckoutError, CheckoutFlow, present_success};
use tamarind_storefront::state::AppState;
use tamarind_storefront::stores::persist::PersistError;
use thiserror::Error;

use super::save_cart;

/// Errors that can occur during the checkout command.
#[derive(Debug, Error)]
pub enum CheckoutCommandError {
    /// A checkout step was rejected or a backend call failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The emptied cart could not be written back.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Run checkout for the current cart.
///
/// # Errors
///
/// [`CheckoutCommandError::Checkout`] if any step is rejected (signed out,
/// empty cart, bad payment reference) or a backend call fails;
/// [`CheckoutCommandError::Persist`] if the cart file cannot be rewritten
/// afterwards.
pub async fn run(state: &AppState, payment_id: &str) -> Result<(), CheckoutCommandError> {
    let gateway = state.client();
    let mut flow = CheckoutFlow::new();

    let order_id = flow.create_order(gateway, state.cart(), state.auth()).await?;
    tracing::info!("Order {order_id} created");

    flow.open_payment()?;
    tracing::info!("Payment window open; confirming with reference {payment_id}");
    flow.confirm_payment(PaymentId::new(payment_id))?;

    let handoff = flow.take_handoff()?;
    let success = present_success(gateway, Some(handoff)).await?;

    tracing::info!("Order placed");
    tracing::info!("  Order number: {}", success.order_number);
    tracing::info!("  Amount: {}", success.amount);
    tracing::info!("  Payment ref: {}", success.payment_ref);
    if let Some(status) = &success.status {
        tracing::info!("  Status: {status}");
    }

    // The cart is spent once the order exists.
    state.cart().clear();
    save_cart(state)?;
    Ok(())
}
