//! Cart inspection and mutation commands.
//!
//! # Usage
//!
//! ```bash
//! # Add two medium tees (merges with an existing M-variant line)
//! tamarind cart add --product tee-901 --name "Pocket Tee" --price 19.50 \
//!     --quantity 2 --size M
//!
//! # Drop the line entirely
//! tamarind cart set-quantity --product tee-901 --size M --quantity 0
//! ```
//!
//! The cart belongs to the signed-in account, so every mutation requires a
//! session. Mutations are written back to the configured cart file.

use rust_decimal::Decimal;
use tamarind_core::{CartLine, ImageRef, LineKey, ProductRef, format_amount};
use tamarind_storefront::state::AppState;
use tamarind_storefront::stores::persist::PersistError;
use thiserror::Error;

use super::save_cart;

/// Errors that can occur during cart commands.
#[derive(Debug, Error)]
pub enum CartCommandError {
    /// Cart mutations require a signed-in session.
    #[error("Not signed in. Run `tamarind auth login` first.")]
    SignedOut,

    /// The cart file could not be written.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Arguments for [`add`], as parsed from the command line.
#[derive(Debug)]
pub struct AddLine {
    /// Product reference.
    pub product: String,
    /// Display name for the line.
    pub name: String,
    /// Unit price.
    pub price: Decimal,
    /// Units to add.
    pub quantity: u32,
    /// Selected size.
    pub size: Option<String>,
    /// Selected color.
    pub color: Option<String>,
    /// Product image reference.
    pub image: Option<String>,
}

/// Print the cart lines and totals.
pub fn show(state: &AppState) {
    if !state.auth().is_authenticated() {
        tracing::info!("Not signed in; the cart belongs to the signed-in account.");
        return;
    }

    let snapshot = state.cart().snapshot();
    if snapshot.is_empty() {
        tracing::info!("Cart is empty");
        return;
    }

    for line in &snapshot.lines {
        let variant = [line.size.as_deref(), line.color.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" / ");
        if variant.is_empty() {
            tracing::info!(
                "  {} x{} @ {} = {}",
                line.name,
                line.quantity,
                format_amount(line.price),
                format_amount(line.total())
            );
        } else {
            tracing::info!(
                "  {} ({variant}) x{} @ {} = {}",
                line.name,
                line.quantity,
                format_amount(line.price),
                format_amount(line.total())
            );
        }
    }
    tracing::info!(
        "{} items, subtotal {}",
        snapshot.total_quantity(),
        format_amount(snapshot.total_amount())
    );
}

/// Add a line to the cart and persist it.
///
/// # Errors
///
/// [`CartCommandError::SignedOut`] without a session,
/// [`CartCommandError::Persist`] if the cart file cannot be written.
pub fn add(state: &AppState, args: AddLine) -> Result<(), CartCommandError> {
    require_session(state)?;

    let line = CartLine {
        product_ref: ProductRef::new(args.product),
        name: args.name,
        price: args.price,
        quantity: args.quantity,
        size: args.size,
        color: args.color,
        image: args.image.map(ImageRef::new),
    };

    if state.cart().add(line) {
        save_cart(state)?;
        tracing::info!("Added. {}", summary(state));
    } else {
        tracing::info!("Nothing to add (quantity 0)");
    }
    Ok(())
}

/// Set the quantity of an existing line. Zero removes the line.
///
/// # Errors
///
/// [`CartCommandError::SignedOut`] without a session,
/// [`CartCommandError::Persist`] if the cart file cannot be written.
pub fn set_quantity(
    state: &AppState,
    product: &str,
    size: Option<String>,
    color: Option<String>,
    quantity: u32,
) -> Result<(), CartCommandError> {
    require_session(state)?;

    let key = line_key(product, size, color);
    if state.cart().set_quantity(&key, quantity) {
        save_cart(state)?;
        tracing::info!("Updated. {}", summary(state));
    } else {
        tracing::info!("No such line; cart unchanged");
    }
    Ok(())
}

/// Remove a line from the cart.
///
/// # Errors
///
/// [`CartCommandError::SignedOut`] without a session,
/// [`CartCommandError::Persist`] if the cart file cannot be written.
pub fn remove(
    state: &AppState,
    product: &str,
    size: Option<String>,
    color: Option<String>,
) -> Result<(), CartCommandError> {
    require_session(state)?;

    let key = line_key(product, size, color);
    if state.cart().remove(&key) {
        save_cart(state)?;
        tracing::info!("Removed. {}", summary(state));
    } else {
        tracing::info!("No such line; cart unchanged");
    }
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// [`CartCommandError::SignedOut`] without a session,
/// [`CartCommandError::Persist`] if the cart file cannot be written.
pub fn clear(state: &AppState) -> Result<(), CartCommandError> {
    require_session(state)?;

    if state.cart().clear() {
        save_cart(state)?;
        tracing::info!("Cart emptied");
    } else {
        tracing::info!("Cart was already empty");
    }
    Ok(())
}

fn require_session(state: &AppState) -> Result<(), CartCommandError> {
    if state.auth().is_authenticated() {
        Ok(())
    } else {
        Err(CartCommandError::SignedOut)
    }
}

fn line_key(product: &str, size: Option<String>, color: Option<String>) -> LineKey {
    LineKey {
        product_ref: ProductRef::new(product),
        size,
        color,
    }
}

fn summary(state: &AppState) -> String {
    let snapshot = state.cart().snapshot();
    format!(
        "{} items, subtotal {}",
        snapshot.total_quantity(),
        format_amount(snapshot.total_amount())
    )
}
