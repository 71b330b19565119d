//! Command implementations.
//!
//! Every command runs against a shared [`AppState`] built by [`load_state`],
//! which seeds the in-memory stores from the persisted session and cart
//! files. Commands that mutate a store write it back through [`save_cart`]
//! or [`save_session`] before returning.

use tamarind_storefront::api::ApiError;
use tamarind_storefront::config::StorefrontConfig;
use tamarind_storefront::state::AppState;
use tamarind_storefront::stores::persist::{self, PersistError};
use thiserror::Error;

pub mod auth;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod nav;
pub mod order;

/// Errors preparing the shared command state.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The backend client could not be built.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A persisted session or cart file could not be read.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Build the app state and seed it from the persisted session and cart.
///
/// The cart belongs to the signed-in account, so a signed-out run leaves
/// any leftover cart file untouched and starts empty.
///
/// # Errors
///
/// [`ContextError::Api`] if the backend client cannot be built,
/// [`ContextError::Persist`] if a persisted file exists but cannot be read.
pub fn load_state(config: StorefrontConfig) -> Result<AppState, ContextError> {
    let state = AppState::new(config)?;

    if let Some(path) = state.config().session_file.clone() {
        if let Some(session) = persist::load_session(&path)? {
            state.auth().login(session);
        }
    }

    if state.auth().is_authenticated() {
        if let Some(path) = state.config().cart_file.clone() {
            let lines = persist::load_cart(&path)?;
            if !lines.is_empty() {
                state.cart().replace_lines(lines);
            }
        }
    }

    Ok(state)
}

/// Write the cart store back to the configured cart file, if any.
///
/// # Errors
///
/// [`PersistError::Io`] if the file cannot be written.
pub fn save_cart(state: &AppState) -> Result<(), PersistError> {
    if let Some(path) = &state.config().cart_file {
        persist::save_cart(path, &state.cart().snapshot().lines)?;
    }
    Ok(())
}

/// Write the current session to the configured session file, or clear the
/// file when signed out.
///
/// # Errors
///
/// [`PersistError::Io`] if the file cannot be written or removed.
pub fn save_session(state: &AppState) -> Result<(), PersistError> {
    if let Some(path) = &state.config().session_file {
        match state.auth().session() {
            Some(session) => persist::save_session(path, &session)?,
            None => persist::clear_session(path)?,
        }
    }
    Ok(())
}
