//! Session management commands.
//!
//! # Usage
//!
//! ```bash
//! # Sign in with a backend token
//! tamarind auth login --token shp_123 --user-name "Ada" --role admin
//!
//! # Sign out (also empties the cart)
//! tamarind auth logout
//! ```
//!
//! Signing in stores the session in the configured session file so later
//! invocations pick it up; signing out clears that file and, through the
//! auth-changed signal, empties the cart.

use tamarind_core::{AuthSession, ImageRef, Role};
use tamarind_storefront::state::AppState;
use tamarind_storefront::stores::persist::PersistError;
use thiserror::Error;

use super::{save_cart, save_session};

/// Errors that can occur during session commands.
#[derive(Debug, Error)]
pub enum AuthCommandError {
    /// The session or cart file could not be written.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Sign in and persist the session.
///
/// # Errors
///
/// [`AuthCommandError::Persist`] if the session file cannot be written.
pub fn login(
    state: &AppState,
    token: String,
    user_name: String,
    role: Role,
    profile_image: Option<String>,
) -> Result<(), AuthCommandError> {
    let mut session = AuthSession::new(token, user_name, role);
    if let Some(image) = profile_image {
        session = session.with_profile_image(ImageRef::new(image));
    }

    let display_name = session.user_name.clone();
    state.auth().login(session);
    save_session(state)?;

    tracing::info!("Signed in as {display_name} ({role})");
    Ok(())
}

/// Sign out, clear the persisted session, and write out the emptied cart.
///
/// # Errors
///
/// [`AuthCommandError::Persist`] if the session or cart file cannot be
/// written.
pub fn logout(state: &AppState) -> Result<(), AuthCommandError> {
    if !state.auth().logout() {
        tracing::info!("Not signed in");
        return Ok(());
    }

    // Logout empties the cart through the auth-changed signal; persist both.
    save_session(state)?;
    save_cart(state)?;

    tracing::info!("Signed out");
    Ok(())
}

/// Print the signed-in account, if any.
pub fn show(state: &AppState) {
    match state.auth().session() {
        Some(session) => {
            tracing::info!("Signed in as {} ({})", session.user_name, session.role);
            if let Some(image) = &session.profile_image {
                tracing::info!("  Avatar: {}", image.as_str());
            }
        }
        None => tracing::info!("Not signed in"),
    }
}
