//! Tamarind storefront client runtime.
//!
//! This crate is the state-synchronization core of the storefront: the
//! pub-sub cart and auth stores, the category stores (plain and retrying),
//! the navigation shell view-model, and the checkout handoff. It owns no
//! rendering; embedders (the CLI, a UI) subscribe to the stores and read
//! derived views.
//!
//! # Architecture
//!
//! - [`config`] - Environment-driven configuration
//! - [`api`] - Backend REST client and the collaborator seams it implements
//! - [`bus`] - Process-wide `auth-changed` / `cart-changed` signals
//! - [`stores`] - CartStore, AuthStore, CategoryStore, local persistence
//! - [`loader`] - Retrying category surface (fixed-delay retry machine)
//! - [`shell`] - Navigation shell composing the stores into one view
//! - [`checkout`] - Order creation through payment confirmation and handoff
//! - [`state`] - `AppState` composition root wiring the pieces together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod bus;
pub mod checkout;
pub mod config;
pub mod loader;
pub mod media;
pub mod shell;
pub mod state;
pub mod stores;
