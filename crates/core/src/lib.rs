//! Tamarind Core - Shared types library.
//!
//! This crate provides common types used across all Tamarind components:
//! - `storefront` - Client-side stores, navigation, and checkout handoff
//! - `cli` - Command-line tools for browsing and cart management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no timers. Everything that talks to the backend lives in the
//! storefront crate; everything here can be unit tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, money formatting, categories, cart lines, orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
