//! Client-side stores.
//!
//! Each store has exactly one writer (its own methods) and many readers.
//! `snapshot()` is synchronous and non-blocking; `subscribe()` registers a
//! listener that runs synchronously after every effective mutation, with
//! the snapshot-the-listener-list semantics documented in [`crate::bus`].

pub mod auth;
pub mod cart;
pub mod categories;
pub mod persist;

pub use auth::AuthStore;
pub use cart::CartStore;
pub use categories::CategoryStore;
