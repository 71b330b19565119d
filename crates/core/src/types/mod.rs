//! Core types for Tamarind.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod category;
pub mod id;
pub mod image;
pub mod money;
pub mod order;
pub mod session;

pub use cart::{CartLine, CartSnapshot, LineKey};
pub use category::{Category, CategoryName, CategoryPage, NamedEntity, UNNAMED_CATEGORY};
pub use id::*;
pub use image::ImageRef;
pub use money::format_amount;
pub use order::{HandoffError, OrderDetail, OrderHandoff};
pub use session::{AuthSession, Role};
