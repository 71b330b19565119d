//! Categories as served by the backend catalog.

use serde::{Deserialize, Serialize};

use super::id::CategoryId;
use super::image::ImageRef;

/// Fallback shown when a category arrives without a usable name.
pub const UNNAMED_CATEGORY: &str = "Unnamed category";

/// A category name as it appears on the wire.
///
/// The catalog endpoint has shipped both shapes in the wild: a bare string
/// and an object with a `name` field. Both are accepted here and collapsed
/// to a plain string by [`CategoryName::normalize`] at the ingestion
/// boundary, so display code only ever deals in `String`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryName {
    /// Plain string form: `"name": "Sneakers"`.
    Raw(String),
    /// Object form: `"name": {"name": "Sneakers"}`.
    Entity(NamedEntity),
}

/// Object-shaped name payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntity {
    /// Display name.
    pub name: String,
}

impl CategoryName {
    /// Collapse either wire shape to a display string.
    ///
    /// Missing and whitespace-only names both fall back to
    /// [`UNNAMED_CATEGORY`] instead of failing the row.
    #[must_use]
    pub fn normalize(name: Option<Self>) -> String {
        let raw = match &name {
            Some(Self::Raw(s)) => s.as_str(),
            Some(Self::Entity(e)) => e.name.as_str(),
            None => "",
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            UNNAMED_CATEGORY.to_owned()
        } else {
            trimmed.to_owned()
        }
    }
}

/// A catalog category, fully normalized.
///
/// Constructed from wire rows exactly once; `name` is always a non-empty
/// display string by the time this type exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Backend row ID.
    pub id: CategoryId,
    /// Normalized display name.
    pub name: String,
    /// Optional marketing copy.
    pub description: Option<String>,
    /// Optional image, relative or absolute.
    pub image: Option<ImageRef>,
}

/// One page of the category listing, with the backend's paging envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryPage {
    /// Categories on this page, in backend order.
    pub categories: Vec<Category>,
    /// Total number of categories across all pages.
    pub total_count: u64,
    /// Total number of pages at the requested page size.
    pub pages_count: u32,
    /// The page this response covers (1-based).
    pub current_page: u32,
}

impl CategoryPage {
    /// True when the page carries no categories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
