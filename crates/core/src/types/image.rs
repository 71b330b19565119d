//! Image references as the backend sends them.

use serde::{Deserialize, Serialize};

/// An image reference from the backend.
///
/// The backend is inconsistent here: some records carry a full URL, others
/// a path relative to the media host. The raw value is kept verbatim and
/// resolved against the configured media base at display time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wrap a raw image reference.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw reference.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the reference is already a full URL and needs no media base.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }
}

impl From<String> for ImageRef {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for ImageRef {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}
