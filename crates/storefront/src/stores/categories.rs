//! Category store.
//!
//! Plain remote-backed store for the navigation menu: `refresh` fetches the
//! first page of the catalog and replaces the held list on success. On
//! failure the previous list is retained, so the menu keeps rendering the
//! last known categories while the caller decides what to tell the user.
//! Retry policy lives in [`crate::loader`], not here.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use tamarind_core::types::Category;

use crate::api::{ApiError, CategorySource};

/// Cheaply cloneable handle to the shared category list.
#[derive(Clone, Default)]
pub struct CategoryStore {
    inner: Arc<CategoryStoreInner>,
}

#[derive(Default)]
struct CategoryStoreInner {
    categories: Mutex<Vec<Category>>,
}

impl CategoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The held list, in backend order. Empty until the first successful
    /// refresh.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Category> {
        self.lock_categories().clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_categories().is_empty()
    }

    /// Fetch the first page of categories and replace the held list.
    ///
    /// Replacement happens only on success; an empty page still replaces
    /// (the backend said there are no categories). On failure the held
    /// list is kept as-is and the error is returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] from the source unchanged.
    pub async fn refresh(
        &self,
        source: &dyn CategorySource,
        limit: u32,
    ) -> Result<usize, ApiError> {
        let page = source.fetch_category_page(1, limit).await?;
        let count = page.categories.len();
        *self.lock_categories() = page.categories;
        debug!(count, "category list replaced");
        Ok(count)
    }

    fn lock_categories(&self) -> std::sync::MutexGuard<'_, Vec<Category>> {
        self.inner
            .categories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CategoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryStore")
            .field("categories", &self.lock_categories().len())
            .finish()
    }
}
