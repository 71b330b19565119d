//! Category listing commands.
//!
//! # Usage
//!
//! ```bash
//! # One-shot fetch of page 1
//! tamarind categories
//!
//! # Drive the retrying loader and watch it work through its attempts
//! tamarind categories --page 2 --browse
//! ```
//!
//! `--browse` runs the same retrying loader the navigation shell uses:
//! every state change is logged as it happens, and a run that exhausts its
//! retries exits with the loader's user-facing notice.

use std::sync::Arc;

use tamarind_core::CategoryPage;
use tamarind_storefront::api::{ApiError, CategorySource};
use tamarind_storefront::loader::{CategoryLoader, LoadState, MAX_RETRIES};
use tamarind_storefront::media;
use tamarind_storefront::state::AppState;
use thiserror::Error;

/// Errors that can occur during category commands.
#[derive(Debug, Error)]
pub enum CategoriesError {
    /// The one-shot fetch failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The retrying loader ran out of attempts.
    #[error("{0}")]
    LoadFailed(String),
}

/// Fetch and print one category page.
///
/// # Errors
///
/// [`CategoriesError::Api`] if the fetch fails; there is no retry on this
/// path (use `--browse` for the retrying loader).
pub async fn list(state: &AppState, page: u32) -> Result<(), CategoriesError> {
    let limit = state.config().api.category_page_size;
    let fetched = state.client().fetch_category_page(page, limit).await?;
    render_page(state, &fetched);
    Ok(())
}

/// Drive the retrying loader for `page`, logging every state change.
///
/// # Errors
///
/// [`CategoriesError::LoadFailed`] with the loader's notice once all
/// attempts are spent.
pub async fn browse(state: &AppState, page: u32) -> Result<(), CategoriesError> {
    let source: Arc<dyn CategorySource> = Arc::new(state.client().clone());
    let loader = CategoryLoader::new(source, state.config().api.category_page_size);
    loader.start(page);

    let mut watch = loader.watch();
    loop {
        let current = *watch.borrow_and_update();
        match current {
            LoadState::Loading => tracing::info!("Loading categories..."),
            LoadState::Retrying(attempt) => {
                tracing::info!("Fetch failed; retrying ({attempt}/{MAX_RETRIES})");
            }
            LoadState::Loaded => {
                if let Some(fetched) = loader.page() {
                    render_page(state, &fetched);
                }
                return Ok(());
            }
            LoadState::Failed => {
                let notice = loader
                    .notice()
                    .unwrap_or_else(|| "Couldn't load categories.".to_owned());
                return Err(CategoriesError::LoadFailed(notice));
            }
        }
        if watch.changed().await.is_err() {
            return Ok(());
        }
    }
}

fn render_page(state: &AppState, page: &CategoryPage) {
    if page.is_empty() {
        tracing::info!("No categories found");
        return;
    }
    tracing::info!(
        "Categories: page {} of {} ({} total)",
        page.current_page,
        page.pages_count,
        page.total_count
    );
    for category in &page.categories {
        let image = media::resolve_image(&state.config().media_base_url, category.image.as_ref());
        tracing::info!("  [{}] {}  ({image})", category.id, category.name);
    }
}
