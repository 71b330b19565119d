//! Retrying category-listing surface.
//!
//! The navigation menu degrades silently when the catalog is unreachable;
//! this surface does the opposite. It drives its own fetch loop with a
//! bounded retry ladder and exposes every phase through a [`watch`]
//! channel so an embedder can render spinners, retry counters, and a
//! final error notice with a manual retry control.
//!
//! The ladder: `Loading → Loaded` on success, `Loading → Retrying(1)` on
//! the first failure, `Retrying(n) → Retrying(n+1)` while `n < 3`, then
//! `Failed`. A failure after any success restarts at `Retrying(1)` — the
//! previously loaded page stays visible while the refetch runs. `Failed`
//! goes back to `Loading` only through [`CategoryLoader::retry`].

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use tamarind_core::types::{Category, CategoryPage};

use crate::api::CategorySource;

/// Retries after the initial attempt before giving up.
pub const MAX_RETRIES: u8 = 3;

/// Fixed pause between attempts. Non-adaptive on purpose: the backend is
/// first-party and close, so backoff buys nothing over a predictable UI.
pub const RETRY_DELAY: Duration = Duration::from_millis(2000);

// =============================================================================
// State machine
// =============================================================================

/// Where the loader is in its fetch ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// First fetch in flight, nothing to show yet.
    Loading,
    /// A page is held and current (a background refetch may be running).
    Loaded,
    /// Attempt `n` failed; the next attempt is scheduled.
    Retrying(u8),
    /// Out of retries. Only [`CategoryLoader::retry`] leaves this state.
    Failed,
}

impl LoadState {
    /// State after a successful fetch. Always [`LoadState::Loaded`]; the
    /// retry counter does not survive a success.
    #[must_use]
    pub const fn after_success(self) -> Self {
        Self::Loaded
    }

    /// State after a failed fetch.
    #[must_use]
    pub const fn after_failure(self) -> Self {
        match self {
            // A failure after success restarts the ladder, never resumes it.
            Self::Loading | Self::Loaded => Self::Retrying(1),
            Self::Retrying(n) => {
                if n < MAX_RETRIES {
                    Self::Retrying(n + 1)
                } else {
                    Self::Failed
                }
            }
            Self::Failed => Self::Failed,
        }
    }

    /// True when no further attempt is scheduled.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Loaded | Self::Failed)
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "loading"),
            Self::Loaded => write!(f, "loaded"),
            Self::Retrying(n) => write!(f, "retrying (attempt {n} failed)"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

// =============================================================================
// Loader
// =============================================================================

/// Async driver around the state machine.
///
/// Cheap to clone; clones share one fetch loop. Dropping the last handle
/// aborts any in-flight fetch or pending retry timer, and a fetch that
/// resolves after teardown updates nothing (the loop only holds a weak
/// reference between awaits).
#[derive(Clone)]
pub struct CategoryLoader {
    inner: Arc<LoaderInner>,
}

struct LoaderInner {
    source: Arc<dyn CategorySource>,
    limit: u32,
    state: watch::Sender<LoadState>,
    page: Mutex<Option<CategoryPage>>,
    requested_page: AtomicU32,
    notice: Mutex<Option<String>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for LoaderInner {
    fn drop(&mut self) {
        if let Some(task) = self
            .task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

impl CategoryLoader {
    /// New loader in [`LoadState::Loading`] with nothing fetched yet.
    /// Call [`CategoryLoader::start`] to begin.
    #[must_use]
    pub fn new(source: Arc<dyn CategorySource>, limit: u32) -> Self {
        let (state, _) = watch::channel(LoadState::Loading);
        Self {
            inner: Arc::new(LoaderInner {
                source,
                limit,
                state,
                page: Mutex::new(None),
                requested_page: AtomicU32::new(1),
                notice: Mutex::new(None),
                task: Mutex::new(None),
            }),
        }
    }

    /// Begin the initial fetch of `page` (1-based; 0 is clamped to 1).
    /// Returns `false` when the loader already ran: a second mount does
    /// not restart the ladder.
    pub fn start(&self, page: u32) -> bool {
        if self.state() != LoadState::Loading {
            return false;
        }
        self.inner
            .requested_page
            .store(page.max(1), Ordering::Relaxed);
        self.try_spawn()
    }

    /// Navigate to another page while [`LoadState::Loaded`]. The held page
    /// stays visible during the refetch; a failure lands in
    /// `Retrying(1)` like any other post-success failure.
    /// Returns `false` when a fetch is already in flight or nothing has
    /// loaded yet.
    pub fn load_page(&self, page: u32) -> bool {
        if self.state() != LoadState::Loaded {
            return false;
        }
        self.inner
            .requested_page
            .store(page.max(1), Ordering::Relaxed);
        self.try_spawn()
    }

    /// Explicit user retry. Only valid from [`LoadState::Failed`]; returns
    /// whether a new ladder was started.
    pub fn retry(&self) -> bool {
        if self.state() != LoadState::Failed {
            return false;
        }
        *self.lock_notice() = None;
        self.inner.state.send_replace(LoadState::Loading);
        self.try_spawn()
    }

    /// Current machine state.
    #[must_use]
    pub fn state(&self) -> LoadState {
        *self.inner.state.borrow()
    }

    /// Watch channel over the machine state, for embedders that render
    /// each phase.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<LoadState> {
        self.inner.state.subscribe()
    }

    /// Last successfully fetched page, if any. Retained through retries
    /// and failures until the next success replaces it.
    #[must_use]
    pub fn page(&self) -> Option<CategoryPage> {
        self.lock_page().clone()
    }

    /// Categories of the held page, or empty before the first success.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.lock_page()
            .as_ref()
            .map(|p| p.categories.clone())
            .unwrap_or_default()
    }

    /// User-visible notice set when the ladder is exhausted, cleared on
    /// retry and on success.
    #[must_use]
    pub fn notice(&self) -> Option<String> {
        self.lock_notice().clone()
    }

    /// Spawn the fetch loop unless one is already running.
    fn try_spawn(&self) -> bool {
        let mut task = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return false;
        }
        let weak = Arc::downgrade(&self.inner);
        *task = Some(tokio::spawn(run_fetch(weak)));
        true
    }

    fn lock_page(&self) -> std::sync::MutexGuard<'_, Option<CategoryPage>> {
        self.inner.page.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_notice(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.inner
            .notice
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CategoryLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryLoader")
            .field("state", &self.state())
            .field("page", &self.inner.requested_page.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// The fetch loop. Holds only a weak reference across awaits so teardown
/// is never blocked and a late resolution cannot update a dropped loader.
async fn run_fetch(inner: Weak<LoaderInner>) {
    loop {
        let Some(loader) = inner.upgrade() else { return };
        let source = Arc::clone(&loader.source);
        let page = loader.requested_page.load(Ordering::Relaxed);
        let limit = loader.limit;
        drop(loader);

        let result = source.fetch_category_page(page, limit).await;
        drop(source);

        let Some(loader) = inner.upgrade() else { return };
        match result {
            Ok(fetched) => {
                let count = fetched.categories.len();
                *loader
                    .page
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(fetched);
                *loader
                    .notice
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = None;
                let previous = *loader.state.borrow();
                loader.state.send_replace(previous.after_success());
                debug!(page, count, "category page loaded");
                return;
            }
            Err(api_error) => {
                let next = loader.state.borrow().after_failure();
                loader.state.send_replace(next);

                if let LoadState::Retrying(attempt) = next {
                    warn!(page, attempt, error = %api_error, "category page fetch failed; retrying");
                    drop(loader);
                    tokio::time::sleep(RETRY_DELAY).await;
                    continue;
                }

                *loader
                    .notice
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) =
                    Some("Couldn't load categories. Check your connection and retry.".to_owned());
                error!(page, error = %api_error, "category page fetch failed; retries exhausted");
                return;
            }
        }
    }
}
