//! Scripted collaborators for integration tests.
//!
//! Each mock counts its calls so tests can assert exactly how many fetches
//! a flow performed, and each can be scripted to fail, so retry ladders and
//! degraded paths can be driven deterministically.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tamarind_core::{
    CartLine, Category, CategoryId, CategoryPage, OrderDetail, OrderId, ProductRef,
};
use tamarind_storefront::api::{ApiError, CartSource, CategorySource, CreatedOrder, OrderGateway};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn server_error(message: &str) -> ApiError {
    ApiError::Server {
        status: 500,
        message: message.to_owned(),
    }
}

// =============================================================================
// Category source
// =============================================================================

/// A category source that replays a script of outcomes.
///
/// The last step repeats once the script is exhausted, so "always fails"
/// and "always succeeds" are one-step scripts.
pub struct ScriptedCategorySource {
    script: Mutex<Vec<Result<CategoryPage, String>>>,
    calls: AtomicUsize,
}

impl ScriptedCategorySource {
    #[must_use]
    pub fn new(script: Vec<Result<CategoryPage, String>>) -> Self {
        Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        }
    }

    /// A source that always returns `page`.
    #[must_use]
    pub fn always(page: CategoryPage) -> Self {
        Self::new(vec![Ok(page)])
    }

    /// A source that always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self::new(vec![Err("backend down".to_owned())])
    }

    /// How many fetches have been made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CategorySource for ScriptedCategorySource {
    async fn fetch_category_page(&self, _page: u32, _limit: u32) -> Result<CategoryPage, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = {
            let mut script = lock(&self.script);
            if script.len() > 1 {
                script.remove(0)
            } else {
                script.first().cloned().unwrap_or_else(|| Err("unscripted call".to_owned()))
            }
        };
        step.map_err(|message| server_error(&message))
    }
}

// =============================================================================
// Cart source
// =============================================================================

/// A cart source with a fixed server-side cart and an optional delay.
pub struct CountingCartSource {
    lines: Mutex<Vec<CartLine>>,
    delay: Mutex<Option<Duration>>,
    fail: Mutex<bool>,
    calls: AtomicUsize,
}

impl CountingCartSource {
    #[must_use]
    pub fn new(lines: Vec<CartLine>) -> Self {
        Self {
            lines: Mutex::new(lines),
            delay: Mutex::new(None),
            fail: Mutex::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make every fetch sleep for `delay` before resolving.
    pub fn set_delay(&self, delay: Duration) {
        *lock(&self.delay) = Some(delay);
    }

    /// Make every fetch fail from now on.
    pub fn set_failing(&self, failing: bool) {
        *lock(&self.fail) = failing;
    }

    /// How many fetches have been made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CartSource for CountingCartSource {
    async fn fetch_cart_lines(&self) -> Result<Vec<CartLine>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *lock(&self.fail) {
            return Err(server_error("cart unavailable"));
        }
        Ok(lock(&self.lines).clone())
    }
}

// =============================================================================
// Order gateway
// =============================================================================

/// An order gateway that mints a fixed order and serves a fixed detail.
pub struct MockOrderGateway {
    created: Mutex<Option<CreatedOrder>>,
    detail: Mutex<Option<OrderDetail>>,
    fail_fetch: Mutex<bool>,
    last_order_lines: Mutex<Vec<CartLine>>,
    create_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl MockOrderGateway {
    /// A gateway that creates `created` and serves `detail` on fetch.
    #[must_use]
    pub fn new(created: CreatedOrder, detail: OrderDetail) -> Self {
        Self {
            created: Mutex::new(Some(created)),
            detail: Mutex::new(Some(detail)),
            fail_fetch: Mutex::new(false),
            last_order_lines: Mutex::new(Vec::new()),
            create_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    /// Make order fetches fail from now on.
    pub fn set_fetch_failing(&self, failing: bool) {
        *lock(&self.fail_fetch) = failing;
    }

    /// The lines submitted by the most recent `create_order`.
    pub fn last_order_lines(&self) -> Vec<CartLine> {
        lock(&self.last_order_lines).clone()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderGateway for MockOrderGateway {
    async fn create_order(&self, lines: &[CartLine]) -> Result<CreatedOrder, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.last_order_lines) = lines.to_vec();
        lock(&self.created)
            .clone()
            .ok_or_else(|| server_error("order creation rejected"))
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<OrderDetail, ApiError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if *lock(&self.fail_fetch) {
            return Err(server_error("order lookup unavailable"));
        }
        lock(&self.detail)
            .clone()
            .ok_or_else(|| ApiError::NotFound(format!("order {order_id} not found")))
    }
}

// =============================================================================
// Builders
// =============================================================================

/// A category with the given ID and name.
#[must_use]
pub fn category(id: i64, name: &str) -> Category {
    Category {
        id: CategoryId::new(id),
        name: name.to_owned(),
        description: None,
        image: None,
    }
}

/// A one-page listing holding categories with the given names.
#[must_use]
pub fn category_page(names: &[&str]) -> CategoryPage {
    let categories: Vec<Category> = names
        .iter()
        .enumerate()
        .map(|(index, name)| category(index as i64 + 1, name))
        .collect();
    CategoryPage {
        total_count: categories.len() as u64,
        pages_count: 1,
        current_page: 1,
        categories,
    }
}

/// A cart line priced in cents, so `cart_line("p", 1999, 2)` is two units
/// at 19.99.
#[must_use]
pub fn cart_line(product: &str, price_cents: i64, quantity: u32) -> CartLine {
    CartLine {
        product_ref: ProductRef::new(product),
        name: format!("Product {product}"),
        price: Decimal::new(price_cents, 2),
        quantity,
        size: None,
        color: None,
        image: None,
    }
}
