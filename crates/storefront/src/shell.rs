//! Navigation shell view-model.
//!
//! Composes the auth, cart, and category stores into the header's derived
//! state: account affordances, the admin menu gate, the category menu, and
//! the cart sidebar with its badge count. The shell owns no authoritative
//! data; everything in [`NavView`] is recomputed from store snapshots.
//!
//! The shell is a passive surface. Fetch failures here are logged and
//! degrade to an empty or stale display; the retrying behavior lives in
//! [`crate::loader`]. Must be created inside a Tokio runtime: a reactor
//! task bridges the synchronous bus signals onto async cart refetches, and
//! is aborted when the last shell handle drops.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};
use url::Url;

use tamarind_core::format_amount;
use tamarind_core::types::{AuthSession, CartLine, CartSnapshot, CategoryId};

use crate::api::{CartSource, CategorySource};
use crate::bus::{EventBus, Subscribers, Subscription};
use crate::media::resolve_image;
use crate::stores::{AuthStore, CartStore, CategoryStore};

// =============================================================================
// View types
// =============================================================================

/// Everything the header needs to render, derived from store snapshots.
#[derive(Debug, Clone)]
pub struct NavView {
    /// Whether a session is active.
    pub authenticated: bool,
    /// Account affordances; `None` renders the sign-in control instead.
    pub account: Option<AccountView>,
    /// Whether the admin menu entries are visible.
    pub show_admin_menu: bool,
    /// Category menu entries, in backend order.
    pub categories: Vec<CategoryMenuItem>,
    /// Cart sidebar contents. Always empty while unauthenticated.
    pub cart: CartSidebarView,
}

/// Account section of the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountView {
    pub user_name: String,
    /// Resolved avatar URL (placeholder when the account has none).
    pub profile_image: String,
}

/// One entry in the category menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMenuItem {
    pub id: CategoryId,
    pub name: String,
    /// Resolved image URL.
    pub image: String,
}

/// Cart sidebar display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSidebarView {
    pub items: Vec<CartItemView>,
    /// Badge count: sum of line quantities.
    pub item_count: u64,
    /// Formatted subtotal, two decimal places.
    pub subtotal: String,
}

/// One line in the cart sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub name: String,
    /// Chosen size and color, joined for display; `None` for plain products.
    pub variant: Option<String>,
    pub quantity: u32,
    /// Formatted unit price.
    pub unit_price: String,
    /// Formatted line total (unit price times quantity).
    pub line_total: String,
    /// Resolved image URL.
    pub image: String,
}

impl CartSidebarView {
    /// Sidebar for an empty (or hidden) cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            item_count: 0,
            subtotal: format_amount(rust_decimal::Decimal::ZERO),
        }
    }

    /// Derive the sidebar from a cart snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &CartSnapshot, media_base: &Url) -> Self {
        Self {
            items: snapshot
                .lines
                .iter()
                .map(|line| CartItemView::from_line(line, media_base))
                .collect(),
            item_count: snapshot.total_quantity(),
            subtotal: format_amount(snapshot.total_amount()),
        }
    }
}

impl CartItemView {
    fn from_line(line: &CartLine, media_base: &Url) -> Self {
        let variant = match (&line.size, &line.color) {
            (Some(size), Some(color)) => Some(format!("{size} / {color}")),
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (None, None) => None,
        };
        Self {
            name: line.name.clone(),
            variant,
            quantity: line.quantity,
            unit_price: format_amount(line.price),
            line_total: format_amount(line.total()),
            image: resolve_image(media_base, line.image.as_ref()),
        }
    }
}

// =============================================================================
// Shell
// =============================================================================

/// Signals forwarded from the bus into the reactor task.
#[derive(Debug, Clone, Copy)]
enum ShellSignal {
    Auth,
    Cart,
}

/// The header surface. Cheap to clone; clones share state and reactor.
#[derive(Clone)]
pub struct NavigationShell {
    inner: Arc<ShellInner>,
}

struct ShellInner {
    auth: AuthStore,
    cart: CartStore,
    categories: CategoryStore,
    category_source: Arc<dyn CategorySource>,
    cart_source: Arc<dyn CartSource>,
    media_base: Url,
    category_limit: u32,
    /// Last observed auth state, for detecting transitions (a profile
    /// update also raises `auth-changed` but is not a transition).
    was_authenticated: Mutex<bool>,
    view_changed: Subscribers<()>,
    bus_subs: Mutex<Vec<Subscription>>,
    reactor: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for ShellInner {
    fn drop(&mut self) {
        if let Some(reactor) = self
            .reactor
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            reactor.abort();
        }
    }
}

impl NavigationShell {
    /// Wire a shell over the given stores and sources.
    ///
    /// Subscribes to both bus signals immediately; call
    /// [`NavigationShell::mount`] once to do the initial fetches.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        bus: &EventBus,
        auth: AuthStore,
        cart: CartStore,
        categories: CategoryStore,
        category_source: Arc<dyn CategorySource>,
        cart_source: Arc<dyn CartSource>,
        media_base: Url,
        category_limit: u32,
    ) -> Self {
        let was_authenticated = auth.is_authenticated();
        let inner = Arc::new(ShellInner {
            auth,
            cart,
            categories,
            category_source,
            cart_source,
            media_base,
            category_limit,
            was_authenticated: Mutex::new(was_authenticated),
            view_changed: Subscribers::new(),
            bus_subs: Mutex::new(Vec::new()),
            reactor: Mutex::new(None),
        });

        let (tx, rx) = mpsc::unbounded_channel();
        let auth_sub = bus.on_auth_changed({
            let tx = tx.clone();
            move || {
                let _ = tx.send(ShellSignal::Auth);
            }
        });
        let cart_sub = bus.on_cart_changed({
            let tx = tx.clone();
            move || {
                let _ = tx.send(ShellSignal::Cart);
            }
        });
        drop(tx);
        *inner
            .bus_subs
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = vec![auth_sub, cart_sub];

        let reactor = tokio::spawn(run_reactor(Arc::downgrade(&inner), rx));
        *inner
            .reactor
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(reactor);

        Self { inner }
    }

    /// Initial fetches: exactly one category fetch, and exactly one cart
    /// fetch while authenticated. Failures degrade to the last known (or
    /// empty) display and are only logged.
    #[instrument(skip(self))]
    pub async fn mount(&self) {
        match self
            .inner
            .categories
            .refresh(self.inner.category_source.as_ref(), self.inner.category_limit)
            .await
        {
            Ok(count) => debug!(count, "category menu ready"),
            Err(error) => {
                warn!(%error, "category fetch failed; menu keeps the last known list");
            }
        }

        if self.inner.auth.is_authenticated() {
            match self.inner.cart_source.fetch_cart_lines().await {
                Ok(lines) => {
                    self.inner.cart.replace_lines(lines);
                }
                Err(error) => {
                    warn!(%error, "cart fetch failed; sidebar keeps the last known cart");
                }
            }
        }

        self.inner.view_changed.notify(&());
    }

    /// Recompute the header view from current store snapshots.
    #[must_use]
    pub fn view(&self) -> NavView {
        let inner = &self.inner;

        // One session read, so the account, the admin gate, and the cart
        // visibility cannot disagree about who is signed in.
        let session = inner.auth.session();
        let authenticated = session.is_some();
        let show_admin_menu = session.as_ref().is_some_and(AuthSession::is_admin);
        let account = session.map(|session| AccountView {
            profile_image: resolve_image(&inner.media_base, session.profile_image.as_ref()),
            user_name: session.user_name,
        });

        let categories = inner
            .categories
            .snapshot()
            .into_iter()
            .map(|category| CategoryMenuItem {
                id: category.id,
                image: resolve_image(&inner.media_base, category.image.as_ref()),
                name: category.name,
            })
            .collect();

        let cart = if authenticated {
            CartSidebarView::from_snapshot(&inner.cart.snapshot(), &inner.media_base)
        } else {
            CartSidebarView::empty()
        };

        NavView {
            authenticated,
            account,
            show_admin_menu,
            categories,
            cart,
        }
    }

    /// Registers a listener invoked whenever the derived view may have
    /// changed. Dropping the returned [`Subscription`] unregisters it.
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.view_changed.subscribe(move |&()| listener())
    }
}

impl std::fmt::Debug for NavigationShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationShell")
            .field("authenticated", &self.inner.auth.is_authenticated())
            .finish_non_exhaustive()
    }
}

/// Reacts to bus signals. Holds only a weak reference between awaits so a
/// fetch resolving after teardown updates nothing.
async fn run_reactor(
    inner: Weak<ShellInner>,
    mut signals: mpsc::UnboundedReceiver<ShellSignal>,
) {
    while let Some(signal) = signals.recv().await {
        let Some(shell) = inner.upgrade() else { return };
        match signal {
            ShellSignal::Cart => {
                shell.view_changed.notify(&());
            }
            ShellSignal::Auth => {
                let now = shell.auth.is_authenticated();
                let before = {
                    let mut held = shell
                        .was_authenticated
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner);
                    std::mem::replace(&mut *held, now)
                };

                if now && !before {
                    // Signing in adopts the server-side cart.
                    let source = Arc::clone(&shell.cart_source);
                    drop(shell);
                    let fetched = source.fetch_cart_lines().await;
                    let Some(shell) = inner.upgrade() else { return };
                    match fetched {
                        Ok(lines) => {
                            shell.cart.replace_lines(lines);
                        }
                        Err(error) => {
                            warn!(%error, "cart fetch after sign-in failed; keeping local cart");
                        }
                    }
                    shell.view_changed.notify(&());
                } else if !now && before {
                    // Signing out empties the display immediately, without
                    // touching the network.
                    shell.cart.clear();
                    shell.view_changed.notify(&());
                } else {
                    // Same auth state; the profile may still have changed.
                    shell.view_changed.notify(&());
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use tamarind_core::types::{Category, CategoryPage, ImageRef, ProductRef, Role};

    use crate::api::ApiError;

    use super::*;

    struct FixedCategorySource {
        page: CategoryPage,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CategorySource for FixedCategorySource {
        async fn fetch_category_page(
            &self,
            _page: u32,
            _limit: u32,
        ) -> Result<CategoryPage, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.page.clone())
        }
    }

    struct FixedCartSource {
        lines: Vec<CartLine>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CartSource for FixedCartSource {
        async fn fetch_cart_lines(&self) -> Result<Vec<CartLine>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.lines.clone())
        }
    }

    fn line(product: &str, quantity: u32, size: Option<&str>, color: Option<&str>) -> CartLine {
        CartLine {
            product_ref: ProductRef::new(product),
            name: format!("Product {product}"),
            price: Decimal::new(2000, 2),
            quantity,
            size: size.map(str::to_owned),
            color: color.map(str::to_owned),
            image: Some(ImageRef::new("uploads/p.png")),
        }
    }

    struct Fixture {
        bus: EventBus,
        auth: AuthStore,
        cart: CartStore,
        category_source: Arc<FixedCategorySource>,
        cart_source: Arc<FixedCartSource>,
    }

    impl Fixture {
        fn new(categories: Vec<Category>, server_cart: Vec<CartLine>) -> Self {
            let bus = EventBus::new();
            Self {
                auth: AuthStore::new(bus.clone()),
                cart: CartStore::new(bus.clone()),
                bus,
                category_source: Arc::new(FixedCategorySource {
                    page: CategoryPage {
                        total_count: categories.len() as u64,
                        pages_count: 1,
                        current_page: 1,
                        categories,
                    },
                    calls: AtomicUsize::new(0),
                }),
                cart_source: Arc::new(FixedCartSource {
                    lines: server_cart,
                    calls: AtomicUsize::new(0),
                }),
            }
        }

        fn shell(&self) -> NavigationShell {
            NavigationShell::new(
                &self.bus,
                self.auth.clone(),
                self.cart.clone(),
                CategoryStore::new(),
                Arc::clone(&self.category_source) as Arc<dyn CategorySource>,
                Arc::clone(&self.cart_source) as Arc<dyn CartSource>,
                Url::parse("https://media.example.com").unwrap(),
                12,
            )
        }
    }

    fn category(id: i64, name: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_owned(),
            description: None,
            image: None,
        }
    }

    #[tokio::test]
    async fn mount_skips_the_cart_fetch_while_unauthenticated() {
        let fixture = Fixture::new(vec![category(1, "Shoes")], vec![line("p-1", 2, None, None)]);
        let shell = fixture.shell();

        shell.mount().await;

        assert_eq!(fixture.category_source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fixture.cart_source.calls.load(Ordering::SeqCst), 0);

        let view = shell.view();
        assert!(!view.authenticated);
        assert!(view.account.is_none());
        assert_eq!(view.categories.len(), 1);
        assert_eq!(view.cart.item_count, 0);
    }

    #[tokio::test]
    async fn mount_fetches_the_cart_exactly_once_when_authenticated() {
        let fixture = Fixture::new(
            vec![category(1, "Shoes")],
            vec![line("p-1", 2, Some("M"), Some("Blue"))],
        );
        fixture
            .auth
            .login(AuthSession::new("tok", "ada", Role::Customer));
        let shell = fixture.shell();

        shell.mount().await;

        assert_eq!(fixture.cart_source.calls.load(Ordering::SeqCst), 1);

        let view = shell.view();
        assert!(view.authenticated);
        assert_eq!(view.cart.item_count, 2);
        assert_eq!(view.cart.subtotal, "40.00");
        assert_eq!(view.cart.items[0].variant.as_deref(), Some("M / Blue"));
        assert_eq!(
            view.cart.items[0].image,
            "https://media.example.com/uploads/p.png"
        );
    }

    #[tokio::test]
    async fn cart_sidebar_is_hidden_while_unauthenticated() {
        let fixture = Fixture::new(Vec::new(), Vec::new());
        // Lines in the local store must not leak into a signed-out view.
        fixture.cart.add(line("p-1", 3, None, None));
        let shell = fixture.shell();

        let view = shell.view();
        assert_eq!(view.cart.item_count, 0);
        assert!(view.cart.items.is_empty());
        assert_eq!(view.cart.subtotal, "0.00");
    }

    #[tokio::test]
    async fn admin_menu_is_gated_on_role() {
        let fixture = Fixture::new(Vec::new(), Vec::new());
        let shell = fixture.shell();

        fixture
            .auth
            .login(AuthSession::new("tok", "ada", Role::Customer));
        assert!(!shell.view().show_admin_menu);

        fixture
            .auth
            .login(AuthSession::new("tok", "root", Role::Admin));
        assert!(shell.view().show_admin_menu);
        assert_eq!(
            shell.view().account.unwrap().profile_image,
            crate::media::PLACEHOLDER_IMAGE
        );
    }

    #[tokio::test]
    async fn variant_text_handles_partial_options() {
        let media = Url::parse("https://media.example.com").unwrap();
        let only_size = CartItemView::from_line(&line("p", 1, Some("M"), None), &media);
        assert_eq!(only_size.variant.as_deref(), Some("M"));

        let plain = CartItemView::from_line(&line("p", 1, None, None), &media);
        assert_eq!(plain.variant, None);
        assert_eq!(plain.unit_price, "20.00");
        assert_eq!(plain.line_total, "20.00");
    }
}
