//! Application state shared across surfaces.

use std::sync::Arc;

use crate::api::{ApiError, BackendClient, CartSource, CategorySource};
use crate::bus::{EventBus, Subscription};
use crate::config::StorefrontConfig;
use crate::shell::NavigationShell;
use crate::stores::{AuthStore, CartStore, CategoryStore};

/// Application state: the bus, the three stores, and the backend client.
///
/// This struct is cheaply cloneable via `Arc`; all clones share the same
/// stores. Safe to build outside a Tokio runtime — nothing here spawns.
/// [`AppState::navigation_shell`] does spawn and needs a runtime.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    bus: EventBus,
    auth: AuthStore,
    cart: CartStore,
    categories: CategoryStore,
    client: BackendClient,
    /// Keeps the logout wiring alive for the life of the state.
    _logout_wiring: Subscription,
}

impl AppState {
    /// Wire up stores, bus, and backend client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let bus = EventBus::new();
        let auth = AuthStore::new(bus.clone());
        let cart = CartStore::new(bus.clone());
        let categories = CategoryStore::new();
        let client = BackendClient::new(&config.api, auth.clone())?;

        // An unauthenticated user has no cart: whatever surface reads the
        // store after a logout must see it empty, shell or no shell.
        let logout_wiring = {
            let auth = auth.clone();
            let cart = cart.clone();
            bus.on_auth_changed(move || {
                if !auth.is_authenticated() {
                    cart.clear();
                }
            })
        };

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                bus,
                auth,
                cart,
                categories,
                client,
                _logout_wiring: logout_wiring,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the process-wide signal bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Get a reference to the session store.
    #[must_use]
    pub fn auth(&self) -> &AuthStore {
        &self.inner.auth
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the category store.
    #[must_use]
    pub fn categories(&self) -> &CategoryStore {
        &self.inner.categories
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn client(&self) -> &BackendClient {
        &self.inner.client
    }

    /// Build a navigation shell over this state's stores and client.
    ///
    /// Must be called inside a Tokio runtime; the shell spawns its reactor
    /// task on creation.
    #[must_use]
    pub fn navigation_shell(&self) -> NavigationShell {
        let inner = &self.inner;
        NavigationShell::new(
            &inner.bus,
            inner.auth.clone(),
            inner.cart.clone(),
            inner.categories.clone(),
            Arc::new(inner.client.clone()) as Arc<dyn CategorySource>,
            Arc::new(inner.client.clone()) as Arc<dyn CartSource>,
            inner.config.media_base_url.clone(),
            inner.config.api.category_page_size,
        )
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("authenticated", &self.inner.auth.is_authenticated())
            .finish_non_exhaustive()
    }
}
