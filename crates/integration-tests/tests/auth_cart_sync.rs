//! Cart reactions to sign-in and sign-out.
//!
//! The navigation shell owns this wiring: signing in refetches the server
//! cart into the local store, signing out empties the store without any
//! network traffic, and a fetch still in flight when the shell is dropped
//! must not touch the stores afterwards.

use std::sync::Arc;
use std::time::Duration;

use tamarind_core::{AuthSession, Role};
use tamarind_integration_tests::mocks::{
    CountingCartSource, ScriptedCategorySource, cart_line, category_page,
};
use tamarind_integration_tests::{eventually, spin_until};
use tamarind_storefront::api::{CartSource, CategorySource};
use tamarind_storefront::bus::EventBus;
use tamarind_storefront::shell::NavigationShell;
use tamarind_storefront::stores::{AuthStore, CartStore, CategoryStore};
use url::Url;

struct Harness {
    bus: EventBus,
    auth: AuthStore,
    cart: CartStore,
    category_source: Arc<ScriptedCategorySource>,
    cart_source: Arc<CountingCartSource>,
}

impl Harness {
    fn new(server_cart: Vec<tamarind_core::CartLine>) -> Self {
        let bus = EventBus::new();
        Self {
            auth: AuthStore::new(bus.clone()),
            cart: CartStore::new(bus.clone()),
            bus,
            category_source: Arc::new(ScriptedCategorySource::always(category_page(&["Shoes"]))),
            cart_source: Arc::new(CountingCartSource::new(server_cart)),
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
            Url::parse("https://media.example.com").expect("static url"),
            12,
        )
    }

    fn login(&self, token: &str) {
        self.auth
            .login(AuthSession::new(token, "Ada", Role::Customer));
    }
}

#[tokio::test(start_paused = true)]
async fn signing_in_pulls_the_server_cart_into_the_store() {
    let harness = Harness::new(vec![cart_line("tee-1", 1950, 2)]);
    let shell = harness.shell();
    shell.mount().await;

    // Signed out: the mount must not have touched the cart endpoint.
    assert_eq!(harness.cart_source.calls(), 0);
    assert!(harness.cart.snapshot().is_empty());

    harness.login("tok-1");

    assert!(
        eventually(|| harness.cart.snapshot().total_quantity() == 2).await,
        "server cart should replace the local store after sign-in"
    );
    assert_eq!(harness.cart_source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn signing_out_empties_the_cart_without_network() {
    let harness = Harness::new(vec![cart_line("tee-1", 1950, 2)]);
    harness.login("tok-1");
    let shell = harness.shell();
    shell.mount().await;
    assert_eq!(harness.cart_source.calls(), 1);

    // Extra local activity on top of the fetched cart.
    harness.cart.add(cart_line("sock-9", 500, 1));
    assert_eq!(harness.cart.snapshot().total_quantity(), 3);

    harness.auth.logout();

    assert!(
        eventually(|| harness.cart.snapshot().is_empty()).await,
        "sign-out should empty the cart"
    );
    assert_eq!(harness.cart_source.calls(), 1, "sign-out must not refetch");
}

#[tokio::test(start_paused = true)]
async fn a_session_swap_without_a_transition_does_not_refetch() {
    let harness = Harness::new(vec![cart_line("tee-1", 1950, 1)]);
    harness.login("tok-1");
    let shell = harness.shell();
    shell.mount().await;
    assert_eq!(harness.cart_source.calls(), 1);

    // Raises auth-changed, but the shell stays authenticated throughout.
    harness.login("tok-2");

    // Give the reactor room to (incorrectly) schedule a fetch.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(harness.cart_source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn a_fetch_resolving_after_teardown_changes_nothing() {
    let harness = Harness::new(vec![cart_line("tee-1", 1950, 5)]);
    harness.cart_source.set_delay(Duration::from_millis(200));
    let shell = harness.shell();
    shell.mount().await;

    harness.login("tok-1");

    // Wait (without advancing the clock) until the refetch is in flight.
    assert!(
        spin_until(|| harness.cart_source.calls() == 1).await,
        "sign-in should start a cart fetch"
    );
    drop(shell);

    // Let the mock's delay elapse; the shell is gone, so nothing may land.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(harness.cart.snapshot().is_empty());
}
