//! Synchronous pub-sub plumbing.
//!
//! Two pieces live here. [`Subscribers`] is the typed listener list every
//! store uses for its own change notifications. [`EventBus`] carries the two
//! process-wide signals, `auth-changed` and `cart-changed`, so independent
//! surfaces stay synchronized without holding references to each other.
//!
//! Dispatch is synchronous and uses snapshot semantics: the listener list is
//! copied under the lock, then invoked with the lock released. A listener
//! subscribed during a dispatch is not invoked for that round (which keeps
//! re-entrant notification from looping forever), and a listener removed
//! during a dispatch still sees that round. Listeners run in subscription
//! order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

// =============================================================================
// Subscribers
// =============================================================================

/// A typed listener list with synchronous, snapshot-based dispatch.
///
/// Cheap to clone; all clones share one listener list.
pub struct Subscribers<T> {
    inner: Arc<SubscribersInner<T>>,
}

struct SubscribersInner<T> {
    listeners: Mutex<Vec<(u64, Callback<T>)>>,
    next_id: AtomicU64,
}

impl<T> Clone for Subscribers<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Subscribers<T> {
    /// Create an empty listener list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SubscribersInner {
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Register a listener. Dropping the returned [`Subscription`] (or
    /// calling [`Subscription::unsubscribe`]) removes it.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription
    where
        T: 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .listeners
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .retain(|(listener_id, _)| *listener_id != id);
            }
        })
    }

    /// Invoke every listener registered before this call, in subscription
    /// order, with the lock released.
    pub fn notify(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in snapshot {
            callback(value);
        }
    }

    /// Number of currently registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Handle to a registered listener.
///
/// The listener is removed when this is dropped or explicitly unsubscribed.
/// Removal is idempotent, and a handle that outlives its store is a no-op
/// (it only holds a weak reference back to the listener list).
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Remove the listener now instead of waiting for drop.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

// =============================================================================
// EventBus
// =============================================================================

/// The two process-wide signals: `auth-changed` and `cart-changed`.
///
/// Signals carry no payload; interested parties read the relevant store
/// when woken. Dispatch is synchronous, so when `emit_*` returns every
/// listener has already run.
#[derive(Clone, Default)]
pub struct EventBus {
    auth_changed: Subscribers<()>,
    cart_changed: Subscribers<()>,
}

impl EventBus {
    /// Create a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen for the `auth-changed` signal.
    pub fn on_auth_changed(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.auth_changed.subscribe(move |&()| listener())
    }

    /// Listen for the `cart-changed` signal.
    pub fn on_cart_changed(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.cart_changed.subscribe(move |&()| listener())
    }

    /// Broadcast `auth-changed` to all current listeners.
    pub fn emit_auth_changed(&self) {
        debug!(
            signal = "auth-changed",
            listeners = self.auth_changed.len(),
            "broadcasting signal"
        );
        self.auth_changed.notify(&());
    }

    /// Broadcast `cart-changed` to all current listeners.
    pub fn emit_cart_changed(&self) {
        debug!(
            signal = "cart-changed",
            listeners = self.cart_changed.len(),
            "broadcasting signal"
        );
        self.cart_changed.notify(&());
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("auth_changed_listeners", &self.auth_changed.len())
            .field("cart_changed_listeners", &self.cart_changed.len())
            .finish()
    }
}
