//! Cart store.
//!
//! Wraps the pure line reducers from `tamarind_core::types::cart` with a
//! lock and change notification. Only effective mutations notify: adding a
//! zero-quantity line, removing an absent key, or re-setting the current
//! quantity leave subscribers (and the bus) silent.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use tamarind_core::types::{
    cart::{merge_line, remove_line, set_line_quantity},
    CartLine, CartSnapshot, LineKey,
};

use crate::bus::{EventBus, Subscribers, Subscription};

/// Cheaply cloneable handle to the shared cart state.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    lines: Mutex<Vec<CartLine>>,
    subscribers: Subscribers<()>,
    bus: EventBus,
}

impl CartStore {
    #[must_use]
    pub fn new(bus: EventBus) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                lines: Mutex::new(Vec::new()),
                subscribers: Subscribers::new(),
                bus,
            }),
        }
    }

    /// Immutable view of the current lines. Aggregates (count, subtotal)
    /// are derived from the snapshot, never stored.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot::new(self.lock_lines().clone())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock_lines().is_empty()
    }

    /// Add `line`, merging quantities into an existing line with the same
    /// product, size, and color. Returns whether the cart changed.
    pub fn add(&self, line: CartLine) -> bool {
        let changed = merge_line(&mut self.lock_lines(), line);
        self.after_mutation(changed, "add")
    }

    /// Set the quantity of the line with `key`. Zero removes the line.
    /// Returns whether the cart changed.
    pub fn set_quantity(&self, key: &LineKey, quantity: u32) -> bool {
        let changed = set_line_quantity(&mut self.lock_lines(), key, quantity);
        self.after_mutation(changed, "set_quantity")
    }

    /// Remove the line with `key`. Returns whether a line was removed.
    pub fn remove(&self, key: &LineKey) -> bool {
        let changed = remove_line(&mut self.lock_lines(), key);
        self.after_mutation(changed, "remove")
    }

    /// Drop every line. Returns whether the cart held anything.
    pub fn clear(&self) -> bool {
        let changed = {
            let mut lines = self.lock_lines();
            let had_lines = !lines.is_empty();
            lines.clear();
            had_lines
        };
        self.after_mutation(changed, "clear")
    }

    /// Replace the whole cart with lines fetched from the backend.
    /// Identical contents are a no-op.
    pub fn replace_lines(&self, lines: Vec<CartLine>) -> bool {
        let changed = {
            let mut guard = self.lock_lines();
            if *guard == lines {
                false
            } else {
                *guard = lines;
                true
            }
        };
        self.after_mutation(changed, "replace_lines")
    }

    /// Registers a listener invoked after every effective mutation.
    /// Dropping the returned [`Subscription`] unregisters it.
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.subscribers.subscribe(move |&()| listener())
    }

    fn after_mutation(&self, changed: bool, op: &'static str) -> bool {
        if changed {
            debug!(op, "cart changed");
            // Listeners run outside the lines lock.
            self.inner.subscribers.notify(&());
            self.inner.bus.emit_cart_changed();
        }
        changed
    }

    fn lock_lines(&self) -> std::sync::MutexGuard<'_, Vec<CartLine>> {
        self.inner
            .lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lock_lines().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rust_decimal::Decimal;
    use tamarind_core::types::ProductRef;

    use super::*;

    fn line(product: &str, quantity: u32) -> CartLine {
        CartLine {
            product_ref: ProductRef::new(product),
            name: format!("Product {product}"),
            price: Decimal::new(1999, 2),
            quantity,
            size: None,
            color: None,
            image: None,
        }
    }

    fn counting_subscriber(store: &CartStore) -> (Arc<AtomicUsize>, Subscription) {
        let hits = Arc::new(AtomicUsize::new(0));
        let sub = store.subscribe({
            let hits = Arc::clone(&hits);
            move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        });
        (hits, sub)
    }

    #[test]
    fn add_merges_same_variant() {
        let store = CartStore::new(EventBus::new());
        store.add(line("p-1", 2));
        store.add(line("p-1", 3));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.lines[0].quantity, 5);
        assert_eq!(snapshot.total_quantity(), 5);
    }

    #[test]
    fn effective_mutations_notify_noops_do_not() {
        let store = CartStore::new(EventBus::new());
        let (hits, _sub) = counting_subscriber(&store);

        assert!(store.add(line("p-1", 2)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Zero-quantity add changes nothing.
        assert!(!store.add(line("p-2", 0)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Re-setting the current quantity changes nothing.
        assert!(!store.set_quantity(&line("p-1", 0).key(), 2));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Removing an absent key changes nothing.
        assert!(!store.remove(&line("p-9", 0).key()));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Clearing an empty cart changes nothing.
        assert!(store.clear());
        assert!(!store.clear());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn set_quantity_zero_removes_the_line() {
        let store = CartStore::new(EventBus::new());
        store.add(line("p-1", 2));

        assert!(store.set_quantity(&line("p-1", 0).key(), 0));
        assert!(store.is_empty());
        assert_eq!(store.snapshot().total_quantity(), 0);
    }

    #[test]
    fn replace_lines_is_silent_when_identical() {
        let store = CartStore::new(EventBus::new());
        store.add(line("p-1", 2));

        let (hits, _sub) = counting_subscriber(&store);
        let same = store.snapshot().lines;
        assert!(!store.replace_lines(same));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        assert!(store.replace_lines(vec![line("p-2", 1)]));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(store.snapshot().lines[0].product_ref.as_str(), "p-2");
    }

    #[test]
    fn bus_hears_cart_changes() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let _sub = bus.on_cart_changed({
            let hits = Arc::clone(&hits);
            move || {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        });

        let store = CartStore::new(bus);
        store.add(line("p-1", 1));
        store.clear();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn snapshot_is_detached_from_later_mutations() {
        let store = CartStore::new(EventBus::new());
        store.add(line("p-1", 2));

        let before = store.snapshot();
        store.add(line("p-2", 1));

        assert_eq!(before.lines.len(), 1);
        assert_eq!(store.snapshot().lines.len(), 2);
    }

    #[test]
    fn aggregates_hold_under_random_mutation_sequences() {
        let store = CartStore::new(EventBus::new());
        let mut rng = StdRng::seed_from_u64(7);
        let products = ["p-1", "p-2", "p-3", "p-4", "p-5"];

        for _ in 0..500 {
            let product = products[rng.random_range(0..products.len())];
            match rng.random_range(0..3_u8) {
                // Additions include zero quantities, which must be no-ops.
                0 => {
                    store.add(line(product, rng.random_range(0..4)));
                }
                // Quantity updates include zero, which must remove.
                1 => {
                    store.set_quantity(&line(product, 0).key(), rng.random_range(0..5));
                }
                _ => {
                    store.remove(&line(product, 0).key());
                }
            }

            let snapshot = store.snapshot();
            let by_hand: u64 = snapshot
                .lines
                .iter()
                .map(|l| u64::from(l.quantity))
                .sum();
            assert_eq!(snapshot.total_quantity(), by_hand);
            // No zero-quantity line is ever retained.
            assert!(snapshot.lines.iter().all(|l| l.quantity > 0));
        }
    }
}
