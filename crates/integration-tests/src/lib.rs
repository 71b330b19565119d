//! Integration tests for Tamarind.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tamarind-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth_cart_sync` - Cart reactions to sign-in and sign-out
//! - `category_loader` - The retrying loader against scripted backends
//! - `checkout_flow` - Order creation through the success page
//! - `navigation_shell` - Mount semantics and the derived view
//!
//! Tests drive the real stores and state machines against the scripted
//! collaborators in [`mocks`]; no network or backend process is involved.
//! Time-sensitive tests run under `#[tokio::test(start_paused = true)]`,
//! so retry delays elapse instantly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod mocks;

use tamarind_storefront::loader::{CategoryLoader, LoadState};

/// Follow the loader's watch channel until it reaches a settled state.
pub async fn wait_until_settled(loader: &CategoryLoader) -> LoadState {
    let mut watch = loader.watch();
    loop {
        let state = *watch.borrow_and_update();
        if state.is_settled() {
            return state;
        }
        if watch.changed().await.is_err() {
            return state;
        }
    }
}

/// Poll `condition` while letting background tasks run.
///
/// Each round sleeps a few milliseconds, so under a paused clock the
/// runtime auto-advances and the whole wait costs no real time.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    condition()
}

/// Yield to background tasks until `condition` holds, without letting the
/// paused clock advance.
///
/// Use this instead of [`eventually`] when the test must observe a moment
/// *before* a timer fires.
pub async fn spin_until(condition: impl Fn() -> bool) -> bool {
    for _ in 0..500 {
        if condition() {
            return true;
        }
        tokio::task::yield_now().await;
    }
    condition()
}
