//! Session store.
//!
//! Holds whether a user is logged in, who they are, and the bearer token
//! the backend client attaches to requests. Login and logout notify local
//! subscribers first, then emit [`crate::bus::StoreEvent::AuthChanged`] so
//! long-lived components can react without polling.

use std::sync::{Arc, Mutex, PoisonError};

use secrecy::SecretString;
use tracing::debug;

use tamarind_core::types::{AuthSession, ImageRef, Role};

use crate::bus::{EventBus, Subscribers, Subscription};

/// Cheaply cloneable handle to the shared session state.
#[derive(Clone)]
pub struct AuthStore {
    inner: Arc<AuthStoreInner>,
}

struct AuthStoreInner {
    session: Mutex<Option<AuthSession>>,
    subscribers: Subscribers<()>,
    bus: EventBus,
}

impl AuthStore {
    #[must_use]
    pub fn new(bus: EventBus) -> Self {
        Self {
            inner: Arc::new(AuthStoreInner {
                session: Mutex::new(None),
                subscribers: Subscribers::new(),
                bus,
            }),
        }
    }

    /// Current session, if any. Returns an owned copy so no lock is held
    /// while the caller inspects it.
    #[must_use]
    pub fn session(&self) -> Option<AuthSession> {
        self.lock_session().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock_session().is_some()
    }

    /// Bearer token for outgoing requests, if a session is active.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.lock_session().as_ref().map(|s| s.token.clone())
    }

    #[must_use]
    pub fn user_name(&self) -> Option<String> {
        self.lock_session().as_ref().map(|s| s.user_name.clone())
    }

    #[must_use]
    pub fn profile_image(&self) -> Option<ImageRef> {
        self.lock_session().as_ref().and_then(|s| s.profile_image.clone())
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.lock_session().as_ref().map(|s| s.role)
    }

    /// Replaces the current session. No-op (and no notification) if the new
    /// session is identical to the current one.
    pub fn login(&self, session: AuthSession) {
        let changed = {
            let mut guard = self.lock_session();
            if guard.as_ref() == Some(&session) {
                false
            } else {
                *guard = Some(session);
                true
            }
        };
        if changed {
            debug!("session established");
            self.notify();
        }
    }

    /// Drops the current session. Returns `false` (and notifies nobody) if
    /// there was no session to drop.
    pub fn logout(&self) -> bool {
        let changed = self.lock_session().take().is_some();
        if changed {
            debug!("session ended");
            self.notify();
        }
        changed
    }

    /// Registers a listener invoked after every effective login or logout.
    /// Dropping the returned [`Subscription`] unregisters it.
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.subscribers.subscribe(move |&()| listener())
    }

    fn notify(&self) {
        // Listeners run outside the session lock.
        self.inner.subscribers.notify(&());
        self.inner.bus.emit_auth_changed();
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, Option<AuthSession>> {
        self.inner
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}
