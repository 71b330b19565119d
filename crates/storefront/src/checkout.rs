//! Checkout handoff.
//!
//! Bridges cart contents to the success page: create the order, open the
//! external payment window, record the confirmation, then hand the
//! confirmed order to the success page exactly once. The machine is strict
//! about ordering — payment cannot be confirmed for an order that was
//! never created, and a success page without a handoff fails closed
//! instead of guessing which order to show.
//!
//! ```text
//! Idle -> OrderCreated -> PaymentPending -> PaymentConfirmed -> Displayed
//!   \          |               |
//!    \---------+---------------+--> Abandoned
//! ```

use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use tamarind_core::types::{HandoffError, OrderHandoff, OrderId, PaymentId};

use crate::api::{ApiError, OrderGateway};
use crate::stores::{AuthStore, CartStore};

/// Errors raised by checkout operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// The success page was reached without a confirmed payment. Rendered
    /// inline; never triggers a fetch.
    #[error("no order found")]
    MissingHandoff,

    /// An operation was called out of order.
    #[error("cannot {operation} from the {state} state")]
    InvalidTransition {
        /// What was attempted.
        operation: &'static str,
        /// Where the machine actually was.
        state: &'static str,
    },

    /// Orders require at least one cart line.
    #[error("cannot create an order from an empty cart")]
    EmptyCart,

    /// Orders require an authenticated session.
    #[error("checkout requires signing in first")]
    Unauthenticated,

    /// The handoff payload failed validation.
    #[error(transparent)]
    Handoff(#[from] HandoffError),

    /// The backend rejected or failed an order call.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Where the checkout currently stands.
///
/// Not `Clone`: `PaymentConfirmed` owns the [`OrderHandoff`], which must
/// move to the success page exactly once.
#[derive(Debug, Default)]
pub enum CheckoutState {
    /// Nothing started.
    #[default]
    Idle,
    /// The backend accepted the order; payment has not been opened.
    OrderCreated {
        order_id: OrderId,
        total: Decimal,
    },
    /// The external payment window is open.
    PaymentPending {
        order_id: OrderId,
        total: Decimal,
    },
    /// Payment confirmed; the handoff is waiting to be displayed.
    PaymentConfirmed { handoff: OrderHandoff },
    /// The handoff was taken; the success page owns it now.
    Displayed,
    /// The user walked away before confirming payment. Terminal.
    Abandoned,
}

impl CheckoutState {
    /// Short name for error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::OrderCreated { .. } => "order created",
            Self::PaymentPending { .. } => "payment pending",
            Self::PaymentConfirmed { .. } => "payment confirmed",
            Self::Displayed => "displayed",
            Self::Abandoned => "abandoned",
        }
    }
}

/// Drives one checkout from cart to success page.
#[derive(Debug, Default)]
pub struct CheckoutFlow {
    state: CheckoutState,
}

impl CheckoutFlow {
    /// A fresh flow in [`CheckoutState::Idle`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, for embedders that render checkout progress.
    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Submit the current cart as an order.
    ///
    /// Requires [`CheckoutState::Idle`], an authenticated session, and a
    /// non-empty cart. On success the machine holds the server-minted
    /// order ID and total.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InvalidTransition`], [`CheckoutError::Unauthenticated`],
    /// [`CheckoutError::EmptyCart`], or the [`ApiError`] from the gateway.
    #[instrument(skip_all)]
    pub async fn create_order(
        &mut self,
        gateway: &dyn OrderGateway,
        cart: &CartStore,
        auth: &AuthStore,
    ) -> Result<OrderId, CheckoutError> {
        if !matches!(self.state, CheckoutState::Idle) {
            return Err(CheckoutError::InvalidTransition {
                operation: "create an order",
                state: self.state.name(),
            });
        }
        if !auth.is_authenticated() {
            return Err(CheckoutError::Unauthenticated);
        }
        let snapshot = cart.snapshot();
        if snapshot.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let created = gateway.create_order(&snapshot.lines).await?;
        info!(order_id = %created.order_id, total = %created.total, "order created");
        self.state = CheckoutState::OrderCreated {
            order_id: created.order_id.clone(),
            total: created.total,
        };
        Ok(created.order_id)
    }

    /// Open the external payment window for the created order.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InvalidTransition`] unless the machine holds a
    /// created order.
    pub fn open_payment(&mut self) -> Result<(), CheckoutError> {
        match std::mem::take(&mut self.state) {
            CheckoutState::OrderCreated { order_id, total } => {
                debug!(%order_id, "payment window opened");
                self.state = CheckoutState::PaymentPending { order_id, total };
                Ok(())
            }
            other => Err(self.reject("open payment", other)),
        }
    }

    /// Record the payment confirmation, building the [`OrderHandoff`]
    /// exactly once.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InvalidTransition`] unless payment is pending, or
    /// [`CheckoutError::Handoff`] if the confirmation payload is invalid
    /// (the machine stays in `PaymentPending` so a corrected confirmation
    /// can follow).
    pub fn confirm_payment(&mut self, payment_id: PaymentId) -> Result<(), CheckoutError> {
        match std::mem::take(&mut self.state) {
            CheckoutState::PaymentPending { order_id, total } => {
                match OrderHandoff::new(order_id.clone(), payment_id, total) {
                    Ok(handoff) => {
                        info!(%order_id, "payment confirmed");
                        self.state = CheckoutState::PaymentConfirmed { handoff };
                        Ok(())
                    }
                    Err(invalid) => {
                        self.state = CheckoutState::PaymentPending { order_id, total };
                        Err(invalid.into())
                    }
                }
            }
            other => Err(self.reject("confirm payment", other)),
        }
    }

    /// Move the handoff out for the success page.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InvalidTransition`] unless a confirmed payment is
    /// waiting. Calling this twice fails: the handoff moves exactly once.
    pub fn take_handoff(&mut self) -> Result<OrderHandoff, CheckoutError> {
        match std::mem::take(&mut self.state) {
            CheckoutState::PaymentConfirmed { handoff } => {
                self.state = CheckoutState::Displayed;
                Ok(handoff)
            }
            other => Err(self.reject("take the handoff", other)),
        }
    }

    /// The user navigated away without a confirmed payment.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InvalidTransition`] once payment was confirmed —
    /// a paid order can no longer be walked away from.
    pub fn abandon(&mut self) -> Result<(), CheckoutError> {
        match &self.state {
            CheckoutState::Idle
            | CheckoutState::OrderCreated { .. }
            | CheckoutState::PaymentPending { .. } => {
                debug!(from = self.state.name(), "checkout abandoned");
                self.state = CheckoutState::Abandoned;
                Ok(())
            }
            other => Err(CheckoutError::InvalidTransition {
                operation: "abandon checkout",
                state: other.name(),
            }),
        }
    }

    /// Restore `state` after a rejected transition and build the error.
    fn reject(&mut self, operation: &'static str, state: CheckoutState) -> CheckoutError {
        let name = state.name();
        self.state = state;
        CheckoutError::InvalidTransition {
            operation,
            state: name,
        }
    }
}

// =============================================================================
// Success page
// =============================================================================

/// What the success page renders for a confirmed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessView {
    /// Backend order ID, shown as the order number.
    pub order_number: String,
    /// Backend-returned total, rendered with two decimal places.
    pub amount: String,
    /// Payment reference from the confirmation.
    pub payment_ref: String,
    /// Fulfillment status, when the backend reports one.
    pub status: Option<String>,
}

/// Build the success page data for a consumed handoff.
///
/// With a handoff, fetches the authoritative order by ID and renders the
/// backend's total — never the locally computed one. Without a handoff it
/// fails closed: [`CheckoutError::MissingHandoff`], zero fetches.
///
/// # Errors
///
/// [`CheckoutError::MissingHandoff`] without a handoff; a failed order
/// fetch propagates as [`CheckoutError::Api`] (no retry or fallback here).
#[instrument(skip_all, fields(has_handoff = handoff.is_some()))]
pub async fn present_success(
    orders: &dyn OrderGateway,
    handoff: Option<OrderHandoff>,
) -> Result<SuccessView, CheckoutError> {
    let Some(handoff) = handoff else {
        debug!("success page reached without a handoff; failing closed");
        return Err(CheckoutError::MissingHandoff);
    };

    let detail = orders.fetch_order(handoff.order_id()).await?;
    Ok(SuccessView {
        order_number: detail.order_id.to_string(),
        amount: detail.amount_display(),
        payment_ref: handoff.payment_id().to_string(),
        status: detail.status,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use tamarind_core::types::{AuthSession, CartLine, OrderDetail, ProductRef, Role};

    use crate::api::CreatedOrder;
    use crate::bus::EventBus;

    use super::*;

    struct StubGateway {
        order_id: &'static str,
        total: Decimal,
        status: Option<&'static str>,
        fail_fetch: bool,
        create_calls: AtomicUsize,
        fetch_calls: AtomicUsize,
    }

    impl StubGateway {
        fn new(order_id: &'static str, total: Decimal) -> Self {
            Self {
                order_id,
                total,
                status: Some("processing"),
                fail_fetch: false,
                create_calls: AtomicUsize::new(0),
                fetch_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl OrderGateway for StubGateway {
        async fn create_order(&self, _lines: &[CartLine]) -> Result<CreatedOrder, ApiError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            Ok(CreatedOrder {
                order_id: OrderId::new(self.order_id),
                total: self.total,
            })
        }

        async fn fetch_order(&self, order_id: &OrderId) -> Result<OrderDetail, ApiError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetch {
                return Err(ApiError::Server {
                    status: 500,
                    message: "order lookup broke".to_owned(),
                });
            }
            Ok(OrderDetail {
                order_id: order_id.clone(),
                total_amount: self.total,
                status: self.status.map(str::to_owned),
                placed_at: None,
            })
        }
    }

    fn stores_with_cart() -> (CartStore, AuthStore) {
        let bus = EventBus::new();
        let cart = CartStore::new(bus.clone());
        cart.add(CartLine {
            product_ref: ProductRef::new("p-1"),
            name: "Canvas Tote".to_owned(),
            price: Decimal::new(49950, 2),
            quantity: 1,
            size: None,
            color: None,
            image: None,
        });
        let auth = AuthStore::new(bus);
        auth.login(AuthSession::new("tok", "ada", Role::Customer));
        (cart, auth)
    }

    #[test]
    fn operations_out_of_order_are_rejected() {
        let mut flow = CheckoutFlow::new();

        assert!(matches!(
            flow.open_payment(),
            Err(CheckoutError::InvalidTransition { state: "idle", .. })
        ));
        assert!(matches!(
            flow.confirm_payment(PaymentId::new("PAY1")),
            Err(CheckoutError::InvalidTransition { .. })
        ));
        assert!(matches!(
            flow.take_handoff(),
            Err(CheckoutError::InvalidTransition { .. })
        ));
        // The rejected calls must not have corrupted the state.
        assert!(matches!(flow.state(), CheckoutState::Idle));
    }

    #[test]
    fn abandon_is_terminal_and_single_shot() {
        let mut flow = CheckoutFlow::new();
        flow.abandon().unwrap();
        assert!(matches!(flow.state(), CheckoutState::Abandoned));

        assert!(matches!(
            flow.abandon(),
            Err(CheckoutError::InvalidTransition {
                state: "abandoned",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn full_ladder_reaches_the_success_page() {
        let gateway = StubGateway::new("ORD123", Decimal::new(4995, 1));
        let (cart, auth) = stores_with_cart();
        let mut flow = CheckoutFlow::new();

        let order_id = flow.create_order(&gateway, &cart, &auth).await.unwrap();
        assert_eq!(order_id.as_str(), "ORD123");

        flow.open_payment().unwrap();
        flow.confirm_payment(PaymentId::new("PAY456")).unwrap();

        let handoff = flow.take_handoff().unwrap();
        assert!(matches!(flow.state(), CheckoutState::Displayed));
        // The handoff moves exactly once.
        assert!(matches!(
            flow.take_handoff(),
            Err(CheckoutError::InvalidTransition {
                state: "displayed",
                ..
            })
        ));

        let view = present_success(&gateway, Some(handoff)).await.unwrap();
        assert_eq!(view.order_number, "ORD123");
        assert_eq!(view.amount, "499.50");
        assert_eq!(view.payment_ref, "PAY456");
        assert_eq!(gateway.fetch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn create_order_requires_auth_and_a_cart() {
        let gateway = StubGateway::new("ORD1", Decimal::ONE);
        let bus = EventBus::new();
        let cart = CartStore::new(bus.clone());
        let auth = AuthStore::new(bus);
        let mut flow = CheckoutFlow::new();

        assert!(matches!(
            flow.create_order(&gateway, &cart, &auth).await,
            Err(CheckoutError::Unauthenticated)
        ));

        auth.login(AuthSession::new("tok", "ada", Role::Customer));
        assert!(matches!(
            flow.create_order(&gateway, &cart, &auth).await,
            Err(CheckoutError::EmptyCart)
        ));

        // Neither rejection reached the backend.
        assert_eq!(gateway.create_calls.load(Ordering::SeqCst), 0);
        assert!(matches!(flow.state(), CheckoutState::Idle));
    }

    #[tokio::test]
    async fn blank_confirmation_keeps_payment_pending() {
        let gateway = StubGateway::new("ORD1", Decimal::ONE);
        let (cart, auth) = stores_with_cart();
        let mut flow = CheckoutFlow::new();

        flow.create_order(&gateway, &cart, &auth).await.unwrap();
        flow.open_payment().unwrap();

        assert!(matches!(
            flow.confirm_payment(PaymentId::new("   ")),
            Err(CheckoutError::Handoff(HandoffError::MissingPaymentId))
        ));
        // A corrected confirmation still goes through.
        assert!(matches!(flow.state(), CheckoutState::PaymentPending { .. }));
        flow.confirm_payment(PaymentId::new("PAY1")).unwrap();
    }

    #[tokio::test]
    async fn missing_handoff_fails_closed_with_zero_fetches() {
        let gateway = StubGateway::new("ORD1", Decimal::ONE);

        let err = present_success(&gateway, None).await.unwrap_err();
        assert!(matches!(err, CheckoutError::MissingHandoff));
        assert_eq!(err.to_string(), "no order found");
        assert_eq!(gateway.fetch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_order_fetch_propagates() {
        let mut gateway = StubGateway::new("ORD1", Decimal::ONE);
        gateway.fail_fetch = true;

        let handoff = OrderHandoff::new(
            OrderId::new("ORD1"),
            PaymentId::new("PAY1"),
            Decimal::ONE,
        )
        .unwrap();

        assert!(matches!(
            present_success(&gateway, Some(handoff)).await,
            Err(CheckoutError::Api(ApiError::Server { status: 500, .. }))
        ));
    }

    #[tokio::test]
    async fn paid_orders_cannot_be_abandoned() {
        let gateway = StubGateway::new("ORD1", Decimal::ONE);
        let (cart, auth) = stores_with_cart();
        let mut flow = CheckoutFlow::new();

        flow.create_order(&gateway, &cart, &auth).await.unwrap();
        flow.open_payment().unwrap();
        flow.confirm_payment(PaymentId::new("PAY1")).unwrap();

        assert!(matches!(
            flow.abandon(),
            Err(CheckoutError::InvalidTransition {
                state: "payment confirmed",
                ..
            })
        ));
    }
}
