//! Order types for the checkout handoff and the success page.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::id::{OrderId, PaymentId};
use super::money;

/// Errors that can occur when building an [`OrderHandoff`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum HandoffError {
    /// The backend returned a blank order ID.
    #[error("order handoff requires a non-empty order id")]
    MissingOrderId,
    /// The payment provider returned a blank payment ID.
    #[error("order handoff requires a non-empty payment id")]
    MissingPaymentId,
    /// Negative totals never describe a placed order.
    #[error("order handoff amount cannot be negative: {amount}")]
    NegativeAmount {
        /// The rejected amount.
        amount: Decimal,
    },
}

/// The payload carried from a confirmed payment to the success page.
///
/// A handoff exists only for an order whose payment was confirmed, and it
/// is consumed by exactly one success-page render. The type enforces both:
/// it can only be built through [`OrderHandoff::new`], and it is
/// deliberately not `Clone`, so handing it to the success page moves it.
///
/// ```
/// use rust_decimal::Decimal;
/// use tamarind_core::{OrderHandoff, OrderId, PaymentId};
///
/// let handoff = OrderHandoff::new(
///     OrderId::new("ORD123"),
///     PaymentId::new("PAY456"),
///     Decimal::new(49950, 2),
/// );
/// assert!(handoff.is_ok());
///
/// let blank = OrderHandoff::new(OrderId::new("  "), PaymentId::new("PAY456"), Decimal::ZERO);
/// assert!(blank.is_err());
/// ```
#[derive(Debug)]
pub struct OrderHandoff {
    order_id: OrderId,
    payment_id: PaymentId,
    amount: Decimal,
    created_at: DateTime<Utc>,
}

impl OrderHandoff {
    /// Build a handoff, validating its parts.
    ///
    /// # Errors
    ///
    /// Returns an error if either ID is blank or the amount is negative.
    pub fn new(
        order_id: OrderId,
        payment_id: PaymentId,
        amount: Decimal,
    ) -> Result<Self, HandoffError> {
        if order_id.as_str().trim().is_empty() {
            return Err(HandoffError::MissingOrderId);
        }
        if payment_id.as_str().trim().is_empty() {
            return Err(HandoffError::MissingPaymentId);
        }
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(HandoffError::NegativeAmount { amount });
        }
        Ok(Self {
            order_id,
            payment_id,
            amount,
            created_at: Utc::now(),
        })
    }

    /// Order the payment was confirmed for.
    #[must_use]
    pub const fn order_id(&self) -> &OrderId {
        &self.order_id
    }

    /// Payment that settled the order.
    #[must_use]
    pub const fn payment_id(&self) -> &PaymentId {
        &self.payment_id
    }

    /// Confirmed total.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }

    /// When the payment was confirmed on this client.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Confirmed total, rendered with two decimal places.
    #[must_use]
    pub fn amount_display(&self) -> String {
        money::format_amount(self.amount)
    }
}

/// An order as returned by the order lookup endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetail {
    /// Backend order ID.
    pub order_id: OrderId,
    /// Total charged for the order.
    pub total_amount: Decimal,
    /// Fulfillment status, when the backend reports one.
    pub status: Option<String>,
    /// When the order was placed, when the backend reports it.
    pub placed_at: Option<DateTime<Utc>>,
}

impl OrderDetail {
    /// Total, rendered with two decimal places.
    #[must_use]
    pub fn amount_display(&self) -> String {
        money::format_amount(self.total_amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_valid_parts() {
        let handoff = OrderHandoff::new(
            OrderId::new("ORD123"),
            PaymentId::new("PAY456"),
            Decimal::new(49950, 2),
        )
        .unwrap();

        assert_eq!(handoff.order_id().as_str(), "ORD123");
        assert_eq!(handoff.payment_id().as_str(), "PAY456");
        assert_eq!(handoff.amount_display(), "499.50");
    }

    #[test]
    fn rejects_blank_ids() {
        assert!(matches!(
            OrderHandoff::new(OrderId::new(""), PaymentId::new("PAY456"), Decimal::ZERO),
            Err(HandoffError::MissingOrderId)
        ));
        assert!(matches!(
            OrderHandoff::new(OrderId::new("ORD123"), PaymentId::new("  "), Decimal::ZERO),
            Err(HandoffError::MissingPaymentId)
        ));
    }

    #[test]
    fn rejects_negative_amounts() {
        assert!(matches!(
            OrderHandoff::new(
                OrderId::new("ORD123"),
                PaymentId::new("PAY456"),
                Decimal::new(-1, 2),
            ),
            Err(HandoffError::NegativeAmount { .. })
        ));
    }

    #[test]
    fn zero_amount_is_allowed() {
        let handoff = OrderHandoff::new(
            OrderId::new("ORD123"),
            PaymentId::new("PAY456"),
            Decimal::ZERO,
        )
        .unwrap();
        assert_eq!(handoff.amount_display(), "0.00");
    }
}
