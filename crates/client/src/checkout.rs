//! Checkout submission.
//!
//! State machine: `Idle -> Validating -> Submitting -> {Redirecting,
//! Failed}`. Validation is pure - it inspects the form and the current
//! shipping selection without touching the network, and a failure
//! returns to `Idle` before any request is issued. Submission builds
//! the order draft from scratch each attempt, re-validates the session,
//! drains any residual guest cart, and posts the draft exactly once.
//!
//! The cart is deliberately NOT cleared on success: an abandoned
//! payment must leave the cart intact for retry. Clearing happens in
//! the payment-succeeded callback, which is outside this client.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use autonorte_core::{DeliveryType, OrderId, PaymentMethod, Pesos};

use crate::api::{Destination, OrderClient};
use crate::cart::{HybridCart, price_lines};
use crate::error::{Result, StoreError};
use crate::session::SessionCoordinator;
use crate::shipping::ShippingQuoteNegotiator;

/// Where a checkout attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// No attempt in progress.
    Idle,
    /// Form checks running; no request issued yet.
    Validating,
    /// Draft built and order request in flight.
    Submitting,
    /// Order accepted; caller should navigate to the payment URL.
    Redirecting,
    /// Order rejected; server message surfaced to the caller.
    Failed,
}

/// Field-specific checkout validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("select a payment method")]
    MissingPaymentMethod,
    #[error("select a delivery type")]
    MissingDeliveryType,
    #[error("enter the delivery street address")]
    MissingStreet,
    #[error("select a comuna")]
    MissingComuna,
    #[error("select a region")]
    MissingRegion,
    #[error("calculate the shipping cost before finishing the purchase")]
    ShippingNotCalculated,
    #[error("the shipping quote is out of date, recalculate it before finishing the purchase")]
    ShippingQuoteStale,
    #[error("the cart is empty")]
    EmptyCart,
}

/// What the checkout page collects before submitting.
#[derive(Debug, Clone, Default)]
pub struct CheckoutForm {
    pub payment_method: Option<PaymentMethod>,
    pub delivery_type: Option<DeliveryType>,
    /// Street address (ship only).
    pub street: String,
    /// Carrier county code (ship only).
    pub comuna: String,
    /// Carrier region id (ship only).
    pub region: String,
}

impl CheckoutForm {
    /// The carrier destination described by the address fields.
    #[must_use]
    pub fn destination(&self) -> Destination {
        Destination {
            region: self.region.clone(),
            comuna: self.comuna.clone(),
            address: self.street.clone(),
        }
    }
}

/// Shipping address block of the order draft.
#[derive(Debug, Clone, Serialize)]
pub struct ShippingAddress {
    pub street: String,
    pub comuna: String,
    pub region: String,
}

/// Chosen shipping option block of the order draft.
#[derive(Debug, Clone, Serialize)]
pub struct OrderShipping {
    /// Carrier service name of the selected quote.
    pub service: String,
    pub cost: Pesos,
}

/// The complete order payload, built client-side and sent as one request.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDraft {
    pub email: String,
    pub total_amount: Pesos,
    pub payment_method: PaymentMethod,
    pub delivery_type: DeliveryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<ShippingAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<OrderShipping>,
}

/// Successful submission: the order id and where to send the customer
/// to pay.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order_id: OrderId,
    /// Payment-gateway hand-off URL for this order.
    pub payment_url: String,
}

/// Check the form against the current shipping selection. Pure - never
/// touches the network.
pub(crate) fn validate_form(
    form: &CheckoutForm,
    selected_shipping: Option<Pesos>,
) -> std::result::Result<(), ValidationError> {
    if form.payment_method.is_none() {
        return Err(ValidationError::MissingPaymentMethod);
    }
    let Some(delivery) = form.delivery_type else {
        return Err(ValidationError::MissingDeliveryType);
    };

    if delivery == DeliveryType::Ship {
        if form.street.trim().is_empty() {
            return Err(ValidationError::MissingStreet);
        }
        if form.comuna.trim().is_empty() {
            return Err(ValidationError::MissingComuna);
        }
        if form.region.trim().is_empty() {
            return Err(ValidationError::MissingRegion);
        }
        match selected_shipping {
            Some(cost) if cost.is_positive() => {}
            _ => return Err(ValidationError::ShippingNotCalculated),
        }
    }
    Ok(())
}

/// Drives a checkout attempt end to end.
pub struct CheckoutSubmitter {
    session: SessionCoordinator,
    cart: HybridCart,
    shipping: Arc<ShippingQuoteNegotiator>,
    orders: OrderClient,
    api_base: String,
    state: Mutex<CheckoutState>,
}

impl CheckoutSubmitter {
    /// Create a submitter over the session, cart and shipping components.
    #[must_use]
    pub fn new(
        session: SessionCoordinator,
        cart: HybridCart,
        shipping: Arc<ShippingQuoteNegotiator>,
        orders: OrderClient,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            session,
            cart,
            shipping,
            orders,
            api_base: api_base.into(),
            state: Mutex::new(CheckoutState::Idle),
        }
    }

    /// Current state of the submitter.
    #[must_use]
    pub fn state(&self) -> CheckoutState {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn set_state(&self, state: CheckoutState) {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = state;
    }

    /// Validate the form and submit the order once.
    ///
    /// # Errors
    ///
    /// `Validation` when a form check fails (state returns to `Idle`, no
    /// order request is issued); `NoSession`/`InvalidToken` when the
    /// session cannot be re-validated; `ServerRejected` with the
    /// server's message verbatim when the order is refused (state
    /// `Failed`). The cart is never cleared on any path.
    #[instrument(skip_all)]
    pub async fn submit(&self, form: &CheckoutForm) -> Result<CheckoutOutcome> {
        self.set_state(CheckoutState::Validating);
        let selected = self.shipping.selected_quote().map(|quote| quote.cost);
        if let Err(err) = validate_form(form, selected) {
            debug!(%err, "checkout validation failed");
            self.set_state(CheckoutState::Idle);
            return Err(err.into());
        }

        self.set_state(CheckoutState::Submitting);
        let result = self.run_submission(form).await;
        match &result {
            Ok(outcome) => {
                debug!(order_id = %outcome.order_id, "order accepted");
                self.set_state(CheckoutState::Redirecting);
            }
            // Late validation failures (stale quote, emptied cart) are
            // form problems, not submission failures.
            Err(StoreError::Validation(err)) => {
                debug!(%err, "checkout refused before submission");
                self.set_state(CheckoutState::Idle);
            }
            Err(err) => {
                warn!(%err, "order submission failed");
                self.set_state(CheckoutState::Failed);
            }
        }
        result
    }

    async fn run_submission(&self, form: &CheckoutForm) -> Result<CheckoutOutcome> {
        // Re-validate before spending the round trip.
        let token = self.session.ensure_token().await?;

        // Anything still sitting in the guest cart belongs in the order.
        self.cart.migrate_guest_cart().await?;

        let lines = self.cart.lines().await?;
        if lines.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }

        let payment_method = form
            .payment_method
            .ok_or(ValidationError::MissingPaymentMethod)?;
        let delivery_type = form
            .delivery_type
            .ok_or(ValidationError::MissingDeliveryType)?;

        let (shipping_cost, address, shipping) = match delivery_type {
            DeliveryType::Pickup => (Pesos::ZERO, None, None),
            DeliveryType::Ship => {
                let destination = form.destination();
                let quote = self
                    .shipping
                    .quote_for_checkout(&destination, &lines)
                    .ok_or(ValidationError::ShippingQuoteStale)?;
                (
                    quote.cost,
                    Some(ShippingAddress {
                        street: form.street.clone(),
                        comuna: form.comuna.clone(),
                        region: form.region.clone(),
                    }),
                    Some(OrderShipping {
                        service: quote.name,
                        cost: quote.cost,
                    }),
                )
            }
        };

        let totals = price_lines(&lines, shipping_cost);
        let profile = self.session.profile(&token).await?;

        let draft = OrderDraft {
            email: profile.email,
            total_amount: totals.grand_total,
            payment_method,
            delivery_type,
            address,
            shipping,
        };

        let order_id = self.orders.submit(&token, &draft).await?;
        Ok(CheckoutOutcome {
            order_id,
            payment_url: format!("{}/pay/{order_id}/", self.api_base),
        })
    }
}
