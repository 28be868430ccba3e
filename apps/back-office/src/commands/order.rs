//! # Order Commands
//!
//! Checkout and the customer side of the order lifecycle.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout                                             │
//! │                                                                         │
//! │  cart (client-held)                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  checkout_preview ──► subtotal, discount, delivery fee, total           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  place_order ──► Pending order, stock checked but not taken             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  payment::pay_order ──► stock taken, payment recorded                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use greengrocer_core::{
    CancelOutcome, Cart, CartEntry, CheckoutPreview, DeliveryMethod, OrderDetails, OrderSummary,
    PaymentMethod,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{DbState, Session};

/// Checkout form submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub delivery_method: DeliveryMethod,
    pub payment_method: PaymentMethod,
    pub cart: Vec<CartEntry>,
}

/// Prices the caller's cart for the checkout page.
pub async fn checkout_preview(
    db: &DbState,
    session: &Session,
    cart: &Cart,
    delivery_method: DeliveryMethod,
) -> Result<CheckoutPreview, ApiError> {
    debug!(entries = cart.len(), delivery = %delivery_method, "checkout_preview command");
    let customer_id = session.require_customer()?;

    let account = db.inner().accounts().get(customer_id).await?;
    let items = db.inner().items().list().await?;
    Ok(cart.preview(&items, &account, delivery_method)?)
}

/// Places a Pending order from the submitted cart.
///
/// The cart is rebuilt from its entries first, so duplicates merge and
/// quantity limits apply the same way they do when adding to the cart.
pub async fn place_order(
    db: &DbState,
    session: &Session,
    request: PlaceOrderRequest,
    today: NaiveDate,
) -> Result<OrderSummary, ApiError> {
    debug!(entries = request.cart.len(), "place_order command");
    let customer_id = session.require_customer()?;

    let cart = Cart::from_entries(request.cart)?;
    let order = db
        .inner()
        .orders()
        .place_order(
            customer_id,
            request.delivery_method,
            request.payment_method,
            &cart,
            today,
        )
        .await?;

    info!(
        order_number = %order.order_number,
        customer_id,
        total = %order.total(),
        "Order placed"
    );
    Ok(order.summary())
}

/// Full order view for the confirmation and staff pages.
pub async fn order_details(
    db: &DbState,
    session: &Session,
    order_id: i64,
) -> Result<OrderDetails, ApiError> {
    debug!(order_id, "order_details command");

    let details = db.inner().orders().details(order_id).await?;
    session.require_self_or_staff(details.summary.customer_id)?;
    Ok(details)
}

/// Cancels a Pending order. Customers may cancel their own; staff any.
pub async fn cancel_order(
    db: &DbState,
    session: &Session,
    order_id: i64,
) -> Result<CancelOutcome, ApiError> {
    debug!(order_id, "cancel_order command");

    let orders = db.inner().orders();
    let order = orders.get(order_id).await?;
    session.require_self_or_staff(order.customer_id)?;

    Ok(orders.cancel_order(order_id).await?)
}

/// The caller's paid orders, newest first. Unpaid orders left behind by
/// abandoned checkouts are discarded on the way.
pub async fn order_history(db: &DbState, session: &Session) -> Result<Vec<OrderSummary>, ApiError> {
    debug!("order_history command");
    let customer_id = session.require_customer()?;

    Ok(db.inner().orders().history(customer_id).await?)
}
