//! # Payment Commands
//!
//! Paying for orders and paying down account balances. Card payments are
//! recorded with a masked number; nothing is charged to a card network.

use chrono::NaiveDate;
use greengrocer_core::{Account, Money, Payment, PaymentRequest};
use greengrocer_db::PaymentHistoryEntry;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{DbState, Session};

/// Pays an order's total with the method it was placed with.
///
/// ## Errors
/// - `FORBIDDEN` for someone else's order
/// - `PAYMENT_ERROR` for a bad request, a method mismatch or an order that
///   is already paid
/// - `LIMIT_EXCEEDED` when an account payment would pass the credit limit
/// - `INSUFFICIENT_STOCK` if stock ran out after the order was placed
pub async fn pay_order(
    db: &DbState,
    session: &Session,
    order_id: i64,
    request: &PaymentRequest,
    today: NaiveDate,
) -> Result<Payment, ApiError> {
    debug!(order_id, method = %request.method, "pay_order command");

    let orders = db.inner().orders();
    let order = orders.get(order_id).await?;
    session.require_self_or_staff(order.customer_id)?;

    let payment = orders.pay_order(order_id, request, today).await?;
    info!(
        order_number = %order.order_number,
        amount = %payment.amount,
        method = %payment.method(),
        "Order paid"
    );
    Ok(payment)
}

/// A customer's payments, newest first.
pub async fn payment_history(
    db: &DbState,
    session: &Session,
    customer_id: i64,
) -> Result<Vec<PaymentHistoryEntry>, ApiError> {
    debug!(customer_id, "payment_history command");
    session.require_self_or_staff(customer_id)?;

    Ok(db.inner().payments().history_for_customer(customer_id).await?)
}

/// The calling customer pays `amount` off their account balance.
pub async fn pay_balance(db: &DbState, session: &Session, amount: Money) -> Result<Account, ApiError> {
    debug!(amount = %amount, "pay_balance command");
    let customer_id = session.require_customer()?;

    Ok(db.inner().accounts().pay_balance(customer_id, amount).await?)
}
