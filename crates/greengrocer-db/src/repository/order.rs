//! # Order Repository
//!
//! Order placement, payment, cancellation and the order lists.
//!
//! ## Pay Order Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  pay_order(order_id, request, today)                                    │
//! │                                                                         │
//! │  1. PaymentDetails::from_request   (fields, expiry, card number)        │
//! │  2. lock write gate, BEGIN                                              │
//! │  3. load order + lines + payment, customer, referenced items            │
//! │  4. order.pay(...)                 (every rule, in memory)              │
//! │  5. UPDATE items ... WHERE stock_milli >= ?   per item                  │
//! │  6. UPDATE accounts balance        (account payments only)              │
//! │  7. INSERT payments                                                     │
//! │  8. COMMIT                                                              │
//! │                                                                         │
//! │  Any error drops the transaction: nothing is written.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use greengrocer_core::cart::resolve;
use greengrocer_core::order::{next_order_number, order_total};
use greengrocer_core::{
    CancelOutcome, Cart, CoreError, CustomerType, DeliveryMethod, Money, Order, OrderDetails,
    OrderLine, OrderStatus, OrderSummary, Payment, PaymentDetails, PaymentMethod, PaymentRequest,
    Quantity, Role, ValidationError,
};
use sqlx::{SqliteConnection, SqlitePool};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::lock_writes;
use crate::repository::account::{fetch_account, fetch_customer, save_balance};
use crate::repository::item::{fetch_items, return_stock, take_stock};
use crate::repository::payment::{fetch_for_order, insert_payment};

// =============================================================================
// Rows
// =============================================================================

const ORDER_SELECT: &str = r#"
    SELECT o.id, o.order_number, o.order_date, o.delivery_method, o.status,
           o.payment_method, o.customer_id, a.role AS customer_role
    FROM orders o
    JOIN accounts a ON a.id = o.customer_id
"#;

const SUMMARY_SELECT: &str = r#"
    SELECT o.id, o.order_number, o.order_date, o.delivery_method, o.status,
           o.payment_method, o.customer_id, a.role AS customer_role,
           COALESCE((SELECT SUM(l.subtotal_scaled) FROM order_lines l
                     WHERE l.order_id = o.id), 0) AS line_sum_scaled,
           EXISTS(SELECT 1 FROM payments p WHERE p.order_id = o.id) AS is_paid
    FROM orders o
    JOIN accounts a ON a.id = o.customer_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    order_number: String,
    order_date: NaiveDate,
    delivery_method: DeliveryMethod,
    status: OrderStatus,
    payment_method: PaymentMethod,
    customer_id: i64,
    customer_role: Role,
}

impl OrderRow {
    fn customer_type(&self) -> DbResult<CustomerType> {
        match self.customer_role {
            Role::PrivateCustomer => Ok(CustomerType::Private),
            Role::CorporateCustomer => Ok(CustomerType::Corporate),
            Role::Staff => Err(DbError::corrupt("orders", self.id, "placed by a staff account")),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    order: OrderRow,
    line_sum_scaled: i64,
    is_paid: bool,
}

impl TryFrom<SummaryRow> for OrderSummary {
    type Error = DbError;

    fn try_from(row: SummaryRow) -> DbResult<OrderSummary> {
        let customer_type = row.order.customer_type()?;
        let o = row.order;
        Ok(OrderSummary {
            id: o.id,
            order_number: o.order_number,
            date: o.order_date,
            status: o.status,
            delivery_method: o.delivery_method,
            payment_method: o.payment_method,
            customer_id: o.customer_id,
            total: order_total(Money::from_scaled(row.line_sum_scaled), customer_type, o.delivery_method),
            is_paid: row.is_paid,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    id: i64,
    item_id: i64,
    item_name: String,
    quantity_milli: i64,
    subtotal_scaled: i64,
}

impl From<LineRow> for OrderLine {
    fn from(row: LineRow) -> Self {
        OrderLine {
            id: row.id,
            item_id: row.item_id,
            item_name: row.item_name,
            quantity: Quantity::from_milli(row.quantity_milli),
            subtotal: Money::from_scaled(row.subtotal_scaled),
        }
    }
}

// =============================================================================
// Connection-level helpers
// =============================================================================

/// Loads an order with its lines and payment.
pub(crate) async fn fetch_order(conn: &mut SqliteConnection, id: i64) -> DbResult<Order> {
    let sql = format!("{} WHERE o.id = ?1", ORDER_SELECT);
    let row: OrderRow = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Order", id))?;

    let lines: Vec<LineRow> = sqlx::query_as(
        r#"
        SELECT id, item_id, item_name, quantity_milli, subtotal_scaled
        FROM order_lines
        WHERE order_id = ?1
        ORDER BY id
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    let payment = fetch_for_order(conn, id).await?;

    Ok(Order {
        customer_type: row.customer_type()?,
        id: row.id,
        order_number: row.order_number,
        date: row.order_date,
        delivery_method: row.delivery_method,
        status: row.status,
        payment_method: row.payment_method,
        customer_id: row.customer_id,
        lines: lines.into_iter().map(OrderLine::from).collect(),
        payment,
    })
}

async fn save_status(conn: &mut SqliteConnection, order_id: i64, status: OrderStatus) -> DbResult<()> {
    let result = sqlx::query("UPDATE orders SET status = ?2 WHERE id = ?1")
        .bind(order_id)
        .bind(status)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Order", order_id));
    }
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order operations.
///
/// ## Usage
/// ```rust,ignore
/// let order = db.orders()
///     .place_order(customer_id, DeliveryMethod::Delivery, PaymentMethod::Account, &cart, today)
///     .await?;
/// let payment = db.orders()
///     .pay_order(order.id, &PaymentRequest::new("account"), today)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    write_gate: Arc<Mutex<()>>,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool, write_gate: Arc<Mutex<()>>) -> Self {
        OrderRepository { pool, write_gate }
    }

    /// Creates a Pending order holding every cart entry.
    ///
    /// Lines are priced now and checked against live stock; stock itself
    /// is only consumed when the order is paid.
    ///
    /// ## Errors
    /// - `Validation(Required)` for an empty cart
    /// - `NotACustomer` if `customer_id` is a staff account
    /// - `NotFound` if an entry's item is missing or of another variant
    /// - `InsufficientStock` if an entry asks for more than is on hand
    pub async fn place_order(
        &self,
        customer_id: i64,
        delivery_method: DeliveryMethod,
        payment_method: PaymentMethod,
        cart: &Cart,
        date: NaiveDate,
    ) -> DbResult<Order> {
        if cart.is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "cart".to_string(),
            })
            .into());
        }

        let _gate = lock_writes(&self.write_gate).await;
        let mut tx = self.pool.begin().await?;

        let customer = fetch_account(&mut tx, customer_id).await?;
        let items = fetch_items(&mut tx, cart.entries.iter().map(|e| e.item_id)).await?;

        let max_number: Option<i64> =
            sqlx::query_scalar("SELECT MAX(CAST(order_number AS INTEGER)) FROM orders")
                .fetch_one(&mut *tx)
                .await?;

        let mut order = Order::open(
            next_order_number(max_number),
            date,
            &customer,
            delivery_method,
            payment_method,
        )?;
        for entry in &cart.entries {
            let item = resolve(&items, entry, customer_id)?;
            order.add_line(item, entry.quantity)?;
        }

        order.id = sqlx::query(
            r#"
            INSERT INTO orders (
                order_number, order_date, delivery_method, status, payment_method, customer_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&order.order_number)
        .bind(order.date)
        .bind(order.delivery_method)
        .bind(order.status)
        .bind(order.payment_method)
        .bind(order.customer_id)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for line in &mut order.lines {
            line.id = sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, item_id, item_name, quantity_milli, subtotal_scaled)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(order.id)
            .bind(line.item_id)
            .bind(&line.item_name)
            .bind(line.quantity.milli())
            .bind(line.subtotal.scaled())
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        }

        tx.commit().await?;

        info!(
            order_id = order.id,
            order_number = %order.order_number,
            customer_id,
            lines = order.lines.len(),
            total = %order.total(),
            "Order placed"
        );
        Ok(order)
    }

    /// Gets an order with its lines and payment.
    pub async fn get(&self, id: i64) -> DbResult<Order> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    /// The order joined with its customer and line items.
    pub async fn details(&self, id: i64) -> DbResult<OrderDetails> {
        let mut conn = self.pool.acquire().await?;
        let order = fetch_order(&mut conn, id).await?;
        let customer = fetch_account(&mut conn, order.customer_id).await?;
        let items = fetch_items(&mut conn, order.lines.iter().map(|l| l.item_id)).await?;
        Ok(OrderDetails::build(&order, &customer, &items)?)
    }

    /// Takes payment for an order's total.
    ///
    /// ## Errors
    /// - `UnknownMethod`, `MissingField`, `Validation` for bad request data
    /// - `AlreadyPaid`, `InvalidTransition`, `PaymentMethodMismatch`
    /// - `LimitExceeded` for an account payment over the credit limit
    /// - `InsufficientStock` if stock ran out since the order was placed
    /// - `InvalidPaymentAmount` for a zero total
    pub async fn pay_order(
        &self,
        order_id: i64,
        request: &PaymentRequest,
        date: NaiveDate,
    ) -> DbResult<Payment> {
        let details = PaymentDetails::from_request(request, date)?;

        let _gate = lock_writes(&self.write_gate).await;
        let mut tx = self.pool.begin().await?;

        let mut order = fetch_order(&mut tx, order_id).await?;
        let mut customer = fetch_customer(&mut tx, order.customer_id).await?;
        let needed = order.stock_requirements();
        let mut items = fetch_items(&mut tx, needed.keys().copied()).await?;

        let profile = customer.require_customer_mut()?;
        let mut payment = match order.pay(profile, &mut items, details, date) {
            Ok(payment) => payment.clone(),
            Err(e) => {
                warn!(order_id, error = %e, "Payment rejected");
                return Err(e.into());
            }
        };

        for (item_id, quantity) in needed {
            take_stock(&mut tx, item_id, quantity).await?;
        }
        if payment.method() == PaymentMethod::Account {
            save_balance(&mut tx, order.customer_id, profile.balance).await?;
        }
        payment.id = insert_payment(&mut tx, &payment).await?;

        tx.commit().await?;

        info!(
            order_id,
            payment_id = payment.id,
            method = %payment.method(),
            amount = %payment.amount,
            "Order paid"
        );
        Ok(payment)
    }

    /// Cancels a Pending order, returning stock and refunding account
    /// payments if it was paid.
    ///
    /// ## Errors
    /// `InvalidTransition` if the order is not Pending.
    pub async fn cancel_order(&self, order_id: i64) -> DbResult<CancelOutcome> {
        let _gate = lock_writes(&self.write_gate).await;
        let mut tx = self.pool.begin().await?;

        let mut order = fetch_order(&mut tx, order_id).await?;
        let mut customer = fetch_customer(&mut tx, order.customer_id).await?;
        let mut items = fetch_items(&mut tx, order.lines.iter().map(|l| l.item_id)).await?;

        let profile = customer.require_customer_mut()?;
        let outcome = order.cancel(&mut items, profile)?;

        for (item_id, quantity) in &outcome.restored {
            return_stock(&mut tx, *item_id, *quantity).await?;
        }
        if outcome.refunded.is_positive() {
            save_balance(&mut tx, order.customer_id, profile.balance).await?;
        }
        save_status(&mut tx, order_id, order.status).await?;

        tx.commit().await?;

        info!(
            order_id,
            restored = outcome.restored.len(),
            refunded = %outcome.refunded,
            "Order cancelled"
        );
        Ok(outcome)
    }

    /// Sets an order's status without checking the move. Returns the
    /// previous status.
    pub async fn update_status(&self, order_id: i64, status: OrderStatus) -> DbResult<OrderStatus> {
        let _gate = lock_writes(&self.write_gate).await;
        let mut tx = self.pool.begin().await?;

        let mut order = fetch_order(&mut tx, order_id).await?;
        let previous = order.update_status(status);
        save_status(&mut tx, order_id, status).await?;

        tx.commit().await?;

        if previous.is_terminal() && previous != status {
            warn!(order_id, from = %previous, to = %status, "Order moved out of a finished status");
        } else {
            info!(order_id, from = %previous, to = %status, "Order status updated");
        }
        Ok(previous)
    }

    /// Every order, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<OrderSummary>> {
        let sql = format!("{} ORDER BY o.order_date DESC, o.id DESC", SUMMARY_SELECT);
        let rows: Vec<SummaryRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(OrderSummary::try_from).collect()
    }

    /// A customer's orders, newest first.
    pub async fn list_for_customer(&self, customer_id: i64) -> DbResult<Vec<OrderSummary>> {
        let sql = format!(
            "{} WHERE o.customer_id = ?1 ORDER BY o.order_date DESC, o.id DESC",
            SUMMARY_SELECT
        );
        let rows: Vec<SummaryRow> = sqlx::query_as(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(OrderSummary::try_from).collect()
    }

    /// Deletes a customer's Pending orders that were never paid. Returns
    /// how many were removed.
    pub async fn discard_unpaid_orders(&self, customer_id: i64) -> DbResult<u64> {
        let _gate = lock_writes(&self.write_gate).await;

        let result = sqlx::query(
            r#"
            DELETE FROM orders
            WHERE customer_id = ?1
              AND status = 'pending'
              AND NOT EXISTS (SELECT 1 FROM payments p WHERE p.order_id = orders.id)
            "#,
        )
        .bind(customer_id)
        .execute(&self.pool)
        .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            debug!(customer_id, removed, "Discarded unpaid orders");
        }
        Ok(removed)
    }

    /// A customer's order history: abandoned orders are discarded first,
    /// then the paid orders are listed newest first.
    pub async fn history(&self, customer_id: i64) -> DbResult<Vec<OrderSummary>> {
        self.discard_unpaid_orders(customer_id).await?;
        Ok(self
            .list_for_customer(customer_id)
            .await?
            .into_iter()
            .filter(|o| o.is_paid)
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        create_box, create_corporate, create_private, create_staff, create_unit_item, date,
        memory_db,
    };
    use crate::Database;
    use greengrocer_core::{BoxSize, CartEntry, ItemType};

    fn cart(entries: &[(i64, ItemType, i64)]) -> Cart {
        Cart::from_entries(entries.iter().map(|(id, t, q)| CartEntry {
            item_id: *id,
            item_type: *t,
            quantity: Quantity::from_units(*q),
        }))
        .unwrap()
    }

    fn credit_card() -> PaymentRequest {
        PaymentRequest::new("credit_card")
            .field("card_number", "4111 1111 1111 1111")
            .field("card_type", "Visa")
            .field("card_expiry", "2030-12")
    }

    async fn stock_of(db: &Database, item_id: i64) -> Quantity {
        db.items().get(item_id).await.unwrap().stock
    }

    async fn balance_of(db: &Database, account_id: i64) -> Money {
        db.accounts().get(account_id).await.unwrap().customer().unwrap().balance
    }

    #[tokio::test]
    async fn test_place_order_numbers_and_totals() {
        let db = memory_db().await;
        let ying = create_private(&db, "ying").await;
        let avocado = create_unit_item(&db, "Avocado", 10).await;
        let small = create_box(&db, BoxSize::Small, 5, &[&avocado]).await;

        let order = db
            .orders()
            .place_order(
                ying.id,
                DeliveryMethod::Delivery,
                PaymentMethod::CreditCard,
                &cart(&[(avocado.id, ItemType::UnitPrice, 2), (small.id, ItemType::PremadeBox, 1)]),
                date(2025, 3, 14),
            )
            .await
            .unwrap();

        assert_eq!(order.order_number, "1000");
        assert_eq!(order.lines.len(), 2);
        // 2 × $10 + $10 box + $10 delivery
        assert_eq!(order.total().cents(), 4_000);
        // Placing reserves nothing.
        assert_eq!(stock_of(&db, avocado.id).await, Quantity::from_units(10));

        let second = db
            .orders()
            .place_order(
                ying.id,
                DeliveryMethod::Pickup,
                PaymentMethod::CreditCard,
                &cart(&[(avocado.id, ItemType::UnitPrice, 1)]),
                date(2025, 3, 15),
            )
            .await
            .unwrap();
        assert_eq!(second.order_number, "1001");

        let loaded = db.orders().get(order.id).await.unwrap();
        assert_eq!(loaded, order);
    }

    #[tokio::test]
    async fn test_place_order_rejections() {
        let db = memory_db().await;
        let ying = create_private(&db, "ying").await;
        let staff = create_staff(&db, "staff").await;
        let avocado = create_unit_item(&db, "Avocado", 1).await;
        let today = date(2025, 3, 14);

        let err = db
            .orders()
            .place_order(ying.id, DeliveryMethod::Pickup, PaymentMethod::Account, &Cart::new(), today)
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::Validation(ValidationError::Required { .. }))
        ));

        let err = db
            .orders()
            .place_order(
                ying.id,
                DeliveryMethod::Pickup,
                PaymentMethod::Account,
                &cart(&[(avocado.id, ItemType::Weighted, 1)]),
                today,
            )
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::NotFound { .. })));

        let err = db
            .orders()
            .place_order(
                ying.id,
                DeliveryMethod::Pickup,
                PaymentMethod::Account,
                &cart(&[(avocado.id, ItemType::UnitPrice, 2)]),
                today,
            )
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::InsufficientStock { .. })));

        let err = db
            .orders()
            .place_order(
                staff.id,
                DeliveryMethod::Pickup,
                PaymentMethod::Account,
                &cart(&[(avocado.id, ItemType::UnitPrice, 1)]),
                today,
            )
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::NotACustomer(_))));

        assert!(db.orders().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_place_order_whole_units_and_own_boxes() {
        let db = memory_db().await;
        let ying = create_private(&db, "ying").await;
        let harry = create_private(&db, "harry").await;
        let avocado = create_unit_item(&db, "Avocado", 10).await;
        let large = create_box(&db, BoxSize::Large, 5, &[&avocado]).await;
        let today = date(2025, 3, 14);

        // Cart::add would refuse these, so the cart is assembled directly.
        for (item_id, item_type, milli) in [
            (large.id, ItemType::PremadeBox, 1),
            (avocado.id, ItemType::UnitPrice, 500),
        ] {
            let fractional = Cart {
                entries: vec![CartEntry {
                    item_id,
                    item_type,
                    quantity: Quantity::from_milli(milli),
                }],
            };
            let err = db
                .orders()
                .place_order(ying.id, DeliveryMethod::Pickup, PaymentMethod::DebitCard, &fractional, today)
                .await
                .unwrap_err();
            assert!(matches!(
                err.as_domain(),
                Some(CoreError::Validation(ValidationError::InvalidFormat { .. }))
            ));
        }

        let yings_box = db
            .items()
            .derive_custom_box(large.id, &[avocado.id], ying.id)
            .await
            .unwrap();
        let err = db
            .orders()
            .place_order(
                harry.id,
                DeliveryMethod::Pickup,
                PaymentMethod::DebitCard,
                &cart(&[(yings_box.id, ItemType::PremadeBox, 1)]),
                today,
            )
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::NotFound { .. })));

        let err = db
            .items()
            .derive_custom_box(yings_box.id, &[avocado.id], harry.id)
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::NotFound { .. })));

        let order = db
            .orders()
            .place_order(
                ying.id,
                DeliveryMethod::Pickup,
                PaymentMethod::DebitCard,
                &cart(&[(yings_box.id, ItemType::PremadeBox, 1)]),
                today,
            )
            .await
            .unwrap();
        assert_eq!(order.total().cents(), 5_000);
        assert_eq!(db.orders().list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_pay_by_card_consumes_stock_once() {
        let db = memory_db().await;
        let ying = create_private(&db, "ying").await;
        let avocado = create_unit_item(&db, "Avocado", 10).await;
        let today = date(2025, 3, 14);

        let order = db
            .orders()
            .place_order(
                ying.id,
                DeliveryMethod::Pickup,
                PaymentMethod::CreditCard,
                &cart(&[(avocado.id, ItemType::UnitPrice, 3)]),
                today,
            )
            .await
            .unwrap();

        let payment = db.orders().pay_order(order.id, &credit_card(), today).await.unwrap();
        assert!(payment.id > 0);
        assert_eq!(payment.amount.cents(), 3_000);
        match &payment.details {
            PaymentDetails::CreditCard { card_number, .. } => assert_eq!(card_number, "**** 1111"),
            other => panic!("unexpected details {:?}", other),
        }
        assert_eq!(stock_of(&db, avocado.id).await, Quantity::from_units(7));
        assert!(balance_of(&db, ying.id).await.is_zero());

        let err = db
            .orders()
            .pay_order(order.id, &credit_card(), today)
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::AlreadyPaid { .. })));
        assert_eq!(stock_of(&db, avocado.id).await, Quantity::from_units(7));

        let stored = db.payments().for_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored, payment);
    }

    #[tokio::test]
    async fn test_pay_rejections_leave_nothing_written() {
        let db = memory_db().await;
        let ying = create_private(&db, "ying").await;
        let avocado = create_unit_item(&db, "Avocado", 20).await;
        let today = date(2025, 3, 14);

        let order = db
            .orders()
            .place_order(
                ying.id,
                DeliveryMethod::Pickup,
                PaymentMethod::Account,
                &cart(&[(avocado.id, ItemType::UnitPrice, 11)]),
                today,
            )
            .await
            .unwrap();

        // Wrong method.
        let err = db
            .orders()
            .pay_order(order.id, &credit_card(), today)
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::PaymentMethodMismatch { .. })));

        // $110 against a $100 limit.
        let err = db
            .orders()
            .pay_order(order.id, &PaymentRequest::new("account"), today)
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::LimitExceeded { .. })));

        // Missing card fields never reach the transaction.
        let err = db
            .orders()
            .pay_order(order.id, &PaymentRequest::new("debit_card"), today)
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::MissingField { .. })));

        assert_eq!(stock_of(&db, avocado.id).await, Quantity::from_units(20));
        assert!(balance_of(&db, ying.id).await.is_zero());
        assert!(db.payments().for_order(order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stock_gone_before_payment() {
        let db = memory_db().await;
        let ying = create_private(&db, "ying").await;
        let harry = create_private(&db, "harry").await;
        let avocado = create_unit_item(&db, "Avocado", 2).await;
        let today = date(2025, 3, 14);
        let two = cart(&[(avocado.id, ItemType::UnitPrice, 2)]);

        let first = db
            .orders()
            .place_order(ying.id, DeliveryMethod::Pickup, PaymentMethod::CreditCard, &two, today)
            .await
            .unwrap();
        let second = db
            .orders()
            .place_order(harry.id, DeliveryMethod::Pickup, PaymentMethod::CreditCard, &two, today)
            .await
            .unwrap();

        db.orders().pay_order(first.id, &credit_card(), today).await.unwrap();
        let err = db
            .orders()
            .pay_order(second.id, &credit_card(), today)
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::InsufficientStock { .. })));
        assert!(stock_of(&db, avocado.id).await.is_zero());
    }

    #[tokio::test]
    async fn test_account_payment_and_cancel_refund() {
        let db = memory_db().await;
        let fresh = create_corporate(&db, "fresh").await;
        let avocado = create_unit_item(&db, "Avocado", 10).await;
        let today = date(2025, 3, 14);

        let order = db
            .orders()
            .place_order(
                fresh.id,
                DeliveryMethod::Delivery,
                PaymentMethod::Account,
                &cart(&[(avocado.id, ItemType::UnitPrice, 4)]),
                today,
            )
            .await
            .unwrap();
        // $40 × 0.9 + $10
        assert_eq!(order.total().cents(), 4_600);

        db.orders()
            .pay_order(order.id, &PaymentRequest::new("account"), today)
            .await
            .unwrap();
        assert_eq!(balance_of(&db, fresh.id).await.cents(), 4_600);
        assert_eq!(stock_of(&db, avocado.id).await, Quantity::from_units(6));

        let outcome = db.orders().cancel_order(order.id).await.unwrap();
        assert_eq!(outcome.refunded.cents(), 4_600);
        assert_eq!(outcome.restored, vec![(avocado.id, Quantity::from_units(4))]);
        assert!(balance_of(&db, fresh.id).await.is_zero());
        assert_eq!(stock_of(&db, avocado.id).await, Quantity::from_units(10));
        assert_eq!(db.orders().get(order.id).await.unwrap().status, OrderStatus::Cancelled);

        let err = db.orders().cancel_order(order.id).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn test_cancel_unpaid_order_changes_no_stock() {
        let db = memory_db().await;
        let ying = create_private(&db, "ying").await;
        let avocado = create_unit_item(&db, "Avocado", 10).await;
        let order = db
            .orders()
            .place_order(
                ying.id,
                DeliveryMethod::Pickup,
                PaymentMethod::CreditCard,
                &cart(&[(avocado.id, ItemType::UnitPrice, 4)]),
                date(2025, 3, 14),
            )
            .await
            .unwrap();

        let outcome = db.orders().cancel_order(order.id).await.unwrap();
        assert!(outcome.restored.is_empty());
        assert!(outcome.refunded.is_zero());
        assert_eq!(stock_of(&db, avocado.id).await, Quantity::from_units(10));
    }

    #[tokio::test]
    async fn test_update_status_is_unguarded() {
        let db = memory_db().await;
        let ying = create_private(&db, "ying").await;
        let avocado = create_unit_item(&db, "Avocado", 10).await;
        let order = db
            .orders()
            .place_order(
                ying.id,
                DeliveryMethod::Pickup,
                PaymentMethod::CreditCard,
                &cart(&[(avocado.id, ItemType::UnitPrice, 1)]),
                date(2025, 3, 14),
            )
            .await
            .unwrap();

        let previous = db
            .orders()
            .update_status(order.id, OrderStatus::Completed)
            .await
            .unwrap();
        assert_eq!(previous, OrderStatus::Pending);

        let previous = db
            .orders()
            .update_status(order.id, OrderStatus::Pending)
            .await
            .unwrap();
        assert_eq!(previous, OrderStatus::Completed);

        assert!(db.orders().update_status(999, OrderStatus::Processed).await.is_err());
    }

    #[tokio::test]
    async fn test_lists_history_and_details() {
        let db = memory_db().await;
        let ying = create_private(&db, "ying").await;
        let harry = create_private(&db, "harry").await;
        let avocado = create_unit_item(&db, "Avocado", 50).await;
        let small = create_box(&db, BoxSize::Small, 5, &[&avocado]).await;
        let one = cart(&[(avocado.id, ItemType::UnitPrice, 1)]);

        let paid = db
            .orders()
            .place_order(ying.id, DeliveryMethod::Pickup, PaymentMethod::CreditCard, &one, date(2025, 1, 5))
            .await
            .unwrap();
        db.orders().pay_order(paid.id, &credit_card(), date(2025, 1, 5)).await.unwrap();
        let abandoned = db
            .orders()
            .place_order(ying.id, DeliveryMethod::Pickup, PaymentMethod::CreditCard, &one, date(2025, 2, 1))
            .await
            .unwrap();
        let boxed = db
            .orders()
            .place_order(
                harry.id,
                DeliveryMethod::Delivery,
                PaymentMethod::CreditCard,
                &cart(&[(small.id, ItemType::PremadeBox, 1)]),
                date(2025, 3, 1),
            )
            .await
            .unwrap();

        let all = db.orders().list_all().await.unwrap();
        let ids: Vec<i64> = all.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![boxed.id, abandoned.id, paid.id]);
        assert_eq!(all[0].total.cents(), 2_000);
        assert!(all[2].is_paid);

        let history = db.orders().history(ying.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, paid.id);
        assert!(matches!(
            db.orders().get(abandoned.id).await,
            Err(DbError::NotFound { .. })
        ));

        let details = db.orders().details(boxed.id).await.unwrap();
        assert_eq!(details.customer_username, "harry");
        assert_eq!(details.lines[0].name, "Small Premade Box");
        assert_eq!(details.lines[0].contents, vec!["Avocado".to_string()]);
        assert!(details.payment.is_none());
    }
}
