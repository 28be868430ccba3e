//! # Payment Repository
//!
//! Payments are written by [`OrderRepository::pay_order`](super::order::OrderRepository::pay_order)
//! inside its transaction; this module owns the row mapping and the
//! read-only history queries.

use chrono::NaiveDate;
use greengrocer_core::{Money, Payment, PaymentDetails, PaymentMethod};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use ts_rs::TS;

use crate::error::{DbError, DbResult};

const PAYMENT_COLUMNS: &str = "id, order_id, customer_id, method, amount_scaled, payment_date, \
                               card_expiry, card_type, card_number, bank_name";

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    order_id: i64,
    customer_id: i64,
    method: PaymentMethod,
    amount_scaled: i64,
    payment_date: NaiveDate,
    card_expiry: Option<NaiveDate>,
    card_type: Option<String>,
    card_number: Option<String>,
    bank_name: Option<String>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DbError;

    fn try_from(row: PaymentRow) -> DbResult<Payment> {
        let missing = |field: &str| DbError::corrupt("payments", row.id, format!("missing {}", field));

        let details = match row.method {
            PaymentMethod::CreditCard => PaymentDetails::CreditCard {
                card_expiry: row.card_expiry.ok_or_else(|| missing("card_expiry"))?,
                card_number: row.card_number.clone().ok_or_else(|| missing("card_number"))?,
                card_type: row.card_type.clone().ok_or_else(|| missing("card_type"))?,
            },
            PaymentMethod::DebitCard => PaymentDetails::DebitCard {
                bank_name: row.bank_name.clone().ok_or_else(|| missing("bank_name"))?,
                card_number: row.card_number.clone().ok_or_else(|| missing("card_number"))?,
            },
            PaymentMethod::Account => PaymentDetails::Account,
        };

        Ok(Payment {
            id: row.id,
            order_id: row.order_id,
            customer_id: row.customer_id,
            amount: Money::from_scaled(row.amount_scaled),
            date: row.payment_date,
            details,
        })
    }
}

/// One row of a customer's payment history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct PaymentHistoryEntry {
    pub payment_id: i64,
    pub order_number: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub amount: Money,
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    payment_id: i64,
    order_number: String,
    date: NaiveDate,
    method: PaymentMethod,
    amount_scaled: i64,
}

// =============================================================================
// Connection-level helpers
// =============================================================================

/// Stores a payment and returns its id.
pub(crate) async fn insert_payment(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<i64> {
    let (card_expiry, card_type, card_number, bank_name) = match &payment.details {
        PaymentDetails::CreditCard {
            card_expiry,
            card_number,
            card_type,
        } => (Some(*card_expiry), Some(card_type.clone()), Some(card_number.clone()), None),
        PaymentDetails::DebitCard {
            bank_name,
            card_number,
        } => (None, None, Some(card_number.clone()), Some(bank_name.clone())),
        PaymentDetails::Account => (None, None, None, None),
    };

    let id = sqlx::query(
        r#"
        INSERT INTO payments (
            order_id, customer_id, method, amount_scaled, payment_date,
            card_expiry, card_type, card_number, bank_name
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.customer_id)
    .bind(payment.method())
    .bind(payment.amount.scaled())
    .bind(payment.date)
    .bind(card_expiry)
    .bind(card_type)
    .bind(card_number)
    .bind(bank_name)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// The payment attached to an order, if any.
pub(crate) async fn fetch_for_order(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> DbResult<Option<Payment>> {
    let sql = format!("SELECT {} FROM payments WHERE order_id = ?1", PAYMENT_COLUMNS);
    let row: Option<PaymentRow> = sqlx::query_as(&sql)
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(Payment::try_from).transpose()
}

// =============================================================================
// Repository
// =============================================================================

/// Read-only payment queries.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Gets a payment by id.
    pub async fn get(&self, id: i64) -> DbResult<Payment> {
        let sql = format!("SELECT {} FROM payments WHERE id = ?1", PAYMENT_COLUMNS);
        let row: PaymentRow = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Payment", id))?;
        row.try_into()
    }

    /// The payment for an order, if it has been paid.
    pub async fn for_order(&self, order_id: i64) -> DbResult<Option<Payment>> {
        let mut conn = self.pool.acquire().await?;
        fetch_for_order(&mut conn, order_id).await
    }

    /// A customer's payments, newest first.
    pub async fn history_for_customer(&self, customer_id: i64) -> DbResult<Vec<PaymentHistoryEntry>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT p.id AS payment_id, o.order_number, p.payment_date AS date,
                   p.method, p.amount_scaled
            FROM payments p
            JOIN orders o ON o.id = p.order_id
            WHERE p.customer_id = ?1
            ORDER BY p.payment_date DESC, p.id DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| PaymentHistoryEntry {
                payment_id: r.payment_id,
                order_number: r.order_number,
                date: r.date,
                method: r.method,
                amount: Money::from_scaled(r.amount_scaled),
            })
            .collect())
    }
}
