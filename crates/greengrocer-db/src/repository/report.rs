//! # Report Repository
//!
//! Loads the raw figures and hands them to `greengrocer_core::reporting`
//! for bucketing and ranking. Every stored order counts, whatever its
//! status or payment state.

use chrono::NaiveDate;
use greengrocer_core::order::order_total;
use greengrocer_core::reporting::{self, ItemPopularity, PeriodSales, SalesRecord};
use greengrocer_core::{BoxSize, CustomerType, DeliveryMethod, ItemType, Money, Role, POPULARITY_LIMIT};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct SalesRow {
    id: i64,
    order_date: NaiveDate,
    delivery_method: DeliveryMethod,
    customer_role: Role,
    line_sum_scaled: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct PopularityRow {
    id: i64,
    item_type: ItemType,
    name: Option<String>,
    box_size: Option<BoxSize>,
    line_count: i64,
}

/// Sales and popularity reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// One record per order, priced with the order totals table.
    pub async fn sales_records(&self) -> DbResult<Vec<SalesRecord>> {
        let rows: Vec<SalesRow> = sqlx::query_as(
            r#"
            SELECT o.id, o.order_date, o.delivery_method, a.role AS customer_role,
                   COALESCE((SELECT SUM(l.subtotal_scaled) FROM order_lines l
                             WHERE l.order_id = o.id), 0) AS line_sum_scaled
            FROM orders o
            JOIN accounts a ON a.id = o.customer_id
            ORDER BY o.order_date, o.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(orders = rows.len(), "Loaded sales records");

        rows.into_iter()
            .map(|row| {
                let customer_type = match row.customer_role {
                    Role::PrivateCustomer => CustomerType::Private,
                    Role::CorporateCustomer => CustomerType::Corporate,
                    Role::Staff => {
                        return Err(DbError::corrupt("orders", row.id, "placed by a staff account"))
                    }
                };
                Ok(SalesRecord {
                    date: row.order_date,
                    total: order_total(
                        Money::from_scaled(row.line_sum_scaled),
                        customer_type,
                        row.delivery_method,
                    ),
                })
            })
            .collect()
    }

    /// Sales per week of month, across every year.
    pub async fn weekly_sales(&self) -> DbResult<Vec<PeriodSales>> {
        Ok(reporting::weekly_sales(self.sales_records().await?))
    }

    /// Sales per month of `year`.
    pub async fn monthly_sales(&self, year: i32) -> DbResult<Vec<PeriodSales>> {
        Ok(reporting::monthly_sales(self.sales_records().await?, year))
    }

    /// Total sales for `year`.
    pub async fn yearly_sales(&self, year: i32) -> DbResult<PeriodSales> {
        Ok(reporting::yearly_sales(self.sales_records().await?, year))
    }

    /// Order line count for every item, including items never ordered.
    pub async fn item_popularity(&self) -> DbResult<Vec<ItemPopularity>> {
        let rows: Vec<PopularityRow> = sqlx::query_as(
            r#"
            SELECT i.id, i.item_type, i.name, i.box_size, COUNT(l.id) AS line_count
            FROM items i
            LEFT JOIN order_lines l ON l.item_id = i.id
            GROUP BY i.id
            ORDER BY i.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let name = match (row.item_type, row.box_size) {
                    (ItemType::PremadeBox, Some(size)) => format!("{} Premade Box", size),
                    _ => row.name.unwrap_or_default(),
                };
                ItemPopularity {
                    item_id: row.id,
                    name,
                    line_count: u32::try_from(row.line_count).unwrap_or(u32::MAX),
                }
            })
            .collect())
    }

    /// The most-ordered items.
    pub async fn popular_items(&self) -> DbResult<Vec<ItemPopularity>> {
        Ok(reporting::popular_items(&self.item_popularity().await?, POPULARITY_LIMIT))
    }

    /// The least-ordered items.
    pub async fn unpopular_items(&self) -> DbResult<Vec<ItemPopularity>> {
        Ok(reporting::unpopular_items(&self.item_popularity().await?, POPULARITY_LIMIT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_corporate, create_private, create_unit_item, date, memory_db};
    use greengrocer_core::{Cart, CartEntry, PaymentMethod, Quantity};

    fn one_of(item_id: i64, units: i64) -> Cart {
        Cart::from_entries([CartEntry {
            item_id,
            item_type: ItemType::UnitPrice,
            quantity: Quantity::from_units(units),
        }])
        .unwrap()
    }

    #[tokio::test]
    async fn test_sales_reports() {
        let db = memory_db().await;
        let ying = create_private(&db, "ying").await;
        let fresh = create_corporate(&db, "fresh").await;
        let avocado = create_unit_item(&db, "Avocado", 100).await;

        let orders = db.orders();
        // $20 pickup
        orders
            .place_order(ying.id, DeliveryMethod::Pickup, PaymentMethod::CreditCard, &one_of(avocado.id, 2), date(2025, 3, 2))
            .await
            .unwrap();
        // $10 × 0.9 + $10 delivery = $19
        orders
            .place_order(fresh.id, DeliveryMethod::Delivery, PaymentMethod::Account, &one_of(avocado.id, 1), date(2025, 3, 9))
            .await
            .unwrap();
        // $10, previous year
        orders
            .place_order(ying.id, DeliveryMethod::Pickup, PaymentMethod::CreditCard, &one_of(avocado.id, 1), date(2024, 12, 30))
            .await
            .unwrap();

        let weekly = db.reports().weekly_sales().await.unwrap();
        let labels: Vec<&str> = weekly.iter().map(|w| w.label.as_str()).collect();
        assert_eq!(labels, vec!["week5/12/2024", "week1/03/2025", "week2/03/2025"]);
        assert_eq!(weekly[2].total.cents(), 1_900);

        let monthly = db.reports().monthly_sales(2025).await.unwrap();
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].total.cents(), 3_900);
        assert_eq!(monthly[0].order_count, 2);

        assert_eq!(db.reports().yearly_sales(2024).await.unwrap().total.cents(), 1_000);
        assert!(db.reports().yearly_sales(2023).await.unwrap().total.is_zero());
    }

    #[tokio::test]
    async fn test_popularity() {
        let db = memory_db().await;
        let ying = create_private(&db, "ying").await;
        let avocado = create_unit_item(&db, "Avocado", 100).await;
        let feijoa = create_unit_item(&db, "Feijoa", 100).await;
        let cucumber = create_unit_item(&db, "Cucumber", 100).await;

        for (item, times) in [(&avocado, 1), (&feijoa, 3)] {
            for _ in 0..times {
                db.orders()
                    .place_order(ying.id, DeliveryMethod::Pickup, PaymentMethod::CreditCard, &one_of(item.id, 1), date(2025, 1, 1))
                    .await
                    .unwrap();
            }
        }

        let popular = db.reports().popular_items().await.unwrap();
        let names: Vec<&str> = popular.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Feijoa", "Avocado"]);

        let unpopular = db.reports().unpopular_items().await.unwrap();
        assert_eq!(unpopular[0].item_id, cucumber.id);
        assert_eq!(unpopular[0].line_count, 0);
    }
}
