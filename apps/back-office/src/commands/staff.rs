//! # Staff Commands
//!
//! Everything behind the staff dashboard. Every command here starts with
//! `session.require_staff()`.
//!
//! ## Sales Report
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SalesReport::load(db, 2024)                                            │
//! │                                                                         │
//! │   weekly    week1/05/2024  $  26.00   (every year, by week of month)    │
//! │   monthly   05/2024        $  42.00   (months of 2024)                  │
//! │   yearly    2024           $ 118.00   (always one row)                  │
//! │   popular   top 5 items by order lines, never-ordered left out          │
//! │   unpopular bottom 5 items, never-ordered included                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use greengrocer_core::reporting::{ItemPopularity, PeriodSales};
use greengrocer_core::{OrderStatus, OrderSummary};
use serde::Serialize;
use tracing::{debug, info};

use crate::commands::customer::CustomerProfileView;
use crate::error::ApiError;
use crate::state::{DbState, Session};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub profile: CustomerProfileView,
    pub orders: Vec<OrderSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub previous: OrderStatus,
    pub current: OrderStatus,
}

/// Sales and popularity figures for one year.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub year: i32,
    pub weekly: Vec<PeriodSales>,
    pub monthly: Vec<PeriodSales>,
    pub yearly: PeriodSales,
    pub popular: Vec<ItemPopularity>,
    pub unpopular: Vec<ItemPopularity>,
}

impl SalesReport {
    /// Builds the report without a role check; the binary calls this directly.
    pub async fn load(db: &DbState, year: i32) -> Result<SalesReport, ApiError> {
        let reports = db.inner().reports();
        Ok(SalesReport {
            year,
            weekly: reports.weekly_sales().await?,
            monthly: reports.monthly_sales(year).await?,
            yearly: reports.yearly_sales(year).await?,
            popular: reports.popular_items().await?,
            unpopular: reports.unpopular_items().await?,
        })
    }
}

/// Every customer account, private and corporate.
pub async fn list_customers(db: &DbState, session: &Session) -> Result<Vec<CustomerProfileView>, ApiError> {
    debug!("list_customers command");
    session.require_staff()?;

    let accounts = db.inner().accounts().list_customers().await?;
    Ok(accounts
        .iter()
        .filter_map(CustomerProfileView::from_account)
        .collect())
}

/// One customer's profile and all their orders, paid or not.
pub async fn customer_details(
    db: &DbState,
    session: &Session,
    customer_id: i64,
) -> Result<CustomerDetails, ApiError> {
    debug!(customer_id, "customer_details command");
    session.require_staff()?;

    let account = db.inner().accounts().get(customer_id).await?;
    let profile = CustomerProfileView::from_account(&account)
        .ok_or_else(|| ApiError::not_found("Customer", &customer_id.to_string()))?;
    let orders = db.inner().orders().list_for_customer(customer_id).await?;
    Ok(CustomerDetails { profile, orders })
}

/// Every order, newest first.
pub async fn list_all_orders(db: &DbState, session: &Session) -> Result<Vec<OrderSummary>, ApiError> {
    debug!("list_all_orders command");
    session.require_staff()?;

    Ok(db.inner().orders().list_all().await?)
}

/// Moves an order to any status. Staff use this to mark orders Processed or Completed.
pub async fn update_order_status(
    db: &DbState,
    session: &Session,
    order_id: i64,
    status: OrderStatus,
) -> Result<StatusChange, ApiError> {
    debug!(order_id, status = %status, "update_order_status command");
    session.require_staff()?;

    let previous = db.inner().orders().update_status(order_id, status).await?;
    info!(
        order_id,
        previous = %previous,
        current = %status,
        staff_id = session.account_id,
        "Order status changed"
    );
    Ok(StatusChange {
        previous,
        current: status,
    })
}

/// The sales report for `year`.
pub async fn sales_report(db: &DbState, session: &Session, year: i32) -> Result<SalesReport, ApiError> {
    debug!(year, "sales_report command");
    session.require_staff()?;

    SalesReport::load(db, year).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::order::{place_order, PlaceOrderRequest};
    use crate::error::ErrorCode;
    use crate::testing::{corporate_session, customer_session, date, seeded, staff_session, SeedIds};
    use greengrocer_core::{
        CartEntry, DeliveryMethod, ItemType, Money, PaymentMethod, PaymentRequest, Quantity,
    };

    async fn paid_order(
        db: &DbState,
        session: &Session,
        entries: Vec<CartEntry>,
        delivery_method: DeliveryMethod,
        on: chrono::NaiveDate,
    ) -> OrderSummary {
        let request = PlaceOrderRequest {
            delivery_method,
            payment_method: PaymentMethod::Account,
            cart: entries,
        };
        let order = place_order(db, session, request, on).await.unwrap();
        db.inner()
            .orders()
            .pay_order(order.id, &PaymentRequest::new("account"), on)
            .await
            .unwrap();
        order
    }

    fn kumara(ids: &SeedIds, units: i64) -> CartEntry {
        CartEntry {
            item_id: ids.kumara,
            item_type: ItemType::UnitPrice,
            quantity: Quantity::from_units(units),
        }
    }

    #[tokio::test]
    async fn test_staff_only() {
        let (db, ids) = seeded().await;
        let ying = customer_session(ids.ying);

        assert_eq!(list_customers(&db, &ying).await.unwrap_err().code, ErrorCode::Forbidden);
        assert_eq!(list_all_orders(&db, &ying).await.unwrap_err().code, ErrorCode::Forbidden);
        assert_eq!(sales_report(&db, &ying, 2024).await.unwrap_err().code, ErrorCode::Forbidden);
        assert!(customer_details(&db, &ying, ids.ying).await.is_err());
    }

    #[tokio::test]
    async fn test_customers_and_orders() {
        let (db, ids) = seeded().await;
        let staff = staff_session(&ids);

        let customers = list_customers(&db, &staff).await.unwrap();
        assert_eq!(customers.len(), 3);
        assert!(customers.iter().all(|c| c.id != ids.staff));

        let order = paid_order(
            &db,
            &customer_session(ids.ying),
            vec![kumara(&ids, 1)],
            DeliveryMethod::Pickup,
            date(2024, 5, 7),
        )
        .await;

        let details = customer_details(&db, &staff, ids.ying).await.unwrap();
        assert_eq!(details.profile.balance, Money::from_cents(200));
        assert_eq!(details.orders.len(), 1);
        assert_eq!(list_all_orders(&db, &staff).await.unwrap().len(), 1);

        let change = update_order_status(&db, &staff, order.id, OrderStatus::Completed)
            .await
            .unwrap();
        assert_eq!(change.previous, OrderStatus::Pending);
        assert_eq!(change.current, OrderStatus::Completed);

        let change = update_order_status(&db, &staff, order.id, OrderStatus::Pending)
            .await
            .unwrap();
        assert_eq!(change.previous, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_sales_report() {
        let (db, ids) = seeded().await;
        let staff = staff_session(&ids);

        // $6.00 + $10.00 delivery
        paid_order(
            &db,
            &customer_session(ids.ying),
            vec![kumara(&ids, 3)],
            DeliveryMethod::Delivery,
            date(2024, 5, 7),
        )
        .await;
        // $20.00 less 10%
        paid_order(
            &db,
            &corporate_session(ids.fresh),
            vec![kumara(&ids, 10)],
            DeliveryMethod::Pickup,
            date(2024, 8, 10),
        )
        .await;
        paid_order(
            &db,
            &customer_session(ids.harry),
            vec![kumara(&ids, 1)],
            DeliveryMethod::Pickup,
            date(2023, 8, 10),
        )
        .await;

        let report = sales_report(&db, &staff, 2024).await.unwrap();
        assert_eq!(report.yearly.total, Money::from_cents(3_400));
        assert_eq!(report.yearly.order_count, 2);
        assert_eq!(report.monthly.len(), 2);
        assert_eq!(report.monthly[0].label, "05/2024");
        assert_eq!(report.weekly.len(), 3);

        assert_eq!(report.popular.len(), 1);
        assert_eq!(report.popular[0].item_id, ids.kumara);
        assert_eq!(report.popular[0].line_count, 3);
        assert_eq!(report.unpopular[0].item_id, ids.carrots);
        assert_eq!(report.unpopular[1].name, "Small Premade Box");

        let empty = sales_report(&db, &staff, 2022).await.unwrap();
        assert_eq!(empty.yearly.total, Money::zero());
        assert!(empty.monthly.is_empty());
    }
}
