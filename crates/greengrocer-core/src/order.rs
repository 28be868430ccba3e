//! # Orders
//!
//! The order aggregate and its lifecycle.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   open() ──► Pending ──pay()──► Pending (paid, stock consumed)          │
//! │                │                     │                                  │
//! │                │ cancel()            │ update_status() (staff)          │
//! │                ▼                     ▼                                  │
//! │            Cancelled            Processed ──► Completed                 │
//! │                                                                         │
//! │   cancel() is the only guarded move: it requires Pending.               │
//! │   update_status() accepts any target; staff own that decision.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock
//! Adding a line checks live stock but reserves nothing. Stock is consumed
//! once, when the payment is taken, and returned when a paid order is
//! cancelled.
//!
//! ## Totals
//! ```text
//! ┌──────────┬───────────┬─────────────────────┐
//! │ Delivery │ Customer  │ total               │
//! ├──────────┼───────────┼─────────────────────┤
//! │ Pickup   │ private   │ sum                 │
//! │ Pickup   │ corporate │ sum × 0.9           │
//! │ Delivery │ private   │ sum + 10.00         │
//! │ Delivery │ corporate │ sum × 0.9 + 10.00   │
//! └──────────┴───────────┴─────────────────────┘
//! ```
//! The corporate factor is fixed and does not read the customer's own
//! discount rate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::account::{Account, CustomerProfile};
use crate::catalog::Item;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::payment::{Payment, PaymentDetails};
use crate::quantity::Quantity;
use crate::types::{CustomerType, DeliveryMethod, ItemType, OrderStatus, PaymentMethod};
use crate::validation::validate_whole_units;
use crate::{CORPORATE_ORDER_DISCOUNT_BPS, FIRST_ORDER_NUMBER};

// =============================================================================
// Order
// =============================================================================

/// A customer's order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Zero until the order is stored.
    pub id: i64,
    pub order_number: String,
    pub date: NaiveDate,
    pub delivery_method: DeliveryMethod,
    pub status: OrderStatus,
    /// The method chosen at checkout. The payment must use it.
    pub payment_method: PaymentMethod,
    pub customer_id: i64,
    /// Snapshot taken when the order is opened; drives the total.
    pub customer_type: CustomerType,
    pub lines: Vec<OrderLine>,
    pub payment: Option<Payment>,
}

/// A priced quantity of one item.
///
/// `subtotal` is computed when the line is added and never recomputed,
/// so later price changes do not reach existing orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub quantity: Quantity,
    pub subtotal: Money,
}

/// What `cancel` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CancelOutcome {
    /// Quantities put back, per item.
    pub restored: Vec<(i64, Quantity)>,
    /// Amount taken off the balance (after clamping at zero).
    pub refunded: Money,
}

impl Order {
    /// Opens an empty Pending order for `customer`.
    ///
    /// ## Errors
    /// `NotACustomer` if `customer` is a staff account.
    pub fn open(
        order_number: impl Into<String>,
        date: NaiveDate,
        customer: &Account,
        delivery_method: DeliveryMethod,
        payment_method: PaymentMethod,
    ) -> CoreResult<Order> {
        let customer_type = customer
            .customer_type()
            .ok_or(CoreError::NotACustomer(customer.id))?;

        Ok(Order {
            id: 0,
            order_number: order_number.into(),
            date,
            delivery_method,
            status: OrderStatus::Pending,
            payment_method,
            customer_id: customer.id,
            customer_type,
            lines: Vec::new(),
            payment: None,
        })
    }

    pub fn is_paid(&self) -> bool {
        self.payment.is_some()
    }

    fn ensure_pending(&self, action: &str) -> CoreResult<()> {
        if self.status != OrderStatus::Pending {
            return Err(CoreError::InvalidTransition {
                order_number: self.order_number.clone(),
                status: self.status,
                action: action.to_string(),
            });
        }
        Ok(())
    }

    /// Appends a line for `quantity` of `item`, priced now.
    ///
    /// ## Errors
    /// - `Validation` if `quantity` is not positive, or is fractional for
    ///   anything but a weighted veggie
    /// - `InvalidTransition` if the order is not Pending or already paid
    /// - `InsufficientStock` if `item.stock < quantity`
    pub fn add_line(&mut self, item: &Item, quantity: Quantity) -> CoreResult<&OrderLine> {
        if !quantity.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        validate_whole_units(item.item_type(), quantity)?;
        self.ensure_pending("add items")?;
        if self.is_paid() {
            return Err(CoreError::AlreadyPaid {
                order_number: self.order_number.clone(),
            });
        }
        item.ensure_available(quantity)?;

        self.lines.push(OrderLine {
            id: 0,
            item_id: item.id,
            item_name: item.name(),
            quantity,
            subtotal: item.price(quantity),
        });
        Ok(&self.lines[self.lines.len() - 1])
    }

    /// Sum of the frozen line subtotals.
    pub fn line_sum(&self) -> Money {
        self.lines.iter().map(|line| line.subtotal).sum()
    }

    /// The amount the customer pays.
    pub fn total(&self) -> Money {
        order_total(self.line_sum(), self.customer_type, self.delivery_method)
    }

    /// Total quantity needed per item, across lines.
    pub fn stock_requirements(&self) -> BTreeMap<i64, Quantity> {
        let mut needed: BTreeMap<i64, Quantity> = BTreeMap::new();
        for line in &self.lines {
            *needed.entry(line.item_id).or_default() += line.quantity;
        }
        needed
    }

    /// Consumes stock for every line.
    ///
    /// Every requirement is checked before anything is withdrawn, so on
    /// error no item has changed.
    pub fn decrement_stock(&self, items: &mut [Item]) -> CoreResult<()> {
        let needed = self.stock_requirements();

        for (item_id, quantity) in &needed {
            find_item(items, *item_id)?.ensure_available(*quantity)?;
        }
        for (item_id, quantity) in needed {
            find_item_mut(items, item_id)?.withdraw(quantity)?;
        }
        Ok(())
    }

    /// Takes payment for the order total.
    ///
    /// ## Flow
    /// ```text
    /// amount > 0 ─► not paid ─► Pending ─► method matches ─► credit check
    ///     (account only) ─► decrement stock ─► Payment::create ─► attach
    /// ```
    /// Every check runs before the first mutation.
    pub fn pay(
        &mut self,
        customer: &mut CustomerProfile,
        items: &mut [Item],
        details: PaymentDetails,
        date: NaiveDate,
    ) -> CoreResult<&Payment> {
        let amount = self.total();
        if !amount.is_positive() {
            return Err(CoreError::InvalidPaymentAmount {
                reason: format!("order total {} is not greater than zero", amount),
            });
        }
        if self.is_paid() {
            return Err(CoreError::AlreadyPaid {
                order_number: self.order_number.clone(),
            });
        }
        self.ensure_pending("take payment")?;

        let method = details.method();
        if method != self.payment_method {
            return Err(CoreError::PaymentMethodMismatch {
                expected: self.payment_method,
                actual: method,
            });
        }
        if method == PaymentMethod::Account {
            customer.ensure_can_charge(amount)?;
        }

        self.decrement_stock(items)?;
        let payment = Payment::create(self.id, self.customer_id, customer, amount, date, details)?;
        Ok(self.payment.insert(payment))
    }

    /// Cancels a Pending order.
    ///
    /// For a paid order this also puts the stock back and, for account
    /// payments, takes the total off the balance (clamped at zero). An
    /// unpaid order never consumed stock, so there is nothing to return.
    ///
    /// ## Errors
    /// `InvalidTransition` for any other status, with nothing changed.
    pub fn cancel(
        &mut self,
        items: &mut [Item],
        customer: &mut CustomerProfile,
    ) -> CoreResult<CancelOutcome> {
        self.ensure_pending("cancel")?;

        let mut outcome = CancelOutcome {
            restored: Vec::new(),
            refunded: Money::zero(),
        };

        if self.is_paid() {
            let needed = self.stock_requirements();
            for item_id in needed.keys() {
                find_item(items, *item_id)?;
            }
            for (item_id, quantity) in needed {
                find_item_mut(items, item_id)?.restock(quantity);
                outcome.restored.push((item_id, quantity));
            }

            if self.payment_method == PaymentMethod::Account {
                let before = customer.balance;
                let after = customer.refund(self.total());
                outcome.refunded = before - after;
            }
        }

        self.status = OrderStatus::Cancelled;
        Ok(outcome)
    }

    /// Sets the status, returning the previous one.
    pub fn update_status(&mut self, status: OrderStatus) -> OrderStatus {
        std::mem::replace(&mut self.status, status)
    }

    pub fn summary(&self) -> OrderSummary {
        OrderSummary {
            id: self.id,
            order_number: self.order_number.clone(),
            date: self.date,
            status: self.status,
            delivery_method: self.delivery_method,
            payment_method: self.payment_method,
            customer_id: self.customer_id,
            total: self.total(),
            is_paid: self.is_paid(),
        }
    }
}

fn find_item(items: &[Item], item_id: i64) -> CoreResult<&Item> {
    items
        .iter()
        .find(|item| item.id == item_id)
        .ok_or_else(|| CoreError::not_found("Item", item_id))
}

fn find_item_mut(items: &mut [Item], item_id: i64) -> CoreResult<&mut Item> {
    items
        .iter_mut()
        .find(|item| item.id == item_id)
        .ok_or_else(|| CoreError::not_found("Item", item_id))
}

/// Applies the totals table to a sum of line subtotals.
///
/// Lets list views and reports price an order from an aggregated line sum
/// without loading every line.
pub fn order_total(line_sum: Money, customer_type: CustomerType, delivery: DeliveryMethod) -> Money {
    let discounted = match customer_type {
        CustomerType::Private => line_sum,
        CustomerType::Corporate => line_sum.apply_percentage_discount(CORPORATE_ORDER_DISCOUNT_BPS),
    };
    discounted + delivery.fee()
}

/// The next order number: one past the highest existing, starting at 1000.
pub fn next_order_number(max_existing: Option<i64>) -> String {
    let next = max_existing
        .map(|max| max.saturating_add(1))
        .unwrap_or(FIRST_ORDER_NUMBER)
        .max(FIRST_ORDER_NUMBER);
    next.to_string()
}

// =============================================================================
// Views
// =============================================================================

/// One row of an order list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderSummary {
    pub id: i64,
    pub order_number: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub status: OrderStatus,
    pub delivery_method: DeliveryMethod,
    pub payment_method: PaymentMethod,
    pub customer_id: i64,
    pub total: Money,
    pub is_paid: bool,
}

/// An order line with the item data the details page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLineDetail {
    pub item_id: i64,
    pub name: String,
    pub item_type: ItemType,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub subtotal: Money,
    /// Veggie names for box lines.
    pub contents: Vec<String>,
}

/// Full order view for a customer or staff member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetails {
    pub summary: OrderSummary,
    pub customer_name: String,
    pub customer_username: String,
    pub address: String,
    pub lines: Vec<OrderLineDetail>,
    pub payment: Option<Payment>,
}

impl OrderDetails {
    /// Joins `order` with its customer and the items its lines reference.
    pub fn build(order: &Order, customer: &Account, items: &[Item]) -> CoreResult<OrderDetails> {
        let address = customer.require_customer()?.address.clone();

        let lines = order
            .lines
            .iter()
            .map(|line| {
                let item = find_item(items, line.item_id)?;
                Ok(OrderLineDetail {
                    item_id: line.item_id,
                    name: line.item_name.clone(),
                    item_type: item.item_type(),
                    quantity: line.quantity,
                    unit_price: item.unit_price(),
                    subtotal: line.subtotal,
                    contents: item.contents().iter().map(|c| c.name.clone()).collect(),
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(OrderDetails {
            summary: order.summary(),
            customer_name: customer.full_name(),
            customer_username: customer.username.clone(),
            address,
            lines,
            payment: order.payment.clone(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
