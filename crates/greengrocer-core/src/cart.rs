//! # Cart
//!
//! The list of `{item_id, item_type, quantity}` entries a customer builds
//! before placing an order.
//!
//! The cart lives with the client session. Each request hands the whole
//! cart to the order placement flow as a value; nothing here is stored.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Storefront Action        Cart Method              Change               │
//! │  ─────────────────        ───────────              ──────               │
//! │                                                                         │
//! │  Add to cart ───────────► add() ─────────────────► merge or push       │
//! │  Change quantity ───────► update_quantity() ─────► entry.quantity = q  │
//! │  Remove ────────────────► remove() ──────────────► entry dropped       │
//! │  Checkout page ─────────► preview() ─────────────► CheckoutPreview     │
//! │  Place order ───────────► (db) place_order(cart) ► Order + lines       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::account::Account;
use crate::catalog::Item;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{DeliveryMethod, ItemType};
use crate::validation::{validate_cart_size, validate_order_quantity, validate_quantity};

/// One cart row. Entries are unique by `(item_id, item_type)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartEntry {
    pub item_id: i64,
    pub item_type: ItemType,
    pub quantity: Quantity,
}

/// A customer's cart.
///
/// ## Invariants
/// - Same item added twice merges into one entry (quantities add)
/// - Quantities are positive and at most `MAX_ITEM_QUANTITY` units
/// - At most `MAX_CART_ITEMS` entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub entries: Vec<CartEntry>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Rebuilds a cart from client-held entries, merging duplicates.
    pub fn from_entries(entries: impl IntoIterator<Item = CartEntry>) -> CoreResult<Self> {
        let mut cart = Cart::new();
        for entry in entries {
            cart.add(entry.item_id, entry.item_type, entry.quantity)?;
        }
        Ok(cart)
    }

    /// Adds `quantity` of an item, or increases the existing entry.
    pub fn add(&mut self, item_id: i64, item_type: ItemType, quantity: Quantity) -> CoreResult<()> {
        validate_order_quantity(item_type, quantity)?;

        if let Some(entry) = self.find_mut(item_id, item_type) {
            let merged = entry.quantity + quantity;
            validate_quantity(merged)?;
            entry.quantity = merged;
            return Ok(());
        }

        validate_cart_size(self.entries.len()).map_err(|_| CoreError::CartTooLarge {
            max: crate::MAX_CART_ITEMS,
        })?;

        self.entries.push(CartEntry {
            item_id,
            item_type,
            quantity,
        });
        Ok(())
    }

    /// Sets an entry's quantity. Zero removes the entry.
    pub fn update_quantity(
        &mut self,
        item_id: i64,
        item_type: ItemType,
        quantity: Quantity,
    ) -> CoreResult<()> {
        if quantity.is_zero() {
            return self.remove(item_id, item_type);
        }
        validate_order_quantity(item_type, quantity)?;

        let entry = self
            .find_mut(item_id, item_type)
            .ok_or_else(|| CoreError::not_found("Cart entry", item_id))?;
        entry.quantity = quantity;
        Ok(())
    }

    pub fn remove(&mut self, item_id: i64, item_type: ItemType) -> CoreResult<()> {
        let before = self.entries.len();
        self.entries
            .retain(|e| !(e.item_id == item_id && e.item_type == item_type));

        if self.entries.len() == before {
            return Err(CoreError::not_found("Cart entry", item_id));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn find_mut(&mut self, item_id: i64, item_type: ItemType) -> Option<&mut CartEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.item_id == item_id && e.item_type == item_type)
    }

    /// Prices the cart for the checkout page.
    ///
    /// The discount here is the customer's own rate. The order total
    /// charged later uses the fixed corporate factor, so the two only agree
    /// while the rate is the default.
    ///
    /// ## Errors
    /// `NotFound` when an entry does not match an item of the stated type,
    /// or names another customer's custom box.
    pub fn preview(
        &self,
        items: &[Item],
        account: &Account,
        delivery_method: DeliveryMethod,
    ) -> CoreResult<CheckoutPreview> {
        let lines = self
            .entries
            .iter()
            .map(|entry| {
                let item = resolve(items, entry, account.id)?;
                Ok(PreviewLine {
                    item_id: item.id,
                    name: item.name(),
                    item_type: entry.item_type,
                    quantity: entry.quantity,
                    unit_price: item.unit_price(),
                    subtotal: item.price(entry.quantity),
                    in_stock: item.stock >= entry.quantity,
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        let subtotal: Money = lines.iter().map(|l| l.subtotal).sum();
        let discounted_subtotal = account.apply_discount(subtotal);
        let delivery_fee = delivery_method.fee();
        let total = discounted_subtotal + delivery_fee;
        let can_charge_to_account = account
            .customer()
            .map_or(false, |c| c.can_charge(total));

        Ok(CheckoutPreview {
            lines,
            subtotal,
            discounted_subtotal,
            delivery_fee,
            total,
            can_charge_to_account,
        })
    }
}

/// Finds the item a cart entry refers to, checking its variant.
///
/// Custom boxes only resolve for the customer who owns them.
pub fn resolve<'a>(items: &'a [Item], entry: &CartEntry, customer_id: i64) -> CoreResult<&'a Item> {
    items
        .iter()
        .find(|item| {
            item.id == entry.item_id
                && item.item_type() == entry.item_type
                && item
                    .as_box()
                    .map_or(true, |b| !b.is_custom || b.owner_customer_id == Some(customer_id))
        })
        .ok_or_else(|| CoreError::not_found(entry.item_type.to_string(), entry.item_id))
}

/// A priced cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PreviewLine {
    pub item_id: i64,
    pub name: String,
    pub item_type: ItemType,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub subtotal: Money,
    pub in_stock: bool,
}

/// What the checkout page shows before the order is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CheckoutPreview {
    pub lines: Vec<PreviewLine>,
    pub subtotal: Money,
    pub discounted_subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
    pub can_charge_to_account: bool,
}
