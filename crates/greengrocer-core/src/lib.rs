//! # greengrocer-core: Pure Business Logic for the Greengrocer Back End
//!
//! This crate holds the order pricing and fulfillment rules as plain data
//! and functions. It never touches a database, a socket or a file.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Greengrocer Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               Web handlers (outside this workspace)             │   │
//! │  │    login, browse, cart, checkout, pay, staff pages              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 back-office (commands, config)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ greengrocer-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐   │   │
//! │  │   │ catalog │ │ account │ │  order  │ │ payment │ │reporting│   │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘   │   │
//! │  │   money • quantity • types • cart • validation • error          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              greengrocer-db (SQLite, transactions)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - Item variants, pricing, custom boxes
//! - [`account`] - Staff and customer accounts, balance rules
//! - [`order`] - Order aggregate and its state machine
//! - [`payment`] - Payment variants and required fields
//! - [`reporting`] - Sales and popularity aggregation
//! - [`cart`] - Pre-order cart and checkout preview
//! - [`money`] / [`quantity`] - Integer fixed-point values
//! - [`validation`] - Field rules
//!
//! ## Example Usage
//!
//! ```rust
//! use greengrocer_core::money::Money;
//! use greengrocer_core::quantity::Quantity;
//!
//! let per_unit = Money::from_cents(199);
//! let line = per_unit.multiply_quantity(Quantity::from_units(2));
//! assert_eq!(line.cents(), 398);
//!
//! // Corporate orders take 10% off before the delivery fee.
//! let corporate = line.apply_percentage_discount(greengrocer_core::CORPORATE_ORDER_DISCOUNT_BPS);
//! assert_eq!(corporate.to_decimal_string(), "3.5820");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod account;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod money;
pub mod order;
pub mod payment;
pub mod quantity;
pub mod reporting;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use account::{Account, AccountProfile, CorporateProfile, CustomerProfile, Role, StaffProfile};
pub use cart::{Cart, CartEntry, CheckoutPreview};
pub use catalog::{BoxContent, CatalogListing, Item, ItemDraft, ItemKind, PremadeBox};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{CancelOutcome, Order, OrderDetails, OrderLine, OrderSummary};
pub use payment::{Payment, PaymentDetails, PaymentRequest};
pub use quantity::Quantity;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Flat fee added to delivery orders.
pub const DELIVERY_FEE: Money = Money::from_cents(1_000);

/// Discount the order total applies to every corporate customer (10%).
///
/// Fixed; a corporate customer's own `discount_rate_bps` only affects the
/// checkout preview.
pub const CORPORATE_ORDER_DISCOUNT_BPS: u32 = 1_000;

/// Discount rate given to new corporate accounts.
pub const DEFAULT_CORPORATE_DISCOUNT_BPS: u32 = 1_000;

/// Credit limit given to new customer accounts.
pub const DEFAULT_CREDIT_LIMIT: Money = Money::from_cents(10_000);

/// Order numbers start here.
pub const FIRST_ORDER_NUMBER: i64 = 1_000;

/// Rows in each popularity report.
pub const POPULARITY_LIMIT: usize = 5;

/// Maximum entries in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and keeps an order to a size staff can pack.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in a cart, in whole units
///
/// ## Business Reason
/// Catches typos such as 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;
