//! # Repository Module
//!
//! Database repository implementations for the greengrocer back end.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  back-office command                                                    │
//! │       │                                                                 │
//! │       │  db.orders().pay_order(order_id, &request, today)               │
//! │       ▼                                                                 │
//! │  OrderRepository                                                        │
//! │  ├── lock write gate, BEGIN                                             │
//! │  ├── load rows → domain values (Order, Item, Account)                   │
//! │  ├── run greengrocer-core rules (order.pay(...))                        │
//! │  ├── write the changed rows                                             │
//! │  └── COMMIT (or drop the transaction → ROLLBACK)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  Rules live in the core; repositories only load and store.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ItemRepository`](item::ItemRepository) - Catalog, stock, custom boxes
//! - [`AccountRepository`](account::AccountRepository) - Accounts, login, balances
//! - [`OrderRepository`](order::OrderRepository) - Order placement, payment, cancellation
//! - [`PaymentRepository`](payment::PaymentRepository) - Payment history
//! - [`ReportRepository`](report::ReportRepository) - Sales and popularity reports
//!
//! Each module also exposes `pub(crate)` helpers that take a
//! `&mut SqliteConnection`, so a flow in one repository can read and write
//! another's tables inside its own transaction.

pub mod account;
pub mod item;
pub mod order;
pub mod payment;
pub mod report;
