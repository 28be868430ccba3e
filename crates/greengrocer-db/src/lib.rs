//! # greengrocer-db: Database Layer for the Greengrocer Back End
//!
//! This crate provides database access for the vegetable-ordering back end.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Greengrocer Data Flow                            │
//! │                                                                         │
//! │  back-office command (pay_order)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  greengrocer-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │    │   │
//! │  │   │   (pool.rs)   │    │  (order.rs)   │    │  (embedded)  │    │   │
//! │  │   │               │    │               │    │              │    │   │
//! │  │   │ SqlitePool    │    │ ItemRepo      │    │ 001_initial  │    │   │
//! │  │   │ Writer gate   │◄───│ OrderRepo     │    │ _schema.sql  │    │   │
//! │  │   │               │    │ ReportRepo    │    │              │    │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘    │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ./greengrocer.db  (GREENGROCER_DB_PATH)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`credentials`] - Password hashing
//! - [`repository`] - Repository implementations (item, order, etc.)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use greengrocer_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("greengrocer.db")).await?;
//!
//! let listing = db.items().catalog_for_customers().await?;
//! let order = db.orders().place_order(customer_id, delivery, method, &cart, today).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod credentials;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::account::{AccountRepository, NewAccount};
pub use repository::item::ItemRepository;
pub use repository::order::OrderRepository;
pub use repository::payment::{PaymentHistoryEntry, PaymentRepository};
pub use repository::report::ReportRepository;
