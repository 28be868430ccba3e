//! # Back Office Library
//!
//! The command layer of the greengrocer: what the web handlers call for
//! customers and staff, plus the sales report binary.
//!
//! ## Module Organization
//! ```text
//! back_office/
//! ├── lib.rs          ◄─── You are here (tracing setup, today)
//! ├── config.rs       ◄─── Environment configuration
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   └── session.rs  ◄─── Logged-in user and role checks
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command exports
//! │   ├── auth.rs     ◄─── Login
//! │   ├── catalog.rs  ◄─── Catalog and custom boxes
//! │   ├── order.rs    ◄─── Checkout and order lifecycle
//! │   ├── payment.rs  ◄─── Payments and balances
//! │   ├── customer.rs ◄─── Customer profile
//! │   └── staff.rs    ◄─── Staff views and sales reports
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## State
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command State                                        │
//! │                                                                         │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────────┐     │
//! │  │    DbState       │ │    Session       │ │    AppConfig         │     │
//! │  │                  │ │                  │ │                      │     │
//! │  │  • Database pool │ │  • Account id    │ │  • Database path     │     │
//! │  │  • Repositories  │ │  • Role          │ │  • Store name        │     │
//! │  └──────────────────┘ └──────────────────┘ └──────────────────────┘     │
//! │                                                                         │
//! │  Each command takes only the state it needs. The cart lives in the      │
//! │  caller's session storage and arrives as a `Cart` value.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

use chrono::{NaiveDate, Utc};
use tracing_subscriber::EnvFilter;

/// Today's date, used for order dates, payment dates and card expiry checks.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=greengrocer_db=trace` - Show trace for the database crate only
/// - Default: INFO level
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,greengrocer_db=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
