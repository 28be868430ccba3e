//! # State Module
//!
//! What every command is handed.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐           │
//! │  │   DbState    │  │     Session      │  │    AppConfig     │           │
//! │  │              │  │                  │  │  (config.rs)     │           │
//! │  │  Database    │  │  account_id      │  │  db path         │           │
//! │  │  (SQLite     │  │  role            │  │  store name      │           │
//! │  │   pool)      │  │                  │  │  currency        │           │
//! │  └──────────────┘  └──────────────────┘  └──────────────────┘           │
//! │                                                                         │
//! │  • DbState: shared by every request; the pool is thread-safe            │
//! │  • Session: one per logged-in user, issued by commands::auth::login     │
//! │  • AppConfig: read-only after startup                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart is not state: the web layer keeps it and passes it into
//! `checkout_preview` and `place_order`.

mod db;
mod session;

pub use db::DbState;
pub use session::Session;
