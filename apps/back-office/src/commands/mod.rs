//! # Commands Module
//!
//! Every operation the web layer can call.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── auth.rs      ◄─── Login
//! ├── catalog.rs   ◄─── Browsing, custom boxes, stock (staff)
//! ├── order.rs     ◄─── Checkout preview, place, details, cancel, history
//! ├── payment.rs   ◄─── Pay order, payment history, pay balance
//! ├── customer.rs  ◄─── Customer profile
//! └── staff.rs     ◄─── Customers, all orders, status, reports
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  web handler                                                            │
//! │       │  place_order(&db, &session, request, today)                     │
//! │       ▼                                                                 │
//! │  1. session.require_customer()      ◄── role check first                │
//! │  2. db.inner().orders().place_order(...)                                │
//! │  3. map the result to a response DTO                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Result<Dto, ApiError>  ──► JSON                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands that depend on the date take `today` as an argument; handlers
//! pass [`crate::today`].

pub mod auth;
pub mod catalog;
pub mod customer;
pub mod order;
pub mod payment;
pub mod staff;
