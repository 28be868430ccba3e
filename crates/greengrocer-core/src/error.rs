//! # Error Types
//!
//! Domain-specific error types for greengrocer-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  greengrocer-core errors (this file)                                   │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  greengrocer-db errors (separate crate)                                │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  back-office errors (app)                                              │
//! │  └── ApiError         - What the web handlers see (serialized)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Handler      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{OrderStatus, PaymentMethod};

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the order lifecycle.
///
/// Every failure the core can produce is one of these variants. Callers
/// match on them instead of inspecting strings.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An item, account, order or box content could not be resolved.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Not enough stock to add a line or to consume it on payment.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to order (Kumara, 3 kg)
    ///      │
    ///      ▼
    /// Check stock: available=2
    ///      │
    ///      ▼
    /// InsufficientStock { item: "Kumara", available: 2, requested: 3 }
    /// ```
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: Quantity,
        requested: Quantity,
    },

    /// The order's current status does not allow the requested operation.
    #[error("Order {order_number} is {status}, cannot {action}")]
    InvalidTransition {
        order_number: String,
        status: OrderStatus,
        action: String,
    },

    /// A payment method was chosen but one of its required fields is absent.
    #[error("{method} payment requires {field}")]
    MissingField { method: PaymentMethod, field: String },

    /// Payment method string did not match any known method.
    #[error("Unknown payment method: {0}")]
    UnknownMethod(String),

    /// Charging the amount would take the balance past the credit limit.
    #[error("Charging {amount} would exceed credit limit {limit} (balance {balance})")]
    LimitExceeded {
        balance: Money,
        amount: Money,
        limit: Money,
    },

    /// Username unknown or password wrong. Deliberately does not say which.
    #[error("Invalid username or password")]
    AuthFailure,

    /// The order already carries a payment.
    #[error("Order {order_number} has already been paid")]
    AlreadyPaid { order_number: String },

    /// The payment method differs from the one chosen when the order was placed.
    #[error("Order was placed for {expected} payment, got {actual}")]
    PaymentMethodMismatch {
        expected: PaymentMethod,
        actual: PaymentMethod,
    },

    /// Payment amount is invalid.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Cart has exceeded maximum allowed entries.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// The operation needs a customer account but got a staff account.
    #[error("Account {0} is not a customer account")]
    NotACustomer(i64),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. unparseable date or quantity).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
