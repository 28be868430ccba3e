//! # Validation Module
//!
//! Input validation for the storefront and back-office forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web form                                                      │
//! │  └── Required fields, basic formats                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: back-office command (Rust)                                    │
//! │  ├── Type validation (deserialization, FromStr)                         │
//! │  └── THIS MODULE: field rules                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── UNIQUE usernames and order numbers                                 │
//! │  └── CHECK (stock_milli >= 0)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use greengrocer_core::quantity::Quantity;
//! use greengrocer_core::validation::{validate_quantity, validate_username};
//!
//! validate_username("ying").unwrap();
//! validate_quantity(Quantity::from_milli(1_500)).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::ItemType;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a login name.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, `.`, `-` and `_` only
///
/// ## Example
/// ```rust
/// use greengrocer_core::validation::validate_username;
///
/// assert!(validate_username("ying").is_ok());
/// assert!(validate_username("").is_err());
/// assert!(validate_username("has space").is_err());
/// ```
pub fn validate_username(username: &str) -> ValidationResult<String> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if username.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 50,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, dots, hyphens and underscores"
                .to_string(),
        });
    }

    Ok(username.to_string())
}

/// Validates a password before hashing. Only length is checked.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.len() < 3 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 3,
        });
    }

    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    Ok(())
}

/// Validates a person, veggie or department name.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(name.to_string())
}

/// Validates a card number and returns its digits.
///
/// Spaces and hyphens are accepted as separators.
pub fn validate_card_number(number: &str) -> ValidationResult<String> {
    let digits: String = number
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();

    if digits.is_empty() {
        return Err(ValidationError::Required {
            field: "card_number".to_string(),
        });
    }

    if !digits.chars().all(|c| c.is_ascii_digit()) || !(12..=19).contains(&digits.len()) {
        return Err(ValidationError::InvalidFormat {
            field: "card_number".to_string(),
            reason: "must be 12 to 19 digits".to_string(),
        });
    }

    Ok(digits)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order or cart quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999) units
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Storefront: Add to cart                                                │
/// │                                                                         │
/// │  Customer enters quantity: 1.5                                          │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(1.5) ← THIS FUNCTION                                 │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"                │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"      │
/// │       │                                                                 │
/// │       └── OK → Cart::add                                                │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: Quantity) -> ValidationResult<()> {
    if !qty.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > Quantity::from_units(MAX_ITEM_QUANTITY) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a quantity ordered of an item of `item_type`: everything
/// `validate_quantity` checks, plus `validate_whole_units`.
pub fn validate_order_quantity(item_type: ItemType, qty: Quantity) -> ValidationResult<()> {
    validate_quantity(qty)?;
    validate_whole_units(item_type, qty)
}

/// Packs, units and boxes come in whole numbers; only weighted items take
/// fractions (kilos).
pub fn validate_whole_units(item_type: ItemType, qty: Quantity) -> ValidationResult<()> {
    if item_type != ItemType::Weighted && !qty.is_whole() {
        return Err(ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: format!("{} items are sold in whole numbers, got {}", item_type, qty),
        });
    }

    Ok(())
}

/// Validates a catalog price. Zero is allowed.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount rate in basis points (0 to 10000).
pub fn validate_discount_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "discount_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that one more entry fits in the cart.
///
/// ## Rules
/// - Must not exceed MAX_CART_ITEMS (100)
pub fn validate_cart_size(current_entries: usize) -> ValidationResult<()> {
    if current_entries >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
