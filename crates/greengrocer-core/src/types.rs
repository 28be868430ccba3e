//! # Domain Types
//!
//! Small enums shared by every part of the order lifecycle.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Shared Enums                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  OrderStatus    │   │ DeliveryMethod  │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Pending        │   │  Delivery (+$10)│   │  CreditCard     │       │
//! │  │  Processed      │   │  Pickup         │   │  DebitCard      │       │
//! │  │  Completed      │   └─────────────────┘   │  Account        │       │
//! │  │  Cancelled      │                         └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   ItemType      │   │    BoxSize      │   │  CustomerType   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  weighted       │   │  Small  ($10)   │   │  Private        │       │
//! │  │  pack           │   │  Medium ($25)   │   │  Corporate      │       │
//! │  │  unit_price     │   │  Large  ($50)   │   └─────────────────┘       │
//! │  │  premade_box    │   └─────────────────┘                              │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The web layer sends these as strings, so each has a `FromStr` that
//! accepts the spellings the storefront forms use.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, ValidationError};
use crate::money::Money;

/// Lowercases and strips separators so "Credit Card", "credit_card" and
/// "CreditCard" all compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

// =============================================================================
// Order Status
// =============================================================================

/// Where an order is in its lifecycle.
///
/// ```text
/// Pending ──► Processed ──► Completed
///    │
///    └──────► Cancelled   (cancel() only from Pending)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processed,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processed => "Processed",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Completed and Cancelled orders are finished.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        OrderStatus::ALL
            .into_iter()
            .find(|status| normalize(status.as_str()) == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL.iter().map(|s| s.to_string()).collect(),
            })
    }
}

// =============================================================================
// Delivery Method
// =============================================================================

/// How the customer receives the order. Delivery adds a flat fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    Delivery,
    Pickup,
}

impl DeliveryMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DeliveryMethod::Delivery => "Delivery",
            DeliveryMethod::Pickup => "Pickup",
        }
    }

    /// Fee added on top of the (possibly discounted) line sum.
    pub const fn fee(&self) -> Money {
        match self {
            DeliveryMethod::Delivery => crate::DELIVERY_FEE,
            DeliveryMethod::Pickup => Money::zero(),
        }
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "delivery" => Ok(DeliveryMethod::Delivery),
            "pickup" => Ok(DeliveryMethod::Pickup),
            _ => Err(ValidationError::NotAllowed {
                field: "delivery_method".to_string(),
                allowed: vec!["Delivery".to_string(), "Pickup".to_string()],
            }),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How an order is paid. Chosen at placement, checked again at payment.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card details are recorded, never charged.
    CreditCard,
    DebitCard,
    /// Charged to the customer's account balance.
    Account,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::DebitCard => "Debit Card",
            PaymentMethod::Account => "Account",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown strings fail with `UnknownMethod`, part of the payment taxonomy.
impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "creditcard" => Ok(PaymentMethod::CreditCard),
            "debitcard" => Ok(PaymentMethod::DebitCard),
            "account" => Ok(PaymentMethod::Account),
            _ => Err(CoreError::UnknownMethod(s.to_string())),
        }
    }
}

// =============================================================================
// Item Type
// =============================================================================

/// Discriminant of the item variants, as stored and as sent by the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Weighted,
    Pack,
    UnitPrice,
    PremadeBox,
}

impl ItemType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ItemType::Weighted => "weighted",
            ItemType::Pack => "pack",
            ItemType::UnitPrice => "unit_price",
            ItemType::PremadeBox => "premade_box",
        }
    }

    pub const fn is_veggie(&self) -> bool {
        !matches!(self, ItemType::PremadeBox)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "weighted" => Ok(ItemType::Weighted),
            "pack" => Ok(ItemType::Pack),
            "unitprice" => Ok(ItemType::UnitPrice),
            "premadebox" => Ok(ItemType::PremadeBox),
            _ => Err(ValidationError::NotAllowed {
                field: "item_type".to_string(),
                allowed: vec![
                    "weighted".to_string(),
                    "pack".to_string(),
                    "unit_price".to_string(),
                    "premade_box".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Box Size
// =============================================================================

/// Premade box size. The size alone decides the box price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BoxSize {
    Small,
    Medium,
    Large,
}

impl BoxSize {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BoxSize::Small => "Small",
            BoxSize::Medium => "Medium",
            BoxSize::Large => "Large",
        }
    }

    pub const fn price(&self) -> Money {
        match self {
            BoxSize::Small => Money::from_cents(1_000),
            BoxSize::Medium => Money::from_cents(2_500),
            BoxSize::Large => Money::from_cents(5_000),
        }
    }
}

impl fmt::Display for BoxSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoxSize {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "small" => Ok(BoxSize::Small),
            "medium" => Ok(BoxSize::Medium),
            "large" => Ok(BoxSize::Large),
            _ => Err(ValidationError::NotAllowed {
                field: "box_size".to_string(),
                allowed: vec!["Small".to_string(), "Medium".to_string(), "Large".to_string()],
            }),
        }
    }
}

// =============================================================================
// Customer Type
// =============================================================================

/// Which pricing rules apply to a customer's orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    Private,
    Corporate,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_default_and_parse() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!("processed".parse::<OrderStatus>().unwrap(), OrderStatus::Processed);
        assert_eq!("Cancelled".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_method_accepts_form_spellings() {
        for s in ["Credit Card", "credit_card", "CreditCard"] {
            assert_eq!(s.parse::<PaymentMethod>().unwrap(), PaymentMethod::CreditCard);
        }
        assert_eq!("Debit Card".parse::<PaymentMethod>().unwrap(), PaymentMethod::DebitCard);
        assert_eq!("account".parse::<PaymentMethod>().unwrap(), PaymentMethod::Account);
    }

    #[test]
    fn test_unknown_payment_method() {
        let err = "Cash".parse::<PaymentMethod>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownMethod(m) if m == "Cash"));
    }

    #[test]
    fn test_item_type_round_trips_cart_tags() {
        for tag in ["weighted", "pack", "unit_price", "premade_box"] {
            assert_eq!(tag.parse::<ItemType>().unwrap().as_str(), tag);
        }
        assert!("bundle".parse::<ItemType>().is_err());
    }

    #[test]
    fn test_box_price_table() {
        assert_eq!(BoxSize::Small.price().cents(), 1_000);
        assert_eq!(BoxSize::Medium.price().cents(), 2_500);
        assert_eq!(BoxSize::Large.price().cents(), 5_000);
    }

    #[test]
    fn test_delivery_fee() {
        assert_eq!(DeliveryMethod::Delivery.fee().cents(), 1_000);
        assert!(DeliveryMethod::Pickup.fee().is_zero());
    }
}
