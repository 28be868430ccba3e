//! # Payments
//!
//! Payment variants and the rules that bind a method to its fields.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  method string ──► PaymentMethod::from_str ──► required fields          │
//! │                                                                         │
//! │  "Credit Card"  card_expiry, card_number, card_type                     │
//! │  "Debit Card"   bank_name, card_number                                  │
//! │  "Account"      (none)  → customer.balance += amount on creation        │
//! │  anything else  UnknownMethod                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Card payments are recorded, not processed. Only the last four digits of
//! a card number are kept.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::account::CustomerProfile;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::PaymentMethod;
use crate::validation::validate_card_number;

// =============================================================================
// Request
// =============================================================================

/// A payment as submitted by a checkout form.
///
/// Field keys are matched loosely: `card_number`, `cardNumber` and
/// `debit_card_number` all satisfy the card number requirement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub method: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl PaymentRequest {
    pub fn new(method: impl Into<String>) -> Self {
        PaymentRequest {
            method: method.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// First non-blank value whose normalized key is one of `aliases`.
    fn lookup(&self, aliases: &[&str]) -> Option<&str> {
        self.fields.iter().find_map(|(key, value)| {
            let key: String = key
                .chars()
                .filter(|c| *c != '_' && *c != '-')
                .flat_map(char::to_lowercase)
                .collect();
            let value = value.trim();
            (aliases.contains(&key.as_str()) && !value.is_empty()).then_some(value)
        })
    }

    fn require(&self, method: PaymentMethod, field: &str, aliases: &[&str]) -> CoreResult<&str> {
        self.lookup(aliases).ok_or_else(|| CoreError::MissingField {
            method,
            field: field.to_string(),
        })
    }
}

// =============================================================================
// Payment Details
// =============================================================================

/// Variant-specific payment data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentDetails {
    CreditCard {
        card_expiry: NaiveDate,
        /// Masked, e.g. `**** 4242`.
        card_number: String,
        card_type: String,
    },
    DebitCard {
        bank_name: String,
        card_number: String,
    },
    Account,
}

impl PaymentDetails {
    /// Builds the details for `request`, checking every required field.
    ///
    /// ## Errors
    /// - `UnknownMethod` for a method string that is not a known method
    /// - `MissingField` for an absent or blank required field
    /// - `Validation` for an unparseable expiry, an expired card or a
    ///   malformed card number
    pub fn from_request(request: &PaymentRequest, today: NaiveDate) -> CoreResult<Self> {
        let method: PaymentMethod = request.method.parse()?;

        match method {
            PaymentMethod::CreditCard => {
                let expiry = request.require(
                    method,
                    "card_expiry",
                    &["cardexpiry", "cardexpirydate", "expiry"],
                )?;
                let number = request.require(method, "card_number", &["cardnumber"])?;
                let card_type = request.require(method, "card_type", &["cardtype"])?;

                let card_expiry = parse_expiry(expiry)?;
                if card_expiry < today {
                    return Err(ValidationError::InvalidFormat {
                        field: "card_expiry".to_string(),
                        reason: "card has expired".to_string(),
                    }
                    .into());
                }

                Ok(PaymentDetails::CreditCard {
                    card_expiry,
                    card_number: mask_card_number(validate_card_number(number)?),
                    card_type: card_type.to_string(),
                })
            }
            PaymentMethod::DebitCard => {
                let bank_name = request.require(method, "bank_name", &["bankname"])?;
                let number = request.require(
                    method,
                    "card_number",
                    &["cardnumber", "debitcardnumber"],
                )?;

                Ok(PaymentDetails::DebitCard {
                    bank_name: bank_name.to_string(),
                    card_number: mask_card_number(validate_card_number(number)?),
                })
            }
            PaymentMethod::Account => Ok(PaymentDetails::Account),
        }
    }

    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentDetails::CreditCard { .. } => PaymentMethod::CreditCard,
            PaymentDetails::DebitCard { .. } => PaymentMethod::DebitCard,
            PaymentDetails::Account => PaymentMethod::Account,
        }
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM` and `MM/YY`. Month-only forms expire at
/// the end of that month.
fn parse_expiry(raw: &str) -> CoreResult<NaiveDate> {
    let invalid = || ValidationError::InvalidFormat {
        field: "card_expiry".to_string(),
        reason: "expected YYYY-MM-DD, YYYY-MM or MM/YY".to_string(),
    };

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }

    let (year, month) = if let Some((y, m)) = raw.split_once('-') {
        (y.parse::<i32>().ok(), m.parse::<u32>().ok())
    } else if let Some((m, y)) = raw.split_once('/') {
        (y.parse::<i32>().ok().map(|y| 2000 + y), m.parse::<u32>().ok())
    } else {
        (None, None)
    };

    let (year, month) = year.zip(month).ok_or_else(invalid)?;
    last_day_of_month(year, month).ok_or_else(|| invalid().into())
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    next.pred_opt()
}

fn mask_card_number(digits: String) -> String {
    let tail: String = digits.chars().skip(digits.len().saturating_sub(4)).collect();
    format!("**** {}", tail)
}

// =============================================================================
// Payment
// =============================================================================

/// A recorded payment. Exactly one per order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub customer_id: i64,
    pub amount: Money,
    pub date: NaiveDate,
    pub details: PaymentDetails,
}

impl Payment {
    /// Creates a payment.
    ///
    /// An `Account` payment credits `customer.balance` by `amount` every
    /// time it is created. The credit limit is not checked here.
    pub fn create(
        order_id: i64,
        customer_id: i64,
        customer: &mut CustomerProfile,
        amount: Money,
        date: NaiveDate,
        details: PaymentDetails,
    ) -> CoreResult<Payment> {
        if !amount.is_positive() {
            return Err(CoreError::InvalidPaymentAmount {
                reason: format!("{} is not greater than zero", amount),
            });
        }

        if details.method() == PaymentMethod::Account {
            customer.credit_balance(amount);
        }

        Ok(Payment {
            id: 0,
            order_id,
            customer_id,
            amount,
            date,
            details,
        })
    }

    pub fn method(&self) -> PaymentMethod {
        self.details.method()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
