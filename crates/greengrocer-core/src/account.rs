//! # Accounts
//!
//! Staff and customer accounts, balances and credit limits.
//!
//! ## Balance Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  balance = what the customer owes the shop                              │
//! │                                                                         │
//! │  Account payment of $20   balance += 20   (checked: ≤ credit_limit)     │
//! │  Cancel account order     balance  = max(0, balance − order total)      │
//! │  Pay off balance $15      balance −= 15                                 │
//! │                                                                         │
//! │  Card payments never touch the balance.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::CustomerType;

// =============================================================================
// Role
// =============================================================================

/// Stored discriminant of the account variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Staff,
    PrivateCustomer,
    CorporateCustomer,
}

impl Role {
    pub const fn is_customer(&self) -> bool {
        !matches!(self, Role::Staff)
    }
}

// =============================================================================
// Account
// =============================================================================

/// A user who can log in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// PHC-format password hash. Never leaves the server.
    #[serde(skip)]
    pub credential_hash: String,
    pub profile: AccountProfile,
}

/// Variant-specific account data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum AccountProfile {
    Staff(StaffProfile),
    PrivateCustomer(CustomerProfile),
    CorporateCustomer(CorporateProfile),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StaffProfile {
    pub department: String,
    #[ts(as = "String")]
    pub date_joined: NaiveDate,
}

/// Balance-carrying part shared by private and corporate customers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerProfile {
    pub address: String,
    pub balance: Money,
    pub credit_limit: Money,
}

/// A customer that gets a discount rate on top of the customer rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CorporateProfile {
    #[serde(flatten)]
    pub customer: CustomerProfile,
    /// Discount in basis points (1000 = 10%).
    pub discount_rate_bps: u32,
}

impl Account {
    pub fn role(&self) -> Role {
        match self.profile {
            AccountProfile::Staff(_) => Role::Staff,
            AccountProfile::PrivateCustomer(_) => Role::PrivateCustomer,
            AccountProfile::CorporateCustomer(_) => Role::CorporateCustomer,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_staff(&self) -> bool {
        matches!(self.profile, AccountProfile::Staff(_))
    }

    pub fn customer_type(&self) -> Option<CustomerType> {
        match self.profile {
            AccountProfile::Staff(_) => None,
            AccountProfile::PrivateCustomer(_) => Some(CustomerType::Private),
            AccountProfile::CorporateCustomer(_) => Some(CustomerType::Corporate),
        }
    }

    pub fn customer(&self) -> Option<&CustomerProfile> {
        match &self.profile {
            AccountProfile::Staff(_) => None,
            AccountProfile::PrivateCustomer(c) => Some(c),
            AccountProfile::CorporateCustomer(c) => Some(&c.customer),
        }
    }

    pub fn customer_mut(&mut self) -> Option<&mut CustomerProfile> {
        match &mut self.profile {
            AccountProfile::Staff(_) => None,
            AccountProfile::PrivateCustomer(c) => Some(c),
            AccountProfile::CorporateCustomer(c) => Some(&mut c.customer),
        }
    }

    /// The customer part, or `NotACustomer` for staff accounts.
    pub fn require_customer(&self) -> CoreResult<&CustomerProfile> {
        self.customer().ok_or(CoreError::NotACustomer(self.id))
    }

    pub fn require_customer_mut(&mut self) -> CoreResult<&mut CustomerProfile> {
        let id = self.id;
        self.customer_mut().ok_or(CoreError::NotACustomer(id))
    }

    /// Discounted amount for corporate customers, unchanged otherwise.
    pub fn apply_discount(&self, amount: Money) -> Money {
        match &self.profile {
            AccountProfile::CorporateCustomer(c) => c.apply_discount(amount),
            _ => amount,
        }
    }
}

impl CustomerProfile {
    pub fn new(address: impl Into<String>, credit_limit: Money) -> Self {
        CustomerProfile {
            address: address.into(),
            balance: Money::zero(),
            credit_limit,
        }
    }

    /// Whether `amount` fits under the credit limit.
    pub fn can_charge(&self, amount: Money) -> bool {
        self.balance + amount <= self.credit_limit
    }

    pub fn available_credit(&self) -> Money {
        self.credit_limit - self.balance
    }

    /// Charges `amount` to the account after checking the credit limit.
    ///
    /// ## Returns
    /// The new balance, or `LimitExceeded` with the balance unchanged.
    pub fn charge_to_account(&mut self, amount: Money) -> CoreResult<Money> {
        self.ensure_can_charge(amount)?;
        self.balance += amount;
        Ok(self.balance)
    }

    /// Fails with `LimitExceeded` if `amount` does not fit under the limit.
    pub fn ensure_can_charge(&self, amount: Money) -> CoreResult<()> {
        if !self.can_charge(amount) {
            return Err(CoreError::LimitExceeded {
                balance: self.balance,
                amount,
                limit: self.credit_limit,
            });
        }
        Ok(())
    }

    /// Adds to the balance without checking the limit.
    ///
    /// Account payments call this; the limit check happens earlier in the flow.
    pub fn credit_balance(&mut self, amount: Money) -> Money {
        self.balance += amount;
        self.balance
    }

    /// Reduces the balance by `amount`, never below zero.
    pub fn refund(&mut self, amount: Money) -> Money {
        self.balance = (self.balance - amount).max(Money::zero());
        self.balance
    }

    /// Records the customer paying off part of their balance.
    pub fn pay_balance(&mut self, amount: Money) -> CoreResult<Money> {
        if !amount.is_positive() {
            return Err(CoreError::InvalidPaymentAmount {
                reason: "must be greater than zero".to_string(),
            });
        }
        self.balance -= amount;
        Ok(self.balance)
    }
}

impl CorporateProfile {
    pub fn new(customer: CustomerProfile) -> Self {
        CorporateProfile {
            customer,
            discount_rate_bps: crate::DEFAULT_CORPORATE_DISCOUNT_BPS,
        }
    }

    /// `amount × (1 − discount rate)`.
    pub fn apply_discount(&self, amount: Money) -> Money {
        amount.apply_percentage_discount(self.discount_rate_bps)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(balance_cents: i64, limit_cents: i64) -> CustomerProfile {
        CustomerProfile {
            address: "1 Test Street".to_string(),
            balance: Money::from_cents(balance_cents),
            credit_limit: Money::from_cents(limit_cents),
        }
    }

    fn account(profile: AccountProfile) -> Account {
        Account {
            id: 7,
            username: "ying".to_string(),
            first_name: "Ying".to_string(),
            last_name: "Chen".to_string(),
            credential_hash: String::new(),
            profile,
        }
    }

    #[test]
    fn test_charge_within_limit() {
        let mut c = customer(8_000, 10_000);
        assert_eq!(c.charge_to_account(Money::from_cents(2_000)).unwrap().cents(), 10_000);
    }

    #[test]
    fn test_charge_over_limit_leaves_balance() {
        let mut c = customer(8_000, 10_000);
        let err = c.charge_to_account(Money::from_cents(2_001)).unwrap_err();
        assert!(matches!(err, CoreError::LimitExceeded { .. }));
        assert_eq!(c.balance.cents(), 8_000);
    }

    #[test]
    fn test_credit_balance_is_additive() {
        let mut c = customer(0, 10_000);
        c.credit_balance(Money::from_cents(6_000));
        c.credit_balance(Money::from_cents(6_000));
        // Unchecked: the limit is enforced before this is called.
        assert_eq!(c.balance.cents(), 12_000);
    }

    #[test]
    fn test_refund_clamps_at_zero() {
        let mut c = customer(500, 10_000);
        assert!(c.refund(Money::from_cents(1_398)).is_zero());
        let mut c = customer(2_000, 10_000);
        assert_eq!(c.refund(Money::from_cents(500)).cents(), 1_500);
    }

    #[test]
    fn test_pay_balance() {
        let mut c = customer(2_000, 10_000);
        assert_eq!(c.pay_balance(Money::from_cents(500)).unwrap().cents(), 1_500);
        assert!(c.pay_balance(Money::zero()).is_err());
    }

    #[test]
    fn test_corporate_discount() {
        let corp = CorporateProfile::new(customer(0, 50_000));
        assert_eq!(corp.discount_rate_bps, 1_000);
        assert_eq!(
            corp.apply_discount(Money::from_cents(398)),
            Money::from_scaled(35_820)
        );

        let acc = account(AccountProfile::CorporateCustomer(corp));
        assert_eq!(acc.role(), Role::CorporateCustomer);
        assert_eq!(acc.customer_type(), Some(CustomerType::Corporate));
        assert_eq!(acc.apply_discount(Money::from_cents(1_000)).cents(), 900);
    }

    #[test]
    fn test_private_customer_gets_no_discount() {
        let acc = account(AccountProfile::PrivateCustomer(customer(0, 10_000)));
        assert_eq!(acc.apply_discount(Money::from_cents(1_000)).cents(), 1_000);
    }

    #[test]
    fn test_staff_is_not_a_customer() {
        let mut acc = account(AccountProfile::Staff(StaffProfile {
            department: "Sales".to_string(),
            date_joined: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }));
        assert!(acc.is_staff());
        assert!(matches!(acc.require_customer(), Err(CoreError::NotACustomer(7))));
        assert!(acc.require_customer_mut().is_err());
    }

    #[test]
    fn test_credential_hash_is_not_serialized() {
        let mut acc = account(AccountProfile::PrivateCustomer(customer(0, 10_000)));
        acc.credential_hash = "$argon2id$secret".to_string();
        let json = serde_json::to_string(&acc).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"role\":\"private_customer\""));
    }
}
