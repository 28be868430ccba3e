//! # Customer Commands

use greengrocer_core::{Account, AccountProfile, CustomerType, Money};
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::{DbState, Session};

/// What the profile page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfileView {
    pub id: i64,
    pub username: String,
    pub full_name: String,
    pub address: String,
    pub balance: Money,
    pub credit_limit: Money,
    pub available_credit: Money,
    pub customer_type: CustomerType,
    /// Only set for corporate customers.
    pub discount_rate_bps: Option<u32>,
}

impl CustomerProfileView {
    /// `None` for staff accounts.
    pub fn from_account(account: &Account) -> Option<Self> {
        let customer = account.customer()?;
        let customer_type = account.customer_type()?;
        let discount_rate_bps = match &account.profile {
            AccountProfile::CorporateCustomer(corporate) => Some(corporate.discount_rate_bps),
            _ => None,
        };

        Some(CustomerProfileView {
            id: account.id,
            username: account.username.clone(),
            full_name: account.full_name(),
            address: customer.address.clone(),
            balance: customer.balance,
            credit_limit: customer.credit_limit,
            available_credit: customer.available_credit(),
            customer_type,
            discount_rate_bps,
        })
    }
}

/// A customer's profile. Customers see their own; staff see anyone's.
pub async fn get_profile(
    db: &DbState,
    session: &Session,
    customer_id: i64,
) -> Result<CustomerProfileView, ApiError> {
    debug!(customer_id, "get_profile command");
    session.require_self_or_staff(customer_id)?;

    let account = db.inner().accounts().get(customer_id).await?;
    CustomerProfileView::from_account(&account)
        .ok_or_else(|| ApiError::not_found("Customer", &customer_id.to_string()))
}
