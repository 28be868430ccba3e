//! # Session
//!
//! Who is calling, and the role checks commands run before doing anything.

use greengrocer_core::{Account, Role};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A logged-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub account_id: i64,
    pub role: Role,
}

impl Session {
    pub fn for_account(account: &Account) -> Self {
        Session {
            account_id: account.id,
            role: account.role(),
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role == Role::Staff
    }

    pub fn require_staff(&self) -> Result<(), ApiError> {
        if !self.is_staff() {
            return Err(ApiError::forbidden("Staff access required"));
        }
        Ok(())
    }

    /// The caller's customer id, or `Forbidden` for staff.
    pub fn require_customer(&self) -> Result<i64, ApiError> {
        if !self.role.is_customer() {
            return Err(ApiError::forbidden("Customer access required"));
        }
        Ok(self.account_id)
    }

    /// Staff may act on any customer; a customer only on themselves.
    pub fn require_self_or_staff(&self, customer_id: i64) -> Result<(), ApiError> {
        if self.is_staff() || self.account_id == customer_id {
            return Ok(());
        }
        Err(ApiError::forbidden("Not your account"))
    }
}
