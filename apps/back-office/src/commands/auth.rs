//! # Auth Commands

use greengrocer_core::Account;
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::state::{DbState, Session};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub session: Session,
    pub account: Account,
}

/// Checks credentials and opens a session.
///
/// Unknown usernames and wrong passwords fail with the same `AUTH_FAILED`
/// error.
pub async fn login(db: &DbState, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
    debug!(username = %username, "login command");

    let account = db.inner().accounts().authenticate(username, password).await?;
    Ok(LoginResponse {
        session: Session::for_account(&account),
        account,
    })
}
