//! # Account Repository
//!
//! Staff and customer accounts, login, and balance changes.
//!
//! All three account variants share the `accounts` table; the `role`
//! column picks which of the nullable columns are meaningful:
//!
//! ```text
//! role                 department  date_joined  address  balance  limit  discount
//! staff                    ✓           ✓
//! private_customer                                 ✓        ✓       ✓
//! corporate_customer                               ✓        ✓       ✓        ✓
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use greengrocer_core::validation::{
    validate_discount_rate_bps, validate_name, validate_password, validate_price,
    validate_username,
};
use greengrocer_core::{
    Account, AccountProfile, CoreError, CorporateProfile, CustomerProfile, Money, Role,
    StaffProfile,
};
use sqlx::{SqliteConnection, SqlitePool};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::credentials::{hash_password, verify_dummy, verify_password};
use crate::error::{DbError, DbResult};
use crate::pool::lock_writes;

const ACCOUNT_COLUMNS: &str = "id, username, password_hash, first_name, last_name, role, \
                               department, date_joined, address, balance_scaled, \
                               credit_limit_scaled, discount_rate_bps";

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: i64,
    username: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    role: Role,
    department: Option<String>,
    date_joined: Option<NaiveDate>,
    address: Option<String>,
    balance_scaled: i64,
    credit_limit_scaled: i64,
    discount_rate_bps: Option<i64>,
}

impl TryFrom<AccountRow> for Account {
    type Error = DbError;

    fn try_from(row: AccountRow) -> DbResult<Account> {
        let customer = || CustomerProfile {
            address: row.address.clone().unwrap_or_default(),
            balance: Money::from_scaled(row.balance_scaled),
            credit_limit: Money::from_scaled(row.credit_limit_scaled),
        };

        let profile = match row.role {
            Role::Staff => AccountProfile::Staff(StaffProfile {
                department: row.department.clone().unwrap_or_default(),
                date_joined: row
                    .date_joined
                    .ok_or_else(|| DbError::corrupt("accounts", row.id, "staff without join date"))?,
            }),
            Role::PrivateCustomer => AccountProfile::PrivateCustomer(customer()),
            Role::CorporateCustomer => {
                let bps = row
                    .discount_rate_bps
                    .and_then(|b| u32::try_from(b).ok())
                    .ok_or_else(|| {
                        DbError::corrupt("accounts", row.id, "corporate without discount rate")
                    })?;
                AccountProfile::CorporateCustomer(CorporateProfile {
                    customer: customer(),
                    discount_rate_bps: bps,
                })
            }
        };

        Ok(Account {
            id: row.id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            credential_hash: row.password_hash,
            profile,
        })
    }
}

/// Input for creating an account. The password is hashed before storage.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub profile: AccountProfile,
}

// =============================================================================
// Connection-level helpers
// =============================================================================

/// Loads an account by id.
pub(crate) async fn fetch_account(conn: &mut SqliteConnection, id: i64) -> DbResult<Account> {
    let sql = format!("SELECT {} FROM accounts WHERE id = ?1", ACCOUNT_COLUMNS);
    let row: AccountRow = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Account", id))?;
    row.try_into()
}

/// Loads a customer account, failing with `NotACustomer` for staff.
pub(crate) async fn fetch_customer(conn: &mut SqliteConnection, id: i64) -> DbResult<Account> {
    let account = fetch_account(conn, id).await?;
    account.require_customer()?;
    Ok(account)
}

/// Writes a customer's balance back.
pub(crate) async fn save_balance(
    conn: &mut SqliteConnection,
    customer_id: i64,
    balance: Money,
) -> DbResult<()> {
    let result = sqlx::query("UPDATE accounts SET balance_scaled = ?2 WHERE id = ?1")
        .bind(customer_id)
        .bind(balance.scaled())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Account", customer_id));
    }
    debug!(customer_id, balance = %balance, "Balance saved");
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for account operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
    write_gate: Arc<Mutex<()>>,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool, write_gate: Arc<Mutex<()>>) -> Self {
        AccountRepository { pool, write_gate }
    }

    /// Creates an account.
    ///
    /// ## Errors
    /// - `Domain(Validation)` for a bad username, password, name or rate
    /// - `UniqueViolation` if the username is taken
    pub async fn create(&self, new: NewAccount) -> DbResult<Account> {
        let username = validate_username(&new.username)?;
        validate_password(&new.password)?;
        let first_name = validate_name("first_name", &new.first_name)?;
        let last_name = validate_name("last_name", &new.last_name)?;

        let (department, date_joined, address, limit, bps) = match &new.profile {
            AccountProfile::Staff(s) => (Some(s.department.clone()), Some(s.date_joined), None, 0, None),
            AccountProfile::PrivateCustomer(c) => {
                validate_price(c.credit_limit)?;
                (None, None, Some(c.address.clone()), c.credit_limit.scaled(), None)
            }
            AccountProfile::CorporateCustomer(c) => {
                validate_price(c.customer.credit_limit)?;
                validate_discount_rate_bps(c.discount_rate_bps)?;
                (
                    None,
                    None,
                    Some(c.customer.address.clone()),
                    c.customer.credit_limit.scaled(),
                    Some(i64::from(c.discount_rate_bps)),
                )
            }
        };
        let role = match new.profile {
            AccountProfile::Staff(_) => Role::Staff,
            AccountProfile::PrivateCustomer(_) => Role::PrivateCustomer,
            AccountProfile::CorporateCustomer(_) => Role::CorporateCustomer,
        };
        let password_hash = hash_password(&new.password)?;

        let _gate = lock_writes(&self.write_gate).await;
        let mut conn = self.pool.acquire().await?;

        let taken: Option<i64> = sqlx::query_scalar("SELECT id FROM accounts WHERE username = ?1")
            .bind(&username)
            .fetch_optional(&mut *conn)
            .await?;
        if taken.is_some() {
            return Err(DbError::duplicate("username", username));
        }

        let id = sqlx::query(
            r#"
            INSERT INTO accounts (
                username, password_hash, first_name, last_name, role,
                department, date_joined, address,
                balance_scaled, credit_limit_scaled, discount_rate_bps
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?10)
            "#,
        )
        .bind(&username)
        .bind(&password_hash)
        .bind(&first_name)
        .bind(&last_name)
        .bind(role)
        .bind(department)
        .bind(date_joined)
        .bind(address)
        .bind(limit)
        .bind(bps)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        info!(id, username = %username, role = ?role, "Account created");
        fetch_account(&mut conn, id).await
    }

    /// Gets an account by id.
    pub async fn get(&self, id: i64) -> DbResult<Account> {
        let mut conn = self.pool.acquire().await?;
        fetch_account(&mut conn, id).await
    }

    /// Finds an account by username (case-sensitive).
    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<Account>> {
        let sql = format!("SELECT {} FROM accounts WHERE username = ?1", ACCOUNT_COLUMNS);
        let row: Option<AccountRow> = sqlx::query_as(&sql)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Account::try_from).transpose()
    }

    /// Checks a username and password.
    ///
    /// ## Errors
    /// `Domain(AuthFailure)` for an unknown user or a wrong password alike.
    pub async fn authenticate(&self, username: &str, password: &str) -> DbResult<Account> {
        match self.find_by_username(username).await? {
            Some(account) if verify_password(password, &account.credential_hash) => {
                info!(id = account.id, role = ?account.role(), "Login succeeded");
                Ok(account)
            }
            Some(account) => {
                warn!(id = account.id, "Login failed: wrong password");
                Err(CoreError::AuthFailure.into())
            }
            None => {
                verify_dummy(password);
                warn!("Login failed: unknown username");
                Err(CoreError::AuthFailure.into())
            }
        }
    }

    /// Every private and corporate customer, by last then first name.
    pub async fn list_customers(&self) -> DbResult<Vec<Account>> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE role <> 'staff' ORDER BY last_name, first_name, id",
            ACCOUNT_COLUMNS
        );
        let rows: Vec<AccountRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(Account::try_from).collect()
    }

    /// Records a customer paying off part of their balance.
    ///
    /// ## Returns
    /// The updated account.
    pub async fn pay_balance(&self, customer_id: i64, amount: Money) -> DbResult<Account> {
        let _gate = lock_writes(&self.write_gate).await;
        let mut tx = self.pool.begin().await?;

        let mut account = fetch_customer(&mut tx, customer_id).await?;
        let balance = account.require_customer_mut()?.pay_balance(amount)?;
        save_balance(&mut tx, customer_id, balance).await?;

        tx.commit().await?;
        info!(customer_id, amount = %amount, balance = %balance, "Balance paid");
        Ok(account)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_corporate, create_private, create_staff, memory_db};

    #[tokio::test]
    async fn test_create_each_role() {
        let db = memory_db().await;

        let staff = create_staff(&db, "staff").await;
        assert!(staff.is_staff());

        let ying = create_private(&db, "ying").await;
        let loaded = db.accounts().get(ying.id).await.unwrap();
        assert_eq!(loaded, ying);
        assert_eq!(loaded.customer().unwrap().credit_limit.cents(), 10_000);

        let fresh = create_corporate(&db, "fresh").await;
        match &fresh.profile {
            AccountProfile::CorporateCustomer(c) => assert_eq!(c.discount_rate_bps, 1_000),
            other => panic!("unexpected profile {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = memory_db().await;
        create_private(&db, "ying").await;

        let err = db
            .accounts()
            .create(NewAccount {
                username: "ying".to_string(),
                password: "secret".to_string(),
                first_name: "Other".to_string(),
                last_name: "Person".to_string(),
                profile: AccountProfile::PrivateCustomer(CustomerProfile::new(
                    "1 Queen St",
                    Money::from_cents(10_000),
                )),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let db = memory_db().await;
        let ying = create_private(&db, "ying").await;

        let account = db.accounts().authenticate("ying", "123").await.unwrap();
        assert_eq!(account.id, ying.id);

        let wrong = db.accounts().authenticate("ying", "321").await.unwrap_err();
        let unknown = db.accounts().authenticate("nobody", "123").await.unwrap_err();
        assert!(matches!(wrong.as_domain(), Some(CoreError::AuthFailure)));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_password_is_hashed() {
        let db = memory_db().await;
        let ying = create_private(&db, "ying").await;
        assert_ne!(ying.credential_hash, "123");
        assert!(ying.credential_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_list_customers_excludes_staff() {
        let db = memory_db().await;
        create_staff(&db, "staff").await;
        create_private(&db, "ying").await;
        create_corporate(&db, "fresh").await;

        let customers = db.accounts().list_customers().await.unwrap();
        assert_eq!(customers.len(), 2);
        assert!(customers.iter().all(|c| !c.is_staff()));
    }

    #[tokio::test]
    async fn test_pay_balance() {
        let db = memory_db().await;
        let ying = create_private(&db, "ying").await;

        let mut conn = db.pool().acquire().await.unwrap();
        save_balance(&mut conn, ying.id, Money::from_cents(4_000)).await.unwrap();
        drop(conn);

        let account = db
            .accounts()
            .pay_balance(ying.id, Money::from_cents(1_500))
            .await
            .unwrap();
        assert_eq!(account.customer().unwrap().balance.cents(), 2_500);

        let err = db.accounts().pay_balance(ying.id, Money::zero()).await.unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::InvalidPaymentAmount { .. })
        ));
    }

    #[tokio::test]
    async fn test_staff_cannot_pay_balance() {
        let db = memory_db().await;
        let staff = create_staff(&db, "staff").await;
        let err = db
            .accounts()
            .pay_balance(staff.id, Money::from_cents(100))
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::NotACustomer(_))));
    }
}
