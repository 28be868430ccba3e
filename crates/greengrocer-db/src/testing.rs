//! Fixtures shared by the repository tests.

use chrono::NaiveDate;
use greengrocer_core::{
    Account, AccountProfile, BoxContent, BoxSize, CorporateProfile, CustomerProfile, Item,
    ItemDraft, Money, Quantity, StaffProfile,
};

use crate::repository::account::NewAccount;
use crate::{Database, DbConfig};

pub(crate) async fn memory_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn create(db: &Database, username: &str, profile: AccountProfile) -> Account {
    db.accounts()
        .create(NewAccount {
            username: username.to_string(),
            password: "123".to_string(),
            first_name: "Test".to_string(),
            last_name: username.to_string(),
            profile,
        })
        .await
        .unwrap()
}

pub(crate) async fn create_staff(db: &Database, username: &str) -> Account {
    create(
        db,
        username,
        AccountProfile::Staff(StaffProfile {
            department: "Sales".to_string(),
            date_joined: date(2024, 1, 1),
        }),
    )
    .await
}

/// Private customer with a $100 limit.
pub(crate) async fn create_private(db: &Database, username: &str) -> Account {
    create(
        db,
        username,
        AccountProfile::PrivateCustomer(CustomerProfile::new(
            "23 Kingsland Road",
            Money::from_cents(10_000),
        )),
    )
    .await
}

/// Corporate customer with a $500 limit and the default 10% rate.
pub(crate) async fn create_corporate(db: &Database, username: &str) -> Account {
    create(
        db,
        username,
        AccountProfile::CorporateCustomer(CorporateProfile::new(CustomerProfile::new(
            "23 Commerce St",
            Money::from_cents(50_000),
        ))),
    )
    .await
}

/// $10.00 a unit.
pub(crate) async fn create_unit_item(db: &Database, name: &str, stock: i64) -> Item {
    db.items()
        .create(&ItemDraft::unit_price(
            name,
            Money::from_cents(1_000),
            Quantity::from_units(stock),
        ))
        .await
        .unwrap()
}

pub(crate) async fn create_box(db: &Database, size: BoxSize, stock: i64, veggies: &[&Item]) -> Item {
    let contents = veggies
        .iter()
        .map(|v| BoxContent {
            veggie_id: v.id,
            name: v.name(),
        })
        .collect();
    db.items()
        .create(&ItemDraft::premade_box(size, Quantity::from_units(stock), contents))
        .await
        .unwrap()
}
