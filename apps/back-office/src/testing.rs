//! Fixtures shared by the command tests.

use chrono::NaiveDate;
use greengrocer_core::{
    AccountProfile, BoxContent, BoxSize, CorporateProfile, CustomerProfile, ItemDraft, Money,
    Quantity, Role, StaffProfile,
};
use greengrocer_db::{Database, DbConfig, NewAccount};

use crate::state::{DbState, Session};

/// Ids of everything `seeded` creates.
pub(crate) struct SeedIds {
    pub staff: i64,
    pub ying: i64,
    pub harry: i64,
    pub fresh: i64,
    /// $2.00 a unit, 50 in stock.
    pub kumara: i64,
    /// $4.00 a kilo, 20 kg in stock.
    pub carrots: i64,
    /// Small box holding kumara and carrots, 10 in stock.
    pub small_box: i64,
}

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn account(db: &Database, username: &str, profile: AccountProfile) -> i64 {
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
        .id
}

/// An in-memory store with one staff member, two private customers ($100
/// limit), one corporate customer ($500 limit, 10% off) and a small catalog.
pub(crate) async fn seeded() -> (DbState, SeedIds) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    let staff = account(
        &db,
        "staff",
        AccountProfile::Staff(StaffProfile {
            department: "Sales".to_string(),
            date_joined: date(2024, 1, 1),
        }),
    )
    .await;
    let ying = account(
        &db,
        "ying",
        AccountProfile::PrivateCustomer(CustomerProfile::new("1 Queen St", Money::from_cents(10_000))),
    )
    .await;
    let harry = account(
        &db,
        "harry",
        AccountProfile::PrivateCustomer(CustomerProfile::new("2 King St", Money::from_cents(10_000))),
    )
    .await;
    let fresh = account(
        &db,
        "fresh",
        AccountProfile::CorporateCustomer(CorporateProfile::new(CustomerProfile::new(
            "3 Commerce St",
            Money::from_cents(50_000),
        ))),
    )
    .await;

    let items = db.items();
    let kumara = items
        .create(&ItemDraft::unit_price("Kumara", Money::from_cents(200), Quantity::from_units(50)))
        .await
        .unwrap();
    let carrots = items
        .create(&ItemDraft::weighted("Carrots", Money::from_cents(400), Quantity::from_units(20)))
        .await
        .unwrap();
    let contents = [&kumara, &carrots]
        .iter()
        .map(|v| BoxContent {
            veggie_id: v.id,
            name: v.name(),
        })
        .collect();
    let small_box = items
        .create(&ItemDraft::premade_box(BoxSize::Small, Quantity::from_units(10), contents))
        .await
        .unwrap();

    let ids = SeedIds {
        staff,
        ying,
        harry,
        fresh,
        kumara: kumara.id,
        carrots: carrots.id,
        small_box: small_box.id,
    };
    (DbState::new(db), ids)
}

pub(crate) fn staff_session(ids: &SeedIds) -> Session {
    Session {
        account_id: ids.staff,
        role: Role::Staff,
    }
}

pub(crate) fn customer_session(account_id: i64) -> Session {
    Session {
        account_id,
        role: Role::PrivateCustomer,
    }
}

pub(crate) fn corporate_session(account_id: i64) -> Session {
    Session {
        account_id,
        role: Role::CorporateCustomer,
    }
}
