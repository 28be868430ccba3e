//! # Starter Data Loader
//!
//! Populates an empty database with the shop's starter catalogue, accounts
//! and a few paid sample orders.
//!
//! ## Usage
//! ```bash
//! # Seed ./greengrocer.db
//! cargo run -p greengrocer-db --bin seed
//!
//! # Specify database path
//! cargo run -p greengrocer-db --bin seed -- --db ./data/greengrocer.db
//! ```
//!
//! ## Seeded Data
//! - One staff login (`staff` / `123`)
//! - Three private customers with a $100 limit
//! - Two corporate customers with $500 and $1000 limits
//! - Ten veggies across the weighted, pack and unit-price variants
//! - Small, Medium and Large premade boxes
//! - Three paid orders in 2024

use chrono::{NaiveDate, Utc};
use std::env;

use greengrocer_core::{
    AccountProfile, BoxContent, BoxSize, Cart, CorporateProfile, CustomerProfile, DeliveryMethod,
    Item, ItemDraft, ItemType, Money, PaymentMethod, PaymentRequest, Quantity, StaffProfile,
};
use greengrocer_db::{Database, DbConfig, NewAccount};

/// (username, first, last, address, credit limit in dollars)
const CUSTOMERS: &[(&str, &str, &str, &str, i64)] = &[
    ("ying", "Ying", "Zheng", "23 Kingsland Road, Auckland", 100),
    ("harry", "Harry", "Potter", "3 North Road, Wellington", 100),
    ("peter", "Peter", "Wu", "5 Lincoln Road, Christchurch", 100),
];

const CORPORATE_CUSTOMERS: &[(&str, &str, &str, &str, i64)] = &[
    ("fresh", "Hello", "Fresh", "23 Commerce St, Wellington", 500),
    ("veggies", "Everyday", "Veggies", "45 Great South Road, Auckland", 1000),
];

/// (variant, name, price in cents, stock in units)
const VEGGIES: &[(ItemType, &str, i64, i64)] = &[
    (ItemType::Weighted, "Kumara", 399, 100),
    (ItemType::Weighted, "Pumpkin", 299, 80),
    (ItemType::Weighted, "Yam", 799, 50),
    (ItemType::Weighted, "Taro", 699, 60),
    (ItemType::Pack, "Celery", 399, 75),
    (ItemType::Pack, "Lettuce", 299, 90),
    (ItemType::Pack, "Spinach", 350, 70),
    (ItemType::UnitPrice, "Feijoa", 99, 200),
    (ItemType::UnitPrice, "Avocado", 199, 150),
    (ItemType::UnitPrice, "Cucumber", 199, 100),
];

/// (size, stock, how many of the first veggies go in)
const BOXES: &[(BoxSize, i64, usize)] = &[
    (BoxSize::Small, 30, 3),
    (BoxSize::Medium, 25, 6),
    (BoxSize::Large, 20, VEGGIES.len()),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./greengrocer.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Greengrocer Starter Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./greengrocer.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Greengrocer Starter Data Loader");
    println!("==================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.accounts().find_by_username("staff").await?.is_some() {
        println!("⚠ Database already has starter data");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Accounts
    db.accounts()
        .create(NewAccount {
            username: "staff".to_string(),
            password: "123".to_string(),
            first_name: "Lucy".to_string(),
            last_name: "Baker".to_string(),
            profile: AccountProfile::Staff(StaffProfile {
                department: "Sales".to_string(),
                date_joined: Utc::now().date_naive(),
            }),
        })
        .await?;

    let mut customer_ids = Vec::new();
    for (username, first, last, address, limit) in CUSTOMERS {
        let profile = CustomerProfile::new(*address, Money::from_major_minor(*limit, 0));
        let account = db
            .accounts()
            .create(customer(username, first, last, AccountProfile::PrivateCustomer(profile)))
            .await?;
        customer_ids.push(account.id);
    }
    for (username, first, last, address, limit) in CORPORATE_CUSTOMERS {
        let profile = CorporateProfile::new(CustomerProfile::new(
            *address,
            Money::from_major_minor(*limit, 0),
        ));
        let account = db
            .accounts()
            .create(customer(username, first, last, AccountProfile::CorporateCustomer(profile)))
            .await?;
        customer_ids.push(account.id);
    }
    println!("✓ Created 1 staff and {} customer accounts", customer_ids.len());

    // Catalogue
    let mut veggies: Vec<Item> = Vec::new();
    for (kind, name, cents, stock) in VEGGIES {
        let price = Money::from_cents(*cents);
        let stock = Quantity::from_units(*stock);
        let draft = match kind {
            ItemType::Weighted => ItemDraft::weighted(*name, price, stock),
            ItemType::Pack => ItemDraft::pack(*name, price, stock),
            _ => ItemDraft::unit_price(*name, price, stock),
        };
        veggies.push(db.items().create(&draft).await?);
    }

    let mut boxes: Vec<Item> = Vec::new();
    for (size, stock, take) in BOXES {
        let contents = veggies
            .iter()
            .take(*take)
            .map(|v| BoxContent {
                veggie_id: v.id,
                name: v.name(),
            })
            .collect();
        let draft = ItemDraft::premade_box(*size, Quantity::from_units(*stock), contents);
        boxes.push(db.items().create(&draft).await?);
    }
    println!("✓ Created {} veggies and {} premade boxes", veggies.len(), boxes.len());

    // Sample orders, each paid on the day it was placed
    let visa = PaymentRequest::new("credit_card")
        .field("card_number", "1234567890123456")
        .field("card_type", "Visa")
        .field("card_expiry", "2030-12");
    let anz = PaymentRequest::new("debit_card")
        .field("bank_name", "ANZ Bank")
        .field("card_number", "9876543210987654");

    let samples = [
        (
            customer_ids[0],
            DeliveryMethod::Delivery,
            PaymentMethod::CreditCard,
            vec![(&veggies[0], 2), (&boxes[0], 1)],
            NaiveDate::from_ymd_opt(2024, 5, 7),
            &visa,
        ),
        (
            customer_ids[1],
            DeliveryMethod::Pickup,
            PaymentMethod::DebitCard,
            vec![(&veggies[2], 3)],
            NaiveDate::from_ymd_opt(2024, 8, 10),
            &anz,
        ),
        (
            customer_ids[3],
            DeliveryMethod::Delivery,
            PaymentMethod::CreditCard,
            vec![(&boxes[2], 1)],
            NaiveDate::from_ymd_opt(2024, 9, 15),
            &visa,
        ),
    ];

    for (customer_id, delivery, method, lines, date, request) in samples {
        let date = date.ok_or("invalid sample date")?;
        let mut cart = Cart::new();
        for (item, units) in lines {
            cart.add(item.id, item.item_type(), Quantity::from_units(units))?;
        }

        let order = db
            .orders()
            .place_order(customer_id, delivery, method, &cart, date)
            .await?;
        let payment = db.orders().pay_order(order.id, request, date).await?;
        println!(
            "  Order {} on {}: {} by {}",
            order.order_number, date, payment.amount, payment.method()
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn customer(username: &str, first: &str, last: &str, profile: AccountProfile) -> NewAccount {
    NewAccount {
        username: username.to_string(),
        password: "123".to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        profile,
    }
}
