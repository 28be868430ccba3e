//! # Item Repository
//!
//! Database operations for the catalog.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  items                                                                  │
//! │  ┌────┬─────────────┬──────────┬───────────────────┬──────────┬──────┐  │
//! │  │ id │ item_type   │ name     │ unit_price_scaled │ box_size │stock │  │
//! │  ├────┼─────────────┼──────────┼───────────────────┼──────────┼──────┤  │
//! │  │  1 │ weighted    │ Kumara   │ 39900             │ NULL     │100000│  │
//! │  │  9 │ unit_price  │ Avocado  │ 19900             │ NULL     │150000│  │
//! │  │ 11 │ premade_box │ NULL     │ NULL              │ small    │ 30000│  │
//! │  └────┴─────────────┴──────────┴───────────────────┴──────────┴──────┘  │
//! │                                                                         │
//! │  box_contents (box_id, veggie_id, position) ── one row per veggie       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Updates
//! Stock only moves through `take_stock` and `return_stock`. `take_stock`
//! is a conditional update, so a row can never go below zero even if two
//! writers race.

use std::sync::Arc;

use greengrocer_core::catalog::default_contents;
use greengrocer_core::validation::{validate_price, validate_quantity};
use greengrocer_core::{
    BoxContent, BoxSize, CatalogListing, CoreError, Item, ItemDraft, ItemKind, ItemType, Money,
    PremadeBox, Quantity,
};
use sqlx::{SqliteConnection, SqlitePool};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::pool::lock_writes;

// =============================================================================
// Rows
// =============================================================================

const ITEM_COLUMNS: &str = "id, item_type, name, unit_price_scaled, box_size, box_count, \
                            is_custom, owner_customer_id, stock_milli";

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i64,
    item_type: ItemType,
    name: Option<String>,
    unit_price_scaled: Option<i64>,
    box_size: Option<BoxSize>,
    box_count: i64,
    is_custom: bool,
    owner_customer_id: Option<i64>,
    stock_milli: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ContentRow {
    box_id: i64,
    veggie_id: i64,
    name: Option<String>,
}

impl ItemRow {
    fn name(&self) -> DbResult<String> {
        self.name
            .clone()
            .ok_or_else(|| DbError::corrupt("items", self.id, "veggie without a name"))
    }

    fn price(&self) -> DbResult<Money> {
        self.unit_price_scaled
            .map(Money::from_scaled)
            .ok_or_else(|| DbError::corrupt("items", self.id, "veggie without a price"))
    }

    fn into_item(self, contents: Vec<BoxContent>) -> DbResult<Item> {
        let kind = match self.item_type {
            ItemType::Weighted => ItemKind::Weighted {
                name: self.name()?,
                weight_per_kilo: self.price()?,
            },
            ItemType::Pack => ItemKind::Pack {
                name: self.name()?,
                price_per_pack: self.price()?,
            },
            ItemType::UnitPrice => ItemKind::UnitPrice {
                name: self.name()?,
                price_per_unit: self.price()?,
            },
            ItemType::PremadeBox => ItemKind::PremadeBox(PremadeBox {
                size: self
                    .box_size
                    .ok_or_else(|| DbError::corrupt("items", self.id, "box without a size"))?,
                box_count: self.box_count,
                is_custom: self.is_custom,
                owner_customer_id: self.owner_customer_id,
                contents,
            }),
        };

        Ok(Item {
            id: self.id,
            stock: Quantity::from_milli(self.stock_milli),
            kind,
        })
    }
}

// =============================================================================
// Connection-level helpers
// =============================================================================

async fn fetch_contents(conn: &mut SqliteConnection, box_id: i64) -> DbResult<Vec<BoxContent>> {
    let rows: Vec<ContentRow> = sqlx::query_as(
        r#"
        SELECT bc.box_id, bc.veggie_id, v.name
        FROM box_contents bc
        JOIN items v ON v.id = bc.veggie_id
        WHERE bc.box_id = ?1
        ORDER BY bc.position
        "#,
    )
    .bind(box_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| BoxContent {
            veggie_id: r.veggie_id,
            name: r.name.unwrap_or_default(),
        })
        .collect())
}

/// Loads one item with its box contents.
pub(crate) async fn fetch_item(conn: &mut SqliteConnection, id: i64) -> DbResult<Item> {
    let sql = format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS);
    let row: ItemRow = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Item", id))?;

    let contents = if row.item_type == ItemType::PremadeBox {
        fetch_contents(conn, id).await?
    } else {
        Vec::new()
    };
    row.into_item(contents)
}

/// Loads several items by id, skipping duplicates. Fails on the first
/// missing id.
pub(crate) async fn fetch_items(
    conn: &mut SqliteConnection,
    ids: impl IntoIterator<Item = i64>,
) -> DbResult<Vec<Item>> {
    let mut items: Vec<Item> = Vec::new();
    for id in ids {
        if items.iter().any(|i| i.id == id) {
            continue;
        }
        items.push(fetch_item(conn, id).await?);
    }
    Ok(items)
}

/// Loads the whole catalog, ordered by id.
pub(crate) async fn fetch_all_items(conn: &mut SqliteConnection) -> DbResult<Vec<Item>> {
    let sql = format!("SELECT {} FROM items ORDER BY id", ITEM_COLUMNS);
    let rows: Vec<ItemRow> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;

    let content_rows: Vec<ContentRow> = sqlx::query_as(
        r#"
        SELECT bc.box_id, bc.veggie_id, v.name
        FROM box_contents bc
        JOIN items v ON v.id = bc.veggie_id
        ORDER BY bc.box_id, bc.position
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(|row| {
            let contents = content_rows
                .iter()
                .filter(|c| c.box_id == row.id)
                .map(|c| BoxContent {
                    veggie_id: c.veggie_id,
                    name: c.name.clone().unwrap_or_default(),
                })
                .collect();
            row.into_item(contents)
        })
        .collect()
}

async fn replace_contents(
    conn: &mut SqliteConnection,
    box_id: i64,
    contents: &[BoxContent],
) -> DbResult<()> {
    sqlx::query("DELETE FROM box_contents WHERE box_id = ?1")
        .bind(box_id)
        .execute(&mut *conn)
        .await?;

    for (position, content) in contents.iter().enumerate() {
        sqlx::query("INSERT INTO box_contents (box_id, veggie_id, position) VALUES (?1, ?2, ?3)")
            .bind(box_id)
            .bind(content.veggie_id)
            .bind(position as i64)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Inserts an item and its contents, returning the new id.
pub(crate) async fn insert_item(conn: &mut SqliteConnection, draft: &ItemDraft) -> DbResult<i64> {
    let item_type = draft.kind.item_type();

    let (name, price, box_size, box_count, is_custom, owner) = match &draft.kind {
        ItemKind::Weighted { name, weight_per_kilo: price }
        | ItemKind::Pack { name, price_per_pack: price }
        | ItemKind::UnitPrice { name, price_per_unit: price } => {
            (Some(name.clone()), Some(price.scaled()), None, 1, false, None)
        }
        ItemKind::PremadeBox(b) => (
            None,
            None,
            Some(b.size),
            b.box_count,
            b.is_custom,
            b.owner_customer_id,
        ),
    };

    let id = sqlx::query(
        r#"
        INSERT INTO items (
            item_type, name, unit_price_scaled,
            box_size, box_count, is_custom, owner_customer_id,
            stock_milli
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(item_type)
    .bind(name)
    .bind(price)
    .bind(box_size)
    .bind(box_count)
    .bind(is_custom)
    .bind(owner)
    .bind(draft.stock.milli())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    if let ItemKind::PremadeBox(b) = &draft.kind {
        replace_contents(conn, id, &b.contents).await?;
    }

    debug!(id, item_type = %item_type, "Inserted item");
    Ok(id)
}

/// Removes `quantity` from an item's stock, only if that much is on hand.
///
/// ## Errors
/// `Domain(InsufficientStock)` when the conditional update matches no row.
pub(crate) async fn take_stock(
    conn: &mut SqliteConnection,
    item_id: i64,
    quantity: Quantity,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE items SET stock_milli = stock_milli - ?2
        WHERE id = ?1 AND stock_milli >= ?2
        "#,
    )
    .bind(item_id)
    .bind(quantity.milli())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let item = fetch_item(conn, item_id).await?;
        return Err(CoreError::InsufficientStock {
            item: item.name(),
            available: item.stock,
            requested: quantity,
        }
        .into());
    }

    debug!(item_id, quantity = %quantity, "Stock taken");
    Ok(())
}

/// Puts `quantity` back on an item's stock.
pub(crate) async fn return_stock(
    conn: &mut SqliteConnection,
    item_id: i64,
    quantity: Quantity,
) -> DbResult<()> {
    let result = sqlx::query("UPDATE items SET stock_milli = stock_milli + ?2 WHERE id = ?1")
        .bind(item_id)
        .bind(quantity.milli())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Item", item_id));
    }

    debug!(item_id, quantity = %quantity, "Stock returned");
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog operations.
///
/// ## Usage
/// ```rust,ignore
/// let listing = db.items().catalog_for_customers().await?;
/// let custom = db.items().derive_custom_box(box_id, &[1, 4, 9], customer_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
    write_gate: Arc<Mutex<()>>,
}

impl ItemRepository {
    pub fn new(pool: SqlitePool, write_gate: Arc<Mutex<()>>) -> Self {
        ItemRepository { pool, write_gate }
    }

    /// Gets an item by id.
    pub async fn get(&self, id: i64) -> DbResult<Item> {
        let mut conn = self.pool.acquire().await?;
        fetch_item(&mut conn, id).await
    }

    /// Every item, custom boxes included.
    pub async fn list(&self) -> DbResult<Vec<Item>> {
        let mut conn = self.pool.acquire().await?;
        fetch_all_items(&mut conn).await
    }

    /// Every veggie, in or out of stock.
    pub async fn veggies(&self) -> DbResult<Vec<Item>> {
        Ok(self.list().await?.into_iter().filter(Item::is_veggie).collect())
    }

    /// The storefront: in-stock veggies and in-stock base boxes.
    pub async fn catalog_for_customers(&self) -> DbResult<CatalogListing> {
        Ok(CatalogListing::for_customers(self.list().await?))
    }

    /// The staff inventory view.
    pub async fn catalog_for_staff(&self) -> DbResult<CatalogListing> {
        Ok(CatalogListing::for_staff(self.list().await?))
    }

    /// Adds an item to the catalog.
    pub async fn create(&self, draft: &ItemDraft) -> DbResult<Item> {
        validate_price(draft.kind.unit_price())?;

        let _gate = lock_writes(&self.write_gate).await;
        let mut tx = self.pool.begin().await?;

        let id = insert_item(&mut tx, draft).await?;
        let item = fetch_item(&mut tx, id).await?;

        tx.commit().await?;
        info!(id, name = %item.name(), "Item created");
        Ok(item)
    }

    /// Resets a base box's contents to every veggie currently in stock.
    pub async fn set_default_contents(&self, box_id: i64) -> DbResult<Item> {
        let _gate = lock_writes(&self.write_gate).await;
        let mut tx = self.pool.begin().await?;

        let item = fetch_item(&mut tx, box_id).await?;
        if item.as_box().is_none() {
            return Err(DbError::not_found("Premade box", box_id));
        }

        let catalog = fetch_all_items(&mut tx).await?;
        let contents = default_contents(&catalog);
        replace_contents(&mut tx, box_id, &contents).await?;
        let item = fetch_item(&mut tx, box_id).await?;

        tx.commit().await?;
        info!(box_id, veggies = contents.len(), "Box contents reset to defaults");
        Ok(item)
    }

    /// Creates a customer-owned copy of a base box holding `selected` veggies.
    ///
    /// ## Errors
    /// - `NotFound` if the box or any selected veggie does not exist
    pub async fn derive_custom_box(
        &self,
        box_id: i64,
        selected: &[i64],
        customer_id: i64,
    ) -> DbResult<Item> {
        let _gate = lock_writes(&self.write_gate).await;
        let mut tx = self.pool.begin().await?;

        let base = fetch_item(&mut tx, box_id).await?;
        let catalog = fetch_all_items(&mut tx).await?;
        let draft = base.derive_custom(selected, &catalog, customer_id)?;

        let id = insert_item(&mut tx, &draft).await?;
        let item = fetch_item(&mut tx, id).await?;

        tx.commit().await?;
        info!(base_box = box_id, custom_box = id, customer_id, "Custom box created");
        Ok(item)
    }

    /// Adds received stock to an item.
    pub async fn restock(&self, item_id: i64, quantity: Quantity) -> DbResult<Item> {
        validate_quantity(quantity)?;

        let _gate = lock_writes(&self.write_gate).await;
        let mut tx = self.pool.begin().await?;

        return_stock(&mut tx, item_id, quantity).await?;
        let item = fetch_item(&mut tx, item_id).await?;

        tx.commit().await?;
        info!(item_id, quantity = %quantity, stock = %item.stock, "Item restocked");
        Ok(item)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{create_private, memory_db as db};
    use crate::Database;

    async fn avocado(db: &Database, stock: i64) -> Item {
        db.items()
            .create(&ItemDraft::unit_price(
                "Avocado",
                Money::from_cents(199),
                Quantity::from_units(stock),
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_each_variant() {
        let db = db().await;
        let kumara = db
            .items()
            .create(&ItemDraft::weighted(
                "Kumara",
                Money::from_cents(399),
                Quantity::from_units(100),
            ))
            .await
            .unwrap();
        let celery = db
            .items()
            .create(&ItemDraft::pack("Celery", Money::from_cents(399), Quantity::from_units(75)))
            .await
            .unwrap();
        let small = db
            .items()
            .create(&ItemDraft::premade_box(
                BoxSize::Small,
                Quantity::from_units(30),
                vec![BoxContent {
                    veggie_id: kumara.id,
                    name: "Kumara".to_string(),
                }],
            ))
            .await
            .unwrap();

        let loaded = db.items().get(kumara.id).await.unwrap();
        assert_eq!(loaded, kumara);
        assert_eq!(loaded.price(Quantity::from_milli(1_500)).scaled(), 59_850);

        assert_eq!(db.items().get(celery.id).await.unwrap().item_type(), ItemType::Pack);

        let small = db.items().get(small.id).await.unwrap();
        assert_eq!(small.name(), "Small Premade Box");
        assert_eq!(small.unit_price().cents(), 1_000);
        assert_eq!(small.contents().len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_item() {
        let db = db().await;
        assert!(matches!(db.items().get(42).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_take_stock_is_conditional() {
        let db = db().await;
        let item = avocado(&db, 3).await;

        let mut conn = db.pool().acquire().await.unwrap();
        take_stock(&mut conn, item.id, Quantity::from_units(2)).await.unwrap();
        let err = take_stock(&mut conn, item.id, Quantity::from_units(2))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::InsufficientStock { .. })
        ));
        drop(conn);

        assert_eq!(db.items().get(item.id).await.unwrap().stock, Quantity::from_units(1));
    }

    #[tokio::test]
    async fn test_default_contents_only_in_stock() {
        let db = db().await;
        let a = avocado(&db, 5).await;
        db.items()
            .create(&ItemDraft::pack("Lettuce", Money::from_cents(299), Quantity::zero()))
            .await
            .unwrap();
        let small = db
            .items()
            .create(&ItemDraft::premade_box(BoxSize::Small, Quantity::from_units(30), vec![]))
            .await
            .unwrap();

        let small = db.items().set_default_contents(small.id).await.unwrap();
        let ids: Vec<i64> = small.contents().iter().map(|c| c.veggie_id).collect();
        assert_eq!(ids, vec![a.id]);
    }

    #[tokio::test]
    async fn test_derive_custom_box() {
        let db = db().await;
        let a = avocado(&db, 5).await;
        let base = db
            .items()
            .create(&ItemDraft::premade_box(BoxSize::Medium, Quantity::from_units(25), vec![]))
            .await
            .unwrap();
        let customer = create_private(&db, "ying").await;

        let custom = db
            .items()
            .derive_custom_box(base.id, &[a.id], customer.id)
            .await
            .unwrap();
        let b = custom.as_box().unwrap();
        assert!(b.is_custom);
        assert_eq!(b.size, BoxSize::Medium);
        assert_eq!(b.owner_customer_id, Some(customer.id));
        assert_eq!(custom.stock, Quantity::from_units(1));
        assert_eq!(custom.contents()[0].name, "Avocado");

        // Custom boxes never show up in the listings.
        let listing = db.items().catalog_for_customers().await.unwrap();
        assert_eq!(listing.premade_boxes.len(), 1);

        let err = db
            .items()
            .derive_custom_box(base.id, &[999], customer.id)
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_restock() {
        let db = db().await;
        let item = avocado(&db, 0).await;
        let item = db.items().restock(item.id, Quantity::from_units(10)).await.unwrap();
        assert_eq!(item.stock, Quantity::from_units(10));
        assert!(db.items().restock(item.id, Quantity::zero()).await.is_err());
    }
}
