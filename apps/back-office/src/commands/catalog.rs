//! # Catalog Commands
//!
//! Customers browse what is in stock and build custom boxes; staff see the
//! whole inventory and manage it.

use greengrocer_core::{CatalogListing, Item, ItemDraft, Quantity};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{DbState, Session};

/// The catalog as the caller's role sees it.
///
/// ## Returns
/// - Customers: in-stock veggies and in-stock base boxes
/// - Staff: every veggie and base box, in or out of stock
pub async fn list_catalog(db: &DbState, session: &Session) -> Result<CatalogListing, ApiError> {
    debug!(role = ?session.role, "list_catalog command");

    let items = db.inner().items();
    let listing = if session.is_staff() {
        items.catalog_for_staff().await?
    } else {
        items.catalog_for_customers().await?
    };
    Ok(listing)
}

/// One item with its box contents.
pub async fn get_item(db: &DbState, item_id: i64) -> Result<Item, ApiError> {
    debug!(item_id, "get_item command");
    Ok(db.inner().items().get(item_id).await?)
}

/// Creates a custom box for the calling customer from a base box and the
/// veggies they picked.
pub async fn create_custom_box(
    db: &DbState,
    session: &Session,
    box_id: i64,
    veggie_ids: &[i64],
) -> Result<Item, ApiError> {
    debug!(box_id, veggies = veggie_ids.len(), "create_custom_box command");
    let customer_id = session.require_customer()?;

    if veggie_ids.is_empty() {
        return Err(ApiError::validation("Pick at least one veggie for the box"));
    }

    let item = db
        .inner()
        .items()
        .derive_custom_box(box_id, veggie_ids, customer_id)
        .await?;
    Ok(item)
}

/// Adds an item to the catalog (staff).
pub async fn add_item(db: &DbState, session: &Session, draft: &ItemDraft) -> Result<Item, ApiError> {
    debug!(item_type = %draft.kind.item_type(), "add_item command");
    session.require_staff()?;

    let item = db.inner().items().create(draft).await?;
    info!(item_id = item.id, staff_id = session.account_id, "Item added");
    Ok(item)
}

/// Adds received stock to an item (staff).
pub async fn restock_item(
    db: &DbState,
    session: &Session,
    item_id: i64,
    quantity: Quantity,
) -> Result<Item, ApiError> {
    debug!(item_id, quantity = %quantity, "restock_item command");
    session.require_staff()?;

    Ok(db.inner().items().restock(item_id, quantity).await?)
}

/// Resets a base box to every veggie currently in stock (staff).
pub async fn reset_box_contents(db: &DbState, session: &Session, box_id: i64) -> Result<Item, ApiError> {
    debug!(box_id, "reset_box_contents command");
    session.require_staff()?;

    Ok(db.inner().items().set_default_contents(box_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::testing::{customer_session, seeded, staff_session};
    use greengrocer_core::Money;

    #[tokio::test]
    async fn test_listing_depends_on_role() {
        let (db, ids) = seeded().await;
        let staff = staff_session(&ids);

        let draft = ItemDraft::unit_price("Dragon Fruit", Money::from_cents(400), Quantity::zero());
        let sold_out = add_item(&db, &staff, &draft).await.unwrap();

        let customer_view = list_catalog(&db, &customer_session(ids.ying)).await.unwrap();
        let staff_view = list_catalog(&db, &staff).await.unwrap();
        assert!(customer_view.unit_price.iter().all(|i| i.id != sold_out.id));
        assert!(customer_view.unit_price.iter().any(|i| i.id == ids.kumara));
        assert!(staff_view.unit_price.iter().any(|i| i.id == sold_out.id));
    }

    #[tokio::test]
    async fn test_custom_box_belongs_to_customer() {
        let (db, ids) = seeded().await;
        let ying = customer_session(ids.ying);

        let custom = create_custom_box(&db, &ying, ids.small_box, &[ids.kumara])
            .await
            .unwrap();
        let b = custom.as_box().unwrap();
        assert_eq!(b.owner_customer_id, Some(ids.ying));
        assert_eq!(custom.unit_price(), Money::from_cents(1_000));

        let err = create_custom_box(&db, &staff_session(&ids), ids.small_box, &[ids.kumara])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let err = create_custom_box(&db, &ying, ids.small_box, &[]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_staff_only_inventory_commands() {
        let (db, ids) = seeded().await;
        let ying = customer_session(ids.ying);
        let staff = staff_session(&ids);

        let err = restock_item(&db, &ying, ids.kumara, Quantity::from_units(5))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let before = get_item(&db, ids.kumara).await.unwrap().stock;
        let item = restock_item(&db, &staff, ids.kumara, Quantity::from_units(5))
            .await
            .unwrap();
        assert_eq!(item.stock, before + Quantity::from_units(5));

        let draft = ItemDraft::pack("Spinach", Money::from_cents(350), Quantity::from_units(70));
        assert!(add_item(&db, &ying, &draft).await.is_err());
        let spinach = add_item(&db, &staff, &draft).await.unwrap();
        assert_eq!(spinach.name(), "Spinach");

        let small = reset_box_contents(&db, &staff, ids.small_box).await.unwrap();
        assert!(small.contents().iter().any(|c| c.veggie_id == spinach.id));
    }
}
