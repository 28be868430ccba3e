//! # Catalog
//!
//! Item variants and their pricing rules.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Item (id, stock)                                │
//! │                                                                         │
//! │   Weighted    price = weight_per_kilo × kg                              │
//! │   Pack        price = price_per_pack  × packs                           │
//! │   UnitPrice   price = price_per_unit  × units                           │
//! │   PremadeBox  price = size table      × boxes   (contents ignored)      │
//! │                                                                         │
//! │   Custom boxes are per-customer copies of a base box:                   │
//! │     base (Small, 5 veggies) ──derive_custom([1,4])──► custom (Small,    │
//! │                                                       2 veggies,        │
//! │                                                       stock 1)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is never clamped. Withdrawing more than is on hand is an
//! `InsufficientStock` error and leaves the item untouched.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{BoxSize, ItemType};

// =============================================================================
// Item
// =============================================================================

/// A sellable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Item {
    pub id: i64,
    /// On-hand stock, never negative.
    pub stock: Quantity,
    pub kind: ItemKind,
}

/// The four item variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemKind {
    /// Sold by the kilogram.
    Weighted { name: String, weight_per_kilo: Money },
    Pack { name: String, price_per_pack: Money },
    UnitPrice { name: String, price_per_unit: Money },
    PremadeBox(PremadeBox),
}

/// A box of veggies with a size-determined price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PremadeBox {
    pub size: BoxSize,
    /// Number of boxes per sale unit, copied onto custom boxes.
    pub box_count: i64,
    pub is_custom: bool,
    /// Set for custom boxes only.
    pub owner_customer_id: Option<i64>,
    pub contents: Vec<BoxContent>,
}

/// A veggie inside a box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BoxContent {
    pub veggie_id: i64,
    pub name: String,
}

impl Item {
    pub fn item_type(&self) -> ItemType {
        self.kind.item_type()
    }

    /// Display name: the veggie name, or e.g. "Small Premade Box".
    pub fn name(&self) -> String {
        self.kind.name()
    }

    pub fn unit_price(&self) -> Money {
        self.kind.unit_price()
    }

    /// Price of `quantity` of this item. Boxes ignore their contents.
    pub fn price(&self, quantity: Quantity) -> Money {
        self.unit_price().multiply_quantity(quantity)
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock.is_positive()
    }

    pub fn is_veggie(&self) -> bool {
        self.item_type().is_veggie()
    }

    pub fn as_box(&self) -> Option<&PremadeBox> {
        match &self.kind {
            ItemKind::PremadeBox(b) => Some(b),
            _ => None,
        }
    }

    /// Box contents; empty for veggies.
    pub fn contents(&self) -> &[BoxContent] {
        self.as_box().map(|b| b.contents.as_slice()).unwrap_or_default()
    }

    /// Fails with `InsufficientStock` if `quantity` exceeds stock.
    pub fn ensure_available(&self, quantity: Quantity) -> CoreResult<()> {
        if self.stock < quantity {
            return Err(CoreError::InsufficientStock {
                item: self.name(),
                available: self.stock,
                requested: quantity,
            });
        }
        Ok(())
    }

    /// Removes `quantity` from stock.
    pub fn withdraw(&mut self, quantity: Quantity) -> CoreResult<()> {
        let remaining = self
            .stock
            .checked_sub(quantity)
            .ok_or_else(|| CoreError::InsufficientStock {
                item: self.name(),
                available: self.stock,
                requested: quantity,
            })?;
        self.stock = remaining;
        Ok(())
    }

    /// Puts `quantity` back on the shelf.
    pub fn restock(&mut self, quantity: Quantity) {
        self.stock += quantity;
    }

    /// Creates a customer-owned copy of this box holding only `selected`.
    ///
    /// ## Arguments
    /// * `selected` - veggie ids chosen by the customer
    /// * `catalog` - items to resolve the ids against
    /// * `owner_customer_id` - the customer the box belongs to
    ///
    /// ## Errors
    /// `NotFound` if this item is not a base box (custom boxes are not
    /// templates) or any id does not resolve to a veggie in `catalog`.
    pub fn derive_custom(
        &self,
        selected: &[i64],
        catalog: &[Item],
        owner_customer_id: i64,
    ) -> CoreResult<ItemDraft> {
        let template = self
            .as_box()
            .filter(|b| !b.is_custom)
            .ok_or_else(|| CoreError::not_found("Premade box", self.id))?;

        let mut contents: Vec<BoxContent> = Vec::with_capacity(selected.len());
        for veggie_id in selected {
            if contents.iter().any(|c| c.veggie_id == *veggie_id) {
                continue;
            }
            let veggie = catalog
                .iter()
                .find(|item| item.id == *veggie_id && item.is_veggie())
                .ok_or_else(|| CoreError::not_found("Veggie", veggie_id))?;
            contents.push(BoxContent {
                veggie_id: veggie.id,
                name: veggie.name(),
            });
        }

        Ok(ItemDraft {
            stock: Quantity::from_units(1),
            kind: ItemKind::PremadeBox(PremadeBox {
                size: template.size,
                box_count: template.box_count,
                is_custom: true,
                owner_customer_id: Some(owner_customer_id),
                contents,
            }),
        })
    }
}

impl ItemKind {
    pub fn item_type(&self) -> ItemType {
        match self {
            ItemKind::Weighted { .. } => ItemType::Weighted,
            ItemKind::Pack { .. } => ItemType::Pack,
            ItemKind::UnitPrice { .. } => ItemType::UnitPrice,
            ItemKind::PremadeBox(_) => ItemType::PremadeBox,
        }
    }

    pub fn name(&self) -> String {
        match self {
            ItemKind::Weighted { name, .. }
            | ItemKind::Pack { name, .. }
            | ItemKind::UnitPrice { name, .. } => name.clone(),
            ItemKind::PremadeBox(b) => format!("{} Premade Box", b.size),
        }
    }

    pub fn unit_price(&self) -> Money {
        match self {
            ItemKind::Weighted { weight_per_kilo, .. } => *weight_per_kilo,
            ItemKind::Pack { price_per_pack, .. } => *price_per_pack,
            ItemKind::UnitPrice { price_per_unit, .. } => *price_per_unit,
            ItemKind::PremadeBox(b) => b.size.price(),
        }
    }
}

/// Picks the default contents for a base box: every veggie currently in stock.
pub fn default_contents(veggies: &[Item]) -> Vec<BoxContent> {
    veggies
        .iter()
        .filter(|item| item.is_veggie() && item.is_in_stock())
        .map(|item| BoxContent {
            veggie_id: item.id,
            name: item.name(),
        })
        .collect()
}

// =============================================================================
// Item Draft
// =============================================================================

/// An item that has not been given an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub stock: Quantity,
    pub kind: ItemKind,
}

impl ItemDraft {
    pub fn weighted(name: impl Into<String>, weight_per_kilo: Money, stock: Quantity) -> Self {
        ItemDraft {
            stock,
            kind: ItemKind::Weighted {
                name: name.into(),
                weight_per_kilo,
            },
        }
    }

    pub fn pack(name: impl Into<String>, price_per_pack: Money, stock: Quantity) -> Self {
        ItemDraft {
            stock,
            kind: ItemKind::Pack {
                name: name.into(),
                price_per_pack,
            },
        }
    }

    pub fn unit_price(name: impl Into<String>, price_per_unit: Money, stock: Quantity) -> Self {
        ItemDraft {
            stock,
            kind: ItemKind::UnitPrice {
                name: name.into(),
                price_per_unit,
            },
        }
    }

    /// A non-custom base box with the given contents.
    pub fn premade_box(size: BoxSize, stock: Quantity, contents: Vec<BoxContent>) -> Self {
        ItemDraft {
            stock,
            kind: ItemKind::PremadeBox(PremadeBox {
                size,
                box_count: 1,
                is_custom: false,
                owner_customer_id: None,
                contents,
            }),
        }
    }

    pub fn into_item(self, id: i64) -> Item {
        Item {
            id,
            stock: self.stock,
            kind: self.kind,
        }
    }
}

// =============================================================================
// Listings
// =============================================================================

/// Catalog grouped by variant, as the storefront pages render it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CatalogListing {
    pub weighted: Vec<Item>,
    pub pack: Vec<Item>,
    pub unit_price: Vec<Item>,
    pub premade_boxes: Vec<Item>,
}

impl CatalogListing {
    /// What customers may order: in-stock veggies and in-stock base boxes.
    pub fn for_customers(items: impl IntoIterator<Item = Item>) -> Self {
        Self::group(items.into_iter().filter(|item| {
            item.is_in_stock() && item.as_box().map_or(true, |b| !b.is_custom)
        }))
    }

    /// Staff inventory view: every veggie and every base box, in or out of stock.
    pub fn for_staff(items: impl IntoIterator<Item = Item>) -> Self {
        Self::group(
            items
                .into_iter()
                .filter(|item| item.as_box().map_or(true, |b| !b.is_custom)),
        )
    }

    fn group(items: impl Iterator<Item = Item>) -> Self {
        let mut listing = CatalogListing::default();
        for item in items {
            match item.item_type() {
                ItemType::Weighted => listing.weighted.push(item),
                ItemType::Pack => listing.pack.push(item),
                ItemType::UnitPrice => listing.unit_price.push(item),
                ItemType::PremadeBox => listing.premade_boxes.push(item),
            }
        }
        listing
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
