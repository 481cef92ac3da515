//! Catalog domain records shared between the cache tier and the backing store.

use rust_decimal::Decimal;

/// Authoritative catalog item, denormalized into the index store on populate.
///
/// The backing `items` table owns this data; the cached copy is overwritten on
/// every populate and never explicitly expired (absence = miss).
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub image_path: String,
}

impl ItemRecord {
    /// Merge the per-user basket count into the shared catalog record.
    pub fn into_view(self, count: i64) -> ItemView {
        ItemView {
            id: self.id,
            title: self.title,
            description: self.description,
            price: self.price,
            image_path: self.image_path,
            count,
        }
    }
}

/// Item as presented to callers: shared catalog fields plus the count of
/// units the requesting user currently holds in their basket.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub image_path: String,
    pub count: i64,
}

/// Per-user cart row in the backing store. The counter cache mirrors
/// `quantity`; the row stays the system of record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub item_id: i64,
    pub user_id: i64,
    pub quantity: i64,
}
