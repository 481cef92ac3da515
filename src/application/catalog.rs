//! Catalog cache facade: cache-aside reads and basket-count mutations.
//!
//! Single entry point for callers. Hides the miss/populate dance: try the
//! index store, fall back to the loader on miss or degraded read, merge the
//! per-user counter into the shared record before returning.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use metrics::counter;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{CacheConfig, CacheError, CacheLoader, IndexStore, bounded};
use crate::cache::lock::{rw_read, rw_write};
use crate::domain::entities::{ItemRecord, ItemView};
use crate::domain::types::SortOrder;

use super::repos::{CartRepo, ItemsRepo, RepoError};

const SOURCE: &str = "application::catalog";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("item {id} not found in catalog")]
    ItemNotFound { id: i64 },
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Debug, Clone, Copy)]
struct TotalCount {
    value: u64,
    refreshed_at: Instant,
}

/// Shared catalog read path. One instance serves all concurrent callers;
/// mutations are expressed as single atomic cache operations plus synchronous
/// write-through to the cart table, so no in-process locking is needed
/// beyond the index store's own.
pub struct CatalogCache {
    store: Arc<dyn IndexStore>,
    loader: CacheLoader,
    config: CacheConfig,
    total_count: RwLock<Option<TotalCount>>,
}

impl CatalogCache {
    pub fn new(
        store: Arc<dyn IndexStore>,
        items: Arc<dyn ItemsRepo>,
        cart: Arc<dyn CartRepo>,
        config: CacheConfig,
    ) -> Self {
        let loader = CacheLoader::new(Arc::clone(&store), items, cart, config.clone());
        Self {
            store,
            loader,
            config,
            total_count: RwLock::new(None),
        }
    }

    /// Item by id with the requesting user's basket count merged in. The
    /// identifying fields are either fresh cache or fresh backing-store data,
    /// never a mix: a miss loads the whole record.
    pub async fn find_by_id(&self, item_id: i64, user_id: i64) -> Result<ItemView, CatalogError> {
        let record = self.record_cache_aside(item_id).await?;
        let count = self.find_count_for_item(item_id, user_id).await?;
        Ok(record.into_view(count))
    }

    /// One page of item views in the requested order.
    ///
    /// A non-empty index range is the fast path; an empty range is read as a
    /// cold cache and the loader seeds the page from the backing store.
    pub async fn find_page(
        &self,
        page: u32,
        size: u32,
        search: &str,
        sort: SortOrder,
        user_id: i64,
    ) -> Result<Vec<ItemView>, CatalogError> {
        let offset = page as usize * size as usize;
        let limit = size as usize;

        let range = match sort {
            SortOrder::Title => {
                bounded(self.config.op_timeout(), self.store.range_by_title(offset, limit)).await
            }
            SortOrder::Unsorted | SortOrder::Price => {
                bounded(self.config.op_timeout(), self.store.range_by_price(offset, limit)).await
            }
        };

        let ids = match range {
            Ok(ids) if !ids.is_empty() => ids,
            Ok(_) => {
                counter!("vetrina_catalog_page_cold_total").increment(1);
                debug!(page, size, ?sort, "index range empty; seeding page from backing store");
                self.loader.load_page(page, size, search, sort).await?
            }
            Err(err) => {
                warn!(page, size, error = %err, "index range degraded to backing store");
                self.loader.load_page(page, size, search, sort).await?
            }
        };

        // A warm index ignores `search` and filters after per-item
        // resolution; only the cold path pushes the term down into the
        // backing query. A page window can therefore under-fill when most
        // indexed items in it do not match the term.
        let mut views = Vec::with_capacity(ids.len());
        for id in ids {
            let view = self.find_by_id(id, user_id).await?;
            if matches_search(&view, search) {
                views.push(view);
            }
        }
        Ok(views)
    }

    /// Atomic +1 on the user's basket counter, clamped at zero, written
    /// through to the cart row. Returns the post-increment value.
    pub async fn increment_count(&self, item_id: i64, user_id: i64) -> Result<i64, CatalogError> {
        self.apply_count_delta(item_id, user_id, 1).await
    }

    /// Atomic -1 with the same clamp-at-zero contract. Whether 0 means
    /// "remove from basket" is the caller's decision.
    pub async fn decrement_count(&self, item_id: i64, user_id: i64) -> Result<i64, CatalogError> {
        self.apply_count_delta(item_id, user_id, -1).await
    }

    /// Zero the counter after checkout or explicit removal. The backing cart
    /// row is deleted first so cache and cart cannot diverge; a zeroed pair
    /// stays in the cache rather than being removed.
    pub async fn reset_count(&self, item_id: i64, user_id: i64) -> Result<(), CatalogError> {
        self.loader.remove_cart_line(item_id, user_id).await?;
        bounded(self.config.op_timeout(), self.store.reset_count(item_id, user_id)).await?;
        debug!(item_id, user_id, "basket count reset");
        Ok(())
    }

    /// The user's current basket count for an item, seeding from the cart
    /// row on first touch. Absent pairs read as 0.
    pub async fn find_count_for_item(
        &self,
        item_id: i64,
        user_id: i64,
    ) -> Result<i64, CatalogError> {
        self.loader.quantity(item_id, user_id).await
    }

    /// Write-through publish of a new or updated item into the cache.
    pub async fn save_item(&self, item: &ItemRecord) -> Result<(), CatalogError> {
        self.loader.save(item).await
    }

    /// Total catalog size, cached until its TTL lapses.
    pub async fn total_count(&self) -> Result<u64, CatalogError> {
        let ttl = self.config.total_count_ttl();
        if let Some(cached) = *rw_read(&self.total_count, SOURCE, "total_count") {
            if cached.refreshed_at.elapsed() < ttl {
                return Ok(cached.value);
            }
        }

        let value = self.loader.total_items().await?;
        *rw_write(&self.total_count, SOURCE, "total_count.refresh") = Some(TotalCount {
            value,
            refreshed_at: Instant::now(),
        });
        Ok(value)
    }

    async fn record_cache_aside(&self, item_id: i64) -> Result<ItemRecord, CatalogError> {
        match bounded(self.config.op_timeout(), self.store.get_record(item_id)).await {
            Ok(Some(record)) => {
                counter!("vetrina_catalog_record_hit_total").increment(1);
                Ok(record)
            }
            Ok(None) => {
                counter!("vetrina_catalog_record_miss_total").increment(1);
                debug!(item_id, "record miss; loading from backing store");
                self.loader.load_item(item_id).await
            }
            Err(err) => {
                warn!(item_id, error = %err, "record read degraded to backing store");
                self.loader.load_item(item_id).await
            }
        }
    }

    /// The clamp is a separate follow-up write and may race another mutator;
    /// it only ever moves the counter toward zero, which is idempotent.
    async fn apply_count_delta(
        &self,
        item_id: i64,
        user_id: i64,
        delta: i64,
    ) -> Result<i64, CatalogError> {
        let raw = bounded(
            self.config.op_timeout(),
            self.store.increment_count(item_id, user_id, delta),
        )
        .await?;

        let value = if raw <= 0 {
            debug!(item_id, user_id, raw, "clamping basket count to zero");
            bounded(
                self.config.op_timeout(),
                self.store.set_count(item_id, user_id, 0),
            )
            .await?;
            0
        } else {
            raw
        };

        self.loader
            .write_cart_quantity(item_id, user_id, value)
            .await?;
        Ok(value)
    }
}

fn matches_search(view: &ItemView, search: &str) -> bool {
    if search.trim().is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    view.title.to_lowercase().contains(&needle)
        || view.description.to_lowercase().contains(&needle)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn view(title: &str, description: &str) -> ItemView {
        ItemView {
            id: 1,
            title: title.to_string(),
            description: description.to_string(),
            price: dec!(10),
            image_path: String::new(),
            count: 0,
        }
    }

    #[test]
    fn blank_search_matches_everything() {
        assert!(matches_search(&view("Lamp", "warm light"), ""));
        assert!(matches_search(&view("Lamp", "warm light"), "   "));
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let v = view("Gaming Laptop", "Portable workstation");
        assert!(matches_search(&v, "LAPTOP"));
        assert!(matches_search(&v, "workstation"));
        assert!(!matches_search(&v, "desk"));
    }
}
