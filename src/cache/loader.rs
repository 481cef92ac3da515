//! Read-through population from the backing store into the index store.
//!
//! The loader is the only component that reads the system of record. Every
//! backing read also warms the cache, so the next reader hits. Population is
//! a full overwrite and therefore idempotent and safe to race.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::application::catalog::CatalogError;
use crate::application::repos::{CartRepo, ItemQuery, ItemsRepo};
use crate::domain::entities::{CartLine, ItemRecord};
use crate::domain::types::SortOrder;

use super::config::CacheConfig;
use super::store::{IndexStore, bounded};

pub struct CacheLoader {
    store: Arc<dyn IndexStore>,
    items: Arc<dyn ItemsRepo>,
    cart: Arc<dyn CartRepo>,
    config: CacheConfig,
}

impl CacheLoader {
    pub fn new(
        store: Arc<dyn IndexStore>,
        items: Arc<dyn ItemsRepo>,
        cart: Arc<dyn CartRepo>,
        config: CacheConfig,
    ) -> Self {
        Self {
            store,
            items,
            cart,
            config,
        }
    }

    /// Read-through item load. The populate failure mode is "proceed with
    /// backing-store data uncached": the overwrite is all-or-nothing, so a
    /// failed write cannot leave a record without its indexes.
    pub async fn load_item(&self, item_id: i64) -> Result<ItemRecord, CatalogError> {
        let record = self
            .items
            .item_by_id(item_id)
            .await?
            .ok_or(CatalogError::ItemNotFound { id: item_id })?;
        self.populate(&record).await;
        debug!(item_id, "item loaded from backing store");
        Ok(record)
    }

    /// Seed a whole page. The backing store owns the ordering (and the cold
    /// path honors `search`); every returned item is cached before the id
    /// list is handed back, which is how the sort indexes warm up from cold.
    pub async fn load_page(
        &self,
        page: u32,
        size: u32,
        search: &str,
        sort: SortOrder,
    ) -> Result<Vec<i64>, CatalogError> {
        let query = ItemQuery {
            page,
            size,
            search: search.to_string(),
            sort,
        };
        let records = self.items.list_items(&query).await?;
        let mut ids = Vec::with_capacity(records.len());
        for record in &records {
            self.populate(record).await;
            ids.push(record.id);
        }
        debug!(
            page,
            size,
            loaded = ids.len(),
            "page loaded from backing store"
        );
        Ok(ids)
    }

    /// Per-user counter with lazy seeding from the backing cart row (0 when
    /// the user has no row). A degraded cache read answers straight from the
    /// cart row without touching the cache.
    pub async fn quantity(&self, item_id: i64, user_id: i64) -> Result<i64, CatalogError> {
        match bounded(self.config.op_timeout(), self.store.get_count(item_id, user_id)).await {
            Ok(Some(count)) => return Ok(count),
            Ok(None) => {}
            Err(err) => {
                warn!(item_id, user_id, error = %err, "counter read degraded to cart row");
                let line = self.cart.cart_line(item_id, user_id).await?;
                return Ok(line.map(|l| l.quantity).unwrap_or(0));
            }
        }

        let quantity = self
            .cart
            .cart_line(item_id, user_id)
            .await?
            .map(|l| l.quantity)
            .unwrap_or(0);
        if let Err(err) = bounded(
            self.config.op_timeout(),
            self.store.set_count(item_id, user_id, quantity),
        )
        .await
        {
            warn!(item_id, user_id, error = %err, "counter seed write failed; returning unseeded value");
        } else {
            counter!("vetrina_basket_count_seed_total").increment(1);
        }
        Ok(quantity)
    }

    /// Explicit write-through populate, used when the catalog saves an item.
    /// Unlike the read path, a failed write surfaces here: the caller asked
    /// for the cache write and may retry.
    pub async fn save(&self, item: &ItemRecord) -> Result<(), CatalogError> {
        bounded(self.config.op_timeout(), self.store.put_record(item)).await?;
        debug!(item_id = item.id, title = %item.title, "item saved to cache");
        Ok(())
    }

    /// Counter write-through: the cart table stays the system of record for
    /// basket quantities.
    pub async fn write_cart_quantity(
        &self,
        item_id: i64,
        user_id: i64,
        quantity: i64,
    ) -> Result<(), CatalogError> {
        self.cart
            .upsert_cart_line(CartLine {
                item_id,
                user_id,
                quantity,
            })
            .await?;
        Ok(())
    }

    pub async fn remove_cart_line(&self, item_id: i64, user_id: i64) -> Result<(), CatalogError> {
        self.cart.delete_cart_line(item_id, user_id).await?;
        Ok(())
    }

    /// Total catalog size from the backing store. The facade owns the TTL
    /// caching around it; the loader stays the only reader of the system of
    /// record.
    pub async fn total_items(&self) -> Result<u64, CatalogError> {
        Ok(self.items.count_items().await?)
    }

    async fn populate(&self, record: &ItemRecord) {
        if let Err(err) = bounded(self.config.op_timeout(), self.store.put_record(record)).await {
            warn!(item_id = record.id, error = %err, "cache populate failed; serving uncached");
        }
    }
}
