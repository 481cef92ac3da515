//! Index store: cache-tier storage for catalog records, the two sort
//! indexes, and per-user basket counters.
//!
//! The trait is the seam for the cache backend; `MemoryIndexStore` is the
//! in-process implementation over ordered maps. Any backend offering hash
//! records, ordered range scans, and an atomic counter fits behind it.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::entities::ItemRecord;

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// Cache-tier failure. Readers treat `Unavailable` as a miss and fall back to
/// the backing store; writers surface it to the caller.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

/// Bound a single cache round-trip. An elapsed deadline maps to
/// `Unavailable`, so a hung backend degrades instead of stalling requests.
pub async fn bounded<T, F>(limit: Duration, fut: F) -> Result<T, CacheError>
where
    F: Future<Output = Result<T, CacheError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(CacheError::Unavailable(format!(
            "round-trip exceeded {}ms",
            limit.as_millis()
        ))),
    }
}

/// Cache-tier storage operations.
///
/// `put_record` must be atomic with respect to readers: a concurrent reader
/// never observes the record without both index entries or vice versa.
/// `increment_count` must be a single indivisible read-modify-write.
#[async_trait]
pub trait IndexStore: Send + Sync {
    async fn get_record(&self, item_id: i64) -> Result<Option<ItemRecord>, CacheError>;

    /// Idempotent full overwrite of the record and both index entries.
    /// Concurrent writers converge last-writer-wins.
    async fn put_record(&self, item: &ItemRecord) -> Result<(), CacheError>;

    /// Up to `limit` item ids in ascending price order, ties by id, starting
    /// at `offset`. Empty when `offset` exceeds the index size.
    async fn range_by_price(&self, offset: usize, limit: usize) -> Result<Vec<i64>, CacheError>;

    /// Same contract ordered lexicographically by title, ties by id.
    async fn range_by_title(&self, offset: usize, limit: usize) -> Result<Vec<i64>, CacheError>;

    /// `None` means the counter was never seeded; callers surface it as 0.
    async fn get_count(&self, item_id: i64, user_id: i64) -> Result<Option<i64>, CacheError>;

    async fn set_count(&self, item_id: i64, user_id: i64, value: i64) -> Result<(), CacheError>;

    /// Indivisible increment; returns the post-increment value. Two
    /// concurrent calls are both reflected.
    async fn increment_count(
        &self,
        item_id: i64,
        user_id: i64,
        delta: i64,
    ) -> Result<i64, CacheError>;

    /// Sets the counter to 0. The pair is never removed, only zeroed.
    async fn reset_count(&self, item_id: i64, user_id: i64) -> Result<(), CacheError>;
}

/// Record hash plus both sort indexes, guarded as one unit so populate is
/// atomic for readers.
#[derive(Debug, Default)]
struct CatalogTables {
    records: HashMap<i64, ItemRecord>,
    // Stable sort key = primary sort field + tiebreak id, as a tuple in a
    // balanced tree rather than a delimited composite string.
    by_price: BTreeSet<(Decimal, i64)>,
    by_title: BTreeSet<(String, i64)>,
}

/// In-process index store over ordered maps.
#[derive(Debug, Default)]
pub struct MemoryIndexStore {
    tables: RwLock<CatalogTables>,
    counters: RwLock<HashMap<(i64, i64), i64>>,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    async fn get_record(&self, item_id: i64) -> Result<Option<ItemRecord>, CacheError> {
        Ok(rw_read(&self.tables, SOURCE, "get_record")
            .records
            .get(&item_id)
            .cloned())
    }

    async fn put_record(&self, item: &ItemRecord) -> Result<(), CacheError> {
        let mut guard = rw_write(&self.tables, SOURCE, "put_record");
        let tables = &mut *guard;
        if let Some(old) = tables.records.insert(item.id, item.clone()) {
            // Overwrite: drop index entries derived from the previous values
            // so a price or title change leaves no stale ordering.
            tables.by_price.remove(&(old.price, old.id));
            tables.by_title.remove(&(old.title, old.id));
        }
        tables.by_price.insert((item.price, item.id));
        tables.by_title.insert((item.title.clone(), item.id));
        Ok(())
    }

    async fn range_by_price(&self, offset: usize, limit: usize) -> Result<Vec<i64>, CacheError> {
        Ok(rw_read(&self.tables, SOURCE, "range_by_price")
            .by_price
            .iter()
            .skip(offset)
            .take(limit)
            .map(|(_, id)| *id)
            .collect())
    }

    async fn range_by_title(&self, offset: usize, limit: usize) -> Result<Vec<i64>, CacheError> {
        Ok(rw_read(&self.tables, SOURCE, "range_by_title")
            .by_title
            .iter()
            .skip(offset)
            .take(limit)
            .map(|(_, id)| *id)
            .collect())
    }

    async fn get_count(&self, item_id: i64, user_id: i64) -> Result<Option<i64>, CacheError> {
        Ok(rw_read(&self.counters, SOURCE, "get_count")
            .get(&(item_id, user_id))
            .copied())
    }

    async fn set_count(&self, item_id: i64, user_id: i64, value: i64) -> Result<(), CacheError> {
        rw_write(&self.counters, SOURCE, "set_count").insert((item_id, user_id), value);
        Ok(())
    }

    async fn increment_count(
        &self,
        item_id: i64,
        user_id: i64,
        delta: i64,
    ) -> Result<i64, CacheError> {
        let mut counters = rw_write(&self.counters, SOURCE, "increment_count");
        let value = counters.entry((item_id, user_id)).or_insert(0);
        *value += delta;
        Ok(*value)
    }

    async fn reset_count(&self, item_id: i64, user_id: i64) -> Result<(), CacheError> {
        rw_write(&self.counters, SOURCE, "reset_count").insert((item_id, user_id), 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::Arc;

    use rust_decimal_macros::dec;

    use super::*;

    fn sample_item(id: i64, title: &str, price: Decimal) -> ItemRecord {
        ItemRecord {
            id,
            title: title.to_string(),
            description: format!("{title} description"),
            price,
            image_path: format!("/img/{id}.png"),
        }
    }

    #[tokio::test]
    async fn record_roundtrip_populates_both_indexes() {
        let store = MemoryIndexStore::new();
        let item = sample_item(2, "Laptop", dec!(1199.50));

        assert!(store.get_record(2).await.unwrap().is_none());

        store.put_record(&item).await.unwrap();

        assert_eq!(store.get_record(2).await.unwrap(), Some(item));
        assert_eq!(store.range_by_price(0, 10).await.unwrap(), vec![2]);
        assert_eq!(store.range_by_title(0, 10).await.unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn repeated_put_is_idempotent() {
        let store = MemoryIndexStore::new();
        let item = sample_item(1, "Desk", dec!(80));

        store.put_record(&item).await.unwrap();
        store.put_record(&item).await.unwrap();

        assert_eq!(store.range_by_price(0, 10).await.unwrap(), vec![1]);
        assert_eq!(store.range_by_title(0, 10).await.unwrap(), vec![1]);
        assert_eq!(store.get_record(1).await.unwrap(), Some(item));
    }

    #[tokio::test]
    async fn overwrite_moves_index_entries() {
        let store = MemoryIndexStore::new();
        store
            .put_record(&sample_item(1, "Aardvark Mug", dec!(5)))
            .await
            .unwrap();
        store
            .put_record(&sample_item(2, "Zebra Mug", dec!(10)))
            .await
            .unwrap();

        // Reprice and retitle item 1 past item 2.
        store
            .put_record(&sample_item(1, "Zulu Mug", dec!(20)))
            .await
            .unwrap();

        assert_eq!(store.range_by_price(0, 10).await.unwrap(), vec![2, 1]);
        assert_eq!(store.range_by_title(0, 10).await.unwrap(), vec![2, 1]);
    }

    #[tokio::test]
    async fn price_ties_break_by_id_ascending() {
        let store = MemoryIndexStore::new();
        store
            .put_record(&sample_item(7, "Mug B", dec!(9.99)))
            .await
            .unwrap();
        store
            .put_record(&sample_item(3, "Mug A", dec!(9.99)))
            .await
            .unwrap();

        assert_eq!(store.range_by_price(0, 10).await.unwrap(), vec![3, 7]);
    }

    #[tokio::test]
    async fn title_ties_break_by_id_ascending() {
        let store = MemoryIndexStore::new();
        store
            .put_record(&sample_item(9, "Mug", dec!(4)))
            .await
            .unwrap();
        store
            .put_record(&sample_item(4, "Mug", dec!(6)))
            .await
            .unwrap();

        assert_eq!(store.range_by_title(0, 10).await.unwrap(), vec![4, 9]);
    }

    #[tokio::test]
    async fn range_offset_past_end_is_empty() {
        let store = MemoryIndexStore::new();
        store
            .put_record(&sample_item(1, "Lamp", dec!(30)))
            .await
            .unwrap();

        assert!(store.range_by_price(5, 10).await.unwrap().is_empty());
        assert!(store.range_by_title(5, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn counters_default_absent_and_increment_atomically() {
        let store = MemoryIndexStore::new();

        assert_eq!(store.get_count(2, 7).await.unwrap(), None);

        assert_eq!(store.increment_count(2, 7, 1).await.unwrap(), 1);
        assert_eq!(store.increment_count(2, 7, 1).await.unwrap(), 2);
        assert_eq!(store.increment_count(2, 7, -1).await.unwrap(), 1);

        store.reset_count(2, 7).await.unwrap();
        assert_eq!(store.get_count(2, 7).await.unwrap(), Some(0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_all_reflected() {
        let store = Arc::new(MemoryIndexStore::new());

        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.increment_count(1, 1, 1).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.get_count(1, 1).await.unwrap(), Some(64));
    }

    #[tokio::test]
    async fn bounded_maps_timeout_to_unavailable() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(0i64)
        };
        let result = bounded(Duration::from_millis(5), slow).await;
        assert!(matches!(result, Err(CacheError::Unavailable(_))));
    }

    #[tokio::test]
    async fn recovers_from_poisoned_lock() {
        let store = MemoryIndexStore::new();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store
                .tables
                .write()
                .expect("tables lock should be acquired");
            panic!("poison tables lock");
        }));

        store
            .put_record(&sample_item(1, "Lamp", dec!(30)))
            .await
            .unwrap();
        assert!(store.get_record(1).await.unwrap().is_some());
    }
}
